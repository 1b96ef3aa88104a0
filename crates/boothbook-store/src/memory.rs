//! In-memory object store for tests and local runs.
//!
//! [`InMemoryStore`] keeps real content-addressed blobs, trees and commits in
//! `HashMap`s behind one `RwLock`, and enforces the same fast-forward rule on
//! branch updates that the remote does. Data is lost when the store is dropped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use boothbook_types::ObjectHash;

use crate::error::{StoreError, StoreResult};
use crate::traits::{FileContent, ObjectStore, TreeFile};

/// A commit as stored by [`InMemoryStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitObject {
    pub message: String,
    pub tree: ObjectHash,
    pub parents: Vec<ObjectHash>,
}

type TreeMap = BTreeMap<String, ObjectHash>;

#[derive(Default)]
struct Objects {
    blobs: HashMap<ObjectHash, String>,
    trees: HashMap<ObjectHash, TreeMap>,
    commits: HashMap<ObjectHash, CommitObject>,
    branches: HashMap<String, ObjectHash>,
    // Stands in for the author timestamp so identical commits stay distinct.
    serial: u64,
    advances: u64,
}

impl Objects {
    fn put_blob(&mut self, content: &str) -> ObjectHash {
        let id = ObjectHash::of_content("blob", content.as_bytes());
        self.blobs.entry(id.clone()).or_insert_with(|| content.to_string());
        id
    }

    fn put_tree(&mut self, tree: TreeMap) -> ObjectHash {
        let mut encoded = String::new();
        for (path, blob) in &tree {
            encoded.push_str(path);
            encoded.push('\0');
            encoded.push_str(blob.as_str());
            encoded.push('\n');
        }
        let id = ObjectHash::of_content("tree", encoded.as_bytes());
        self.trees.entry(id.clone()).or_insert(tree);
        id
    }

    fn put_commit(&mut self, commit: CommitObject) -> ObjectHash {
        self.serial += 1;
        let mut encoded = format!("tree {}\n", commit.tree);
        for parent in &commit.parents {
            encoded.push_str(&format!("parent {parent}\n"));
        }
        encoded.push_str(&format!("serial {}\n\n{}", self.serial, commit.message));
        let id = ObjectHash::of_content("commit", encoded.as_bytes());
        self.commits.insert(id.clone(), commit);
        id
    }

    fn tip(&self, branch: &str) -> StoreResult<&ObjectHash> {
        self.branches.get(branch).ok_or_else(|| StoreError::NotFound {
            path: format!("refs/heads/{branch}"),
        })
    }

    /// Commit named by a branch, or by its own hash.
    fn resolve(&self, reference: &str) -> StoreResult<&ObjectHash> {
        if let Some(tip) = self.branches.get(reference) {
            return Ok(tip);
        }
        ObjectHash::parse(reference)
            .ok()
            .and_then(|id| self.commits.get_key_value(&id).map(|(k, _)| k))
            .ok_or_else(|| StoreError::NotFound {
                path: format!("refs/heads/{reference}"),
            })
    }

    fn commit(&self, id: &ObjectHash) -> StoreResult<&CommitObject> {
        self.commits.get(id).ok_or_else(|| StoreError::NotFound {
            path: format!("commit {id}"),
        })
    }

    fn tree(&self, id: &ObjectHash) -> StoreResult<&TreeMap> {
        self.trees.get(id).ok_or_else(|| StoreError::NotFound {
            path: format!("tree {id}"),
        })
    }

    /// Returns `true` if `ancestor` is reachable from `commit` via parents.
    fn descends_from(&self, commit: &ObjectHash, ancestor: &ObjectHash) -> bool {
        let mut stack = vec![commit.clone()];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if &id == ancestor {
                return true;
            }
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(c) = self.commits.get(&id) {
                stack.extend(c.parents.iter().cloned());
            }
        }
        false
    }
}

/// An in-memory implementation of [`ObjectStore`].
pub struct InMemoryStore {
    objects: RwLock<Objects>,
}

impl InMemoryStore {
    /// Create a store with no branches.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Objects::default()),
        }
    }

    /// Create `branch` with a root commit holding `files`.
    ///
    /// Replaces the branch if it already exists.
    pub fn seed(&self, branch: &str, files: &[(&str, &str)]) -> StoreResult<ObjectHash> {
        let mut objects = self.write()?;
        let mut tree = TreeMap::new();
        for (path, content) in files {
            let blob = objects.put_blob(content);
            tree.insert(path.to_string(), blob);
        }
        let tree = objects.put_tree(tree);
        let commit = objects.put_commit(CommitObject {
            message: "seed".into(),
            tree,
            parents: Vec::new(),
        });
        objects.branches.insert(branch.to_string(), commit.clone());
        Ok(commit)
    }

    /// Content of `path` at the tip of `branch`, if both exist.
    pub fn read_path(&self, branch: &str, path: &str) -> StoreResult<Option<String>> {
        let objects = self.read()?;
        let tip = objects.tip(branch)?;
        let tree = objects.tree(&objects.commit(tip)?.tree)?;
        Ok(tree.get(path).and_then(|blob| objects.blobs.get(blob)).cloned())
    }

    /// Commit object at the tip of `branch`.
    pub fn tip_commit(&self, branch: &str) -> StoreResult<CommitObject> {
        let objects = self.read()?;
        let tip = objects.tip(branch)?;
        Ok(objects.commit(tip)?.clone())
    }

    /// Paths whose content differs between `commit` and its first parent.
    pub fn changed_paths(&self, commit: &ObjectHash) -> StoreResult<Vec<String>> {
        let objects = self.read()?;
        let c = objects.commit(commit)?;
        let after = objects.tree(&c.tree)?;
        let empty = TreeMap::new();
        let before = match c.parents.first() {
            Some(parent) => objects.tree(&objects.commit(parent)?.tree)?,
            None => &empty,
        };
        let mut paths: Vec<String> = after
            .iter()
            .filter(|(path, blob)| before.get(*path) != Some(*blob))
            .map(|(path, _)| path.clone())
            .chain(before.keys().filter(|p| !after.contains_key(*p)).cloned())
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Number of successful branch updates since creation, seeds excluded.
    pub fn advance_count(&self) -> StoreResult<u64> {
        Ok(self.read()?.advances)
    }

    /// Number of commit objects, reachable or not.
    pub fn commit_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.commits.len())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Objects>> {
        self.objects
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Objects>> {
        self.objects
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("InMemoryStore");
        if let Ok(objects) = self.objects.read() {
            d.field("commits", &objects.commits.len())
                .field("branches", &objects.branches.len());
        }
        d.finish()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn fetch_file(&self, reference: &str, path: &str) -> StoreResult<FileContent> {
        let objects = self.read()?;
        let commit = objects.resolve(reference)?;
        let tree = objects.tree(&objects.commit(commit)?.tree)?;
        let hash = tree.get(path).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        let content = objects.blobs.get(hash).cloned().ok_or_else(|| StoreError::NotFound {
            path: format!("blob {hash}"),
        })?;
        Ok(FileContent {
            content,
            hash: hash.clone(),
        })
    }

    async fn branch_tip(&self, branch: &str) -> StoreResult<ObjectHash> {
        Ok(self.read()?.tip(branch)?.clone())
    }

    async fn read_commit_tree(&self, commit: &ObjectHash) -> StoreResult<ObjectHash> {
        Ok(self.read()?.commit(commit)?.tree.clone())
    }

    async fn commit_tree(&self, base_tree: &ObjectHash, files: &[TreeFile]) -> StoreResult<ObjectHash> {
        let mut objects = self.write()?;
        let mut tree = objects.tree(base_tree)?.clone();
        for file in files {
            let blob = objects.put_blob(&file.content);
            tree.insert(file.path.clone(), blob);
        }
        Ok(objects.put_tree(tree))
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectHash,
        parent: &ObjectHash,
    ) -> StoreResult<ObjectHash> {
        let mut objects = self.write()?;
        objects.tree(tree)?;
        objects.commit(parent)?;
        Ok(objects.put_commit(CommitObject {
            message: message.to_string(),
            tree: tree.clone(),
            parents: vec![parent.clone()],
        }))
    }

    async fn advance_branch(&self, branch: &str, commit: &ObjectHash, force: bool) -> StoreResult<()> {
        let mut objects = self.write()?;
        let current = objects.tip(branch)?.clone();
        if !objects.commits.contains_key(commit) {
            return Err(StoreError::Unexpected {
                status: 422,
                body: format!("object {commit} does not exist"),
            });
        }
        if !force && !objects.descends_from(commit, &current) {
            return Err(StoreError::Rejected {
                branch: branch.to_string(),
            });
        }
        objects.branches.insert(branch.to_string(), commit.clone());
        objects.advances += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .seed("main", &[("data/a.json", "[]"), ("data/b.json", "[1]")])
            .unwrap();
        store
    }

    async fn commit_file(store: &InMemoryStore, parent: &ObjectHash, path: &str, body: &str) -> ObjectHash {
        let base = store.read_commit_tree(parent).await.unwrap();
        let tree = store.commit_tree(&base, &[TreeFile::new(path, body)]).await.unwrap();
        store.create_commit("edit", &tree, parent).await.unwrap()
    }

    #[tokio::test]
    async fn fetch_file_returns_content_and_blob_hash() {
        let store = seeded();
        let file = store.fetch_file("main", "data/a.json").await.unwrap();
        assert_eq!(file.content, "[]");
        assert_eq!(file.hash, ObjectHash::of_content("blob", b"[]"));
    }

    #[tokio::test]
    async fn fetch_missing_path_or_branch_is_not_found() {
        let store = seeded();
        let err = store.fetch_file("main", "data/zzz.json").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref path } if path == "data/zzz.json"));
        let err = store.fetch_file("dev", "data/a.json").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn fetch_file_at_commit_ignores_later_writes() {
        let store = seeded();
        let old = store.branch_tip("main").await.unwrap();
        let base = store.read_commit_tree(&old).await.unwrap();
        let tree = store.commit_tree(&base, &[TreeFile::new("data/a.json", "[1]")]).await.unwrap();
        let new = store.create_commit("next", &tree, &old).await.unwrap();
        store.advance_branch("main", &new, false).await.unwrap();

        assert_eq!(store.fetch_file(old.as_str(), "data/a.json").await.unwrap().content, "[]");
        assert_eq!(store.fetch_file(new.as_str(), "data/a.json").await.unwrap().content, "[1]");
        assert_eq!(store.fetch_file("main", "data/a.json").await.unwrap().content, "[1]");
        let unknown = ObjectHash::of_content("commit", b"nowhere");
        assert!(matches!(
            store.fetch_file(unknown.as_str(), "data/a.json").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn commit_tree_replaces_only_named_paths() {
        let store = seeded();
        let tip = store.branch_tip("main").await.unwrap();
        let commit = commit_file(&store, &tip, "data/a.json", "[42]").await;

        // Nothing visible until the branch moves.
        assert_eq!(store.read_path("main", "data/a.json").unwrap().as_deref(), Some("[]"));

        store.advance_branch("main", &commit, false).await.unwrap();
        assert_eq!(store.read_path("main", "data/a.json").unwrap().as_deref(), Some("[42]"));
        assert_eq!(store.read_path("main", "data/b.json").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.changed_paths(&commit).unwrap(), vec!["data/a.json"]);
    }

    #[tokio::test]
    async fn commit_tree_can_add_new_paths() {
        let store = seeded();
        let tip = store.branch_tip("main").await.unwrap();
        let commit = commit_file(&store, &tip, "data/c.json", "{}").await;
        store.advance_branch("main", &commit, false).await.unwrap();
        assert_eq!(store.read_path("main", "data/c.json").unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn stale_parent_is_rejected() {
        let store = seeded();
        let tip = store.branch_tip("main").await.unwrap();

        let winner = commit_file(&store, &tip, "data/a.json", "[1]").await;
        let loser = commit_file(&store, &tip, "data/a.json", "[2]").await;

        store.advance_branch("main", &winner, false).await.unwrap();
        let err = store.advance_branch("main", &loser, false).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { ref branch } if branch == "main"));
        assert_eq!(store.read_path("main", "data/a.json").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.advance_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn force_skips_fast_forward_check() {
        let store = seeded();
        let tip = store.branch_tip("main").await.unwrap();
        let winner = commit_file(&store, &tip, "data/a.json", "[1]").await;
        let loser = commit_file(&store, &tip, "data/a.json", "[2]").await;
        store.advance_branch("main", &winner, false).await.unwrap();
        store.advance_branch("main", &loser, true).await.unwrap();
        assert_eq!(store.read_path("main", "data/a.json").unwrap().as_deref(), Some("[2]"));
    }

    #[tokio::test]
    async fn identical_commits_get_distinct_hashes() {
        let store = seeded();
        let tip = store.branch_tip("main").await.unwrap();
        let a = commit_file(&store, &tip, "data/a.json", "[1]").await;
        let b = commit_file(&store, &tip, "data/a.json", "[1]").await;
        assert_ne!(a, b);
        assert_eq!(store.commit_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn advance_to_unknown_commit_fails() {
        let store = seeded();
        let bogus = ObjectHash::of_content("commit", b"nope");
        let err = store.advance_branch("main", &bogus, false).await.unwrap_err();
        assert!(matches!(err, StoreError::Unexpected { status: 422, .. }));
    }

    #[tokio::test]
    async fn create_commit_requires_existing_objects() {
        let store = seeded();
        let tip = store.branch_tip("main").await.unwrap();
        let bogus = ObjectHash::of_content("tree", b"nope");
        assert!(store.create_commit("x", &bogus, &tip).await.is_err());
    }
}
