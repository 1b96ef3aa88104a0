//! Typed access to the JSON documents stored in the repository.

use std::fmt;
use std::sync::Arc;

use boothbook_store::{ObjectStore, StoreError, TreeFile};
use boothbook_types::{Booth, ObjectHash, ScheduleRecord, Vendor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// The three documents boothbook keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentName {
    Vendors,
    Booths,
    Schedule,
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vendors => write!(f, "vendors"),
            Self::Booths => write!(f, "booths"),
            Self::Schedule => write!(f, "schedule"),
        }
    }
}

/// Repository paths of each document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPaths {
    pub vendors: String,
    pub booths: String,
    pub schedule: String,
}

impl Default for DocumentPaths {
    fn default() -> Self {
        Self {
            vendors: "data/vendors.json".into(),
            booths: "data/booths.json".into(),
            schedule: "data/schedule.json".into(),
        }
    }
}

impl DocumentPaths {
    pub fn path(&self, name: DocumentName) -> &str {
        match name {
            DocumentName::Vendors => &self.vendors,
            DocumentName::Booths => &self.booths,
            DocumentName::Schedule => &self.schedule,
        }
    }

    /// Overlay `VENDOR_FILE`, `BOOTH_FILE` and `SCHEDULE_FILE`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(p) = get("VENDOR_FILE") {
            self.vendors = p;
        }
        if let Some(p) = get("BOOTH_FILE") {
            self.booths = p;
        }
        if let Some(p) = get("SCHEDULE_FILE") {
            self.schedule = p;
        }
    }
}

/// A decoded document and the blob hash it was read at.
#[derive(Clone, Debug, PartialEq)]
pub struct Document<T> {
    pub name: DocumentName,
    pub path: String,
    pub hash: ObjectHash,
    pub items: Vec<T>,
}

impl<T: Serialize> Document<T> {
    /// Pretty JSON with two-space indentation, matching hand-edited files.
    pub fn encode(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(&self.items).map_err(|e| LedgerError::Encode {
            document: self.name,
            reason: e.to_string(),
        })
    }

    /// Full replacement content of this document's path.
    pub fn to_file(&self) -> LedgerResult<TreeFile> {
        Ok(TreeFile::new(self.path.clone(), self.encode()?))
    }
}

/// Read side of the commit layer.
///
/// Documents are fetched fresh on every call; nothing is cached.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn ObjectStore>,
    branch: String,
    paths: DocumentPaths,
}

impl DocumentRepository {
    pub fn new(store: Arc<dyn ObjectStore>, branch: impl Into<String>, paths: DocumentPaths) -> Self {
        Self {
            store,
            branch: branch.into(),
            paths,
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    /// Pin the current branch tip so several documents can be read at the
    /// same commit.
    pub async fn snapshot(&self) -> LedgerResult<Snapshot<'_>> {
        let commit = self.store.branch_tip(&self.branch).await?;
        tracing::debug!(branch = %self.branch, commit = commit.short(), "pinned snapshot");
        Ok(Snapshot { repo: self, commit })
    }

    /// Fetch and decode `name` at the branch tip.
    ///
    /// A whitespace-only file decodes as an empty collection.
    pub async fn load<T: DeserializeOwned>(&self, name: DocumentName) -> LedgerResult<Document<T>> {
        self.load_at(&self.branch, name).await
    }

    async fn load_at<T: DeserializeOwned>(&self, reference: &str, name: DocumentName) -> LedgerResult<Document<T>> {
        let path = self.paths.path(name).to_string();
        let file = match self.store.fetch_file(reference, &path).await {
            Ok(file) => file,
            Err(StoreError::NotFound { .. }) => {
                return Err(LedgerError::MissingDocument { document: name, path });
            }
            Err(e) => return Err(e.into()),
        };

        let items = if file.content.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&file.content).map_err(|e| LedgerError::Decode {
                document: name,
                reason: e.to_string(),
            })?
        };
        tracing::debug!(document = %name, %path, hash = file.hash.short(), "loaded document");

        Ok(Document {
            name,
            path,
            hash: file.hash,
            items,
        })
    }

    pub async fn vendors(&self) -> LedgerResult<Document<Vendor>> {
        self.load(DocumentName::Vendors).await
    }

    pub async fn booths(&self) -> LedgerResult<Document<Booth>> {
        self.load(DocumentName::Booths).await
    }

    pub async fn schedule(&self) -> LedgerResult<Document<ScheduleRecord>> {
        self.load(DocumentName::Schedule).await
    }
}

/// Documents as of one commit.
///
/// Writes derived from a snapshot should be
/// [`based_on`](crate::CommitTransaction::based_on) its [`commit`](Self::commit).
#[derive(Clone, Debug)]
pub struct Snapshot<'a> {
    repo: &'a DocumentRepository,
    commit: ObjectHash,
}

impl Snapshot<'_> {
    pub fn commit(&self) -> &ObjectHash {
        &self.commit
    }

    pub async fn load<T: DeserializeOwned>(&self, name: DocumentName) -> LedgerResult<Document<T>> {
        self.repo.load_at(self.commit.as_str(), name).await
    }

    pub async fn vendors(&self) -> LedgerResult<Document<Vendor>> {
        self.load(DocumentName::Vendors).await
    }

    pub async fn booths(&self) -> LedgerResult<Document<Booth>> {
        self.load(DocumentName::Booths).await
    }

    pub async fn schedule(&self) -> LedgerResult<Document<ScheduleRecord>> {
        self.load(DocumentName::Schedule).await
    }
}

impl fmt::Debug for DocumentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("branch", &self.branch)
            .field("paths", &self.paths)
            .finish()
    }
}
