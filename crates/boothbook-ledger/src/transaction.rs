use boothbook_store::TreeFile;
use boothbook_types::ObjectHash;

/// Files to publish together in one commit.
///
/// Each file carries the full new content of its path. Adding a path twice
/// keeps the position of the first insertion and the content of the last.
///
/// A transaction built from documents read at a known commit should be
/// [`based_on`](Self::based_on) that commit, so the new commit extends the
/// state that was read rather than whatever the tip is at publish time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitTransaction {
    message: String,
    files: Vec<TreeFile>,
    base: Option<ObjectHash>,
}

impl CommitTransaction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            files: Vec::new(),
            base: None,
        }
    }

    /// Parent the commit on `commit` instead of the tip read at publish time.
    pub fn based_on(mut self, commit: ObjectHash) -> Self {
        self.base = Some(commit);
        self
    }

    pub fn base(&self) -> Option<&ObjectHash> {
        self.base.as_ref()
    }

    pub fn with_file(mut self, file: TreeFile) -> Self {
        self.push(file);
        self
    }

    pub fn push(&mut self, file: TreeFile) {
        match self.files.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => existing.content = file.content,
            None => self.files.push(file),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn files(&self) -> &[TreeFile] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_order() {
        let tx = CommitTransaction::new("msg")
            .with_file(TreeFile::new("data/schedule.json", "[]"))
            .with_file(TreeFile::new("data/booths.json", "[]"));
        assert_eq!(tx.message(), "msg");
        assert_eq!(tx.len(), 2);
        assert_eq!(tx.paths().collect::<Vec<_>>(), vec!["data/schedule.json", "data/booths.json"]);
    }

    #[test]
    fn same_path_is_replaced_in_place() {
        let mut tx = CommitTransaction::new("msg");
        tx.push(TreeFile::new("a", "1"));
        tx.push(TreeFile::new("b", "2"));
        tx.push(TreeFile::new("a", "3"));
        assert_eq!(tx.files(), &[TreeFile::new("a", "3"), TreeFile::new("b", "2")]);
    }

    #[test]
    fn empty_by_default() {
        let tx = CommitTransaction::new("nothing");
        assert!(tx.is_empty());
        assert!(tx.base().is_none());
    }

    #[test]
    fn based_on_records_parent() {
        let base = ObjectHash::of_content("commit", b"c1");
        let tx = CommitTransaction::new("msg").based_on(base.clone());
        assert_eq!(tx.base(), Some(&base));
    }
}
