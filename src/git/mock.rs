use crate::domain::CommitRecord;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use std::cell::RefCell;

/// Mock repository for testing without actual git operations
///
/// Mutating calls are recorded in order and can be inspected with
/// [`MockRepository::calls`].
pub struct MockRepository {
    branch: Option<String>,
    dirty: Vec<String>,
    tags: RefCell<Vec<(String, usize)>>,
    commits: RefCell<Vec<CommitRecord>>,
    calls: RefCell<Vec<String>>,
    fail_push: bool,
}

impl MockRepository {
    /// Create a new mock repository on `main` with no history
    pub fn new() -> Self {
        MockRepository {
            branch: Some("main".to_string()),
            dirty: Vec::new(),
            tags: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            fail_push: false,
        }
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Check out a bare commit instead of a branch
    pub fn detached(mut self) -> Self {
        self.branch = None;
        self
    }

    pub fn with_dirty_path(mut self, path: impl Into<String>) -> Self {
        self.dirty.push(path.into());
        self
    }

    /// Append a commit with the given subject
    pub fn add_commit(&self, subject: impl Into<String>, author: impl Into<String>) {
        let mut commits = self.commits.borrow_mut();
        let id = format!("{:040x}", commits.len() + 1);
        commits.push(CommitRecord::new(subject, author).with_id(id));
    }

    /// Tag the most recent commit
    pub fn add_tag(&self, name: impl Into<String>) {
        let head = self.commits.borrow().len();
        self.tags.borrow_mut().push((name.into(), head));
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    /// Mutating operations performed so far, e.g. `tag v1.0.0`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.borrow().iter().map(|(name, _)| name.clone()).collect()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn uncommitted_changes(&self) -> Result<Vec<String>> {
        Ok(self.dirty.clone())
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self
            .tags
            .borrow()
            .iter()
            .max_by_key(|(_, position)| *position)
            .map(|(name, _)| name.clone()))
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitRecord>> {
        let start = match tag {
            Some(tag) => self
                .tags
                .borrow()
                .iter()
                .find(|(name, _)| name == tag)
                .map(|(_, position)| *position)
                .ok_or_else(|| ReleaseError::config(format!("Tag not found: {}", tag)))?,
            None => 0,
        };

        Ok(self.commits.borrow()[start..].to_vec())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.borrow().iter().any(|(existing, _)| existing == name))
    }

    fn head_hash(&self) -> Result<String> {
        Ok(self
            .commits
            .borrow()
            .last()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| "0".repeat(40)))
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        self.add_commit(message, "release-health");
        self.calls.borrow_mut().push(format!("commit {}", message));
        self.head_hash()
    }

    fn create_tag(&self, name: &str, _message: &str) -> Result<()> {
        if self.tag_exists(name)? {
            return Err(ReleaseError::Git(git2::Error::from_str(&format!(
                "tag '{}' already exists",
                name
            ))));
        }
        self.add_tag(name);
        self.calls.borrow_mut().push(format!("tag {}", name));
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str, tag: &str) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseError::remote("connection refused"));
        }
        self.calls
            .borrow_mut()
            .push(format!("push {} {} {}", remote, branch, tag));
        Ok(())
    }
}
