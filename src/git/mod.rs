//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! queries and mutations a release needs, allowing the release flow to run
//! against a real repository or an in-memory mock.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! Most code should depend on the [Repository] trait rather than concrete
//! implementations.
//!
//! ```rust,no_run
//! # use release_health::git::{Git2Repository, Repository};
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Git2Repository::open(".")?;
//! let last = repo.latest_tag()?;
//! let commits = repo.commits_since(last.as_deref())?;
//! println!("{} commits since {:?}", commits.len(), last);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::CommitRecord;
use crate::error::Result;

/// Shown in place of a branch name when HEAD points directly at a commit
pub const DETACHED_HEAD: &str = "HEAD (detached)";

/// Version-control operations used by a release
///
/// Implementations map backend errors to [crate::error::ReleaseError]. The
/// first six methods are read-only; the rest mutate the repository or a
/// remote.
pub trait Repository {
    /// Name of the currently checked-out branch
    ///
    /// # Returns
    /// * `Ok(Some(name))` - Short branch name (e.g. "main")
    /// * `Ok(None)` - If HEAD is detached
    /// * `Err` - If HEAD is unborn or unreadable
    fn current_branch(&self) -> Result<Option<String>>;

    /// Paths with uncommitted changes, including untracked files
    ///
    /// An empty list means the working tree is clean. Ignored files are not
    /// reported.
    fn uncommitted_changes(&self) -> Result<Vec<String>>;

    /// Most recent tag reachable from HEAD
    ///
    /// # Returns
    /// * `Ok(Some(tag))` - The nearest tag walking back from HEAD
    /// * `Ok(None)` - If no tag is reachable
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Commits in `(tag, HEAD]`, oldest first
    ///
    /// With `tag = None`, returns the whole history of HEAD.
    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitRecord>>;

    /// Whether a tag named `name` exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Full hash of the HEAD commit
    fn head_hash(&self) -> Result<String>;

    /// Stage every change in the working tree and commit it on HEAD
    ///
    /// # Returns
    /// * `Ok(String)` - Hash of the new commit
    fn commit_all(&self, message: &str) -> Result<String>;

    /// Create an annotated tag on HEAD
    ///
    /// Fails if the tag already exists.
    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push `branch` and `tag` to `remote`
    fn push(&self, remote: &str, branch: &str, tag: &str) -> Result<()>;
}
