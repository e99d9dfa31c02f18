//! Domain logic - pure release rules independent of git operations

pub mod branch;
pub mod commit;
pub mod version;

pub use branch::BranchContext;
pub use commit::{ChangelogCategory, ChangelogEntry, CommitRecord};
pub use version::{resolve, resolve_or_default, BumpKind, Resolution, Version, DEFAULT_VERSION};
