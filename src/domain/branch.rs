/// The branch a release is being cut from, checked against the configured release branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub name: String,
    pub release_branch: String,
}

impl BranchContext {
    /// Create a new branch context
    pub fn new(name: impl Into<String>, release_branch: impl Into<String>) -> Self {
        BranchContext {
            name: name.into(),
            release_branch: release_branch.into(),
        }
    }

    /// Check if this is the designated release branch
    pub fn is_release_branch(&self) -> bool {
        self.name == self.release_branch
    }
}
