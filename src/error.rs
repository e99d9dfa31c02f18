use thiserror::Error;

/// Unified error type for release-health operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid tag format: '{0}' - expected vMAJOR.MINOR.PATCH")]
    InvalidTagFormat(String),

    #[error("Cannot {bump}-bump {version}: component is already at its maximum")]
    VersionOverflow { version: String, bump: &'static str },

    #[error("Wrong branch: releases are cut from '{expected}', currently on '{actual}'")]
    WrongBranch { expected: String, actual: String },

    #[error("Working tree has uncommitted changes: {0}")]
    DirtyWorkingTree(String),

    #[error("Invalid weight configuration: {0}")]
    InvalidWeightConfiguration(String),

    #[error("Tests failed: {0}")]
    TestFailure(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Notification delivery failed: {0}")]
    Transport(String),

    #[error("Report format error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-health
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Coarse classification of a [`ReleaseError`], deciding how callers react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Precondition not met; nothing has been mutated.
    Validation,
    /// Malformed input that has a documented local recovery.
    Parse,
    /// Test suite failed; only local, reversible changes may exist.
    TestFailure,
    /// Filesystem failure.
    Io,
    /// Version-control failure, possibly after externally visible actions.
    Vcs,
    /// Notification delivery; never affects the run outcome.
    Transport,
}

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a weight configuration error with context
    pub fn weights(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidWeightConfiguration(msg.into())
    }

    /// Create a test failure error with context
    pub fn test_failure(msg: impl Into<String>) -> Self {
        ReleaseError::TestFailure(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a transport error with context
    pub fn transport(msg: impl Into<String>) -> Self {
        ReleaseError::Transport(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReleaseError::Config(_)
            | ReleaseError::WrongBranch { .. }
            | ReleaseError::DirtyWorkingTree(_)
            | ReleaseError::InvalidWeightConfiguration(_)
            | ReleaseError::VersionOverflow { .. }
            | ReleaseError::Report(_) => ErrorKind::Validation,
            ReleaseError::InvalidTagFormat(_) => ErrorKind::Parse,
            ReleaseError::TestFailure(_) => ErrorKind::TestFailure,
            ReleaseError::Io(_) => ErrorKind::Io,
            ReleaseError::Git(_) | ReleaseError::Remote(_) => ErrorKind::Vcs,
            ReleaseError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Whether this error must abort the current run.
    ///
    /// Parse errors have a local fallback and transport errors are ignored.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Parse | ErrorKind::Transport)
    }
}
