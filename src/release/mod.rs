//! Release pipeline
//!
//! A release is an explicit state machine ([`ReleaseState`]) driven by
//! [`ReleaseOrchestrator`]. All external effects go through injected
//! collaborators: [`crate::git::Repository`], [`crate::runner::TestRunner`],
//! [`crate::ui::Confirm`] and optionally [`crate::notify::Notifier`].

pub mod orchestrator;
pub mod state;

pub use orchestrator::{ReleaseContext, ReleaseOrchestrator};
pub use state::{ReleaseOutcome, ReleaseReport, ReleaseRun, ReleaseState};
