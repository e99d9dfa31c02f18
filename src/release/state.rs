use crate::boundary::BoundaryWarning;
use crate::changelog::ChangelogSection;
use crate::domain::Version;
use crate::error::ReleaseError;
use std::fmt;

/// States of the release pipeline
///
/// The happy path is linear from [`ReleaseState::Idle`] to
/// [`ReleaseState::Done`]. Every state before `Done` may fall into
/// [`ReleaseState::Failed`]; cancellation and dry runs return to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseState {
    Idle,
    CheckBranch,
    CheckClean,
    ComputeVersion,
    ConfirmUser,
    RunTests,
    UpdateFiles,
    CommitAndTag,
    Push,
    Done,
    Failed,
}

impl ReleaseState {
    /// Next state on the happy path
    pub fn successor(self) -> Option<ReleaseState> {
        use ReleaseState::*;
        match self {
            Idle => Some(CheckBranch),
            CheckBranch => Some(CheckClean),
            CheckClean => Some(ComputeVersion),
            ComputeVersion => Some(ConfirmUser),
            ConfirmUser => Some(RunTests),
            RunTests => Some(UpdateFiles),
            UpdateFiles => Some(CommitAndTag),
            CommitAndTag => Some(Push),
            Push => Some(Done),
            Done | Failed => None,
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: ReleaseState) -> bool {
        use ReleaseState::*;
        if self.successor() == Some(next) {
            return true;
        }
        match next {
            Failed => !matches!(self, Idle | Done | Failed),
            // dry run stops after ComputeVersion, a "no" stops at ConfirmUser
            Idle => matches!(self, ComputeVersion | ConfirmUser),
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ReleaseState::Done | ReleaseState::Failed)
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ephemeral state owned by one orchestrator invocation
#[derive(Debug)]
pub struct ReleaseRun {
    state: ReleaseState,
    trace: Vec<ReleaseState>,
    pub previous_tag: Option<String>,
    pub version: Option<Version>,
    pub section: Option<ChangelogSection>,
    pub warnings: Vec<BoundaryWarning>,
}

impl ReleaseRun {
    pub fn new() -> Self {
        ReleaseRun {
            state: ReleaseState::Idle,
            trace: vec![ReleaseState::Idle],
            previous_tag: None,
            version: None,
            section: None,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> ReleaseState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`
    pub fn trace(&self) -> &[ReleaseState] {
        &self.trace
    }

    pub fn visited(&self, state: ReleaseState) -> bool {
        self.trace.contains(&state)
    }

    pub(crate) fn advance(&mut self, next: ReleaseState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "release state transition");
        self.state = next;
        self.trace.push(next);
    }

    pub(crate) fn warn(&mut self, warning: BoundaryWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

impl Default for ReleaseRun {
    fn default() -> Self {
        Self::new()
    }
}

/// How a release run ended
#[derive(Debug)]
pub enum ReleaseOutcome {
    /// Tag created and pushed
    Released {
        version: Version,
        tag: String,
        commit: String,
    },
    /// The user declined at the confirmation prompt
    Cancelled,
    /// Dry run finished after computing the version
    DryRun { version: Version },
    /// A step failed; `at` is the state that was executing
    Failed { at: ReleaseState, error: ReleaseError },
}

impl ReleaseOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseOutcome::Failed { .. } => 1,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReleaseOutcome::Released { .. })
    }
}

/// Result of [`crate::release::ReleaseOrchestrator::run`]
#[derive(Debug)]
pub struct ReleaseReport {
    pub run: ReleaseRun,
    pub outcome: ReleaseOutcome,
}
