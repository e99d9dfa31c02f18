use std::fmt;

/// Non-fatal conditions noticed during a release or health evaluation.
/// These are reported to the user but never change the outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No commits since the latest tag
    NoNewCommits {
        latest_tag: String,
        current_commit_hash: String,
    },
    /// Tag exists but is not `vMAJOR.MINOR.PATCH`; the default version is used
    UnparsableTag { tag: String, fallback: String },
    /// Commits left out of the changelog for lacking a recognised prefix
    UnclassifiedCommits { count: usize },
    /// A weighted metric had no sample and was scored as 0
    MissingMetric { category: String },
    /// Webhook delivery failed
    NotificationFailed { event: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                latest_tag,
                current_commit_hash,
            } => {
                let short_hash = current_commit_hash.get(..7).unwrap_or(current_commit_hash);
                write!(
                    f,
                    "No new commits since tag '{}' (HEAD at {})",
                    latest_tag, short_hash
                )
            }
            BoundaryWarning::UnparsableTag { tag, fallback } => {
                write!(
                    f,
                    "Cannot parse tag '{}' as vMAJOR.MINOR.PATCH; using {}",
                    tag, fallback
                )
            }
            BoundaryWarning::UnclassifiedCommits { count } => {
                write!(
                    f,
                    "{} commit(s) without a feat/add/fix/bug/change/update prefix left out of the changelog",
                    count
                )
            }
            BoundaryWarning::MissingMetric { category } => {
                write!(f, "No sample reported for '{}'; scored as 0", category)
            }
            BoundaryWarning::NotificationFailed { event } => {
                write!(f, "Could not deliver '{}' notification", event)
            }
        }
    }
}
