//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text and are unit tested; `display_*`
//! functions print it, styled with `console`.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::changelog::ChangelogSection;
use crate::error::{ErrorKind, ReleaseError};
use crate::metrics::{Badge, HealthScore, Status};
use crate::release::{ReleaseOutcome, ReleaseState};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display the changelog section a release would prepend.
pub fn display_changelog_preview(previous_tag: Option<&str>, section: &ChangelogSection) {
    let next = section.version.tag();
    match previous_tag {
        Some(old) => {
            println!("\n{}", style("Proposed Release:").bold());
            println!("  From: {}", style(old).red());
            println!("  To:   {}", style(&next).green());
        }
        None => {
            println!("\n{}", style("Initial Release:").bold());
            println!("  New tag: {}", style(&next).green());
        }
    }
    println!("\n{}", style("Changelog section:").underlined());
    for line in section.render().lines() {
        println!("  {}", line);
    }
}

/// Print the final line of a release run.
pub fn display_release_outcome(outcome: &ReleaseOutcome) {
    match outcome {
        ReleaseOutcome::Released { tag, commit, .. } => {
            let short = commit.get(..7).unwrap_or(commit);
            println!(
                "\n{} Released {} ({})\n",
                style("✓").green(),
                style(tag).bold(),
                short
            );
        }
        ReleaseOutcome::Cancelled => println!("Release cancelled by user."),
        ReleaseOutcome::DryRun { version } => {
            display_status(&format!("Dry run: {} was not created", version.tag()))
        }
        ReleaseOutcome::Failed { at, error } => display_error(&format_release_failure(*at, error)),
    }
}

/// Failure line with a next step chosen by the error's kind.
pub fn format_release_failure(at: ReleaseState, error: &ReleaseError) -> String {
    let hint = match error.kind() {
        ErrorKind::Validation => "fix the repository state or configuration and retry",
        ErrorKind::Parse => "check the tag and version file formats",
        ErrorKind::TestFailure => "nothing was committed; fix the failing tests and retry",
        ErrorKind::Io => "check that the release files are writable",
        ErrorKind::Vcs => "inspect the local commit and tags before retrying",
        ErrorKind::Transport => "the remote service may be unavailable; retry later",
    };
    let verb = if error.is_fatal() { "failed" } else { "stopped" };

    format!("Release {} during {}: {}
  hint: {}", verb, at, error, hint)
}

/// Display manual push instruction for a tag.
///
/// Used after a failed push: the local commit and tag are kept, so the
/// operator can retry by hand.
pub fn display_manual_push_instruction(remote: &str, branch: &str, tag: &str) {
    println!(
        "\n{} To push this release later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} {} {}", remote, branch, tag)).cyan()
    );
}

/// One line per category, e.g. `coverage   85.0  Good  (weight 0.40)`.
pub fn format_health_breakdown(score: &HealthScore, weight_of: impl Fn(&str) -> Option<f64>) -> Vec<String> {
    score
        .breakdown
        .iter()
        .map(|(category, entry)| {
            let weight = weight_of(category)
                .map(|w| format!("  (weight {:.2})", w))
                .unwrap_or_default();
            format!(
                "{:<16} {:>8.1}  {:<4}{}",
                category,
                entry.value,
                entry.status,
                weight
            )
        })
        .collect()
}

/// Display the overall score, per-category breakdown and badge.
pub fn display_health(score: &HealthScore, badge: &Badge, weight_of: impl Fn(&str) -> Option<f64>) {
    println!("\n{}", style("Health breakdown:").bold());
    for (line, (_, entry)) in format_health_breakdown(score, weight_of)
        .iter()
        .zip(score.breakdown.iter())
    {
        let styled = match entry.status {
            Status::Good => style(line).green(),
            Status::Fair => style(line).yellow(),
            Status::Poor => style(line).red(),
        };
        println!("  {}", styled);
    }

    println!(
        "\n{} {:.1} ({} / {})",
        style("Overall score:").bold(),
        score.overall,
        badge.text,
        badge.color
    );
}
