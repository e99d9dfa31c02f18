//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use crate::error::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_changelog_preview, display_error, display_health,
    display_manual_push_instruction, display_release_outcome, display_status, display_success,
    format_release_failure,
};

/// Source of the yes/no answer at the release confirmation step
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Asks on the terminal; default is "no".
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        Ok(confirm_action(prompt, &mut stdin.lock(), &mut stdout)?)
    }
}

/// Answers "yes" without asking, for `--yes` and CI.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        tracing::debug!(prompt, "auto-confirmed");
        Ok(true)
    }
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Displays the given prompt and accepts "y" or "yes" (case-insensitive) as confirmation.
/// Default is "no" if user presses Enter or input is closed.
///
/// # Arguments
/// * `prompt` - The prompt message to display (without the "(y/N): " suffix)
/// * `input` - Where the answer is read from
/// * `output` - Where the prompt is written
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - Otherwise (including Enter, or "n"/"no")
/// * `Err` - If input error occurs
pub fn confirm_action<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "\n{} (y/N): ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    let response = answer.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
