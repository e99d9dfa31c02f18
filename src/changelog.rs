//! Changelog synthesis from commit history.
//!
//! Commits are classified by subject prefix into Keep a Changelog subsections.
//! Commits with no recognised prefix are left out of the rendered section; the
//! count is kept on [`ChangelogSection::skipped`] so callers can report it.

use crate::domain::{ChangelogCategory, ChangelogEntry, CommitRecord, Version};
use crate::error::Result;
use crate::files::write_atomic;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Preamble written when a project has no changelog yet.
pub const DEFAULT_PREAMBLE: &str = "# Changelog\n\
\n\
All notable changes to this project will be documented in this file.\n\
\n\
The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.0.0/),\n\
and this project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).\n";

/// One released version's worth of changelog entries
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogSection {
    pub version: Version,
    pub date: NaiveDate,
    /// Entries in commit order
    pub entries: Vec<ChangelogEntry>,
    /// Commits dropped for lacking a recognised prefix
    pub skipped: usize,
}

impl ChangelogSection {
    pub fn entries_in(&self, category: ChangelogCategory) -> impl Iterator<Item = &ChangelogEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as Markdown, ending with a blank line.
    pub fn render(&self) -> String {
        let mut out = format!(
            "## [{}] - {}\n",
            self.version,
            self.date.format("%Y-%m-%d")
        );

        for category in ChangelogCategory::ALL {
            let mut entries = self.entries_in(category).peekable();
            if entries.peek().is_none() {
                continue;
            }
            out.push_str(&format!("\n### {}\n", category.heading()));
            for entry in entries {
                out.push_str(&format!("- {}\n", entry.description));
            }
        }

        out.push('\n');
        out
    }
}

/// Build the section for `version` from commits given oldest first.
pub fn synthesize(commits: &[CommitRecord], version: Version, date: NaiveDate) -> ChangelogSection {
    let mut entries = Vec::with_capacity(commits.len());
    let mut skipped = 0;

    for commit in commits {
        match ChangelogEntry::classify(commit) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::debug!(subject = %commit.subject, "commit has no changelog prefix");
                skipped += 1;
            }
        }
    }

    ChangelogSection {
        version,
        date,
        entries,
        skipped,
    }
}

/// Insert `section` right after the document's preamble.
///
/// The preamble is everything before the first `## ` heading; everything from
/// that heading on is kept verbatim.
pub fn prepend_section(document: &str, section: &ChangelogSection) -> String {
    let rendered = section.render();

    let split_at = document
        .match_indices("## ")
        .map(|(idx, _)| idx)
        .find(|&idx| idx == 0 || document.as_bytes()[idx - 1] == b'\n');

    match split_at {
        Some(idx) => {
            let (preamble, history) = document.split_at(idx);
            format!("{}{}{}", preamble, rendered, history)
        }
        None => {
            let mut out = document.to_string();
            if !out.is_empty() {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                if !out.ends_with("\n\n") {
                    out.push('\n');
                }
            }
            out.push_str(&rendered);
            out
        }
    }
}

/// Prepend `section` to the changelog at `path`, creating it if missing.
pub fn apply_to_file(path: &Path, section: &ChangelogSection) -> Result<()> {
    let document = match fs::read_to_string(path) {
        Ok(doc) => doc,
        Err(e) if e.kind() == ErrorKind::NotFound => DEFAULT_PREAMBLE.to_string(),
        Err(e) => return Err(e.into()),
    };

    let updated = prepend_section(&document, section);
    write_atomic(path, &updated)?;

    tracing::info!(
        path = %path.display(),
        version = %section.version,
        entries = section.entries.len(),
        "changelog updated"
    );
    Ok(())
}
