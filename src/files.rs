//! Local file mutations performed during a release.
//!
//! Every write goes through [`write_atomic`]: content lands in a temporary file
//! next to the target and is renamed over it, so readers observe either the old
//! or the new document, never a truncated one.

use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use tempfile::NamedTempFile;

fn version_line_regex() -> &'static Regex {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    VERSION_RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^(?P<lead>\s*(?:__version__|version)\s*[=:]\s*["'])(?P<version>\d+\.\d+\.\d+)(?P<trail>["'])"#,
        )
        .expect("version metadata pattern is a valid regex")
    })
}

/// Replace `path` with `contents` atomically.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ReleaseError::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Rewrite every `version = "X.Y.Z"` / `__version__ = "X.Y.Z"` line in `contents`.
///
/// Returns the new contents and the number of replaced occurrences.
pub fn replace_version_metadata(contents: &str, version: &Version) -> (String, usize) {
    let re = version_line_regex();
    let count = re.find_iter(contents).count();
    let replacement = format!("${{lead}}{}${{trail}}", version);
    let updated = re.replace_all(contents, replacement.as_str()).into_owned();
    (updated, count)
}

/// Compute the rewritten contents of a version file without touching it.
///
/// A file with no recognisable version line is a configuration error: the
/// release would otherwise ship with stale metadata.
pub fn prepare_version_file(path: &Path, version: &Version) -> Result<String> {
    let contents = fs::read_to_string(path)?;
    let (updated, count) = replace_version_metadata(&contents, version);

    if count == 0 {
        return Err(ReleaseError::config(format!(
            "No version metadata found in '{}'",
            path.display()
        )));
    }

    Ok(updated)
}

/// Rewrite version metadata in a file on disk.
pub fn rewrite_version_file(path: &Path, version: &Version) -> Result<()> {
    let updated = prepare_version_file(path, version)?;
    write_atomic(path, &updated)
}
