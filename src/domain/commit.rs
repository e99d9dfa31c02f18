use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn prefix_regex() -> &'static Regex {
    static PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    PREFIX_RE.get_or_init(|| {
        Regex::new(r"(?i)^(feat|add|fix|bug|change|update):\s*(.*)$")
            .expect("commit prefix pattern is a valid regex")
    })
}

/// A commit in the range `(last_tag, HEAD]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full commit hash
    pub id: String,
    pub subject: String,
    pub author: String,
}

impl CommitRecord {
    pub fn new(subject: impl Into<String>, author: impl Into<String>) -> Self {
        CommitRecord {
            id: String::new(),
            subject: subject.into(),
            author: author.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Keep a Changelog subsection an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangelogCategory {
    Added,
    Fixed,
    Changed,
}

impl ChangelogCategory {
    /// Subsections in rendering order
    pub const ALL: [ChangelogCategory; 3] = [
        ChangelogCategory::Added,
        ChangelogCategory::Fixed,
        ChangelogCategory::Changed,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            ChangelogCategory::Added => "Added",
            ChangelogCategory::Fixed => "Fixed",
            ChangelogCategory::Changed => "Changed",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "feat" | "add" => Some(ChangelogCategory::Added),
            "fix" | "bug" => Some(ChangelogCategory::Fixed),
            "change" | "update" => Some(ChangelogCategory::Changed),
            _ => None,
        }
    }
}

impl fmt::Display for ChangelogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

/// A single rendered line of a changelog section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub category: ChangelogCategory,
    pub description: String,
}

impl ChangelogEntry {
    /// Classify a commit by the prefix of its subject line.
    ///
    /// Returns `None` for commits with no recognised prefix.
    pub fn classify(commit: &CommitRecord) -> Option<Self> {
        let first_line = commit.subject.lines().next().unwrap_or("").trim();
        let captures = prefix_regex().captures(first_line)?;
        let category = ChangelogCategory::from_prefix(&captures[1])?;

        Some(ChangelogEntry {
            category,
            description: captures[2].trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(subject: &str) -> Option<ChangelogEntry> {
        ChangelogEntry::classify(&CommitRecord::new(subject, "dev"))
    }

    #[test]
    fn test_classify_added() {
        let entry = classify("feat: add X").unwrap();
        assert_eq!(entry.category, ChangelogCategory::Added);
        assert_eq!(entry.description, "add X");

        let entry = classify("add: sensitivity chart").unwrap();
        assert_eq!(entry.category, ChangelogCategory::Added);
    }

    #[test]
    fn test_classify_fixed() {
        assert_eq!(
            classify("fix: correct Y").unwrap().category,
            ChangelogCategory::Fixed
        );
        assert_eq!(
            classify("bug: npm rounding").unwrap().category,
            ChangelogCategory::Fixed
        );
    }

    #[test]
    fn test_classify_changed() {
        assert_eq!(
            classify("change: default rate").unwrap().category,
            ChangelogCategory::Changed
        );
        assert_eq!(
            classify("update: dependencies").unwrap().category,
            ChangelogCategory::Changed
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let entry = classify("FEAT: loud feature").unwrap();
        assert_eq!(entry.category, ChangelogCategory::Added);
        assert_eq!(entry.description, "loud feature");
        assert!(classify("Fix: mixed case").is_some());
    }

    #[test]
    fn test_classify_unknown_prefix_is_dropped() {
        assert!(classify("chore: noop").is_none());
        assert!(classify("docs: readme").is_none());
        assert!(classify("Merge branch 'develop'").is_none());
        assert!(classify("feature: not an exact prefix").is_none());
    }

    #[test]
    fn test_classify_uses_first_line_only() {
        let entry = classify("fix: crash on empty input\n\nLonger body text").unwrap();
        assert_eq!(entry.description, "crash on empty input");
    }

    #[test]
    fn test_classify_prefix_without_space() {
        let entry = classify("fix:tight").unwrap();
        assert_eq!(entry.description, "tight");
    }
}
