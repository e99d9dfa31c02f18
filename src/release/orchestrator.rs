use super::state::{ReleaseOutcome, ReleaseReport, ReleaseRun, ReleaseState};
use crate::boundary::BoundaryWarning;
use crate::changelog;
use crate::config::{NotifyConfig, ReleaseConfig};
use crate::domain::{resolve_or_default, BranchContext, BumpKind};
use crate::error::{ReleaseError, Result};
use crate::files;
use crate::git::{Repository, DETACHED_HEAD};
use crate::notify::{deliver_permissive, Notifier, WebhookPayload};
use crate::runner::TestRunner;
use crate::ui::Confirm;
use chrono::NaiveDate;
use std::path::PathBuf;

const MAX_LISTED_PATHS: usize = 5;

/// Everything a release needs to know about its surroundings
///
/// Relative `changelog` and `version_files` paths are resolved against
/// `repo_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseContext {
    pub repo_path: PathBuf,
    pub release_branch: String,
    pub remote: String,
    pub changelog: PathBuf,
    pub version_files: Vec<PathBuf>,
    pub release_date: NaiveDate,
    pub dry_run: bool,
}

impl ReleaseContext {
    pub fn from_config(
        repo_path: impl Into<PathBuf>,
        config: &ReleaseConfig,
        release_date: NaiveDate,
    ) -> Self {
        ReleaseContext {
            repo_path: repo_path.into(),
            release_branch: config.branch.clone(),
            remote: config.remote.clone(),
            changelog: config.changelog.clone(),
            version_files: config.version_files.clone(),
            release_date,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn changelog_path(&self) -> PathBuf {
        self.repo_path.join(&self.changelog)
    }
}

/// Drives one release through the state machine
///
/// Collaborators are borrowed so tests can inspect them after the run.
pub struct ReleaseOrchestrator<'a> {
    ctx: &'a ReleaseContext,
    repo: &'a dyn Repository,
    tests: &'a dyn TestRunner,
    confirm: &'a dyn Confirm,
    notifier: Option<(&'a dyn Notifier, &'a NotifyConfig)>,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        ctx: &'a ReleaseContext,
        repo: &'a dyn Repository,
        tests: &'a dyn TestRunner,
        confirm: &'a dyn Confirm,
    ) -> Self {
        ReleaseOrchestrator {
            ctx,
            repo,
            tests,
            confirm,
            notifier: None,
        }
    }

    /// Announce successful releases through `notifier`.
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier, config: &'a NotifyConfig) -> Self {
        self.notifier = Some((notifier, config));
        self
    }

    /// Run the pipeline for a `bump` release.
    ///
    /// Never panics on collaborator errors: any failure moves the run to
    /// [`ReleaseState::Failed`] and is returned in the outcome together with
    /// the state that was executing.
    pub fn run(&self, bump: BumpKind) -> ReleaseReport {
        let mut run = ReleaseRun::new();

        let outcome = match self.drive(&mut run, bump) {
            Ok(outcome) => outcome,
            Err(error) => {
                let at = run.state();
                tracing::error!(state = %at, error = %error, "release failed");
                run.advance(ReleaseState::Failed);
                ReleaseOutcome::Failed { at, error }
            }
        };

        ReleaseReport { run, outcome }
    }

    fn drive(&self, run: &mut ReleaseRun, bump: BumpKind) -> Result<ReleaseOutcome> {
        run.advance(ReleaseState::CheckBranch);
        let current = self
            .repo
            .current_branch()?
            .unwrap_or_else(|| DETACHED_HEAD.to_string());
        let branch = BranchContext::new(current, &self.ctx.release_branch);
        if !branch.is_release_branch() {
            return Err(ReleaseError::WrongBranch {
                expected: branch.release_branch,
                actual: branch.name,
            });
        }

        run.advance(ReleaseState::CheckClean);
        let dirty = self.repo.uncommitted_changes()?;
        if !dirty.is_empty() {
            return Err(ReleaseError::DirtyWorkingTree(summarize_paths(&dirty)));
        }

        run.advance(ReleaseState::ComputeVersion);
        let previous_tag = self.repo.latest_tag()?;
        let resolution = resolve_or_default(previous_tag.as_deref(), bump)?;
        let version = resolution.version;
        let tag = version.tag();

        if let (Some(_), Some(bad_tag)) = (&resolution.fallback, &previous_tag) {
            run.warn(BoundaryWarning::UnparsableTag {
                tag: bad_tag.clone(),
                fallback: tag.clone(),
            });
        }

        if self.repo.tag_exists(&tag)? {
            return Err(ReleaseError::config(format!("Tag '{}' already exists", tag)));
        }

        let commits = self.repo.commits_since(previous_tag.as_deref())?;
        if let (true, Some(latest_tag)) = (commits.is_empty(), &previous_tag) {
            run.warn(BoundaryWarning::NoNewCommits {
                latest_tag: latest_tag.clone(),
                current_commit_hash: self.repo.head_hash()?,
            });
        }

        let section = changelog::synthesize(&commits, version, self.ctx.release_date);
        if section.skipped > 0 {
            run.warn(BoundaryWarning::UnclassifiedCommits {
                count: section.skipped,
            });
        }

        tracing::info!(
            previous = previous_tag.as_deref().unwrap_or("none"),
            next = %tag,
            bump = %bump,
            commits = commits.len(),
            "computed release version"
        );

        run.previous_tag = previous_tag;
        run.version = Some(version);
        run.section = Some(section.clone());

        if self.ctx.dry_run {
            run.advance(ReleaseState::Idle);
            return Ok(ReleaseOutcome::DryRun { version });
        }

        run.advance(ReleaseState::ConfirmUser);
        let prompt = format!(
            "Release {} from branch '{}' to '{}'?",
            tag, self.ctx.release_branch, self.ctx.remote
        );
        if !self.confirm.confirm(&prompt)? {
            tracing::info!(tag = %tag, "release cancelled by user");
            run.advance(ReleaseState::Idle);
            return Ok(ReleaseOutcome::Cancelled);
        }

        run.advance(ReleaseState::RunTests);
        self.tests.run(&self.ctx.repo_path)?;

        run.advance(ReleaseState::UpdateFiles);
        // read and rewrite everything in memory first so a bad version file
        // fails before the changelog is touched
        let rewrites = self
            .ctx
            .version_files
            .iter()
            .map(|file| {
                let path = self.ctx.repo_path.join(file);
                files::prepare_version_file(&path, &version).map(|contents| (path, contents))
            })
            .collect::<Result<Vec<_>>>()?;

        changelog::apply_to_file(&self.ctx.changelog_path(), &section)?;
        for (path, contents) in &rewrites {
            files::write_atomic(path, contents)?;
        }

        run.advance(ReleaseState::CommitAndTag);
        let message = format!("Release {}", tag);
        let commit = self.repo.commit_all(&message)?;
        self.repo.create_tag(&tag, &message)?;

        run.advance(ReleaseState::Push);
        self.repo
            .push(&self.ctx.remote, &self.ctx.release_branch, &tag)?;

        run.advance(ReleaseState::Done);
        tracing::info!(tag = %tag, commit = %commit, "release published");

        if let Some((notifier, config)) = self.notifier {
            let payload = WebhookPayload::new("release", config)
                .git_ref(format!("refs/tags/{}", tag))
                .sha(commit.clone())
                .message(format!("Released {}", tag));
            if !deliver_permissive(notifier, &payload) {
                run.warn(BoundaryWarning::NotificationFailed {
                    event: payload.event,
                });
            }
        }

        Ok(ReleaseOutcome::Released {
            version,
            tag,
            commit,
        })
    }
}

fn summarize_paths(paths: &[String]) -> String {
    let mut listed = paths
        .iter()
        .take(MAX_LISTED_PATHS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if paths.len() > MAX_LISTED_PATHS {
        listed.push_str(&format!(" and {} more", paths.len() - MAX_LISTED_PATHS));
    }
    listed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Version;
    use crate::git::MockRepository;
    use crate::ui::AssumeYes;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct StubTests {
        fail: bool,
        runs: Cell<usize>,
    }

    impl StubTests {
        fn passing() -> Self {
            StubTests {
                fail: false,
                runs: Cell::new(0),
            }
        }

        fn failing() -> Self {
            StubTests {
                fail: true,
                runs: Cell::new(0),
            }
        }
    }

    impl TestRunner for StubTests {
        fn run(&self, _workdir: &Path) -> Result<()> {
            self.runs.set(self.runs.get() + 1);
            if self.fail {
                Err(ReleaseError::test_failure("2 failed, 40 passed"))
            } else {
                Ok(())
            }
        }
    }

    struct Answer(bool);

    impl Confirm for Answer {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(&self, _payload: &WebhookPayload) -> Result<()> {
            Err(ReleaseError::transport("connection refused"))
        }
    }

    fn context(dir: &TempDir) -> ReleaseContext {
        ReleaseContext {
            repo_path: dir.path().to_path_buf(),
            release_branch: "main".to_string(),
            remote: "origin".to_string(),
            changelog: PathBuf::from("CHANGELOG.md"),
            version_files: Vec::new(),
            release_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            dry_run: false,
        }
    }

    fn tagged_repo() -> MockRepository {
        let repo = MockRepository::new();
        repo.add_commit("initial import", "alice");
        repo.add_tag("v1.2.3");
        repo.add_commit("feat: monte carlo engine", "alice");
        repo.add_commit("fix: rounding in NPV", "bob");
        repo
    }

    #[test]
    fn test_full_release() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = tagged_repo();
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Minor);

        match &report.outcome {
            ReleaseOutcome::Released { version, tag, .. } => {
                assert_eq!(*version, Version::new(1, 3, 0));
                assert_eq!(tag, "v1.3.0");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(report.run.state(), ReleaseState::Done);
        assert_eq!(report.run.trace().len(), 10);
        assert_eq!(
            repo.calls(),
            vec![
                "commit Release v1.3.0",
                "tag v1.3.0",
                "push origin main v1.3.0"
            ]
        );

        let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.starts_with("# Changelog"));
        assert!(changelog.contains("## [1.3.0] - 2024-03-01"));
        assert!(changelog.contains("- monte carlo engine"));
        assert!(changelog.contains("- rounding in NPV"));
    }

    #[test]
    fn test_wrong_branch_fails_before_anything_else() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = MockRepository::new().on_branch("develop");
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        match &report.outcome {
            ReleaseOutcome::Failed { at, error } => {
                assert_eq!(*at, ReleaseState::CheckBranch);
                assert!(matches!(error, ReleaseError::WrongBranch { .. }));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            report.run.trace(),
            &[
                ReleaseState::Idle,
                ReleaseState::CheckBranch,
                ReleaseState::Failed
            ]
        );
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_detached_head_is_reported_as_wrong_branch() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = tagged_repo().detached();
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        match &report.outcome {
            ReleaseOutcome::Failed { at, error } => {
                assert_eq!(*at, ReleaseState::CheckBranch);
                match error {
                    ReleaseError::WrongBranch { expected, actual } => {
                        assert_eq!(expected, "main");
                        assert_eq!(actual, DETACHED_HEAD);
                    }
                    other => panic!("unexpected error: {:?}", other),
                }
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_dirty_tree_fails_at_check_clean() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = MockRepository::new().with_dirty_path("src/model.py");
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        match &report.outcome {
            ReleaseOutcome::Failed { at, error } => {
                assert_eq!(*at, ReleaseState::CheckClean);
                assert!(error.to_string().contains("src/model.py"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!report.run.visited(ReleaseState::ComputeVersion));
        assert_eq!(tests.runs.get(), 0);
    }

    #[test]
    fn test_failing_tests_never_reach_commit_and_tag() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = tagged_repo();
        let tests = StubTests::failing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        assert_eq!(report.outcome.exit_code(), 1);
        assert!(matches!(
            report.outcome,
            ReleaseOutcome::Failed {
                at: ReleaseState::RunTests,
                error: ReleaseError::TestFailure(_)
            }
        ));
        assert!(!report.run.visited(ReleaseState::UpdateFiles));
        assert!(!report.run.visited(ReleaseState::CommitAndTag));
        assert!(!report.run.visited(ReleaseState::Push));
        assert!(repo.calls().is_empty());
        assert!(!dir.path().join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_cancellation_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = tagged_repo();
        let tests = StubTests::passing();

        let report =
            ReleaseOrchestrator::new(&ctx, &repo, &tests, &Answer(false)).run(BumpKind::Major);

        assert!(matches!(report.outcome, ReleaseOutcome::Cancelled));
        assert_eq!(report.outcome.exit_code(), 0);
        assert_eq!(report.run.state(), ReleaseState::Idle);
        assert_eq!(tests.runs.get(), 0);
        assert!(repo.calls().is_empty());
        assert!(!dir.path().join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_dry_run_stops_after_compute_version() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir).dry_run(true);
        let repo = tagged_repo();
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        assert!(matches!(
            report.outcome,
            ReleaseOutcome::DryRun { version } if version == Version::new(1, 2, 4)
        ));
        assert!(!report.run.visited(ReleaseState::ConfirmUser));
        assert_eq!(report.run.state(), ReleaseState::Idle);
        assert_eq!(report.run.section.as_ref().unwrap().entries.len(), 2);
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_push_failure_is_surfaced_without_rollback() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = tagged_repo().failing_push();
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        assert!(matches!(
            report.outcome,
            ReleaseOutcome::Failed {
                at: ReleaseState::Push,
                error: ReleaseError::Remote(_)
            }
        ));
        // local commit and tag stay in place
        assert!(repo.tag_names().contains(&"v1.2.4".to_string()));
    }

    #[test]
    fn test_existing_tag_fails_at_compute_version() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = MockRepository::new();
        repo.add_commit("initial", "alice");
        repo.add_tag("v1.0.0");
        repo.add_commit("feat: x", "alice");
        repo.add_tag("release-candidate");

        let tests = StubTests::passing();
        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        // the unparsable tag falls back to v1.0.0, which is already taken
        assert!(matches!(
            report.outcome,
            ReleaseOutcome::Failed {
                at: ReleaseState::ComputeVersion,
                ..
            }
        ));
        assert!(report
            .run
            .warnings
            .iter()
            .any(|w| matches!(w, BoundaryWarning::UnparsableTag { .. })));
    }

    #[test]
    fn test_version_overflow_fails_at_compute_version() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = MockRepository::new();
        repo.add_commit("initial", "alice");
        repo.add_tag(format!("v{}.0.0", u64::MAX));
        repo.add_commit("feat: x", "alice");
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Major);

        match &report.outcome {
            ReleaseOutcome::Failed { at, error } => {
                assert_eq!(*at, ReleaseState::ComputeVersion);
                assert!(matches!(error, ReleaseError::VersionOverflow { .. }));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(report.run.warnings.is_empty());
        assert!(repo.calls().is_empty());
        assert!(!dir.path().join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_first_release_uses_default_version() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = MockRepository::new();
        repo.add_commit("add: initial simulator", "alice");
        repo.add_commit("wip", "alice");
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Major);

        assert!(matches!(
            &report.outcome,
            ReleaseOutcome::Released { tag, .. } if tag == "v1.0.0"
        ));
        assert_eq!(
            report.run.warnings,
            vec![BoundaryWarning::UnclassifiedCommits { count: 1 }]
        );
    }

    #[test]
    fn test_bad_version_file_fails_before_changelog_is_written() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        fs::write(dir.path().join("setup.cfg"), "[metadata]\nname = sim\n").unwrap();
        ctx.version_files = vec![PathBuf::from("setup.cfg")];
        let repo = tagged_repo();
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        assert!(matches!(
            report.outcome,
            ReleaseOutcome::Failed {
                at: ReleaseState::UpdateFiles,
                ..
            }
        ));
        assert!(!dir.path().join("CHANGELOG.md").exists());
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_version_files_are_rewritten() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        fs::write(dir.path().join("__init__.py"), "__version__ = \"1.2.3\"\n").unwrap();
        ctx.version_files = vec![PathBuf::from("__init__.py")];
        let repo = tagged_repo();
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        assert!(report.outcome.is_success());
        assert_eq!(
            fs::read_to_string(dir.path().join("__init__.py")).unwrap(),
            "__version__ = \"1.2.4\"\n"
        );
    }

    #[test]
    fn test_notification_failure_does_not_change_outcome() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = tagged_repo();
        let tests = StubTests::passing();
        let notify_config = NotifyConfig::default();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes)
            .with_notifier(&FailingNotifier, &notify_config)
            .run(BumpKind::Patch);

        assert!(report.outcome.is_success());
        assert!(report
            .run
            .warnings
            .contains(&BoundaryWarning::NotificationFailed {
                event: "release".to_string()
            }));
    }

    #[test]
    fn test_no_new_commits_warns_but_releases() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let repo = MockRepository::new();
        repo.add_commit("initial", "alice");
        repo.add_tag("v2.0.0");
        let tests = StubTests::passing();

        let report = ReleaseOrchestrator::new(&ctx, &repo, &tests, &AssumeYes).run(BumpKind::Patch);

        assert!(report.outcome.is_success());
        assert!(matches!(
            &report.run.warnings[..],
            [BoundaryWarning::NoNewCommits { latest_tag, .. }] if latest_tag == "v2.0.0"
        ));
        let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.ends_with("## [2.0.1] - 2024-03-01\n\n"));
    }

    #[test]
    fn test_summarize_paths_truncates() {
        let paths: Vec<String> = (0..7).map(|i| format!("f{}", i)).collect();
        assert_eq!(summarize_paths(&paths), "f0, f1, f2, f3, f4 and 2 more");
    }
}
