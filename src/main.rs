use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use release_health::boundary::BoundaryWarning;
use release_health::config::{self, Config};
use release_health::domain::BumpKind;
use release_health::files;
use release_health::git::Git2Repository;
use release_health::metrics::{label, ConsolidatedReport, HealthReport};
use release_health::notify::{deliver_permissive, WebhookNotifier, WebhookPayload};
use release_health::release::{ReleaseContext, ReleaseOrchestrator, ReleaseOutcome, ReleaseState};
use release_health::runner::CommandTestRunner;
use release_health::ui::{self, AssumeYes, Confirm, StdinConfirm};

#[derive(Parser)]
#[command(
    name = "release-health",
    version,
    about = "Cut semantic-version releases and score project health"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[arg(short, long, global = true, help = "Only log errors")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag, changelog and push a new release from the release branch
    Release {
        #[arg(value_enum, default_value_t = BumpArg::Patch)]
        bump: BumpArg,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,

        #[arg(long, help = "Preview the release without making changes")]
        dry_run: bool,

        #[arg(long, default_value = ".", help = "Path to the repository")]
        repo: PathBuf,
    },
    /// Score a health report and print its breakdown
    Health {
        report: PathBuf,

        #[arg(long, help = "Write a shields.io endpoint badge to this path")]
        badge: Option<PathBuf>,

        #[arg(long, help = "Write the consolidated report to this path")]
        output: Option<PathBuf>,

        #[arg(long, help = "Post a health webhook notification")]
        notify: bool,
    },
    /// Print the badge label for a score
    Badge { score: f64 },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BumpArg {
    Patch,
    Minor,
    Major,
}

impl From<BumpArg> for BumpKind {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Patch => BumpKind::Patch,
            BumpArg::Minor => BumpKind::Minor,
            BumpArg::Major => BumpKind::Major,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>, project_dir: &Path) -> Result<Config> {
    config::load_config(explicit, project_dir).context("Error loading config")
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Release {
            bump,
            yes,
            dry_run,
            repo,
        } => cmd_release(cli.config.as_deref(), bump.into(), yes, dry_run, &repo),
        Commands::Health {
            report,
            badge,
            output,
            notify,
        } => {
            let config = load_config(cli.config.as_deref(), Path::new("."))?;
            cmd_health(&config, &report, badge.as_deref(), output.as_deref(), notify)
        }
        Commands::Badge { score } => {
            let badge = label(score);
            println!("{} ({})", badge.text, badge.color);
            Ok(0)
        }
    }
}

fn cmd_release(
    config_path: Option<&Path>,
    bump: BumpKind,
    yes: bool,
    dry_run: bool,
    repo_path: &Path,
) -> Result<i32> {
    let repo = Git2Repository::open(repo_path)
        .with_context(|| format!("Git repository error at '{}'", repo_path.display()))?;
    let workdir = repo
        .workdir()
        .context("Cannot release from a bare repository")?
        .to_path_buf();
    let config = load_config(config_path, &workdir)?;

    let ctx = ReleaseContext::from_config(workdir, &config.release, chrono::Local::now().date_naive())
        .dry_run(dry_run);
    let tests = CommandTestRunner::new(config.release.test_command.clone());
    let confirm: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };
    let notifier = WebhookNotifier::from_config(&config.notify)?;

    ui::display_status(&format!(
        "Preparing {} release on '{}'",
        bump, ctx.release_branch
    ));

    let mut orchestrator = ReleaseOrchestrator::new(&ctx, &repo, &tests, confirm.as_ref());
    if let Some(notifier) = &notifier {
        orchestrator = orchestrator.with_notifier(notifier, &config.notify);
    }
    let report = orchestrator.run(bump);

    for warning in &report.run.warnings {
        ui::display_boundary_warning(warning);
    }

    if let (ReleaseOutcome::DryRun { .. }, Some(section)) = (&report.outcome, &report.run.section) {
        ui::display_changelog_preview(report.run.previous_tag.as_deref(), section);
    }

    ui::display_release_outcome(&report.outcome);

    if let (
        ReleaseOutcome::Failed {
            at: ReleaseState::Push,
            ..
        },
        Some(version),
    ) = (&report.outcome, report.run.version)
    {
        ui::display_manual_push_instruction(&ctx.remote, &ctx.release_branch, &version.tag());
    }

    Ok(report.outcome.exit_code())
}

fn cmd_health(
    config: &Config,
    report_path: &Path,
    badge_path: Option<&Path>,
    output_path: Option<&Path>,
    notify: bool,
) -> Result<i32> {
    let report = HealthReport::load(report_path)
        .with_context(|| format!("Cannot read health report '{}'", report_path.display()))?;
    let aggregator = config.metrics.aggregator()?;

    let score = aggregator.aggregate_samples(&report.metric_samples());
    let badge = label(score.overall);

    for (category, _) in score.warnings() {
        ui::display_boundary_warning(&BoundaryWarning::MissingMetric {
            category: category.to_string(),
        });
    }
    ui::display_health(&score, &badge, |category| {
        aggregator.weights().get(category).copied()
    });

    if let Some(path) = badge_path {
        let endpoint = serde_json::to_string_pretty(&badge.to_endpoint("health"))?;
        files::write_atomic(path, &endpoint)?;
        ui::display_success(&format!("Badge written to {}", path.display()));
    }

    let consolidated = ConsolidatedReport {
        report,
        score,
        badge,
    };

    if let Some(path) = output_path {
        consolidated.save(path)?;
        ui::display_success(&format!("Report written to {}", path.display()));
    }

    if notify {
        match WebhookNotifier::from_config(&config.notify)? {
            Some(notifier) => {
                let payload = WebhookPayload::new("health", &config.notify)
                    .git_ref(format!("refs/heads/{}", consolidated.report.branch))
                    .sha(consolidated.report.commit_hash.clone())
                    .message(format!(
                        "Health score {:.1} ({})",
                        consolidated.score.overall, consolidated.badge.text
                    ));
                if !deliver_permissive(&notifier, &payload) {
                    ui::display_boundary_warning(&BoundaryWarning::NotificationFailed {
                        event: payload.event,
                    });
                }
            }
            None => ui::display_status("No webhook_url configured, skipping notification"),
        }
    }

    Ok(0)
}
