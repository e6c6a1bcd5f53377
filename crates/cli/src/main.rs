//! `invite-contributors` entry point.
//!
//! Runs as one step of a release workflow:
//!
//! 1. Load settings from `pyproject.toml` (or `--config`) and apply flag overrides.
//! 2. Install the tracing subscriber, with OTLP export when configured.
//! 3. Collect the released pull request's contributors from the GitHub event.
//! 4. Reconcile them against the target organisation and team.
//! 5. Print the report and exit `0` (clean), `1` (some contributor failed) or
//!    `2` (the run could not start or was aborted). A still-pending invitation
//!    is reported but does not fail the run.

mod config;
mod report;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::{load_event, GithubClient, GithubSettings, PullRequestContributors, DEFAULT_API_URL};
use membership::{
    ConfigurationError, ContributorSet, ContributorSource, ExclusionPolicy, InvitationTarget,
    OrganizationName, ReconciliationReport, RepositoryId, TeamSlug,
};
use reconciler::Reconciler;
use tracing::{error, info, Level};

use crate::config::InviteConfig;
use crate::report::ReportFormat;

const DEFAULT_CONFIG: &str = "pyproject.toml";

#[derive(Parser, Debug)]
#[command(
    name = "invite-contributors",
    version,
    about = "Invite a release's contributors to a GitHub organisation and team"
)]
struct Cli {
    /// Settings file. Defaults to `pyproject.toml`, which may be absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Token with `admin:org` scope.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// `owner/name` of the released repository.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Workflow event payload used to find the released pull request.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Overrides `organization` from the settings file.
    #[arg(long)]
    organization: Option<String>,

    /// Overrides `team-slug` from the settings file.
    #[arg(long)]
    team: Option<String>,

    /// Report what would be sent without sending it.
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Exit 0 even when some contributors could not be invited.
    #[arg(long)]
    allow_failures: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStatus {
    Clean,
    ContributorFailures,
    /// The run could not start or was stopped before reconciling anyone.
    Aborted,
}

impl RunStatus {
    fn from_report(report: &ReconciliationReport) -> Self {
        if report.fails_run() {
            Self::ContributorFailures
        } else {
            Self::Clean
        }
    }

    fn exit_code(self, allow_failures: bool) -> u8 {
        match self {
            Self::Clean => 0,
            Self::ContributorFailures if allow_failures => 0,
            Self::ContributorFailures => 1,
            Self::Aborted => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let telemetry = telemetry::init_tracing(cli.json, level);
    let allow_failures = cli.allow_failures;

    let status = match run(cli).await {
        Ok(status) => status,
        Err(e) => {
            error!(error = format!("{e:#}"), "Contributor invitation aborted");
            RunStatus::Aborted
        }
    };

    telemetry.shutdown();
    ExitCode::from(status.exit_code(allow_failures))
}

async fn run(cli: Cli) -> anyhow::Result<RunStatus> {
    let config = load_config(&cli)?;

    let repository = RepositoryId::new(cli.repository.as_str())
        .context("GITHUB_REPOSITORY must not be empty")?;
    let client = GithubClient::new(&GithubSettings::new(cli.token).with_api_url(cli.api_url))
        .context("Failed to build GitHub client")?;

    let event = match &cli.event_path {
        Some(path) => Some(load_event(path).await?),
        None => None,
    };
    let contributors = PullRequestContributors::new(client.clone(), repository.clone(), event)
        .with_co_authors(config.include_co_authors)
        .release_contributors()
        .await
        .context("Failed to collect release contributors")?;

    if contributors.is_empty() {
        info!(repository = %repository, "No contributors found for this release");
        return Ok(RunStatus::Clean);
    }
    let exclusions = config.exclusion_policy();
    if !needs_invitations(&contributors, &exclusions) {
        info!(
            repository = %repository,
            contributors = contributors.len(),
            "Every contributor is excluded; nothing to invite"
        );
        return Ok(RunStatus::Clean);
    }

    let organization = match config.organization.clone() {
        Some(organization) => organization,
        None => client
            .repository_organization(&repository)
            .await
            .context("Failed to look up the repository's organization")?
            .ok_or(ConfigurationError::MissingOrganization)?,
    };

    let mut target = InvitationTarget::new(organization).with_role(config.role);
    if let Some(team) = config.team_slug.clone() {
        target = target.with_team(team);
    }

    let reconciler = Reconciler::new(Arc::new(client), config.reconciler_config());
    let report = reconciler
        .reconcile(&contributors, &target, &exclusions)
        .await?;

    println!(
        "{}",
        report::render(&report, cli.report).context("Failed to render report")?
    );

    Ok(RunStatus::from_report(&report))
}

/// Whether any contributor survives the exclusion policy. When none does, the
/// organisation is neither resolved nor verified.
fn needs_invitations(contributors: &ContributorSet, exclusions: &ExclusionPolicy) -> bool {
    contributors.iter().any(|login| exclusions.classify(login).is_none())
}

/// Loads the settings file and applies command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<InviteConfig> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    let mut config = InviteConfig::load(&path, required)?;

    if let Some(organization) = &cli.organization {
        config.organization = Some(
            OrganizationName::new(organization.as_str())
                .context("--organization must not be empty")?,
        );
    }
    if let Some(team) = &cli.team {
        config.team_slug = Some(TeamSlug::new(team.as_str()).context("--team must not be empty")?);
    }
    config.dry_run |= cli.dry_run;
    Ok(config)
}
