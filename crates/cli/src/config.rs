//! Invitation settings loaded from TOML.
//!
//! Settings live in `[tool.autopub.plugin_config.invite_contributors]` of a
//! `pyproject.toml`, next to the rest of the release configuration, or at the
//! root of a standalone file.

use std::path::Path;
use std::time::Duration;

use membership::{ExclusionPolicy, OrgRole, OrganizationName, TeamSlug, KNOWN_BOT_EXCLUSIONS};
use reconciler::{ReconcilerConfig, RetryBudget};
use serde::Deserialize;
use thiserror::Error;

const SECTION: [&str; 4] = ["tool", "autopub", "plugin_config", "invite_contributors"];

/// Keys that mark a file as a Python project file rather than a standalone config.
const PYPROJECT_KEYS: [&str; 3] = ["tool", "project", "build-system"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {message}")]
    Invalid { message: String },
}

/// Settings for one invitation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct InviteConfig {
    /// Organisation to invite into. Inferred from the repository when absent.
    pub organization: Option<OrganizationName>,
    /// Team to add contributors to.
    pub team_slug: Option<TeamSlug>,
    pub role: OrgRole,
    pub skip_bots: bool,
    pub include_co_authors: bool,
    pub exclude_users: Vec<String>,
    pub dry_run: bool,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub concurrency: usize,
    pub timeout_secs: Option<u64>,
}

impl Default for InviteConfig {
    fn default() -> Self {
        let retry = RetryBudget::default();
        Self {
            organization: None,
            team_slug: None,
            role: OrgRole::default(),
            skip_bots: true,
            include_co_authors: true,
            exclude_users: KNOWN_BOT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            dry_run: false,
            max_attempts: retry.max_attempts,
            initial_backoff_ms: duration_ms(retry.initial_backoff),
            max_backoff_ms: duration_ms(retry.max_backoff),
            concurrency: ReconcilerConfig::default().concurrency,
            timeout_secs: None,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl InviteConfig {
    /// Loads settings from `path`.
    ///
    /// A missing file yields the defaults when `required` is `false`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Parses either a `pyproject.toml` or a standalone settings file.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let document: toml::Table = toml::from_str(raw)?;

        let section = SECTION
            .iter()
            .try_fold(None::<&toml::Value>, |current, key| {
                let next = match current {
                    None => document.get(*key),
                    Some(value) => value.get(*key),
                };
                next.map(Some).ok_or(())
            })
            .ok()
            .flatten();

        let config: Self = match section {
            Some(value) => value.clone().try_into()?,
            None if PYPROJECT_KEYS.iter().any(|k| document.contains_key(*k)) => Self::default(),
            None => toml::Value::Table(document).try_into()?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max-attempts must be at least 1".into(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                message: "concurrency must be at least 1".into(),
            });
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::Invalid {
                message: "initial-backoff-ms must not exceed max-backoff-ms".into(),
            });
        }
        Ok(())
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(&self.exclude_users, self.skip_bots)
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        let config = ReconcilerConfig::default()
            .with_retry(RetryBudget {
                max_attempts: self.max_attempts,
                initial_backoff: Duration::from_millis(self.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.max_backoff_ms),
            })
            .with_concurrency(self.concurrency)
            .with_dry_run(self.dry_run);
        match self.timeout_secs {
            Some(secs) => config.with_run_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}
