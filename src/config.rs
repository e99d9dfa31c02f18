use crate::error::{ReleaseError, Result};
use crate::metrics::{default_thresholds, default_weights, MetricsAggregator, Threshold};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "release-health.toml";

/// Represents the complete configuration for release-health.
///
/// Contains release preconditions and file locations, metric weighting and
/// thresholds, and the optional webhook target.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_changelog() -> PathBuf {
    PathBuf::from("CHANGELOG.md")
}

fn default_test_command() -> Vec<String> {
    vec![
        "python".to_string(),
        "-m".to_string(),
        "pytest".to_string(),
    ]
}

/// Configuration for the release flow.
///
/// Paths are relative to the repository root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_changelog")]
    pub changelog: PathBuf,

    /// Files whose `version = "X.Y.Z"` lines are rewritten on release
    #[serde(default)]
    pub version_files: Vec<PathBuf>,

    /// Program and arguments; an empty list skips the test step
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            branch: default_branch(),
            remote: default_remote(),
            changelog: default_changelog(),
            version_files: Vec::new(),
            test_command: default_test_command(),
        }
    }
}

/// Configuration for health scoring.
///
/// Thresholds given here are merged over the built-in ones.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, f64>,

    #[serde(default)]
    pub thresholds: BTreeMap<String, Threshold>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            weights: default_weights(),
            thresholds: BTreeMap::new(),
        }
    }
}

impl MetricsConfig {
    /// Build a validated aggregator from this configuration.
    pub fn aggregator(&self) -> Result<MetricsAggregator> {
        let mut thresholds = default_thresholds();
        thresholds.extend(self.thresholds.clone());
        MetricsAggregator::new(self.weights.clone(), thresholds)
    }
}

/// Configuration for the outbound webhook.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub repository: String,

    /// Link included in payloads, e.g. the project page
    #[serde(default)]
    pub url: String,

    /// Who payloads are attributed to, e.g. a CI bot account
    pub actor: Option<String>,
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-health.toml` in `project_dir`
/// 3. `release-health.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, project_dir: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(project_dir),
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            let contents = fs::read_to_string(&path)?;
            parse_config(&contents)
        }
        None => Ok(Config::default()),
    }
}

fn discover_config(project_dir: &Path) -> Option<PathBuf> {
    let local = project_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| ReleaseError::config(e.to_string()))
}
