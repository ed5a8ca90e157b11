use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;
use serde::Deserializer;
use thiserror::Error;
use utils::version;

/// Lower bound applied to every max life and interval.
pub const MIN_DURATION: Duration = Duration::from_secs(10);

pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yaml";

#[derive(Parser, Debug)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[arg(
        long,
        env = "CONFIG_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to the target configuration file [default: /config/config.yaml]"
    )]
    config_path: Option<OsString>,

    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to in-cluster config, then kubectl proxy on 127.0.0.1:8001)"
    )]
    kubeconfig: Option<OsString>,
}

impl Cli {
    /// Configuration file path. Unset or empty means [`DEFAULT_CONFIG_PATH`].
    pub fn config_path(&self) -> PathBuf {
        non_empty_path(self.config_path.as_deref())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Explicit kubeconfig file, if a non-empty one was given.
    pub fn kubeconfig(&self) -> Option<PathBuf> {
        non_empty_path(self.kubeconfig.as_deref())
    }
}

// manifests often render unset variables as ""
fn non_empty_path(value: Option<&OsStr>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read { path: PathBuf },
    #[error("failed to parse config document")]
    Parse,
}

/// Workload controllers whose pods can be rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    DaemonSet,
    Deployment,
    StatefulSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} is not a supported kind")]
pub struct UnsupportedKind(pub String);

impl FromStr for WorkloadKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daemonset" => Ok(Self::DaemonSet),
            "deployment" => Ok(Self::Deployment),
            "statefulset" => Ok(Self::StatefulSet),
            _ => Err(UnsupportedKind(s.to_string())),
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::DaemonSet => "daemonset",
            Self::Deployment => "deployment",
            Self::StatefulSet => "statefulset",
        };
        f.write_str(kind)
    }
}

/// One workload whose pods are rotated once they outlive `max_life`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    /// Lowercased controller kind as written in the config.
    #[serde(deserialize_with = "lowercase")]
    pub kind: String,
    #[serde(rename = "name_space")]
    pub namespace: String,
    pub name: String,
    #[serde(default, deserialize_with = "human_duration")]
    pub max_life: Duration,
    #[serde(default, deserialize_with = "human_duration")]
    pub interval: Duration,
    /// Maximum evictions per iteration, 0 for no limit.
    #[serde(default)]
    pub batch_max_kill: u64,
}

impl TargetSpec {
    pub fn workload_kind(&self) -> Result<WorkloadKind, UnsupportedKind> {
        self.kind.parse()
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.namespace, self.kind, self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(rename = "dryrun", default)]
    pub dry_run: bool,
    #[serde(default)]
    pub batch_mode: bool,
    #[serde(default, deserialize_with = "human_duration")]
    pub default_interval: Duration,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

impl GlobalConfig {
    /// Read, parse and normalize the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::Parse`] if the document is not a valid configuration
    pub fn load(path: &Path) -> Result<Self, Report<ConfigError>> {
        let content = std::fs::read_to_string(path).change_context(ConfigError::Read {
            path: path.to_path_buf(),
        })?;
        Self::from_yaml(&content).attach_printable_lazy(|| format!("path: {}", path.display()))
    }

    /// Parse and normalize a YAML configuration document.
    pub fn from_yaml(content: &str) -> Result<Self, Report<ConfigError>> {
        let config: GlobalConfig =
            serde_yaml::from_str(content).change_context(ConfigError::Parse)?;
        Ok(config.normalized())
    }

    /// Apply the duration floors: max life is clamped to [`MIN_DURATION`],
    /// an interval below it falls back to the default interval.
    pub fn normalized(mut self) -> Self {
        self.default_interval = self.default_interval.max(MIN_DURATION);

        for target in &mut self.targets {
            target.max_life = target.max_life.max(MIN_DURATION);
            if target.interval < MIN_DURATION {
                target.interval = self.default_interval;
            }
        }

        self
    }
}

fn lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.to_ascii_lowercase())
}

/// Accepts `1h30m`, `90s`, `2h 15m` and friends. Null means zero.
fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(Duration::ZERO);
    };
    humantime::parse_duration(value.trim()).map_err(serde::de::Error::custom)
}
