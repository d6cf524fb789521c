use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub target: TargetConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub base_uri: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    #[serde(default = "default_users")]
    pub users: usize,
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// Wall-clock budget for a single workflow iteration.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Users are started evenly across this window.
    #[serde(default)]
    pub ramp_up_secs: u64,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    #[serde(default = "default_asset_paths")]
    pub asset_paths: Vec<String>,
    #[serde(default = "default_picture_paths")]
    pub picture_paths: Vec<String>,
    #[serde(default = "default_submit_path")]
    pub submit_path: String,
    #[serde(default = "default_status_path")]
    pub status_path: String,
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,
    #[serde(default = "default_error_log_path")]
    pub error_log_path: PathBuf,
    #[serde(default = "default_plot_path")]
    pub plot_path: PathBuf,
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_uri: Option<String>,
    pub users: Option<u64>,
    pub duration_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub show_progress: Option<bool>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            duration_secs: default_duration_secs(),
            timeout_secs: default_timeout_secs(),
            ramp_up_secs: 0,
            show_progress: default_show_progress(),
            progress_interval_secs: default_progress_interval_secs(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            asset_paths: default_asset_paths(),
            picture_paths: default_picture_paths(),
            submit_path: default_submit_path(),
            status_path: default_status_path(),
            artifact_path: default_artifact_path(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
            error_log_path: default_error_log_path(),
            plot_path: default_plot_path(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_users() -> usize {
    5
}

fn default_duration_secs() -> u64 {
    30 * 60
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_show_progress() -> bool {
    true
}

fn default_progress_interval_secs() -> u64 {
    1
}

fn default_asset_paths() -> Vec<String> {
    [
        "/",
        "/config/env.js",
        "/images/emojify_small.png",
        "/images/consul.png",
        "/images/emojify.png",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_picture_paths() -> Vec<String> {
    (1..=5).map(|n| format!("/pictures/{n}.jpg")).collect()
}

fn default_submit_path() -> String {
    "/v2/api/emojify/".to_string()
}

fn default_status_path() -> String {
    "/v2/api/emojify/{id}".to_string()
}

fn default_artifact_path() -> String {
    "/v2/api/cache/{id}".to_string()
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    100
}

fn default_table_path() -> PathBuf {
    PathBuf::from("./output.txt")
}

fn default_error_log_path() -> PathBuf {
    PathBuf::from("./error.txt")
}

fn default_plot_path() -> PathBuf {
    PathBuf::from("./output.png")
}

impl AppConfig {
    pub fn load(config_path: Option<&str>, overrides: &Overrides) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("emojify-traffic").required(false));
        }

        // Environment variable overrides, e.g. TRAFFIC_TARGET__BASE_URI
        builder = builder.add_source(
            config::Environment::with_prefix("TRAFFIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("target.base_uri", overrides.base_uri.clone())
            .and_then(|b| b.set_override_option("load.users", overrides.users))
            .and_then(|b| b.set_override_option("load.duration_secs", overrides.duration_secs))
            .and_then(|b| b.set_override_option("load.timeout_secs", overrides.timeout_secs))
            .and_then(|b| b.set_override_option("load.show_progress", overrides.show_progress))
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: AppConfig = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.base_uri.trim().is_empty() {
            return Err(AppError::Config("target.base_uri must not be empty".to_string()));
        }
        if self.load.users == 0 {
            return Err(AppError::Config("load.users must be at least 1".to_string()));
        }
        if self.target.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "target.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.load.timeout_secs == 0 {
            return Err(AppError::Config("load.timeout_secs must be at least 1".to_string()));
        }
        if self.workflow.max_poll_attempts == 0 {
            return Err(AppError::Config(
                "workflow.max_poll_attempts must be at least 1".to_string(),
            ));
        }
        if self.workflow.picture_paths.is_empty() {
            return Err(AppError::Config(
                "workflow.picture_paths must list at least one picture".to_string(),
            ));
        }
        for (key, template) in [
            ("workflow.status_path", &self.workflow.status_path),
            ("workflow.artifact_path", &self.workflow.artifact_path),
        ] {
            if !template.contains("{id}") {
                return Err(AppError::Config(format!("{key} must contain an {{id}} placeholder")));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.target.request_timeout_secs)
    }
}

impl LoadConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn iteration_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ramp_up(&self) -> Duration {
        Duration::from_secs(self.ramp_up_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs.max(1))
    }
}

impl WorkflowConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Parse a duration such as `90`, `45s`, `30m`, `1h30m` or `500ms`.
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration '{input}'"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid duration '{input}'"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            unit => return Err(format!("unknown unit '{unit}' in duration '{input}'")),
        };
        total += part;
        rest = &rest[unit_len..];
    }
    Ok(total)
}
