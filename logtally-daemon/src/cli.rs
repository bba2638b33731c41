//! CLI argument definitions for logtally-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use logtally_core::config::LogtallyConfig;
use logtally_core::error::{ConfigError, LogtallyError};

use crate::error::DaemonError;

/// Lifecycle action requested on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Detach and start tallying the log file.
    Start,
    /// Stop the daemon recorded in the pidfile.
    Stop,
    /// Stop, then start.
    Restart,
}

/// Tail a web-server log and periodically report request counts per
/// route and status code.
///
/// Keep the pidfile unique for every log file being tallied.
#[derive(Parser, Debug)]
#[command(name = "logtally-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Lifecycle action.
    #[arg(value_enum)]
    pub action: Action,

    /// Log file to tally (required for start and restart).
    pub log_file: Option<PathBuf>,

    /// Path to a logtally.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Diagnostic log file.
    #[arg(short, long)]
    pub daemon_log: Option<PathBuf>,

    /// File receiving the periodic reports once detached.
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// File receiving the daemon's stderr once detached.
    #[arg(short, long)]
    pub error_file: Option<PathBuf>,

    /// Pidfile path.
    #[arg(short, long)]
    pub pid_file: Option<PathBuf>,

    /// Report interval in seconds.
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Do not detach; reports go to stdout.
    #[arg(long)]
    pub foreground: bool,
}

impl DaemonCli {
    /// Build the effective configuration.
    ///
    /// Precedence: CLI flags, then `LOGTALLY_*` environment variables, then
    /// the `--config` file, then defaults. Every path is made absolute
    /// against the current directory since a detached daemon runs from `/`.
    /// Validation runs once, on the merged result, so a later layer can
    /// correct a value an earlier layer got wrong.
    pub fn resolve_config(&self) -> Result<LogtallyConfig, DaemonError> {
        let mut config = match &self.config {
            Some(path) => LogtallyConfig::from_file(path)?,
            None => LogtallyConfig::default(),
        };
        config.apply_env_overrides();

        self.apply_overrides(&mut config);
        config.general.log_level = normalize_level(&config.general.log_level);
        absolutize_paths(&mut config)?;
        config.validate()?;

        if matches!(self.action, Action::Start | Action::Restart) && config.tail.log_file.is_empty()
        {
            return Err(config_error(
                "tail.log_file",
                "a log file to tally is required for start and restart".to_owned(),
            ));
        }

        Ok(config)
    }

    fn apply_overrides(&self, config: &mut LogtallyConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.to_ascii_lowercase();
        }
        override_path(&mut config.general.daemon_log, &self.daemon_log);
        override_path(&mut config.general.output_file, &self.output_file);
        override_path(&mut config.general.error_file, &self.error_file);
        override_path(&mut config.general.pid_file, &self.pid_file);
        override_path(&mut config.tail.log_file, &self.log_file);
        if let Some(interval) = self.interval {
            config.report.interval_secs = interval;
        }
    }
}

/// Level names are case-insensitive; `warning` and `critical` are accepted as aliases.
fn normalize_level(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_owned(),
        "critical" => "error".to_owned(),
        other => other.to_owned(),
    }
}

fn override_path(target: &mut String, value: &Option<PathBuf>) {
    if let Some(path) = value {
        *target = path.display().to_string();
    }
}

fn absolutize_paths(config: &mut LogtallyConfig) -> Result<(), DaemonError> {
    for (field, value) in [
        ("general.daemon_log", &mut config.general.daemon_log),
        ("general.output_file", &mut config.general.output_file),
        ("general.error_file", &mut config.general.error_file),
        ("general.pid_file", &mut config.general.pid_file),
        ("tail.log_file", &mut config.tail.log_file),
    ] {
        if value.is_empty() || Path::new(value.as_str()).is_absolute() {
            continue;
        }
        let absolute = std::path::absolute(value.as_str())
            .map_err(|e| config_error(field, format!("cannot resolve path: {e}")))?;
        *value = absolute.display().to_string();
    }
    Ok(())
}

fn config_error(field: &str, reason: String) -> DaemonError {
    DaemonError::Core(LogtallyError::Config(ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }))
}
