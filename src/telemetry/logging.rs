// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Log subscriber setup for hosts embedding FT-CORE.
//!
//! The library never installs a subscriber on its own. A host either calls
//! `init_logging` with explicit settings, or `Runtime::init_logging`
//! (`ft_registry_init_logging` over the C ABI) to use the configured
//! `log_level`, `log_format` and `log_file` values, which the
//! `FT_CORE_LOG_*` variables override.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{self, ConfigError, CoreConfig};

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    #[serde(alias = "text")]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(LogError::InvalidFormat(other.to_string())),
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `ft_core=debug`.
    pub level: String,
    /// Append to this file instead of writing to stderr.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from(&CoreConfig::default())
    }
}

impl From<&CoreConfig> for LogConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            format: config.log_format,
            level: config.log_level.clone(),
            output_path: config.log_file.clone(),
        }
    }
}

impl LogConfig {
    /// Settings from `FT_CORE_CONFIG` and the `FT_CORE_LOG_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::from(&config::load()?))
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),
    #[error("Failed to open log file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

fn open_writer(path: Option<&Path>) -> Result<BoxMakeWriter, LogError> {
    match path {
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LogError::FileOpen { path: path.to_path_buf(), source })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

/// Install the global subscriber. Fails with `AlreadyInitialized` if the
/// process already has one; nothing is installed on any error.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let writer = open_writer(config.output_path.as_deref())?;

    // colour codes only make sense on a terminal
    let ansi = config.output_path.is_none();
    let (json, pretty) = match config.format {
        LogFormat::Json => (Some(fmt::layer().json().with_writer(writer).with_ansi(ansi)), None),
        LogFormat::Pretty => {
            (None, Some(fmt::layer().pretty().with_writer(writer).with_ansi(ansi)))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)?;

    tracing::info!(
        level = %config.level,
        format = ?config.format,
        file = ?config.output_path,
        "logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_names() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(LogError::InvalidFormat(_))));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let config = LogConfig { level: "ft_core=loud".to_string(), ..Default::default() };
        assert!(matches!(init_logging(&config), Err(LogError::InvalidFilter(_))));
    }

    #[test]
    fn unwritable_file_is_reported() {
        let config = LogConfig {
            output_path: Some(PathBuf::from("/nonexistent/dir/ft-core.log")),
            ..Default::default()
        };
        assert!(matches!(init_logging(&config), Err(LogError::FileOpen { .. })));
    }

    #[test]
    fn follows_core_config() {
        let core = CoreConfig {
            log_level: "ft_core=debug".to_string(),
            log_format: LogFormat::Pretty,
            log_file: Some(PathBuf::from("/var/log/ft-core.log")),
            ..CoreConfig::default()
        };
        let config = LogConfig::from(&core);
        assert_eq!(config.level, "ft_core=debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.output_path, Some(PathBuf::from("/var/log/ft-core.log")));
    }
}
