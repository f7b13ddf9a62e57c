// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration loading.
//!
//! Values come from an optional TOML file named by `FT_CORE_CONFIG`, then
//! `FT_CORE_*` environment variables override individual fields. Invalid
//! environment values fall back to the current value without failing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `FT_CORE_CONFIG` | unset | TOML config file |
//! | `FT_CORE_MODEL_ROOT` | unset | Model paths must resolve under this directory |
//! | `FT_CORE_MAX_QUERY_BYTES` | 1048576 | Max bytes per query line |
//! | `FT_CORE_MAX_K` | 4096 | Largest accepted k |
//! | `FT_CORE_VERIFY_DIGEST` | true | Compute SHA-256 of model files at load |
//! | `FT_CORE_LOG_LEVEL` | info | Log filter directive |
//! | `FT_CORE_LOG_FORMAT` | json | `json` or `pretty` |
//! | `FT_CORE_LOG_FILE` | unset | Append logs here instead of stderr |
//! | `FT_CORE_PRELOAD_MANIFEST` | unset | JSON manifest loaded at startup |

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::engine::QueryLimits;
use crate::models::ModelLoader;
use crate::telemetry::LogFormat;

const MIN_QUERY_BYTES: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Effective runtime configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// When set, model paths must resolve inside this directory.
    pub model_root: Option<PathBuf>,
    pub verify_digest: bool,
    pub preload_manifest: Option<PathBuf>,
    pub limits: QueryLimits,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            model_root: None,
            verify_digest: true,
            preload_manifest: None,
            limits: QueryLimits::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            log_file: None,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Override fields from `FT_CORE_*` variables.
    pub fn apply_env(mut self) -> Self {
        if let Some(root) = env_path("FT_CORE_MODEL_ROOT") {
            self.model_root = Some(root);
        }
        if let Some(manifest) = env_path("FT_CORE_PRELOAD_MANIFEST") {
            self.preload_manifest = Some(manifest);
        }
        self.verify_digest = parse_bool("FT_CORE_VERIFY_DIGEST", self.verify_digest);
        self.limits.max_query_bytes =
            parse_usize("FT_CORE_MAX_QUERY_BYTES", self.limits.max_query_bytes);
        self.limits.max_k = parse_usize("FT_CORE_MAX_K", self.limits.max_k);
        if let Ok(level) = std::env::var("FT_CORE_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
        if let Some(format) = std::env::var("FT_CORE_LOG_FORMAT").ok().and_then(|f| f.parse().ok()) {
            self.log_format = format;
        }
        if let Some(file) = env_path("FT_CORE_LOG_FILE") {
            self.log_file = Some(file);
        }
        self.sanitized()
    }

    /// Loader honouring the root and digest settings.
    pub fn model_loader(&self) -> ModelLoader {
        ModelLoader::new(self.model_root.clone(), self.verify_digest)
    }

    fn sanitized(mut self) -> Self {
        self.limits.max_query_bytes = self.limits.max_query_bytes.max(MIN_QUERY_BYTES);
        self.limits.max_k = self.limits.max_k.max(1);
        self
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a boolean env var (`1/0`, `true/false`, `yes/no`, `on/off`).
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Load configuration from `FT_CORE_CONFIG` (if set) and the environment.
pub fn load() -> Result<CoreConfig, ConfigError> {
    let base = match env_path("FT_CORE_CONFIG") {
        Some(path) => CoreConfig::from_file(&path)?,
        None => CoreConfig::default(),
    };
    Ok(base.apply_env())
}
