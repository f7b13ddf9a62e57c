// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Preload manifest parsing and validation.
//!
//! A manifest lists the models to load when a registry is created:
//!
//! ```json
//! { "models": [ { "name": "intent", "path": "intent.bin", "sha256": "…" } ] }
//! ```
//!
//! Relative paths are resolved against the manifest's own directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("manifest invalid: {0}")]
    Invalid(String),
}

/// One model to preload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub path: PathBuf,
    /// Expected SHA-256 of the model file (64 hex characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadManifest {
    pub models: Vec<ManifestEntry>,
}

impl PreloadManifest {
    /// Load a manifest from a JSON file, resolving relative model paths
    /// against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::from_json(&content)?;
        if let Some(base) = path.parent() {
            manifest.resolve_paths(base);
        }
        Ok(manifest)
    }

    /// Parse and validate a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for entry in &mut self.models {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
    }

    /// Validate names and digests.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::new();
        for entry in &self.models {
            if entry.name.is_empty() {
                return Err(ManifestError::Invalid("model name cannot be empty".into()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ManifestError::Invalid(format!("duplicate model name {:?}", entry.name)));
            }
            if let Some(sha) = &entry.sha256 {
                if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ManifestError::Invalid(format!(
                        "sha256 for {:?} must be 64 hex characters",
                        entry.name
                    )));
                }
            }
        }
        Ok(())
    }
}
