// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bulk model loading from a preload manifest.

use thiserror::Error;

use super::loader::LoadError;
use super::manifest::{ManifestError, PreloadManifest};
use super::registry::ModelRegistry;

#[derive(Error, Debug)]
pub enum PreloadError {
    #[error("Manifest invalid: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Load of {name} failed: {source}")]
    LoadFailed {
        name: String,
        #[source]
        source: LoadError,
    },
}

/// Loads every model named in a manifest into a registry.
pub struct ModelPreloader<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> ModelPreloader<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Load all entries in order. On the first failure, every model this
    /// call loaded is unloaded again and the error is returned.
    pub fn preload(&self, manifest: &PreloadManifest) -> Result<Vec<String>, PreloadError> {
        manifest.validate()?;

        let mut loaded = Vec::with_capacity(manifest.models.len());
        for entry in &manifest.models {
            let path = entry.path.to_string_lossy();
            if let Err(source) = self
                .registry
                .load_verified(&entry.name, &path, entry.sha256.as_deref())
            {
                self.abort(&loaded);
                return Err(PreloadError::LoadFailed {
                    name: entry.name.clone(),
                    source,
                });
            }
            loaded.push(entry.name.clone());
        }

        tracing::info!(count = loaded.len(), "preload complete");
        Ok(loaded)
    }

    fn abort(&self, loaded: &[String]) {
        for name in loaded {
            self.registry.unload(name);
        }
        if !loaded.is_empty() {
            tracing::warn!(count = loaded.len(), "preload aborted, rolled back loaded models");
        }
    }
}
