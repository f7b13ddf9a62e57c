// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Registry of named, loaded models.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::handle::{ModelHandle, ModelInfo};
use super::loader::{LoadError, ModelLoader};
use crate::error::CoreError;
use crate::telemetry;

/// Thread-safe map from model name to shared handle.
///
/// Mutations hold the write lock only for the map update itself. Lookups
/// hold the read lock only long enough to clone an `Arc`, so queries run
/// without any registry lock and keep their handle alive even if the name
/// is replaced or removed meanwhile.
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ModelHandle>>>,
    loader: ModelLoader,
}

impl ModelRegistry {
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            loader,
        }
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    /// Load a model file and install it under `name`, replacing any
    /// previous entry. On failure the previous entry is left untouched.
    pub fn load(&self, name: &str, path: &str) -> Result<Arc<ModelHandle>, LoadError> {
        self.load_verified(name, path, None)
    }

    /// Like `load`, additionally requiring the file's SHA-256 to match.
    pub fn load_verified(
        &self,
        name: &str,
        path: &str,
        sha256: Option<&str>,
    ) -> Result<Arc<ModelHandle>, LoadError> {
        let handle = match self.loader.load(name, path, sha256) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(model = %name, path = %path, error = %e, "model load failed");
                telemetry::record_model_load(false);
                return Err(e);
            }
        };
        telemetry::record_model_load(true);
        Ok(self.install(handle))
    }

    /// Install an already constructed handle under its own name.
    pub fn install(&self, handle: ModelHandle) -> Arc<ModelHandle> {
        let handle = Arc::new(handle);
        let name = handle.name().to_string();
        let model = handle.model();
        let (previous, count) = {
            let mut models = self.models.write();
            let previous = models.insert(name.clone(), handle.clone());
            (previous, models.len())
        };
        telemetry::set_models_loaded(count);

        match &previous {
            Some(old) => tracing::info!(
                model = %name,
                previous_instance = %old.instance_id(),
                instance = %handle.instance_id(),
                "model replaced"
            ),
            None => tracing::info!(
                model = %name,
                path = %handle.metadata().path.display(),
                dimension = model.dimension(),
                vocabulary_size = model.vocabulary_size(),
                labels = model.label_count(),
                "model loaded"
            ),
        }
        // the replaced model is freed here, outside the lock, unless a query still holds it
        drop(previous);
        handle
    }

    /// Remove `name` if present. Returns whether an entry was removed.
    pub fn unload(&self, name: &str) -> bool {
        let (removed, count) = {
            let mut models = self.models.write();
            let removed = models.remove(name);
            (removed, models.len())
        };
        match removed {
            Some(handle) => {
                telemetry::set_models_loaded(count);
                tracing::info!(
                    model = %name,
                    instance = %handle.instance_id(),
                    in_flight = Arc::strong_count(&handle) - 1,
                    "model removed"
                );
                true
            }
            None => {
                tracing::debug!(model = %name, "unload of unknown model ignored");
                false
            }
        }
    }

    /// Strong reference to the current handle for `name`.
    pub fn lookup(&self, name: &str) -> Result<Arc<ModelHandle>, CoreError> {
        self.models
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::ModelNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.read().contains_key(name)
    }

    /// Number of loaded models.
    pub fn count(&self) -> usize {
        self.models.read().len()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Summaries of every loaded model, sorted by name.
    pub fn list(&self) -> Vec<ModelInfo> {
        let handles: Vec<Arc<ModelHandle>> = self.models.read().values().cloned().collect();
        let mut infos: Vec<ModelInfo> = handles.iter().map(|h| h.info()).collect();
        infos.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        infos
    }

    /// Remove every model. Handles still held by callers stay valid.
    pub fn clear(&self) {
        let drained: Vec<Arc<ModelHandle>> = {
            let mut models = self.models.write();
            models.drain().map(|(_, handle)| handle).collect()
        };
        telemetry::set_models_loaded(0);
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "registry cleared");
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(ModelLoader::default())
    }
}
