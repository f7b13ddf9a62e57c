// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! FT-CORE
//!
//! An in-process registry of named fastText models with a C ABI.
//!
//! Hosts load `.bin` model files under caller-chosen names and run label
//! prediction, word-vector lookup, nearest-neighbour search and vocabulary
//! listing against them from any number of threads.
//!
//! # Concurrency
//!
//! - Registry mutations hold the write lock only for the map update.
//! - A query resolves its name to an `Arc` handle and releases the lock
//!   before doing any work, so replacing or removing a model never
//!   invalidates a query already in flight.
//!
//! # Boundaries
//!
//! - Model paths can be confined to a root directory.
//! - Inputs over the configured query size are rejected.
//! - No training, quantization or model mutation.

pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod models;
pub mod telemetry;

use config::CoreConfig;
use engine::PredictionPipeline;
use error::CoreResult;
use models::{ModelPreloader, ModelRegistry, PreloadError, PreloadManifest};
use telemetry::{LogConfig, LogError};

/// A configured registry instance.
pub struct Runtime {
    config: CoreConfig,
    registry: ModelRegistry,
}

impl Runtime {
    /// Create an empty runtime. The preload manifest, if any, is ignored.
    pub fn new(config: CoreConfig) -> Self {
        let registry = ModelRegistry::new(config.model_loader());
        Self { config, registry }
    }

    /// Create a runtime and load every model the configured manifest names.
    /// Nothing stays loaded if any entry fails.
    pub fn with_preload(config: CoreConfig) -> Result<Self, PreloadError> {
        let runtime = Self::new(config);
        if let Some(path) = runtime.config.preload_manifest.clone() {
            let manifest = PreloadManifest::from_file(&path)?;
            ModelPreloader::new(&runtime.registry).preload(&manifest)?;
        }
        Ok(runtime)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Install the global log subscriber from this runtime's `log_level`,
    /// `log_format` and `log_file` settings.
    pub fn init_logging(&self) -> Result<(), LogError> {
        telemetry::init_logging(&LogConfig::from(&self.config))
    }

    /// Resolve `name` into a pipeline bound to the handle current right now.
    pub fn pipeline(&self, name: &str) -> CoreResult<PredictionPipeline> {
        let handle = self.registry.lookup(name)?;
        Ok(PredictionPipeline::new(handle, self.config.limits))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.registry.clear();
    }
}
