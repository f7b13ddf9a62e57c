// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Loaded model handles and their metadata.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{InferenceCapability, TextModel};

/// Where a model came from and when it was loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
    /// Distinguishes successive loads under the same name.
    pub instance_id: Uuid,
}

impl ModelMetadata {
    pub fn new(name: &str, path: &Path, size_bytes: u64, sha256: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            size_bytes,
            sha256,
            loaded_at: Utc::now(),
            instance_id: Uuid::new_v4(),
        }
    }
}

/// Serializable summary of a registered model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    #[serde(flatten)]
    pub metadata: ModelMetadata,
    pub dimension: usize,
    pub vocabulary_size: usize,
    pub label_count: usize,
    pub memory_bytes: usize,
    pub capabilities: Vec<InferenceCapability>,
}

/// One loaded model. Immutable once constructed; shared through `Arc`.
pub struct ModelHandle {
    metadata: ModelMetadata,
    model: Box<dyn TextModel>,
}

impl ModelHandle {
    pub fn new(metadata: ModelMetadata, model: Box<dyn TextModel>) -> Self {
        Self { metadata, model }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn instance_id(&self) -> Uuid {
        self.metadata.instance_id
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn model(&self) -> &dyn TextModel {
        self.model.as_ref()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            metadata: self.metadata.clone(),
            dimension: self.model.dimension(),
            vocabulary_size: self.model.vocabulary_size(),
            label_count: self.model.label_count(),
            memory_bytes: self.model.memory_usage(),
            capabilities: self.model.capabilities().to_vec(),
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.metadata.name)
            .field("instance_id", &self.metadata.instance_id)
            .field("dimension", &self.model.dimension())
            .finish()
    }
}
