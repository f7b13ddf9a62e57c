// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model loading and validation.

use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::handle::{ModelHandle, ModelMetadata};
use crate::engine::{FastTextModel, FormatError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid model name: {0:?}")]
    InvalidName(String),

    #[error("Model path not allowed: {0}")]
    PathNotAllowed(PathBuf),

    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid model format: {0}")]
    InvalidFormat(#[from] FormatError),

    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validated, canonical model path.
#[derive(Debug, Clone)]
pub struct ModelPath {
    path: PathBuf,
}

impl ModelPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

/// Loads and validates model files, optionally confined to a root directory.
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    root: Option<PathBuf>,
    verify_digest: bool,
}

impl ModelLoader {
    pub fn new(root: Option<PathBuf>, verify_digest: bool) -> Self {
        Self { root, verify_digest }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve `path` and make sure it stays inside the configured root.
    /// Relative paths are taken relative to the root when one is set.
    pub fn validate_path(&self, path: &str) -> Result<ModelPath, LoadError> {
        let requested = Path::new(path);
        let full_path = match &self.root {
            Some(root) if requested.is_relative() => root.join(requested),
            _ => requested.to_path_buf(),
        };
        let canonical = full_path
            .canonicalize()
            .map_err(|_| LoadError::NotFound(full_path.clone()))?;

        if let Some(root) = &self.root {
            // Canonicalize the root to match the format of the canonical path
            let allowed = root
                .canonicalize()
                .map(|root| canonical.starts_with(root))
                .unwrap_or(false);
            if !allowed {
                return Err(LoadError::PathNotAllowed(canonical));
            }
        }

        if !canonical.is_file() {
            return Err(LoadError::NotFound(canonical));
        }

        Ok(ModelPath { path: canonical })
    }

    /// Read, verify and parse a model into an unregistered handle.
    pub fn load(
        &self,
        name: &str,
        path: &str,
        expected_sha256: Option<&str>,
    ) -> Result<ModelHandle, LoadError> {
        if name.is_empty() {
            return Err(LoadError::InvalidName(name.to_string()));
        }
        let validated = self.validate_path(path)?;
        let mapped = MappedModel::open(&validated)?;

        let sha256 = if self.verify_digest || expected_sha256.is_some() {
            let actual = hex::encode(Sha256::digest(mapped.as_bytes()));
            if let Some(expected) = expected_sha256 {
                if !expected.eq_ignore_ascii_case(&actual) {
                    return Err(LoadError::HashMismatch {
                        path: validated.as_path().to_path_buf(),
                        expected: expected.to_string(),
                        actual,
                    });
                }
            }
            Some(actual)
        } else {
            None
        };

        let model = FastTextModel::from_bytes(mapped.as_bytes())?;
        let metadata = ModelMetadata::new(name, validated.as_path(), mapped.len() as u64, sha256);

        Ok(ModelHandle::new(metadata, Box::new(model)))
    }
}

/// Memory-mapped model file for zero-copy parsing.
/// Uses memmap2 for cross-platform support.
pub struct MappedModel {
    mmap: Option<Mmap>,
}

impl MappedModel {
    /// Memory-map a model file. Empty files are not mapped.
    pub fn open(path: &ModelPath) -> Result<Self, LoadError> {
        let file = File::open(path.as_path())?;
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None });
        }
        // SAFETY: File is opened read-only and only read while parsing
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    /// Get model data as a byte slice (zero-copy).
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Length of mapped data in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}
