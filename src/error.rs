// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Crate-level error taxonomy.
//!
//! Every public operation reports one of four kinds. Layer-specific errors
//! convert into these so callers never have to match on internals.

use thiserror::Error;

use crate::engine::InferenceError;
use crate::models::LoadError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Load failed: {0}")]
    LoadFailure(#[from] LoadError),

    #[error("Inference failed: {0}")]
    InferenceFailure(#[from] InferenceError),

    #[error("Buffer too small: produced {produced} entries, wrote {written}, truncated {truncated_strings} strings")]
    BufferTooSmall {
        produced: usize,
        written: usize,
        truncated_strings: usize,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
