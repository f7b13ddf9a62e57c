// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference error types for FT-CORE.
//!
//! All errors are fail-closed: invalid inputs are rejected, not truncated.

use thiserror::Error;

/// Errors that can occur while querying a loaded model.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Input validation failed: {0}")]
    InputValidation(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Capability not supported: {0}")]
    CapabilityNotSupported(String),

    #[error("Model panicked during {operation}")]
    Panicked { operation: &'static str },
}

impl InferenceError {
    /// Returns true if the caller supplied something unusable, as opposed
    /// to the model failing on valid input.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InputValidation(_) | Self::CapabilityNotSupported(_))
    }
}
