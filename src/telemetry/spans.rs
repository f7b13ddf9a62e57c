// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Span utilities and extension traits for FT-CORE tracing.
//!
//! Provides standardized span creation and result recording.

use tracing::{info_span, Span};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for creating standardized query spans.
pub struct QuerySpan;

impl QuerySpan {
    /// Create a new query span with standard fields.
    ///
    /// Fields included:
    /// - `model`: Registered model name
    /// - `instance`: Load instance of the handle the query resolved to
    /// - `operation`: Pipeline operation being run
    /// - `status`: To be filled in by `SpanExt::record_result`
    /// - `error.message`: To be filled in on error
    /// - `latency_us`: To be filled in after completion
    /// - `results`: Number of entries produced
    pub fn new(model: &str, instance: &str, operation: &'static str) -> Span {
        info_span!(
            "model_query",
            model = %model,
            instance = %instance,
            operation = operation,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            latency_us = tracing::field::Empty,
            results = tracing::field::Empty,
        )
    }
}
