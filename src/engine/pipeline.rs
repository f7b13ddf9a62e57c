// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Query execution against a resolved model handle.
//!
//! A pipeline owns its own `Arc` to the handle, so it keeps working after
//! the registry entry is replaced or removed. Every operation runs inside a
//! query span, is timed into metrics, and turns a panic inside the model
//! into `InferenceError::Panicked` instead of unwinding further.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{InferenceError, Neighbor, Prediction, TextModel};
use crate::models::ModelHandle;
use crate::telemetry::{self, QuerySpan, SpanExt};

/// Probability floor for label prediction; zero keeps every label.
const PREDICTION_THRESHOLD: f32 = 0.0;

/// Per-query input bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    /// Longest accepted query line, in bytes.
    pub max_query_bytes: usize,
    /// Largest accepted k; larger requests are rejected.
    pub max_k: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_query_bytes: 1024 * 1024,
            max_k: 4096,
        }
    }
}

pub struct PredictionPipeline {
    handle: Arc<ModelHandle>,
    limits: QueryLimits,
}

impl PredictionPipeline {
    pub fn new(handle: Arc<ModelHandle>, limits: QueryLimits) -> Self {
        Self { handle, limits }
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    pub fn dimension(&self) -> usize {
        self.handle.model().dimension()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.handle.model().vocabulary_size()
    }

    /// Worst-case result count of `predict_max_intention`.
    pub fn label_count(&self) -> usize {
        self.handle.model().label_count()
    }

    /// Up to `k` labels for `line`, most probable first.
    pub fn predict_top_k(&self, line: &str, k: usize) -> Result<Vec<Prediction>, InferenceError> {
        self.check_query(line)?;
        self.check_k(k)?;
        self.run("predict", |model| model.predict(line, k, PREDICTION_THRESHOLD), Vec::len)
    }

    /// Every label the model ranks for `line`, most probable first.
    pub fn predict_max_intention(&self, line: &str) -> Result<Vec<Prediction>, InferenceError> {
        self.check_query(line)?;
        self.run(
            "predict_max_intention",
            |model| model.predict(line, model.label_count(), PREDICTION_THRESHOLD),
            Vec::len,
        )
    }

    /// Vector for `word`; unknown words are composed from subwords.
    pub fn word_vector(&self, word: &str) -> Result<Vec<f32>, InferenceError> {
        self.run(
            "word_vector",
            |model| {
                let vector = model.word_vector(word);
                if vector.len() != model.dimension() {
                    return Err(InferenceError::ModelError(format!(
                        "vector has {} components, model dimension is {}",
                        vector.len(),
                        model.dimension()
                    )));
                }
                Ok(vector)
            },
            Vec::len,
        )
    }

    /// Up to `k` vocabulary words closest to the query word, which is
    /// itself never returned.
    pub fn nearest_neighbors(&self, query: &str, k: usize) -> Result<Vec<Neighbor>, InferenceError> {
        self.check_query(query)?;
        self.check_k(k)?;
        let word = query.trim();
        self.run("nearest_neighbors", |model| model.nearest_neighbors(word, k), Vec::len)
    }

    /// The full vocabulary in model order.
    pub fn vocabulary(&self) -> Result<Vec<&str>, InferenceError> {
        self.run(
            "list_vocabulary",
            |model| {
                (0..model.vocabulary_size())
                    .map(|i| {
                        model.word(i).ok_or_else(|| {
                            InferenceError::ModelError(format!("vocabulary index {} missing", i))
                        })
                    })
                    .collect()
            },
            Vec::len,
        )
    }

    fn check_query(&self, query: &str) -> Result<(), InferenceError> {
        if query.len() > self.limits.max_query_bytes {
            return Err(InferenceError::InputValidation(format!(
                "query is {} bytes, limit is {}",
                query.len(),
                self.limits.max_query_bytes
            )));
        }
        Ok(())
    }

    fn check_k(&self, k: usize) -> Result<(), InferenceError> {
        if k > self.limits.max_k {
            return Err(InferenceError::InputValidation(format!(
                "k is {}, limit is {}",
                k, self.limits.max_k
            )));
        }
        Ok(())
    }

    fn run<'a, T>(
        &'a self,
        operation: &'static str,
        query: impl FnOnce(&'a dyn TextModel) -> Result<T, InferenceError>,
        count: impl Fn(&T) -> usize,
    ) -> Result<T, InferenceError> {
        let instance = self.handle.instance_id().to_string();
        let span = QuerySpan::new(self.handle.name(), &instance, operation);
        let _enter = span.enter();

        let start = Instant::now();
        let model = self.handle.model();
        let result = catch_unwind(AssertUnwindSafe(|| query(model)))
            .unwrap_or(Err(InferenceError::Panicked { operation }));
        let elapsed = start.elapsed();

        span.record("latency_us", elapsed.as_micros() as u64);
        if let Ok(value) = &result {
            span.record("results", count(value) as u64);
        }
        span.record_result(&result);
        telemetry::record_query(operation, result.is_ok(), elapsed);

        if let Err(e) = &result {
            tracing::debug!(error = %e, "query failed");
        }
        result
    }
}
