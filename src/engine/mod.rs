// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference engine module for FT-CORE.
//!
//! Provides the `TextModel` trait implemented by model backends, the
//! result types they produce, and the `PredictionPipeline` that runs
//! queries against a resolved model handle.

pub mod error;
pub mod fasttext;
mod pipeline;

use serde::Serialize;

pub use error::InferenceError;
pub use fasttext::{FastTextModel, FormatError};
pub use pipeline::{PredictionPipeline, QueryLimits};

/// What a model can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceCapability {
    TextClassification,
    Embedding,
}

/// One classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

/// One nearest-neighbour result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub word: String,
    pub similarity: f32,
}

/// A string paired with a score, as marshalled across the C boundary.
pub trait ScoredText {
    fn text(&self) -> &str;
    fn score(&self) -> f32;
}

impl ScoredText for Prediction {
    fn text(&self) -> &str {
        &self.label
    }

    fn score(&self) -> f32 {
        self.probability
    }
}

impl ScoredText for Neighbor {
    fn text(&self) -> &str {
        &self.word
    }

    fn score(&self) -> f32 {
        self.similarity
    }
}

/// A loaded, immutable text model.
///
/// Implementations must be safe to query from many threads at once.
pub trait TextModel: Send + Sync {
    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Number of vocabulary words (labels excluded).
    fn vocabulary_size(&self) -> usize;

    /// Number of classification labels; zero for unsupervised models.
    fn label_count(&self) -> usize;

    fn capabilities(&self) -> &[InferenceCapability];

    /// Approximate resident size of the model weights.
    fn memory_usage(&self) -> usize;

    /// Up to `k` labels with probability at least `threshold`, sorted by
    /// descending probability.
    fn predict(&self, line: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>, InferenceError>;

    /// Vector of exactly `dimension()` floats for any input word.
    fn word_vector(&self, word: &str) -> Vec<f32>;

    /// Up to `k` vocabulary words most similar to `word`, excluding `word`.
    fn nearest_neighbors(&self, word: &str, k: usize) -> Result<Vec<Neighbor>, InferenceError>;

    /// Vocabulary word at `index`, in stable model order.
    fn word(&self, index: usize) -> Option<&str>;
}
