// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! fastText binary model backend.
//!
//! Reads `.bin` models (format versions 11 and 12) with dense matrices and
//! answers classification, word vector and nearest-neighbour queries the
//! same way the fastText library does. Quantized (`.ftz`) models are
//! rejected.

mod args;
mod dictionary;
mod loss;
mod matrix;
mod reader;

use std::sync::OnceLock;

use thiserror::Error;

pub use args::{Args, LossKind, ModelKind};
pub use dictionary::{hash, EOS, LABEL_PREFIX};

use dictionary::Dictionary;
use loss::{KBest, Loss};
use matrix::DenseMatrix;
use reader::ByteReader;

use super::{InferenceCapability, InferenceError, Neighbor, Prediction, TextModel};

/// Magic number at the start of every fastText binary model.
pub const FASTTEXT_MAGIC: i32 = 793_712_314;
/// Newest format version this reader understands.
pub const FASTTEXT_VERSION: i32 = 12;
const OLDEST_VERSION: i32 = 11;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("file truncated while reading {what} at byte {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("not a fastText model (magic {0:#x})")]
    BadMagic(i32),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(i32),

    #[error("invalid value {value} for {field}")]
    InvalidField { field: &'static str, value: i64 },

    #[error("inconsistent model: {0}")]
    Inconsistent(String),

    #[error("quantized models are not supported")]
    Quantized,
}

const SUPERVISED_CAPS: &[InferenceCapability] =
    &[InferenceCapability::TextClassification, InferenceCapability::Embedding];
const UNSUPERVISED_CAPS: &[InferenceCapability] = &[InferenceCapability::Embedding];

/// A fully parsed fastText model.
pub struct FastTextModel {
    args: Args,
    dict: Dictionary,
    input: DenseMatrix,
    output: DenseMatrix,
    loss: Option<Loss>,
    word_vectors: OnceLock<DenseMatrix>,
}

impl FastTextModel {
    /// Parse a model from its complete binary image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.read_i32("magic")?;
        if magic != FASTTEXT_MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        let version = reader.read_i32("version")?;
        if !(OLDEST_VERSION..=FASTTEXT_VERSION).contains(&version) {
            return Err(FormatError::UnsupportedVersion(version));
        }

        let mut args = Args::read(&mut reader)?;
        if version == OLDEST_VERSION && args.model == ModelKind::Supervised {
            // version 11 classifiers were trained without character n-grams
            args.maxn = 0;
        }

        let dict = Dictionary::read(&mut reader, &args)?;

        if reader.read_bool("quant_input")? {
            return Err(FormatError::Quantized);
        }
        let input = DenseMatrix::read(&mut reader, "input matrix")?;
        if reader.read_bool("quant_output")? {
            return Err(FormatError::Quantized);
        }
        let output = DenseMatrix::read(&mut reader, "output matrix")?;

        Self::check_shapes(&args, &dict, &input, &output)?;

        let loss = (args.model == ModelKind::Supervised)
            .then(|| Loss::new(args.loss, &dict.label_counts()));

        tracing::debug!(
            version,
            dim = args.dim,
            words = dict.nwords(),
            labels = dict.nlabels(),
            trailing_bytes = reader.remaining(),
            "parsed fastText model"
        );

        Ok(Self {
            args,
            dict,
            input,
            output,
            loss,
            word_vectors: OnceLock::new(),
        })
    }

    fn check_shapes(
        args: &Args,
        dict: &Dictionary,
        input: &DenseMatrix,
        output: &DenseMatrix,
    ) -> Result<(), FormatError> {
        if input.cols() != args.dim || output.cols() != args.dim {
            return Err(FormatError::Inconsistent(format!(
                "matrix width {}/{} does not match dim {}",
                input.cols(),
                output.cols(),
                args.dim
            )));
        }
        if input.rows() != dict.input_rows() {
            return Err(FormatError::Inconsistent(format!(
                "input matrix has {} rows, dictionary addresses {}",
                input.rows(),
                dict.input_rows()
            )));
        }
        let expected_out = match args.model {
            ModelKind::Supervised => dict.nlabels(),
            ModelKind::Cbow | ModelKind::SkipGram => dict.nwords(),
        };
        if output.rows() != expected_out {
            return Err(FormatError::Inconsistent(format!(
                "output matrix has {} rows, expected {}",
                output.rows(),
                expected_out
            )));
        }
        Ok(())
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Mean of the input rows for `ids`; zero vector when `ids` is empty.
    fn average_rows(&self, ids: &[usize]) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.args.dim];
        for id in ids {
            self.input.add_row_to(&mut vec, *id);
        }
        if !ids.is_empty() {
            let scale = 1.0 / ids.len() as f32;
            vec.iter_mut().for_each(|v| *v *= scale);
        }
        vec
    }

    /// Unit-length vectors for every vocabulary word, computed on first use.
    fn word_vectors(&self) -> &DenseMatrix {
        self.word_vectors.get_or_init(|| {
            let dim = self.args.dim;
            let nwords = self.dict.nwords();
            let mut data = Vec::with_capacity(nwords * dim);
            for id in 0..nwords {
                let mut vec = self.average_rows(self.dict.word_subwords(id));
                let norm = l2_norm(&vec);
                if norm > 0.0 {
                    vec.iter_mut().for_each(|v| *v /= norm);
                }
                data.extend_from_slice(&vec);
            }
            tracing::debug!(words = nwords, "precomputed normalized word vectors");
            DenseMatrix::from_vec(nwords, dim, data)
        })
    }
}

fn l2_norm(vec: &[f32]) -> f32 {
    vec.iter().map(|v| v * v).sum::<f32>().sqrt()
}

impl TextModel for FastTextModel {
    fn dimension(&self) -> usize {
        self.args.dim
    }

    fn vocabulary_size(&self) -> usize {
        self.dict.nwords()
    }

    fn label_count(&self) -> usize {
        self.dict.nlabels()
    }

    fn capabilities(&self) -> &[InferenceCapability] {
        if self.loss.is_some() {
            SUPERVISED_CAPS
        } else {
            UNSUPERVISED_CAPS
        }
    }

    fn memory_usage(&self) -> usize {
        let cached = self.word_vectors.get().map(|m| m.memory_bytes()).unwrap_or(0);
        self.input.memory_bytes() + self.output.memory_bytes() + cached
    }

    fn predict(&self, line: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>, InferenceError> {
        let loss = self.loss.as_ref().ok_or_else(|| {
            InferenceError::CapabilityNotSupported("model is not a supervised classifier".into())
        })?;

        let ids = self.dict.line_ids(line);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let hidden = self.average_rows(&ids);

        loss.predict(&self.output, &hidden, k, threshold)
            .into_iter()
            .map(|(score, label_id)| {
                let probability = score.exp();
                if !probability.is_finite() {
                    return Err(InferenceError::ModelError(format!(
                        "non-finite probability for label {}",
                        label_id
                    )));
                }
                let label = self.dict.label(label_id).ok_or_else(|| {
                    InferenceError::ModelError(format!("label index {} out of range", label_id))
                })?;
                Ok(Prediction { label: label.to_string(), probability })
            })
            .collect()
    }

    fn word_vector(&self, word: &str) -> Vec<f32> {
        self.average_rows(&self.dict.subwords(word.as_bytes()))
    }

    fn nearest_neighbors(&self, word: &str, k: usize) -> Result<Vec<Neighbor>, InferenceError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = self.word_vector(word);
        let mut query_norm = l2_norm(&query);
        if query_norm.abs() < 1e-8 {
            query_norm = 1.0;
        }

        let vectors = self.word_vectors();
        let mut best = KBest::new(k);
        for id in 0..self.dict.nwords() {
            if self.dict.word_bytes(id) == Some(word.as_bytes()) {
                continue;
            }
            let similarity = vectors.dot_row(&query, id) / query_norm;
            if !similarity.is_finite() {
                return Err(InferenceError::ModelError(format!(
                    "non-finite similarity for word index {}",
                    id
                )));
            }
            if best.is_full() && best.weakest().is_some_and(|w| similarity < w) {
                continue;
            }
            best.push(similarity, id);
        }

        Ok(best
            .into_sorted()
            .into_iter()
            .filter_map(|(similarity, id)| {
                self.dict.word(id).map(|w| Neighbor { word: w.to_string(), similarity })
            })
            .collect())
    }

    fn word(&self, index: usize) -> Option<&str> {
        self.dict.word(index)
    }
}
