// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Training arguments stored in the model header.

use super::reader::ByteReader;
use super::FormatError;

/// Output loss the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    HierarchicalSoftmax,
    NegativeSampling,
    Softmax,
    OneVsAll,
}

impl LossKind {
    fn from_code(code: i32) -> Result<Self, FormatError> {
        match code {
            1 => Ok(Self::HierarchicalSoftmax),
            2 => Ok(Self::NegativeSampling),
            3 => Ok(Self::Softmax),
            4 => Ok(Self::OneVsAll),
            other => Err(FormatError::InvalidField { field: "loss", value: other as i64 }),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::HierarchicalSoftmax => 1,
            Self::NegativeSampling => 2,
            Self::Softmax => 3,
            Self::OneVsAll => 4,
        }
    }
}

/// Model architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Cbow,
    SkipGram,
    Supervised,
}

impl ModelKind {
    fn from_code(code: i32) -> Result<Self, FormatError> {
        match code {
            1 => Ok(Self::Cbow),
            2 => Ok(Self::SkipGram),
            3 => Ok(Self::Supervised),
            other => Err(FormatError::InvalidField { field: "model", value: other as i64 }),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Cbow => 1,
            Self::SkipGram => 2,
            Self::Supervised => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Args {
    pub dim: usize,
    pub ws: i32,
    pub epoch: i32,
    pub min_count: i32,
    pub neg: i32,
    pub word_ngrams: usize,
    pub loss: LossKind,
    pub model: ModelKind,
    pub bucket: usize,
    pub minn: usize,
    pub maxn: usize,
    pub lr_update_rate: i32,
    pub sampling_threshold: f64,
}

fn non_negative(field: &'static str, value: i32) -> Result<usize, FormatError> {
    usize::try_from(value).map_err(|_| FormatError::InvalidField { field, value: value as i64 })
}

impl Args {
    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let dim = non_negative("dim", reader.read_i32("dim")?)?;
        let ws = reader.read_i32("ws")?;
        let epoch = reader.read_i32("epoch")?;
        let min_count = reader.read_i32("min_count")?;
        let neg = reader.read_i32("neg")?;
        let word_ngrams = non_negative("word_ngrams", reader.read_i32("word_ngrams")?)?;
        let loss = LossKind::from_code(reader.read_i32("loss")?)?;
        let model = ModelKind::from_code(reader.read_i32("model")?)?;
        let bucket = non_negative("bucket", reader.read_i32("bucket")?)?;
        let minn = non_negative("minn", reader.read_i32("minn")?)?;
        let maxn = non_negative("maxn", reader.read_i32("maxn")?)?;
        let lr_update_rate = reader.read_i32("lr_update_rate")?;
        let sampling_threshold = reader.read_f64("t")?;

        if dim == 0 {
            return Err(FormatError::InvalidField { field: "dim", value: 0 });
        }

        Ok(Self {
            dim,
            ws,
            epoch,
            min_count,
            neg,
            word_ngrams,
            loss,
            model,
            bucket,
            minn,
            maxn,
            lr_update_rate,
            sampling_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_codes_match_header_values() {
        assert_eq!(LossKind::from_code(1).unwrap(), LossKind::HierarchicalSoftmax);
        assert_eq!(LossKind::from_code(3).unwrap(), LossKind::Softmax);
        assert!(LossKind::from_code(9).is_err());
    }

    #[test]
    fn rejects_unknown_model_kind() {
        assert!(matches!(
            ModelKind::from_code(0),
            Err(FormatError::InvalidField { field: "model", value: 0 })
        ));
    }
}
