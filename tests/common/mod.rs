//! Shared fixtures: writes small but real fastText `.bin` models.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ft_core::engine::fasttext::FASTTEXT_MAGIC;

pub const LOSS_HS: i32 = 1;
pub const LOSS_NS: i32 = 2;
pub const LOSS_SOFTMAX: i32 = 3;
pub const LOSS_OVA: i32 = 4;
pub const MODEL_SKIPGRAM: i32 = 2;
pub const MODEL_SUPERVISED: i32 = 3;

/// Builder for a fastText binary image.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    pub version: i32,
    pub dim: usize,
    pub loss: i32,
    pub model: i32,
    pub bucket: usize,
    pub minn: usize,
    pub maxn: usize,
    pub word_ngrams: usize,
    /// Entries are raw bytes; fastText does not require UTF-8.
    pub words: Vec<(Vec<u8>, i64)>,
    pub labels: Vec<(Vec<u8>, i64)>,
    /// Row-major, `(words + bucket) x dim`.
    pub input: Vec<f32>,
    /// Row-major, `(labels or words) x dim`.
    pub output: Vec<f32>,
    pub quantized: bool,
    pub quantized_output: bool,
}

impl ModelBuilder {
    /// Softmax classifier over words `a b c` with two labels, dim 100.
    /// Every input weight is positive and label `__label__pos` has the
    /// positive output row, so it always ranks first.
    pub fn classifier() -> Self {
        let words: Vec<(Vec<u8>, i64)> = ["</s>", "a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_bytes().to_vec(), 10 - i as i64))
            .collect();
        let labels = vec![
            (b"__label__pos".to_vec(), 6),
            (b"__label__neg".to_vec(), 4),
        ];
        let dim = 100;
        let input = (0..words.len() * dim)
            .map(|i| ((i * 31) % 13 + 1) as f32 / 13.0)
            .collect();
        let mut output = vec![0.02f32; dim];
        output.extend(std::iter::repeat(-0.02f32).take(dim));
        Self {
            version: 12,
            dim,
            loss: LOSS_SOFTMAX,
            model: MODEL_SUPERVISED,
            bucket: 0,
            minn: 0,
            maxn: 0,
            word_ngrams: 1,
            words,
            labels,
            input,
            output,
            quantized: false,
            quantized_output: false,
        }
    }

    /// Skip-gram embedding model with hand-placed 4-d vectors and no
    /// subword buckets: `queen` is close to `king`, `banana` to `apple`.
    pub fn embeddings() -> Self {
        let rows: &[(&str, [f32; 4])] = &[
            ("</s>", [0.0, 0.0, 0.0, 1.0]),
            ("king", [1.0, 0.0, 0.0, 0.0]),
            ("queen", [0.9, 0.1, 0.0, 0.0]),
            ("apple", [0.0, 0.0, 1.0, 0.0]),
            ("banana", [0.0, 0.1, 0.9, 0.0]),
        ];
        let words = rows.iter().map(|(w, _)| (w.as_bytes().to_vec(), 5)).collect();
        let input = rows.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        Self {
            version: 12,
            dim: 4,
            loss: LOSS_NS,
            model: MODEL_SKIPGRAM,
            bucket: 0,
            minn: 0,
            maxn: 0,
            word_ngrams: 1,
            words,
            labels: Vec::new(),
            input,
            output: vec![0.0; rows.len() * 4],
            quantized: false,
            quantized_output: false,
        }
    }

    /// Skip-gram model with character n-gram buckets, so unknown words get
    /// non-zero vectors.
    pub fn subword_embeddings() -> Self {
        let words: Vec<(Vec<u8>, i64)> = ["</s>", "river", "rivers", "stone"]
            .iter()
            .map(|w| (w.as_bytes().to_vec(), 3))
            .collect();
        let dim = 8;
        let bucket = 64;
        let input = (0..(words.len() + bucket) * dim)
            .map(|i| (((i * 17) % 11) as f32 - 5.0) / 10.0)
            .collect();
        Self {
            version: 12,
            dim,
            loss: LOSS_NS,
            model: MODEL_SKIPGRAM,
            bucket,
            minn: 2,
            maxn: 4,
            word_ngrams: 1,
            output: vec![0.0; words.len() * dim],
            words,
            labels: Vec::new(),
            input,
            quantized: false,
            quantized_output: false,
        }
    }

    /// Replace the vocabulary word at `index`, keeping its input row.
    pub fn with_word_bytes(mut self, index: usize, word: &[u8]) -> Self {
        self.words[index].0 = word.to_vec();
        self
    }

    pub fn with_loss(mut self, loss: i32) -> Self {
        self.loss = loss;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_i32(&mut buf, FASTTEXT_MAGIC);
        put_i32(&mut buf, self.version);

        // args
        for value in [
            self.dim as i32,
            5,
            5,
            1,
            5,
            self.word_ngrams as i32,
            self.loss,
            self.model,
            self.bucket as i32,
            self.minn as i32,
            self.maxn as i32,
            100,
        ] {
            put_i32(&mut buf, value);
        }
        buf.extend_from_slice(&1e-4f64.to_le_bytes());

        // dictionary
        put_i32(&mut buf, (self.words.len() + self.labels.len()) as i32);
        put_i32(&mut buf, self.words.len() as i32);
        put_i32(&mut buf, self.labels.len() as i32);
        put_i64(&mut buf, 1000);
        put_i64(&mut buf, -1);
        for (kind, entries) in [(0u8, &self.words), (1u8, &self.labels)] {
            for (text, count) in entries {
                buf.extend_from_slice(text);
                buf.push(0);
                put_i64(&mut buf, *count);
                buf.push(kind);
            }
        }

        buf.push(self.quantized as u8);
        put_matrix(&mut buf, self.words.len() + self.bucket, self.dim, &self.input);
        buf.push(self.quantized_output as u8);
        let out_rows = if self.model == MODEL_SUPERVISED {
            self.labels.len()
        } else {
            self.words.len()
        };
        put_matrix(&mut buf, out_rows, self.dim, &self.output);
        buf
    }

    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.to_bytes()).expect("write model fixture");
        path
    }
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_matrix(buf: &mut Vec<u8>, rows: usize, cols: usize, data: &[f32]) {
    assert_eq!(rows * cols, data.len(), "fixture matrix shape");
    put_i64(buf, rows as i64);
    put_i64(buf, cols as i64);
    for v in data {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Temp directory holding the three standard fixtures.
pub struct Fixtures {
    pub dir: tempfile::TempDir,
    pub classifier: PathBuf,
    pub embeddings: PathBuf,
    pub subwords: PathBuf,
}

impl Fixtures {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let classifier = ModelBuilder::classifier().write_to(dir.path(), "classifier.bin");
        let embeddings = ModelBuilder::embeddings().write_to(dir.path(), "embeddings.bin");
        let subwords = ModelBuilder::subword_embeddings().write_to(dir.path(), "subwords.bin");
        Self { dir, classifier, embeddings, subwords }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}
