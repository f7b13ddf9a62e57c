// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Vocabulary, label table and subword hashing.

use std::borrow::Cow;
use std::collections::HashMap;

use super::args::Args;
use super::reader::ByteReader;
use super::FormatError;

/// End-of-sentence token appended to every query line.
pub const EOS: &str = "</s>";
/// Prefix marking label tokens.
pub const LABEL_PREFIX: &str = "__label__";

const BOW: u8 = b'<';
const EOW: u8 = b'>';
const NGRAM_MULTIPLIER: u64 = 116_049_371;

/// 32-bit FNV-1a over bytes, each byte sign-extended before mixing.
pub fn hash(bytes: &[u8]) -> u32 {
    let mut h: u32 = 2_166_136_261;
    for &b in bytes {
        h ^= (b as i8) as u32;
        h = h.wrapping_mul(16_777_619);
    }
    h
}

fn wrap(word: &[u8]) -> Vec<u8> {
    let mut wrapped = Vec::with_capacity(word.len() + 2);
    wrapped.push(BOW);
    wrapped.extend_from_slice(word);
    wrapped.push(EOW);
    wrapped
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\r' | '\t' | '\u{0B}' | '\u{0C}' | '\0')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Word,
    Label,
}

#[derive(Debug)]
struct Entry {
    /// Bytes as stored in the model; lookups and hashing use these.
    raw: Box<[u8]>,
    /// Lossy UTF-8 rendering handed back to callers.
    text: String,
    count: i64,
    kind: EntryKind,
    subwords: Vec<usize>,
}

#[derive(Debug)]
pub struct Dictionary {
    entries: Vec<Entry>,
    index: HashMap<Box<[u8]>, usize>,
    nwords: usize,
    nlabels: usize,
    pruneidx_size: i64,
    pruneidx: HashMap<i32, i32>,
    bucket: usize,
    minn: usize,
    maxn: usize,
    word_ngrams: usize,
}

impl Dictionary {
    pub(crate) fn read(reader: &mut ByteReader<'_>, args: &Args) -> Result<Self, FormatError> {
        let size = reader.read_i32("dictionary size")?;
        let nwords = reader.read_i32("nwords")?;
        let nlabels = reader.read_i32("nlabels")?;
        let _ntokens = reader.read_i64("ntokens")?;
        let pruneidx_size = reader.read_i64("pruneidx size")?;

        let size = usize::try_from(size)
            .map_err(|_| FormatError::InvalidField { field: "dictionary size", value: size as i64 })?;
        let nwords = usize::try_from(nwords)
            .map_err(|_| FormatError::InvalidField { field: "nwords", value: nwords as i64 })?;
        let nlabels = usize::try_from(nlabels)
            .map_err(|_| FormatError::InvalidField { field: "nlabels", value: nlabels as i64 })?;
        if nwords.checked_add(nlabels) != Some(size) {
            return Err(FormatError::Inconsistent(format!(
                "dictionary size {} != nwords {} + nlabels {}",
                size, nwords, nlabels
            )));
        }

        let mut entries = Vec::with_capacity(size.min(reader.remaining()));
        let mut index = HashMap::with_capacity(size.min(reader.remaining()));
        for id in 0..size {
            let raw = reader.read_cstr("dictionary entry")?;
            let text = String::from_utf8_lossy(raw).into_owned();
            let count = reader.read_i64("entry count")?;
            let kind = match reader.read_i8("entry type")? {
                0 => EntryKind::Word,
                1 => EntryKind::Label,
                other => {
                    return Err(FormatError::InvalidField { field: "entry type", value: other as i64 })
                }
            };
            let expected = if id < nwords { EntryKind::Word } else { EntryKind::Label };
            if kind != expected {
                return Err(FormatError::Inconsistent(format!(
                    "entry {} ({:?}) is out of order",
                    id, text
                )));
            }
            if index.insert(Box::from(raw), id).is_some() {
                return Err(FormatError::Inconsistent(format!("duplicate entry {:?}", text)));
            }
            entries.push(Entry { raw: Box::from(raw), text, count, kind, subwords: Vec::new() });
        }

        let mut pruneidx = HashMap::new();
        for _ in 0..pruneidx_size.max(0) {
            let from = reader.read_i32("pruneidx key")?;
            let to = reader.read_i32("pruneidx value")?;
            if to < 0 || to as i64 >= pruneidx_size {
                return Err(FormatError::InvalidField { field: "pruneidx value", value: to as i64 });
            }
            pruneidx.insert(from, to);
        }

        let mut dict = Self {
            entries,
            index,
            nwords,
            nlabels,
            pruneidx_size,
            pruneidx,
            bucket: args.bucket,
            minn: args.minn,
            maxn: args.maxn,
            word_ngrams: args.word_ngrams,
        };
        dict.init_ngrams();
        Ok(dict)
    }

    fn init_ngrams(&mut self) {
        for id in 0..self.entries.len() {
            let mut subwords = vec![id];
            if &*self.entries[id].raw != EOS.as_bytes() {
                let wrapped = wrap(&self.entries[id].raw);
                self.compute_subwords(&wrapped, &mut subwords);
            }
            self.entries[id].subwords = subwords;
        }
    }

    /// Number of rows of the input matrix this dictionary can address.
    pub fn input_rows(&self) -> usize {
        if self.pruneidx_size >= 0 {
            self.nwords + self.pruneidx_size as usize
        } else {
            self.nwords + self.bucket
        }
    }

    pub fn nwords(&self) -> usize {
        self.nwords
    }

    pub fn nlabels(&self) -> usize {
        self.nlabels
    }

    /// Entry id of a word or label.
    pub fn id(&self, token: &[u8]) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Entry id of `word` when it is a vocabulary word, not a label.
    pub fn word_id(&self, word: &[u8]) -> Option<usize> {
        self.id(word).filter(|id| *id < self.nwords)
    }

    pub fn word(&self, id: usize) -> Option<&str> {
        if id < self.nwords {
            Some(self.entries[id].text.as_str())
        } else {
            None
        }
    }

    pub fn word_bytes(&self, id: usize) -> Option<&[u8]> {
        if id < self.nwords {
            Some(&self.entries[id].raw)
        } else {
            None
        }
    }

    /// Precomputed input rows of vocabulary word `id`.
    pub fn word_subwords(&self, id: usize) -> &[usize] {
        match self.entries.get(id) {
            Some(entry) if id < self.nwords => entry.subwords.as_slice(),
            _ => &[],
        }
    }

    pub fn label(&self, label_id: usize) -> Option<&str> {
        if label_id < self.nlabels {
            Some(self.entries[self.nwords + label_id].text.as_str())
        } else {
            None
        }
    }

    /// Label frequencies in label-id order.
    pub fn label_counts(&self) -> Vec<i64> {
        self.entries[self.nwords..].iter().map(|e| e.count).collect()
    }

    fn push_hash(&self, out: &mut Vec<usize>, id: i32) {
        if self.pruneidx_size == 0 || id < 0 {
            return;
        }
        let id = if self.pruneidx_size > 0 {
            match self.pruneidx.get(&id) {
                Some(mapped) => *mapped,
                None => return,
            }
        } else {
            id
        };
        out.push(self.nwords + id as usize);
    }

    /// Character n-gram rows of an already BOW/EOW-wrapped word.
    fn compute_subwords(&self, bytes: &[u8], out: &mut Vec<usize>) {
        if self.bucket == 0 {
            return;
        }
        let mut ngram = Vec::with_capacity(self.maxn * 4);
        for i in 0..bytes.len() {
            if bytes[i] & 0xC0 == 0x80 {
                continue;
            }
            ngram.clear();
            let mut j = i;
            let mut n = 1;
            while j < bytes.len() && n <= self.maxn {
                ngram.push(bytes[j]);
                j += 1;
                while j < bytes.len() && bytes[j] & 0xC0 == 0x80 {
                    ngram.push(bytes[j]);
                    j += 1;
                }
                if n >= self.minn && !(n == 1 && (i == 0 || j == bytes.len())) {
                    let h = hash(&ngram) as usize % self.bucket;
                    self.push_hash(out, h as i32);
                }
                n += 1;
            }
        }
    }

    /// Input rows composing `word`. Vocabulary words include their own
    /// row; anything else, labels included, resolves to character n-grams.
    pub fn subwords(&self, word: &[u8]) -> Cow<'_, [usize]> {
        if let Some(id) = self.word_id(word) {
            return Cow::Borrowed(&self.entries[id].subwords);
        }
        let mut ngrams = Vec::new();
        if word != EOS.as_bytes() {
            self.compute_subwords(&wrap(word), &mut ngrams);
        }
        Cow::Owned(ngrams)
    }

    fn add_subwords(&self, line: &mut Vec<usize>, token: &[u8], id: Option<usize>) {
        match id {
            None => {
                if token != EOS.as_bytes() {
                    self.compute_subwords(&wrap(token), line);
                }
            }
            Some(id) if self.maxn == 0 => line.push(id),
            Some(id) => line.extend_from_slice(&self.entries[id].subwords),
        }
    }

    fn add_word_ngrams(&self, line: &mut Vec<usize>, hashes: &[i32]) {
        if self.bucket == 0 {
            return;
        }
        for i in 0..hashes.len() {
            let mut h = hashes[i] as i64 as u64;
            for hash_j in hashes.iter().take((i + self.word_ngrams).min(hashes.len())).skip(i + 1) {
                h = h.wrapping_mul(NGRAM_MULTIPLIER).wrapping_add(*hash_j as i64 as u64);
                self.push_hash(line, (h % self.bucket as u64) as i32);
            }
        }
    }

    /// Input rows for the first line of `text`: words, their subwords, the
    /// end-of-sentence token and word n-grams. Label tokens are skipped.
    pub fn line_ids(&self, text: &str) -> Vec<usize> {
        let first_line = text.split('\n').next().unwrap_or("");
        let mut ids = Vec::new();
        let mut hashes = Vec::new();

        let tokens = first_line
            .split(is_delimiter)
            .filter(|t| !t.is_empty())
            .chain(std::iter::once(EOS));
        for token in tokens {
            let token = token.as_bytes();
            let id = self.id(token);
            let kind = match id {
                Some(id) => self.entries[id].kind,
                None if token.starts_with(LABEL_PREFIX.as_bytes()) => EntryKind::Label,
                None => EntryKind::Word,
            };
            if kind == EntryKind::Word {
                self.add_subwords(&mut ids, token, id);
                hashes.push(hash(token) as i32);
            }
        }
        self.add_word_ngrams(&mut ids, &hashes);
        ids
    }
}
