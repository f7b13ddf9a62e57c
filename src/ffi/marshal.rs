// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Copying query results into caller-owned buffers.
//!
//! Callers provide `N` string slots of `L` bytes each, plus an optional
//! parallel array of `N` scores. The first `min(produced, N)` results are
//! copied; each string keeps at most `L - 1` bytes and is always
//! NUL-terminated. The report says how much was produced and how much was
//! written so callers can detect truncation.

use std::ffi::c_char;

use thiserror::Error;

use crate::engine::ScoredText;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarshalError {
    #[error("string slot array is null")]
    NullArray,

    #[error("string slot {0} is null")]
    NullSlot(usize),

    #[error("string capacity must be at least 1 byte")]
    ZeroCapacity,

    #[error("score buffer required for scored results")]
    MissingScores,
}

/// Outcome of one copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarshalReport {
    /// Entries (or bytes, for text) the query produced.
    pub produced: usize,
    /// Entries (or bytes) actually written.
    pub written: usize,
    /// Strings that lost bytes to the per-string capacity.
    pub truncated_strings: usize,
}

impl MarshalReport {
    pub fn is_truncated(&self) -> bool {
        self.written < self.produced || self.truncated_strings > 0
    }

    /// `BufferTooSmall` if anything was cut, otherwise the report itself.
    pub fn into_result(self) -> CoreResult<Self> {
        if self.is_truncated() {
            Err(CoreError::BufferTooSmall {
                produced: self.produced,
                written: self.written,
                truncated_strings: self.truncated_strings,
            })
        } else {
            Ok(self)
        }
    }
}

/// Caller-provided array of fixed-capacity string buffers.
pub struct StringSlots<'a> {
    slots: &'a [*mut c_char],
    capacity: usize,
}

impl<'a> StringSlots<'a> {
    /// Wrap `count` slot pointers, each addressing `capacity` writable bytes.
    ///
    /// With `count == 0` the array pointer is never read and may be null.
    ///
    /// # Safety
    /// When `count > 0`, `ptrs` must point to `count` pointers, each of which
    /// is null or valid for `capacity` byte writes for the lifetime `'a`.
    /// The buffers must not overlap.
    pub unsafe fn from_raw(
        ptrs: *const *mut c_char,
        count: usize,
        capacity: usize,
    ) -> Result<Self, MarshalError> {
        if count == 0 {
            return Ok(Self { slots: &[], capacity });
        }
        if ptrs.is_null() {
            return Err(MarshalError::NullArray);
        }
        if capacity == 0 {
            return Err(MarshalError::ZeroCapacity);
        }
        let slots = std::slice::from_raw_parts(ptrs, count);
        if let Some(index) = slots.iter().position(|p| p.is_null()) {
            return Err(MarshalError::NullSlot(index));
        }
        Ok(Self { slots, capacity })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Write `text` into slot `index`. Returns whether it was cut short.
    fn write(&mut self, index: usize, text: &str) -> bool {
        let bytes = text.as_bytes();
        let n = bytes.len().min(self.capacity - 1);
        let dst = self.slots[index];
        // SAFETY: `from_raw` guarantees dst is non-null and valid for
        // `capacity` bytes, and n < capacity.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.cast::<u8>(), n);
            *dst.add(n) = 0;
        }
        n < bytes.len()
    }
}

/// Copies strings, and optionally their scores, into caller buffers.
pub struct BufferMarshaller<'a> {
    strings: StringSlots<'a>,
    scores: Option<&'a mut [f32]>,
}

impl<'a> BufferMarshaller<'a> {
    pub fn new(strings: StringSlots<'a>) -> Self {
        Self { strings, scores: None }
    }

    /// Pair the string slots with a score array; only the first
    /// `strings.len()` scores are ever written.
    pub fn with_scores(strings: StringSlots<'a>, scores: &'a mut [f32]) -> Self {
        Self { strings, scores: Some(scores) }
    }

    pub fn capacity(&self) -> usize {
        self.strings.len()
    }

    /// Copy labels or words together with their scores.
    pub fn copy_scored<T: ScoredText>(&mut self, items: &[T]) -> Result<MarshalReport, MarshalError> {
        let count = items.len().min(self.strings.len());
        let scores = self.scores.as_deref_mut().ok_or(MarshalError::MissingScores)?;
        if scores.len() < count {
            return Err(MarshalError::MissingScores);
        }

        let mut truncated_strings = 0;
        for (i, item) in items.iter().take(count).enumerate() {
            if self.strings.write(i, item.text()) {
                truncated_strings += 1;
            }
            scores[i] = item.score();
        }
        Ok(MarshalReport {
            produced: items.len(),
            written: count,
            truncated_strings,
        })
    }

    /// Copy plain strings.
    pub fn copy_strings<S: AsRef<str>>(&mut self, items: &[S]) -> MarshalReport {
        let count = items.len().min(self.strings.len());
        let mut truncated_strings = 0;
        for (i, item) in items.iter().take(count).enumerate() {
            if self.strings.write(i, item.as_ref()) {
                truncated_strings += 1;
            }
        }
        MarshalReport {
            produced: items.len(),
            written: count,
            truncated_strings,
        }
    }
}

/// Copy up to `out.len()` floats.
pub fn copy_floats(values: &[f32], out: &mut [f32]) -> MarshalReport {
    let count = values.len().min(out.len());
    out[..count].copy_from_slice(&values[..count]);
    MarshalReport {
        produced: values.len(),
        written: count,
        truncated_strings: 0,
    }
}

/// Copy one string into a byte buffer, NUL-terminated. Counts are in bytes,
/// excluding the terminator.
pub fn copy_text(text: &str, out: &mut [u8]) -> Result<MarshalReport, MarshalError> {
    if out.is_empty() {
        return Err(MarshalError::ZeroCapacity);
    }
    let bytes = text.as_bytes();
    let n = bytes.len().min(out.len() - 1);
    out[..n].copy_from_slice(&bytes[..n]);
    out[n] = 0;
    Ok(MarshalReport {
        produced: bytes.len(),
        written: n,
        truncated_strings: usize::from(n < bytes.len()),
    })
}
