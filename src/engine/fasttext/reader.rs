// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounds-checked little-endian cursor over a model byte slice.
//!
//! Every read fails with `FormatError::Truncated` instead of panicking when
//! the file ends early.

use super::FormatError;

pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], FormatError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(FormatError::Truncated { what, offset: self.offset })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], FormatError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, what)?);
        Ok(buf)
    }

    pub fn read_i8(&mut self, what: &'static str) -> Result<i8, FormatError> {
        Ok(i8::from_le_bytes(self.array::<1>(what)?))
    }

    pub fn read_bool(&mut self, what: &'static str) -> Result<bool, FormatError> {
        Ok(self.array::<1>(what)?[0] != 0)
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32, FormatError> {
        Ok(i32::from_le_bytes(self.array::<4>(what)?))
    }

    pub fn read_i64(&mut self, what: &'static str) -> Result<i64, FormatError> {
        Ok(i64::from_le_bytes(self.array::<8>(what)?))
    }

    pub fn read_f64(&mut self, what: &'static str) -> Result<f64, FormatError> {
        Ok(f64::from_le_bytes(self.array::<8>(what)?))
    }

    /// Read a NUL-terminated byte string, terminator excluded.
    pub fn read_cstr(&mut self, what: &'static str) -> Result<&'a [u8], FormatError> {
        let rest = &self.bytes[self.offset..];
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(FormatError::Truncated { what, offset: self.offset })?;
        let raw = self.take(len, what)?;
        self.offset += 1;
        Ok(raw)
    }

    /// Read `count` little-endian f32 values.
    pub fn read_f32_vec(&mut self, count: usize, what: &'static str) -> Result<Vec<f32>, FormatError> {
        let len = count
            .checked_mul(4)
            .ok_or(FormatError::Truncated { what, offset: self.offset })?;
        let raw = self.take(len, what)?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}
