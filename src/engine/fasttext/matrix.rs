// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense row-major f32 matrix.

use super::reader::ByteReader;
use super::FormatError;

#[derive(Debug, Clone)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    pub(crate) fn read(reader: &mut ByteReader<'_>, what: &'static str) -> Result<Self, FormatError> {
        let rows = reader.read_i64(what)?;
        let cols = reader.read_i64(what)?;
        let rows = usize::try_from(rows).map_err(|_| FormatError::InvalidField { field: what, value: rows })?;
        let cols = usize::try_from(cols).map_err(|_| FormatError::InvalidField { field: what, value: cols })?;
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| FormatError::Inconsistent(format!("{} shape {}x{} overflows", what, rows, cols)))?;
        let data = reader.read_f32_vec(len, what)?;
        Ok(Self { rows, cols, data })
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Self { rows, cols, data }
    }

    #[cfg(test)]
    pub fn from_rows(rows: &[&[f32]]) -> Self {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_vec(rows.len(), cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn dot_row(&self, vec: &[f32], i: usize) -> f32 {
        self.row(i).iter().zip(vec).map(|(a, b)| a * b).sum()
    }

    pub fn add_row_to(&self, vec: &mut [f32], i: usize) {
        for (v, r) in vec.iter_mut().zip(self.row(i)) {
            *v += r;
        }
    }

    pub fn memory_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_shape_and_rows() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i64.to_le_bytes());
        bytes.extend_from_slice(&3i64.to_le_bytes());
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let m = DenseMatrix::read(&mut ByteReader::new(&bytes), "input").unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 3));
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.dot_row(&[1.0, 0.0, 1.0], 0), 4.0);
    }

    #[test]
    fn negative_shape_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i64).to_le_bytes());
        bytes.extend_from_slice(&3i64.to_le_bytes());
        assert!(DenseMatrix::read(&mut ByteReader::new(&bytes), "input").is_err());
    }

    #[test]
    fn add_row_accumulates() {
        let m = DenseMatrix::from_rows(&[&[1.0, 1.0], &[0.5, -1.0]]);
        let mut acc = vec![0.0; 2];
        m.add_row_to(&mut acc, 0);
        m.add_row_to(&mut acc, 1);
        assert_eq!(acc, vec![1.5, 0.0]);
    }
}
