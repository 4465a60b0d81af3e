//! Dense row-major matrices.
//!
//! Every batch, weight matrix and gradient in the engine is a [`Matrix`]: a
//! contiguous `Vec<f64>` plus its shape. Samples are rows, features are
//! columns.

use std::ops::{Index, IndexMut, Range};

use crate::matmul::{Operand, gemm_f64};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from a flat row-major buffer with shape `(rows, cols)`.
    pub fn from_flat(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::InvalidData(format!(
                "buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from per-sample rows.
    ///
    /// This copies into contiguous storage. All rows must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::InvalidData("rows must not be empty".to_owned()));
        };

        let cols = first.as_ref().len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::InvalidData(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// A single-column matrix, one row per value.
    pub fn column(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Returns row `idx`.
    ///
    /// Panics if `idx >= rows`.
    #[inline]
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Copy into one `Vec` per row.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    /// Append a constant-1 column (bias augmentation).
    pub fn with_bias_column(&self) -> Self {
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in self.iter_rows() {
            data.extend_from_slice(row);
            data.push(1.0);
        }
        Self {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Drop the last column (the inverse of [`Matrix::with_bias_column`]).
    pub fn without_last_column(&self) -> Self {
        debug_assert!(self.cols > 0);
        let cols = self.cols - 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in self.iter_rows() {
            data.extend_from_slice(&row[..cols]);
        }
        Self {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Rows `range` as a new matrix.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let rows = range.len();
        let data = self.data[range.start * self.cols..range.end * self.cols].to_vec();
        Self {
            rows,
            cols: self.cols,
            data,
        }
    }

    /// Gather the rows listed in `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// `self · rhs`.
    pub(crate) fn matmul(&self, rhs: &Matrix) -> Self {
        debug_assert_eq!(self.cols, rhs.rows);
        let mut out = Self::zeros(self.rows, rhs.cols);
        gemm_f64(
            (self.rows, rhs.cols, self.cols),
            1.0,
            Operand::plain(&self.data, self.cols),
            Operand::plain(&rhs.data, rhs.cols),
            &mut out.data,
        );
        out
    }

    /// `self · rhsᵀ`.
    pub(crate) fn matmul_transposed(&self, rhs: &Matrix) -> Self {
        debug_assert_eq!(self.cols, rhs.cols);
        let mut out = Self::zeros(self.rows, rhs.rows);
        gemm_f64(
            (self.rows, rhs.rows, self.cols),
            1.0,
            Operand::plain(&self.data, self.cols),
            Operand::transposed(&rhs.data, rhs.cols),
            &mut out.data,
        );
        out
    }

    /// `scale * selfᵀ · rhs`.
    pub(crate) fn transposed_matmul(&self, rhs: &Matrix, scale: f64) -> Self {
        debug_assert_eq!(self.rows, rhs.rows);
        let mut out = Self::zeros(self.cols, rhs.cols);
        gemm_f64(
            (self.cols, rhs.cols, self.rows),
            scale,
            Operand::transposed(&self.data, self.cols),
            Operand::plain(&rhs.data, rhs.cols),
            &mut out.data,
        );
        out
    }

    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two same-shaped matrices elementwise.
    pub(crate) fn zip_map(&self, other: &Matrix, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.shape(), other.shape());
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        debug_assert!(r < self.rows && c < self.cols);
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        debug_assert!(r < self.rows && c < self.cols);
        &mut self.data[r * self.cols + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_and_empty_input() {
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        let empty: &[Vec<f64>] = &[];
        assert!(Matrix::from_rows(empty).is_err());
        assert!(Matrix::from_flat(vec![0.0; 5], 2, 3).is_err());
    }

    #[test]
    fn from_flat_rejects_overflowing_shapes() {
        // (2^63 + 2) * 2 wraps to 4 on 64-bit targets.
        let rows = usize::MAX / 2 + 3;
        let err = Matrix::from_flat(vec![0.0; 4], rows, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(Matrix::from_flat(vec![0.0; 4], 2, 2).is_ok());
    }

    #[test]
    fn bias_column_roundtrip() {
        let m = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let aug = m.with_bias_column();
        assert_eq!(aug.shape(), (2, 3));
        assert_eq!(aug.row(1), &[3.0, 4.0, 1.0]);
        assert_eq!(aug.without_last_column(), m);
    }

    #[test]
    fn products_agree_with_hand_computation() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();

        assert_eq!(a.matmul(&b).as_slice(), &[19.0, 22.0, 43.0, 50.0]);
        // a · bᵀ = [1*5+2*6, 1*7+2*8; 3*5+4*6, 3*7+4*8]
        assert_eq!(a.matmul_transposed(&b).as_slice(), &[17.0, 23.0, 39.0, 53.0]);
        // aᵀ · b / 2 = [1*5+3*7, 1*6+3*8; 2*5+4*7, 2*6+4*8] / 2
        assert_eq!(a.transposed_matmul(&b, 0.5).as_slice(), &[13.0, 15.0, 19.0, 22.0]);
    }

    #[test]
    fn row_selection() {
        let m = Matrix::from_rows(&[[0.0], [1.0], [2.0], [3.0]]).unwrap();
        assert_eq!(m.slice_rows(1..3).as_slice(), &[1.0, 2.0]);
        assert_eq!(m.select_rows(&[3, 0]).as_slice(), &[3.0, 0.0]);
        assert_eq!(m[(2, 0)], 2.0);
    }
}
