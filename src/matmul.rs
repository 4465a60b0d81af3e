//! Strided GEMM used by the forward and backward passes.
//!
//! Two backends sit behind one function:
//! - default: a safe triple loop
//! - feature `matrixmultiply`: `matrixmultiply::dgemm`
//!
//! Operands are strided views, so a transposed factor is just a view with
//! its strides swapped and is never materialized.

/// A read-only `(rows, cols)` view over row-major or transposed storage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Operand<'a> {
    data: &'a [f64],
    row_stride: usize,
    col_stride: usize,
}

impl<'a> Operand<'a> {
    /// `data` read as stored, `cols` values per row.
    #[inline]
    pub(crate) fn plain(data: &'a [f64], cols: usize) -> Self {
        Self {
            data,
            row_stride: cols,
            col_stride: 1,
        }
    }

    /// The transpose of a row-major matrix with `cols` values per row.
    #[inline]
    pub(crate) fn transposed(data: &'a [f64], cols: usize) -> Self {
        Self {
            data,
            row_stride: 1,
            col_stride: cols,
        }
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.row_stride + c * self.col_stride]
    }
}

/// Overwrite the row-major `(m, n)` buffer `out` with `scale * A B`, where
/// `A` is `(m, k)` and `B` is `(k, n)`.
#[inline]
pub(crate) fn gemm_f64(
    (m, n, k): (usize, usize, usize),
    scale: f64,
    a: Operand<'_>,
    b: Operand<'_>,
    out: &mut [f64],
) {
    debug_assert_eq!(out.len(), m * n);
    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        out.fill(0.0);
        return;
    }

    #[cfg(feature = "matrixmultiply")]
    // SAFETY: every `Matrix` call site sizes `a`, `b` and `out` to the
    // shapes passed here, so all strided reads and writes stay in bounds.
    unsafe {
        matrixmultiply::dgemm(
            m,
            k,
            n,
            scale,
            a.data.as_ptr(),
            a.row_stride as isize,
            a.col_stride as isize,
            b.data.as_ptr(),
            b.row_stride as isize,
            b.col_stride as isize,
            0.0,
            out.as_mut_ptr(),
            n as isize,
            1,
        );
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for (i, out_row) in out.chunks_exact_mut(n).enumerate() {
        for (j, cell) in out_row.iter_mut().enumerate() {
            let dot = (0..k).fold(0.0_f64, |acc, p| a.at(i, p).mul_add(b.at(p, j), acc));
            *cell = scale * dot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_product() {
        // [1 2; 3 4] * [5 6; 7 8] = [19 22; 43 50]
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [f64::NAN; 4];
        gemm_f64((2, 2, 2), 1.0, Operand::plain(&a, 2), Operand::plain(&b, 2), &mut c);
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn transposed_left_operand() {
        // 0.5 * Aᵀ I with A = [1 2; 3 4]: Aᵀ = [1 3; 2 4].
        let a = [1.0, 2.0, 3.0, 4.0];
        let eye = [1.0, 0.0, 0.0, 1.0];
        let mut c = [0.0; 4];
        gemm_f64((2, 2, 2), 0.5, Operand::transposed(&a, 2), Operand::plain(&eye, 2), &mut c);
        assert_eq!(c, [0.5, 1.5, 1.0, 2.0]);
    }

    #[test]
    fn rectangular_with_transposed_right_operand() {
        // [1 2 3] (1x3) times Bᵀ where B = [1 0 1; 0 1 0] (2x3) gives [4 2].
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let mut c = [0.0; 2];
        gemm_f64((1, 2, 3), 1.0, Operand::plain(&a, 3), Operand::transposed(&b, 3), &mut c);
        assert_eq!(c, [4.0, 2.0]);
    }
}
