//! Dense exact-integer matrices.
//!
//! A small matrix type tailored to the Smith reducer and the quadratic-form
//! engine: `i64` entries, elementary row/column operations, exact products,
//! and a fraction-free (Bareiss) determinant used by the unimodularity
//! checks. Nothing here allocates per-entry or touches floating point.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Dense matrix over `i64`, stored row-major as one vector per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<i64>>,
}

impl IntMatrix {
    /// Builds a matrix from explicit rows. Returns `None` for ragged input.
    pub fn from_rows(rows: &[Vec<i64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.to_vec(),
        })
    }

    /// The n-by-n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i][i] = 1;
        }
        m
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![vec![0; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn row(&self, i: usize) -> &[i64] {
        &self.data[i]
    }

    /// The main diagonal, as a vector of length `min(rows, cols)`.
    pub fn diagonal(&self) -> Vec<i64> {
        (0..self.rows.min(self.cols)).map(|i| self.data[i][i]).collect()
    }

    pub fn swap_rows(&mut self, i: usize, l: usize) {
        self.data.swap(i, l);
    }

    pub fn swap_cols(&mut self, j: usize, k: usize) {
        for row in &mut self.data {
            row.swap(j, k);
        }
    }

    pub fn scale_row(&mut self, i: usize, c: i64) {
        for x in &mut self.data[i] {
            *x *= c;
        }
    }

    pub fn scale_col(&mut self, j: usize, c: i64) {
        for row in &mut self.data {
            row[j] *= c;
        }
    }

    /// row[dst] += c * row[src]
    pub fn add_row_multiple(&mut self, dst: usize, src: usize, c: i64) {
        debug_assert_ne!(dst, src);
        for j in 0..self.cols {
            let x = self.data[src][j];
            self.data[dst][j] += c * x;
        }
    }

    /// col[dst] += c * col[src]
    pub fn add_col_multiple(&mut self, dst: usize, src: usize, c: i64) {
        debug_assert_ne!(dst, src);
        for row in &mut self.data {
            row[dst] += c * row[src];
        }
    }

    /// Exact matrix product. Panics on a dimension mismatch.
    pub fn mul(&self, other: &Self) -> Self {
        assert_eq!(self.cols, other.rows, "dimension mismatch in matrix product");
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0 {
                    continue;
                }
                for j in 0..other.cols {
                    out.data[i][j] += a * other.data[k][j];
                }
            }
        }
        out
    }

    /// Matrix-vector product M·v.
    pub fn mul_vec(&self, v: &[i64]) -> Vec<i64> {
        assert_eq!(self.cols, v.len(), "dimension mismatch in matrix-vector product");
        self.data
            .iter()
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// The bilinear value uᵗ·M·v.
    pub fn bilinear(&self, u: &[i64], v: &[i64]) -> i64 {
        assert_eq!(self.rows, u.len());
        let mv = self.mul_vec(v);
        u.iter().zip(&mv).map(|(a, b)| a * b).sum()
    }

    /// Exact determinant via Bareiss fraction-free elimination.
    ///
    /// Intermediate values are minors of the input, held in `i128`.
    /// Panics on a non-square matrix.
    pub fn det(&self) -> i64 {
        assert!(self.is_square(), "determinant of a non-square matrix");
        let n = self.rows;
        if n == 0 {
            return 1;
        }
        let mut m: Vec<Vec<i128>> = self
            .data
            .iter()
            .map(|r| r.iter().map(|&x| x as i128).collect())
            .collect();
        let mut sign = 1i128;
        let mut prev = 1i128;
        for k in 0..n - 1 {
            if m[k][k] == 0 {
                let Some(swap) = (k + 1..n).find(|&i| m[i][k] != 0) else {
                    return 0;
                };
                m.swap(k, swap);
                sign = -sign;
            }
            for i in k + 1..n {
                for j in k + 1..n {
                    m[i][j] = (m[i][j] * m[k][k] - m[i][k] * m[k][j]) / prev;
                }
                m[i][k] = 0;
            }
            prev = m[k][k];
        }
        (sign * m[n - 1][n - 1]) as i64
    }
}

impl Index<(usize, usize)> for IntMatrix {
    type Output = i64;

    fn index(&self, (i, j): (usize, usize)) -> &i64 {
        &self.data[i][j]
    }
}

impl IndexMut<(usize, usize)> for IntMatrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut i64 {
        &mut self.data[i][j]
    }
}

impl fmt::Display for IntMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.data {
            writeln!(f, "{:?}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged() {
        assert!(IntMatrix::from_rows(&[vec![1, 2], vec![3]]).is_none());
        let m = IntMatrix::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(m[(1, 0)], 3);
        assert!(m.is_square());
    }

    #[test]
    fn elementary_ops() {
        let mut m = IntMatrix::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        m.swap_rows(0, 1);
        assert_eq!(m.row(0), &[3, 4]);
        m.swap_cols(0, 1);
        assert_eq!(m.row(0), &[4, 3]);
        m.scale_row(0, -1);
        assert_eq!(m.row(0), &[-4, -3]);
        m.add_row_multiple(1, 0, 2);
        assert_eq!(m.row(1), &[-6, -5]);
        m.add_col_multiple(0, 1, 1);
        assert_eq!(m[(0, 0)], -7);
    }

    #[test]
    fn product_and_identity() {
        let m = IntMatrix::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        let id = IntMatrix::identity(2);
        assert_eq!(m.mul(&id), m);
        assert_eq!(id.mul(&m), m);
        let sq = m.mul(&m);
        assert_eq!(sq, IntMatrix::from_rows(&[vec![7, 10], vec![15, 22]]).unwrap());
    }

    #[test]
    fn bilinear_value() {
        let m = IntMatrix::from_rows(&[vec![-2, 1], vec![1, -2]]).unwrap();
        assert_eq!(m.bilinear(&[1, 0], &[1, 0]), -2);
        assert_eq!(m.bilinear(&[1, 1], &[1, 1]), -2);
    }

    #[test]
    fn bareiss_determinant() {
        assert_eq!(IntMatrix::identity(4).det(), 1);
        let m = IntMatrix::from_rows(&[vec![1, 3], vec![4, -9]]).unwrap();
        assert_eq!(m.det(), -21);
        let singular = IntMatrix::from_rows(&[vec![2, 4], vec![1, 2]]).unwrap();
        assert_eq!(singular.det(), 0);
        let m3 = IntMatrix::from_rows(&[
            vec![-2, -1, -1],
            vec![-1, -2, -1],
            vec![-1, -1, -2],
        ])
        .unwrap();
        assert_eq!(m3.det(), -4);
        // zero pivot forces a row swap
        let m4 = IntMatrix::from_rows(&[vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(m4.det(), -1);
    }
}
