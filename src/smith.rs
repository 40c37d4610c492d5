//! Smith Normal Form over the integers, with unimodular tracking.
//!
//! Given a square integer matrix M, computes a diagonal D and unimodular
//! U, V with U·D·V = M exactly, where the diagonal entries are nonnegative
//! and each divides the next. The algorithm follows Havas–Majewski integer
//! matrix diagonalization: pick the pivot minimizing the product of its row
//! and column sums of squares, clear the first row and column ("facade") by
//! balanced division, then shrink the working window by one and repeat.
//! A final pass restores the divisibility chain and normalizes signs.
//!
//! The reducer keeps a single full-size working matrix and a window start
//! index instead of physically slicing submatrices, so every elementary
//! operation is recorded at absolute indices and the trackers never need
//! index translation.
//!
//! Each elementary operation on the working matrix is mirrored as its
//! inverse on U and V, and as itself on U⁻¹ and V⁻¹. An elementary
//! operation's inverse is again elementary, so the exact integer inverses
//! of the unimodular trackers come for free; no matrix is ever inverted.

use serde::Serialize;
use tracing::debug;

use crate::error::FormError;
use crate::matrix::IntMatrix;
use crate::number_theory::{balanced_div, divides};

/// A Smith decomposition U·D·V = M.
#[derive(Debug, Clone)]
pub struct SmithDecomposition {
    /// Diagonal matrix of invariant factors, nonnegative, chained by
    /// divisibility.
    pub d: IntMatrix,
    /// Left unimodular tracker.
    pub u: IntMatrix,
    /// Right unimodular tracker. Its last rows generate the quotient module.
    pub v: IntMatrix,
    /// Exact integer inverse of `u`.
    pub u_inv: IntMatrix,
    /// Exact integer inverse of `v`.
    pub v_inv: IntMatrix,
    /// Operation counts collected during reduction.
    pub stats: SmithStats,
}

impl SmithDecomposition {
    /// The diagonal of D.
    pub fn diagonal(&self) -> Vec<i64> {
        self.d.diagonal()
    }
}

/// Operation counts for one reduction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SmithStats {
    pub pivot_selections: usize,
    pub swaps: usize,
    pub row_ops: usize,
    pub col_ops: usize,
    pub chain_fixups: usize,
}

/// Computes the Smith Normal Form of a square integer matrix.
///
/// Returns `FormError::NotSquare` for rectangular input; reduction itself
/// cannot fail.
pub fn smith_normal_form(mat: &IntMatrix) -> Result<SmithDecomposition, FormError> {
    if !mat.is_square() {
        return Err(FormError::NotSquare {
            rows: mat.rows(),
            cols: mat.cols(),
        });
    }
    let n = mat.rows();
    let mut reducer = Reducer::new(mat.clone());
    reducer.diagonalize();
    // Bottom-up, so each window's corner sign is fixed after all deeper
    // windows are already chained.
    for s in (0..n).rev() {
        reducer.solve_diagonal(s);
    }
    debug!(
        pivots = reducer.stats.pivot_selections,
        row_ops = reducer.stats.row_ops,
        col_ops = reducer.stats.col_ops,
        fixups = reducer.stats.chain_fixups,
        "smith reduction complete"
    );
    Ok(reducer.into_decomposition())
}

struct Reducer {
    n: usize,
    m: IntMatrix,
    u: IntMatrix,
    v: IntMatrix,
    u_inv: IntMatrix,
    v_inv: IntMatrix,
    stats: SmithStats,
}

impl Reducer {
    fn new(m: IntMatrix) -> Self {
        let n = m.rows();
        Self {
            n,
            m,
            u: IntMatrix::identity(n),
            v: IntMatrix::identity(n),
            u_inv: IntMatrix::identity(n),
            v_inv: IntMatrix::identity(n),
            stats: SmithStats::default(),
        }
    }

    fn into_decomposition(self) -> SmithDecomposition {
        SmithDecomposition {
            d: self.m,
            u: self.u,
            v: self.v,
            u_inv: self.u_inv,
            v_inv: self.v_inv,
            stats: self.stats,
        }
    }

    // Elementary operations. The working matrix takes the operation, U and V
    // take its inverse (keeping U·A·V constant), U⁻¹ and V⁻¹ take the
    // operation itself.

    fn row_swap(&mut self, i: usize, l: usize) {
        if i == l {
            return;
        }
        self.m.swap_rows(i, l);
        self.u.swap_cols(i, l);
        self.u_inv.swap_rows(i, l);
        self.stats.swaps += 1;
    }

    fn col_swap(&mut self, j: usize, k: usize) {
        if j == k {
            return;
        }
        self.m.swap_cols(j, k);
        self.v.swap_rows(j, k);
        self.v_inv.swap_cols(j, k);
        self.stats.swaps += 1;
    }

    /// row[dst] += c * row[src] on the working matrix.
    fn row_combine(&mut self, dst: usize, src: usize, c: i64) {
        if c == 0 {
            return;
        }
        self.m.add_row_multiple(dst, src, c);
        self.u.add_col_multiple(src, dst, -c);
        self.u_inv.add_row_multiple(dst, src, c);
        self.stats.row_ops += 1;
    }

    /// col[dst] += c * col[src] on the working matrix.
    fn col_combine(&mut self, dst: usize, src: usize, c: i64) {
        if c == 0 {
            return;
        }
        self.m.add_col_multiple(dst, src, c);
        self.v.add_row_multiple(src, dst, -c);
        self.v_inv.add_col_multiple(dst, src, c);
        self.stats.col_ops += 1;
    }

    fn row_negate(&mut self, i: usize) {
        self.m.scale_row(i, -1);
        self.u.scale_col(i, -1);
        self.u_inv.scale_row(i, -1);
    }

    // Window predicates. The window at `s` is the trailing block with rows
    // and columns in s..n; its facade is row s and column s minus the corner.

    fn window_all_zero(&self, s: usize) -> bool {
        (s..self.n).all(|i| (s..self.n).all(|j| self.m[(i, j)] == 0))
    }

    fn facade_all_zero(&self, s: usize) -> bool {
        (s + 1..self.n).all(|k| self.m[(s, k)] == 0 && self.m[(k, s)] == 0)
    }

    fn window_is_diagonal(&self, s: usize) -> bool {
        (s..self.n).all(|i| (s..self.n).all(|j| i == j || self.m[(i, j)] == 0))
    }

    fn chain_ok(&self, s: usize) -> bool {
        (s..self.n.saturating_sub(1)).all(|i| divides(self.m[(i, i)], self.m[(i + 1, i + 1)]))
    }

    /// Product of the row and column sums of squares through (i, j),
    /// restricted to the window. The pivot-selection figure of merit.
    fn norm_product(&self, s: usize, i: usize, j: usize) -> i128 {
        let row: i128 = (s..self.n)
            .map(|k| (self.m[(i, k)] as i128) * (self.m[(i, k)] as i128))
            .sum();
        let col: i128 = (s..self.n)
            .map(|k| (self.m[(k, j)] as i128) * (self.m[(k, j)] as i128))
            .sum();
        row * col
    }

    /// Best pivot in the whole window: least norm product, ties broken by
    /// least magnitude, then by row-major scan order. The window must
    /// contain a nonzero entry.
    fn best_pivot_window(&self, s: usize) -> (usize, usize) {
        let mut best: Option<((i128, i64), (usize, usize))> = None;
        for i in s..self.n {
            for j in s..self.n {
                let val = self.m[(i, j)];
                if val == 0 {
                    continue;
                }
                let key = (self.norm_product(s, i, j), val.abs());
                if best.as_ref().map_or(true, |(k, _)| key < *k) {
                    best = Some((key, (i, j)));
                }
            }
        }
        best.map(|(_, p)| p).unwrap_or((s, s))
    }

    /// Best pivot among the nonzero facade entries, scanning the row part
    /// before the column part; (s, s) when the facade is already clear.
    fn best_pivot_facade(&self, s: usize) -> (usize, usize) {
        let mut best: Option<((i128, i64), (usize, usize))> = None;
        let row_part = (s + 1..self.n).map(|j| (s, j));
        let col_part = (s + 1..self.n).map(|i| (i, s));
        for (i, j) in row_part.chain(col_part) {
            let val = self.m[(i, j)];
            if val == 0 {
                continue;
            }
            let key = (self.norm_product(s, i, j), val.abs());
            if best.as_ref().map_or(true, |(k, _)| key < *k) {
                best = Some((key, (i, j)));
            }
        }
        best.map(|(_, p)| p).unwrap_or((s, s))
    }

    /// Reduces the facade of window `s` to zero.
    ///
    /// Each pass divides every facade entry by the corner with balanced
    /// division and subtracts the matching multiple of the corner row or
    /// column, leaving minimal-magnitude remainders; the best surviving
    /// remainder is then swapped into the corner and the pass repeats. The
    /// corner magnitude at least halves per pass, so this terminates.
    fn clear_facade(&mut self, s: usize) {
        while !self.facade_all_zero(s) {
            let pivot = self.m[(s, s)];
            for i in s + 1..self.n {
                let (q, _) = balanced_div(self.m[(i, s)], pivot);
                self.row_combine(i, s, -q);
            }
            for j in s + 1..self.n {
                let (q, _) = balanced_div(self.m[(s, j)], pivot);
                self.col_combine(j, s, -q);
            }
            let (i, j) = self.best_pivot_facade(s);
            self.row_swap(i, s);
            self.col_swap(j, s);
        }
    }

    /// Diagonalizes the working matrix, one window at a time.
    fn diagonalize(&mut self) {
        for s in 0..self.n {
            if self.window_all_zero(s) {
                break;
            }
            let (i, j) = self.best_pivot_window(s);
            self.stats.pivot_selections += 1;
            self.row_swap(i, s);
            self.col_swap(j, s);
            self.clear_facade(s);
        }
    }

    /// Restores the divisibility chain on the diagonal from window `s` and
    /// normalizes the corner sign.
    ///
    /// Whenever the corner fails to divide some window entry, that entry's
    /// column is added into the corner column; the reintroduced facade entry
    /// is cleared again, which replaces the corner with a common divisor.
    /// Clearing may disturb deeper windows, so the sub-window is re-solved
    /// and the whole window re-checked afterwards.
    fn solve_diagonal(&mut self, s: usize) {
        if s >= self.n {
            return;
        }
        if self.window_is_diagonal(s) && self.chain_ok(s) {
            if self.m[(s, s)] < 0 {
                self.row_negate(s);
            }
            return;
        }
        let mut pivot = self.m[(s, s)];
        for i in s..self.n {
            for j in s..self.n {
                if !divides(pivot, self.m[(i, j)]) {
                    self.stats.chain_fixups += 1;
                    self.col_combine(s, j, 1);
                    self.clear_facade(s);
                    pivot = self.m[(s, s)];
                }
            }
        }
        self.solve_diagonal(s + 1);
        self.solve_diagonal(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snf(rows: &[Vec<i64>]) -> SmithDecomposition {
        let m = IntMatrix::from_rows(rows).unwrap();
        smith_normal_form(&m).unwrap()
    }

    fn check_invariants(rows: &[Vec<i64>]) -> SmithDecomposition {
        let m = IntMatrix::from_rows(rows).unwrap();
        let dec = smith_normal_form(&m).unwrap();
        // exact round trip
        assert_eq!(dec.u.mul(&dec.d).mul(&dec.v), m, "U*D*V != M");
        // diagonal, nonnegative, chained
        let n = m.rows();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    assert_eq!(dec.d[(i, j)], 0, "D not diagonal");
                }
            }
            assert!(dec.d[(i, i)] >= 0, "negative invariant factor");
        }
        for i in 0..n.saturating_sub(1) {
            assert!(
                divides(dec.d[(i, i)], dec.d[(i + 1, i + 1)]),
                "divisibility chain broken: {:?}",
                dec.diagonal()
            );
        }
        // unimodular trackers with exact inverses
        assert_eq!(dec.u.det().abs(), 1, "U not unimodular");
        assert_eq!(dec.v.det().abs(), 1, "V not unimodular");
        let id = IntMatrix::identity(n);
        assert_eq!(dec.u.mul(&dec.u_inv), id);
        assert_eq!(dec.v.mul(&dec.v_inv), id);
        dec
    }

    #[test]
    fn rejects_non_square() {
        let m = IntMatrix::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert!(matches!(
            smith_normal_form(&m),
            Err(FormError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn unimodular_inputs_reduce_to_identity() {
        for rows in [
            vec![vec![1, 1], vec![0, 1]],
            vec![vec![1, 0], vec![1, 1]],
            vec![vec![1, -17], vec![0, 1]],
        ] {
            let dec = check_invariants(&rows);
            assert_eq!(dec.d, IntMatrix::identity(2));
        }
    }

    #[test]
    fn known_diagonals() {
        assert_eq!(check_invariants(&[vec![1, 3], vec![4, -9]]).diagonal(), vec![1, 21]);
        assert_eq!(
            check_invariants(&[vec![-5, -2], vec![-2, -4]]).diagonal(),
            vec![1, 16]
        );
        assert_eq!(
            check_invariants(&[
                vec![88, 56, 97],
                vec![31, 32, 12],
                vec![78, 58, 43],
            ])
            .diagonal(),
            vec![1, 1, 30098]
        );
    }

    #[test]
    fn five_by_five_plumbing_form() {
        let dec = check_invariants(&[
            vec![-2, 1, 0, 0, 0],
            vec![1, -3, 1, 1, 0],
            vec![0, 1, -2, 0, 0],
            vec![0, 1, 0, -2, 1],
            vec![0, 0, 0, 1, -2],
        ]);
        assert_eq!(dec.diagonal(), vec![1, 1, 1, 1, 16]);
    }

    #[test]
    fn zero_and_singular_matrices() {
        let dec = check_invariants(&[vec![0, 0], vec![0, 0]]);
        assert_eq!(dec.diagonal(), vec![0, 0]);
        // rank one
        let dec = check_invariants(&[vec![2, 4], vec![1, 2]]);
        assert_eq!(dec.diagonal(), vec![1, 0]);
    }

    #[test]
    fn one_by_one() {
        assert_eq!(check_invariants(&[vec![-1]]).diagonal(), vec![1]);
        assert_eq!(check_invariants(&[vec![-7]]).diagonal(), vec![7]);
        assert_eq!(check_invariants(&[vec![0]]).diagonal(), vec![0]);
    }

    #[test]
    fn reduction_is_deterministic() {
        let rows = vec![
            vec![-3, -2, -1, -1],
            vec![-2, -5, -2, -3],
            vec![-1, -2, -4, -3],
            vec![-1, -3, -3, -5],
        ];
        let a = snf(&rows);
        let b = snf(&rows);
        assert_eq!(a.d, b.d);
        assert_eq!(a.u, b.u);
        assert_eq!(a.v, b.v);
        assert_eq!(a.stats.pivot_selections, b.stats.pivot_selections);
    }

    #[test]
    fn diagonal_input_gets_chained() {
        // 2 does not divide 17; the fixup pass must run.
        let dec = check_invariants(&[vec![2, 0], vec![0, 17]]);
        assert_eq!(dec.diagonal(), vec![1, 34]);
        let dec = check_invariants(&[vec![6, 0, 0], vec![0, 4, 0], vec![0, 0, 10]]);
        assert_eq!(dec.diagonal(), vec![2, 2, 60]);
    }
}
