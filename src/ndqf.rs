//! Negative-definite quadratic form engine.
//!
//! `Ndqf` owns a symmetric negative-definite integer matrix Q and eagerly
//! derives everything the correction-term search needs: the Smith
//! decomposition of Q, the exact rational inverse Q⁻¹ = V⁻¹·D⁻¹·U⁻¹, a
//! common-denominator integer copy of Q⁻¹ for the hot path, the basepoint
//! characteristic covector diag(Q) mod 2, and the discriminant group. All
//! derived state is frozen at construction; queries are read-only and the
//! engine can be shared across threads.
//!
//! The correction terms are found by exhaustive scan of the box
//! |α_i| ≤ |Q_ii|: every characteristic covector (α ≡ diag(Q) mod 2
//! componentwise) belongs to the coset of exactly one precomputed class
//! representative, and each coset keeps the running maximum of αᵗQ⁻¹α. The
//! parallel path splits the box into disjoint linear-index chunks; each
//! worker folds a private per-class maxima array and the arrays are merged
//! by pointwise max, so no shared state is ever written concurrently.
//!
//! Symmetry and definiteness are caller-guaranteed and not re-verified;
//! only squareness and nondegeneracy are checked.

use std::time::Instant;

use num_rational::Ratio;
use rayon::prelude::*;
use tracing::debug;

use crate::error::FormError;
use crate::homology::HomologyGroup;
use crate::matrix::IntMatrix;
use crate::number_theory::lcm;
use crate::smith::{smith_normal_form, SmithDecomposition};

/// A negative-definite integer quadratic form with its derived invariants.
#[derive(Debug, Clone)]
pub struct Ndqf {
    mat: IntMatrix,
    rank: usize,
    diagonal: Vec<i64>,
    decomp: SmithDecomposition,
    inverse: Vec<Vec<Ratio<i64>>>,
    int_inverse: IntMatrix,
    denominator: i64,
    basepoint: Vec<i64>,
    group: HomologyGroup,
}

impl Ndqf {
    /// Builds the engine from a square integer matrix.
    ///
    /// Fails with `NotSquare` for rectangular input and `DegenerateForm`
    /// when an invariant factor is zero; on error no engine is observable.
    pub fn new(mat: &IntMatrix) -> Result<Self, FormError> {
        if !mat.is_square() {
            return Err(FormError::NotSquare {
                rows: mat.rows(),
                cols: mat.cols(),
            });
        }
        let rank = mat.rows();
        let decomp = smith_normal_form(mat)?;
        let diag = decomp.diagonal();
        if let Some(index) = diag.iter().position(|&x| x == 0) {
            return Err(FormError::DegenerateForm { index });
        }
        let inverse = rational_inverse(&diag, &decomp.u_inv, &decomp.v_inv);
        let (int_inverse, denominator) = common_denominator(&inverse);
        let basepoint: Vec<i64> = (0..rank).map(|i| mat[(i, i)].rem_euclid(2)).collect();
        let group = HomologyGroup::from_decomposition(&decomp.d, &decomp.v);
        Ok(Self {
            mat: mat.clone(),
            rank,
            diagonal: mat.diagonal(),
            decomp,
            inverse,
            int_inverse,
            denominator,
            basepoint,
            group,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn matrix(&self) -> &IntMatrix {
        &self.mat
    }

    pub fn decomposition(&self) -> &SmithDecomposition {
        &self.decomp
    }

    pub fn group(&self) -> &HomologyGroup {
        &self.group
    }

    /// Q⁻¹ as exact rationals.
    pub fn inverse(&self) -> &[Vec<Ratio<i64>>] {
        &self.inverse
    }

    /// The common denominator of Q⁻¹ and the matching integer matrix, so
    /// that `int_inverse / denominator == Q⁻¹` entrywise.
    pub fn int_inverse(&self) -> (&IntMatrix, i64) {
        (&self.int_inverse, self.denominator)
    }

    /// The basepoint characteristic covector, diag(Q) mod 2.
    pub fn basepoint(&self) -> &[i64] {
        &self.basepoint
    }

    /// uᵗ·Q⁻¹·u, exactly.
    pub fn eval(&self, u: &[i64]) -> Ratio<i64> {
        Ratio::new(self.eval_int(u), self.denominator)
    }

    /// The numerator of uᵗ·Q⁻¹·u over the common denominator. Integer-only,
    /// used on the hot path of the box scan.
    fn eval_int(&self, u: &[i64]) -> i64 {
        self.int_inverse.bilinear(u, u)
    }

    /// Representative of the coset selected by `coeffs`: basepoint +
    /// 2·Σ coeffs_i·generator_i.
    ///
    /// `coeffs` must have one entry per invariant factor, each within
    /// [0, factor).
    pub fn find_rep(&self, coeffs: &[i64]) -> Result<Vec<i64>, FormError> {
        let structure = self.group.structure();
        if coeffs.len() != structure.len() {
            return Err(FormError::InvalidCoefficients {
                reason: format!(
                    "expected {} coefficients, got {}",
                    structure.len(),
                    coeffs.len()
                ),
            });
        }
        for (i, (&c, &order)) in coeffs.iter().zip(structure).enumerate() {
            if c < 0 || c >= order {
                return Err(FormError::InvalidCoefficients {
                    reason: format!(
                        "coefficient {} is {}, outside [0, {})",
                        i, c, order
                    ),
                });
            }
        }
        let mut rep = self.basepoint.clone();
        for (&c, gen) in coeffs.iter().zip(self.group.generators()) {
            for (r, &g) in rep.iter_mut().zip(gen) {
                *r += 2 * c * g;
            }
        }
        Ok(rep)
    }

    /// True iff `a` and `rep` differ by an element of 2·Q(ℤⁿ).
    ///
    /// Tested as: Q⁻¹·(rep − a) is a vector of even integers, via
    /// divisibility on the common-denominator inverse — no rational
    /// arithmetic on the hot path.
    pub fn same_class(&self, a: &[i64], rep: &[i64]) -> bool {
        let diff: Vec<i64> = rep.iter().zip(a).map(|(r, x)| r - x).collect();
        let sol = self.int_inverse.mul_vec(&diff);
        let modulus = 2 * self.denominator;
        sol.iter().all(|&coord| coord % modulus == 0)
    }

    /// All integer vectors α with |α_i| ≤ |Q_ii|, in a fixed mixed-radix
    /// order (first coordinate fastest). Finite and restartable.
    pub fn characteristic_covectors(&self) -> CovectorIter {
        CovectorIter::new(self.diagonal.iter().map(|&d| d.abs()).collect())
    }

    /// One coset representative per group element, in the fixed mixed-radix
    /// enumeration order over the invariant factors (last coefficient
    /// fastest). The order of the returned correction terms.
    pub fn representatives(&self) -> Vec<Vec<i64>> {
        coefficient_lists(self.group.structure())
            .iter()
            .map(|coeffs| {
                self.find_rep(coeffs)
                    .expect("enumerated coefficients are in range")
            })
            .collect()
    }

    /// The correction terms (max over each coset of αᵗQ⁻¹α + n)/4, one per
    /// group element, ordered like `representatives`.
    ///
    /// The serial and parallel paths scan the same box and produce
    /// identical results; the computation is a pure read-only query.
    pub fn correction_terms(&self, parallel: bool) -> Vec<Ratio<i64>> {
        let reps = self.representatives();
        let start = Instant::now();
        let maxes = if parallel {
            self.scan_parallel(&reps)
        } else {
            self.scan_serial(&reps)
        };
        debug!(
            classes = reps.len(),
            parallel,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "covector box scanned"
        );
        let n = self.rank as i64;
        maxes
            .into_iter()
            .map(|m| {
                let m = m.expect("every coset has a covector in the search box");
                Ratio::new(m + n * self.denominator, 4 * self.denominator)
            })
            .collect()
    }

    /// Folds one covector into a private per-class maxima array.
    fn scan_one(&self, alpha: &[i64], reps: &[Vec<i64>], maxes: &mut [Option<i64>]) {
        let characteristic = alpha
            .iter()
            .zip(&self.diagonal)
            .all(|(a, d)| (a - d) % 2 == 0);
        if !characteristic {
            return;
        }
        if let Some(class) = reps.iter().position(|rep| self.same_class(alpha, rep)) {
            let value = self.eval_int(alpha);
            let slot = &mut maxes[class];
            if slot.map_or(true, |m| value > m) {
                *slot = Some(value);
            }
        }
    }

    fn scan_serial(&self, reps: &[Vec<i64>]) -> Vec<Option<i64>> {
        let mut maxes = vec![None; reps.len()];
        for alpha in self.characteristic_covectors() {
            self.scan_one(&alpha, reps, &mut maxes);
        }
        maxes
    }

    /// Partitions the box into disjoint linear-index chunks; each worker
    /// accumulates into its own maxima array and the arrays merge by
    /// pointwise max. No shared mutable state, so workers cannot lose
    /// updates racing on a class slot.
    fn scan_parallel(&self, reps: &[Vec<i64>]) -> Vec<Option<i64>> {
        let bounds: Vec<i64> = self.diagonal.iter().map(|&d| d.abs()).collect();
        let volume = CovectorIter::new(bounds.clone()).volume();
        let chunks = (rayon::current_num_threads() as u64 * 8).clamp(1, volume.max(1));
        let chunk_size = volume.div_ceil(chunks);
        (0..chunks)
            .into_par_iter()
            .map(|c| {
                let start = c * chunk_size;
                let len = chunk_size.min(volume - start.min(volume));
                let mut maxes = vec![None; reps.len()];
                let iter = CovectorIter::with_start(bounds.clone(), start);
                for alpha in iter.take(len as usize) {
                    self.scan_one(&alpha, reps, &mut maxes);
                }
                maxes
            })
            .reduce(|| vec![None; reps.len()], merge_maxes)
    }
}

fn merge_maxes(mut a: Vec<Option<i64>>, b: Vec<Option<i64>>) -> Vec<Option<i64>> {
    for (x, y) in a.iter_mut().zip(b) {
        *x = match (*x, y) {
            (Some(p), Some(q)) => Some(p.max(q)),
            (p, q) => p.or(q),
        };
    }
    a
}

/// Q⁻¹ = V⁻¹·D⁻¹·U⁻¹, built entrywise as Σ_k V⁻¹[i,k]·U⁻¹[k,j] / d_k.
/// The caller has already rejected zero invariant factors.
fn rational_inverse(diag: &[i64], u_inv: &IntMatrix, v_inv: &IntMatrix) -> Vec<Vec<Ratio<i64>>> {
    let n = diag.len();
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    (0..n)
                        .map(|k| Ratio::new(v_inv[(i, k)] * u_inv[(k, j)], diag[k]))
                        .sum()
                })
                .collect()
        })
        .collect()
}

/// Common-denominator integer copy of a rational matrix: returns (N, q)
/// with N / q equal to the input entrywise and q the lcm of all entry
/// denominators.
fn common_denominator(inverse: &[Vec<Ratio<i64>>]) -> (IntMatrix, i64) {
    let denom = inverse
        .iter()
        .flatten()
        .fold(1i64, |acc, r| lcm(acc, *r.denom()));
    let rows: Vec<Vec<i64>> = inverse
        .iter()
        .map(|row| row.iter().map(|r| r.numer() * (denom / r.denom())).collect())
        .collect();
    let mat = IntMatrix::from_rows(&rows).unwrap_or_else(|| IntMatrix::zeros(0, 0));
    (mat, denom)
}

/// All coefficient lists over the given cyclic orders, last coefficient
/// fastest; a single empty list for the trivial group.
fn coefficient_lists(structure: &[i64]) -> Vec<Vec<i64>> {
    let mut out = Vec::new();
    if structure.iter().any(|&x| x <= 0) {
        return out;
    }
    let mut counter = vec![0i64; structure.len()];
    loop {
        out.push(counter.clone());
        let mut pos = structure.len();
        loop {
            if pos == 0 {
                return out;
            }
            pos -= 1;
            counter[pos] += 1;
            if counter[pos] < structure[pos] {
                break;
            }
            counter[pos] = 0;
        }
    }
}

/// Deterministic mixed-radix walk of the box |α_i| ≤ bounds_i. The first
/// coordinate is the fastest digit; the iterator can be started at any
/// linear index so the box splits into disjoint chunks.
#[derive(Debug, Clone)]
pub struct CovectorIter {
    bounds: Vec<i64>,
    radices: Vec<u64>,
    counter: Vec<i64>,
    index: u64,
    volume: u64,
}

impl CovectorIter {
    fn new(bounds: Vec<i64>) -> Self {
        Self::with_start(bounds, 0)
    }

    fn with_start(bounds: Vec<i64>, start: u64) -> Self {
        let radices: Vec<u64> = bounds.iter().map(|&b| 2 * b as u64 + 1).collect();
        let volume = radices.iter().product();
        let mut rem = start;
        let counter = radices
            .iter()
            .map(|&r| {
                let digit = (rem % r) as i64;
                rem /= r;
                digit
            })
            .collect();
        Self {
            bounds,
            radices,
            counter,
            index: start,
            volume,
        }
    }

    /// Total number of vectors in the box.
    pub fn volume(&self) -> u64 {
        self.volume
    }
}

impl Iterator for CovectorIter {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Vec<i64>> {
        if self.index >= self.volume {
            return None;
        }
        let alpha: Vec<i64> = self
            .counter
            .iter()
            .zip(&self.bounds)
            .map(|(&digit, &b)| digit - b)
            .collect();
        self.index += 1;
        for (digit, &radix) in self.counter.iter_mut().zip(&self.radices) {
            *digit += 1;
            if (*digit as u64) < radix {
                break;
            }
            *digit = 0;
        }
        Some(alpha)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.volume - self.index) as usize;
        (left, Some(left))
    }
}

/// Renders correction terms the way the command line expects them:
/// `num/den`, a bare integer when the denominator is 1, comma-separated.
pub fn render_terms(terms: &[Ratio<i64>]) -> String {
    let parts: Vec<String> = terms
        .iter()
        .map(|t| {
            if *t.denom() == 1 {
                t.numer().to_string()
            } else {
                format!("{}/{}", t.numer(), t.denom())
            }
        })
        .collect();
    parts.join(", ")
}
