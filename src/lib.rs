//! Exact invariants of negative-definite integer quadratic forms.
//!
//! Given a square, symmetric, negative-definite integer matrix Q, this crate
//! computes:
//!
//! - the Smith Normal Form of Q over the integers, with unimodular tracking
//!   matrices U, V such that U·D·V = Q exactly;
//! - the discriminant group ℤⁿ / Q(ℤⁿ) as an ordered list of invariant
//!   factors, together with generator and relation vectors read off from V;
//! - the correction terms: for every group element, the maximum of αᵗQ⁻¹α
//!   over the characteristic covectors α in that element's coset, mapped
//!   through (max + n)/4.
//!
//! All arithmetic is exact. Matrix entries are `i64`, rational values are
//! `num_rational::Ratio<i64>`; no floating point appears anywhere.
//!
//! # Modules
//!
//! - `number_theory`: extended gcd, divisibility, balanced division
//! - `matrix`: dense integer matrices and elementary row/column operations
//! - `smith`: Smith Normal Form reducer with unimodular tracking
//! - `homology`: discriminant group model and rendering
//! - `ndqf`: the quadratic-form engine and the correction-term search
//!
//! # Example
//!
//! ```
//! use corrterm::{IntMatrix, Ndqf};
//!
//! let q = IntMatrix::from_rows(&[vec![-5, -2], vec![-2, -4]]).unwrap();
//! let form = Ndqf::new(&q).unwrap();
//! assert_eq!(form.group().structure(), &[16]);
//! assert_eq!(form.correction_terms(false).len(), 16);
//! ```

pub mod error;
pub mod homology;
pub mod matrix;
pub mod ndqf;
pub mod number_theory;
pub mod smith;

pub use error::FormError;
pub use homology::HomologyGroup;
pub use matrix::IntMatrix;
pub use ndqf::{render_terms, CovectorIter, Ndqf};
pub use smith::{smith_normal_form, SmithDecomposition, SmithStats};
