//! Error taxonomy for the quadratic-form engine.

use thiserror::Error;

/// Errors surfaced by the Smith reducer and the quadratic-form engine.
///
/// Construction errors abort `Ndqf::new` entirely; no partially-initialized
/// engine is ever observable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The input matrix is not square. Callers are expected to hand the
    /// engine a square form, so hitting this is a precondition violation.
    #[error("input matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },

    /// A zero invariant factor was found where an inverse is required.
    /// The engine defines no semantics for a singular form.
    #[error("degenerate form: invariant factor {index} is zero")]
    DegenerateForm { index: usize },

    /// A coefficient list handed to `find_rep` does not match the group
    /// structure, either in length or in range.
    #[error("invalid coefficient list: {reason}")]
    InvalidCoefficients { reason: String },
}
