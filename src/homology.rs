//! Discriminant (homology) group of a nondegenerate integer form.
//!
//! Derived once from a Smith decomposition and read-only thereafter. The
//! i-th row of V presents a cyclic factor ℤ/d_i of the quotient module
//! ℤⁿ / M·ℤⁿ; factors with d_i = 1 are trivial and dropped, so the group is
//! carried by the last rows of V.

use std::fmt;

use serde::Serialize;

use crate::matrix::IntMatrix;

/// A finite abelian group presented by invariant factors, with generator
/// and relation vectors taken from the right Smith tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomologyGroup {
    structure: Vec<i64>,
    generators: Vec<Vec<i64>>,
    relations: Vec<Vec<i64>>,
}

impl HomologyGroup {
    /// Reads the group off a post-normalization diagonal D and tracker V.
    ///
    /// Rows of V whose invariant factor is 1 map to the identity and become
    /// relations; the remaining (trailing) rows generate the group, in the
    /// same order as their invariant factors.
    pub fn from_decomposition(d: &IntMatrix, v: &IntMatrix) -> Self {
        let diag = d.diagonal();
        let structure: Vec<i64> = diag.iter().copied().filter(|&x| x.abs() != 1).collect();
        let n = v.rows();
        let start = n - structure.len();
        let generators = (start..n).map(|i| v.row(i).to_vec()).collect();
        let relations = (0..start).map(|i| v.row(i).to_vec()).collect();
        Self {
            structure,
            generators,
            relations,
        }
    }

    /// Ordered invariant factors greater than 1; empty for the trivial group.
    pub fn structure(&self) -> &[i64] {
        &self.structure
    }

    /// Generator vectors, one per invariant factor, in structure order.
    pub fn generators(&self) -> &[Vec<i64>] {
        &self.generators
    }

    /// Relation vectors (congruent to the identity). Kept for diagnostics.
    pub fn relations(&self) -> &[Vec<i64>] {
        &self.relations
    }

    /// Number of elements; 1 for the trivial group.
    pub fn order(&self) -> u64 {
        self.structure.iter().map(|&x| x.unsigned_abs()).product()
    }

    /// Long-form description listing generators with orders and relations.
    pub fn describe(&self) -> String {
        let mut out = Vec::new();
        out.push(format!("Structure decomposition: H_1(Y) ~ {}.", self));
        out.push("Generating vectors in order of invariant factor:".to_string());
        if self.generators.is_empty() {
            out.push("     (No generators, trivial)".to_string());
        } else {
            for (gen, order) in self.generators.iter().zip(&self.structure) {
                out.push(format!("    {:?} has order {}.", gen, order));
            }
        }
        out.push("Relation vectors (congruent to 0):".to_string());
        if self.relations.is_empty() {
            out.push("     (No relations, free)".to_string());
        } else {
            for rel in &self.relations {
                out.push(format!("    {:?}", rel));
            }
        }
        out.join("\n")
    }
}

fn cyclic_factor(n: i64) -> String {
    match n.abs() {
        0 => "Z".to_string(),
        1 => "1".to_string(),
        m => format!("Z/{}Z", m),
    }
}

impl fmt::Display for HomologyGroup {
    /// The decomposition string, e.g. `Z/3ZxZ/9Z`; `1` for the trivial group.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.structure.is_empty() {
            return write!(f, "1");
        }
        let parts: Vec<String> = self.structure.iter().map(|&x| cyclic_factor(x)).collect();
        write!(f, "{}", parts.join("x"))
    }
}
