//! Integer arithmetic utilities.
//!
//! Leaf module: pure functions on `i64`, no shared state. Everything here is
//! exact; the balanced division routine exists to keep intermediate matrix
//! entries small during Smith reduction, which is a performance concern, not
//! a correctness one.

use num_integer::Integer;

/// Extended Euclidean algorithm.
///
/// Returns `(g, (u, v))` with `g >= 0` and `u * a + v * b == g`.
/// `g` is zero only when both arguments are zero.
pub fn extended_gcd(a: i64, b: i64) -> (i64, (i64, i64)) {
    let (mut old_r, mut r) = (a.abs(), b.abs());
    let (mut old_u, mut u) = (1i64, 0i64);
    let (mut old_v, mut v) = (0i64, 1i64);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_u, u) = (u, old_u - q * u);
        (old_v, v) = (v, old_v - q * v);
    }
    let u = if a < 0 { -old_u } else { old_u };
    let v = if b < 0 { -old_v } else { old_v };
    (old_r, (u, v))
}

/// True iff `a` divides `b`. Zero divides only zero.
pub fn divides(a: i64, b: i64) -> bool {
    if a == 0 {
        b == 0
    } else {
        b % a == 0
    }
}

/// Division with minimal-magnitude remainder.
///
/// Returns `(q, r)` with `a == q * b + r` and `|r| <= |b| / 2`.
/// `balanced_div(a, 0)` is `(0, a)`.
///
/// On an exact tie (`|b|` even, both remainders of magnitude `|b|/2`), the
/// remainder carrying the sign of `b` is returned, matching floor division.
pub fn balanced_div(a: i64, b: i64) -> (i64, i64) {
    if b == 0 {
        return (0, a);
    }
    let q = a.div_floor(&b);
    let r1 = a.mod_floor(&b);
    let r2 = a.mod_floor(&-b);
    if r1.abs() <= r2.abs() {
        (q, r1)
    } else {
        (q + 1, r2)
    }
}

/// Least common multiple; zero when either argument is zero.
pub fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        return 0;
    }
    let (g, _) = extended_gcd(a, b);
    (a / g * b).abs()
}
