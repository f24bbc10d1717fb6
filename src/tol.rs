//! The single process-wide floating-point tolerance τ.
//!
//! Purpose
//! - Centralize the one epsilon used for every near-zero and near-equality
//!   comparison in the crate, collapsing the teacher's separate
//!   `eps_det`/`eps_feas`/`eps_tau` knobs (see `geom2::types::GeomCfg` in the
//!   reference pack) into a single constant, as the abstraction algorithms
//!   are tuned for one τ and are not meant to be scale-independent.
//!
//! Why this design
//! - `<`, `=`, `<=` between reals are not distinguished anywhere in this
//!   crate: every comparison is τ-fuzzy. Call sites that need a directional
//!   (permissive vs. strict) slack pass a signed offset of τ explicitly,
//!   mirroring the teacher's `contains_eps(p, eps)` convention, rather than
//!   introducing a second named constant.

/// Default tolerance. Tuned for the geometry in this crate; do not scale it
/// per-dimension or per-call without re-auditing every comparison site.
pub const DEFAULT_TAU: f64 = 1e-8;

/// τ-fuzzy `a < b`.
#[inline]
pub fn lt(a: f64, b: f64, tau: f64) -> bool {
    a < b - tau
}

/// τ-fuzzy `a <= b`.
#[inline]
pub fn le(a: f64, b: f64, tau: f64) -> bool {
    a <= b + tau
}

/// τ-fuzzy `a == b`.
#[inline]
pub fn eq(a: f64, b: f64, tau: f64) -> bool {
    (a - b).abs() <= tau
}

/// τ-fuzzy `a == 0`.
#[inline]
pub fn is_zero(a: f64, tau: f64) -> bool {
    a.abs() <= tau
}

/// Using `DEFAULT_TAU`.
#[inline]
pub fn lt_default(a: f64, b: f64) -> bool {
    lt(a, b, DEFAULT_TAU)
}

/// Using `DEFAULT_TAU`.
#[inline]
pub fn le_default(a: f64, b: f64) -> bool {
    le(a, b, DEFAULT_TAU)
}

/// Using `DEFAULT_TAU`.
#[inline]
pub fn eq_default(a: f64, b: f64) -> bool {
    eq(a, b, DEFAULT_TAU)
}
