//! Oriented halfspace `n . x <= o`, normalized normal, trivial/infeasible
//! sentinels.
//!
//! Purpose
//! - A halfspace that survives rank-reducing transforms without losing its
//!   set-theoretic meaning: when a transform collapses the normal to zero,
//!   the offset becomes `+-infinity` to remember whether the halfspace was
//!   "everything" or "nothing" at the moment it degenerated.
//!
//! References
//! - Teacher precedent: `geom2::types::Hs2` (`n . x <= c`, no normalization
//!   there because its normals are freshly constructed per polygon edge and
//!   kept unit-length by the callers; this layer normalizes at the
//!   boundary instead, since halfspaces here are also built from parsed
//!   text and from `applyRight`, where the caller cannot guarantee a unit
//!   normal).

pub mod parser;

use std::fmt;

use crate::error::{Error, Result};
use crate::linalg::{self, Matrix, Vector};
use crate::tol::{self, DEFAULT_TAU};

/// Closed halfspace `{ x : n . x <= o }`, with `n` normalized to unit length
/// at construction. `o = +infinity` denotes the trivial halfspace (all of
/// `R^d`); `o = -infinity` denotes the infeasible halfspace (the empty set).
#[derive(Clone, Debug)]
pub struct Halfspace {
    n: Vector,
    o: f64,
}

impl Halfspace {
    /// Normalize `(n, o)` into a halfspace. A zero (or near-zero) normal
    /// degenerates to trivial if `o >= 0`, infeasible otherwise, preserving
    /// the sign of `o` as `+-infinity` so dimensionality-changing transforms
    /// keep their meaning.
    pub fn normalize(n: Vector, o: f64) -> Self {
        let norm = linalg::norm(&n);
        if norm <= DEFAULT_TAU {
            let sentinel = if o >= 0.0 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            };
            return Self {
                n: linalg::zeros(n.len()),
                o: sentinel,
            };
        }
        Self {
            n: n / norm,
            o: o / norm,
        }
    }

    /// The trivial halfspace (all of `R^d`).
    pub fn trivial(d: usize) -> Self {
        Self {
            n: linalg::zeros(d),
            o: f64::INFINITY,
        }
    }

    /// The infeasible halfspace (empty set) of dimension `d`.
    pub fn infeasible(d: usize) -> Self {
        Self {
            n: linalg::zeros(d),
            o: f64::NEG_INFINITY,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.n.len()
    }

    #[inline]
    pub fn normal(&self) -> &Vector {
        &self.n
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.o
    }

    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.o == f64::INFINITY
    }

    #[inline]
    pub fn is_infeasible(&self) -> bool {
        self.o == f64::NEG_INFINITY
    }

    /// Negate normal and offset: `{x : n.x <= o}` becomes `{x : -n.x <= -o}`.
    pub fn flip(&self) -> Self {
        if self.is_trivial() {
            return Self::infeasible(self.dim());
        }
        if self.is_infeasible() {
            return Self::trivial(self.dim());
        }
        Self {
            n: -self.n.clone(),
            o: -self.o,
        }
    }

    /// `n . p - o < tau`.
    pub fn contains(&self, p: &Vector) -> bool {
        self.contains_eps(p, DEFAULT_TAU)
    }

    /// Membership with an explicit (possibly signed) slack.
    pub fn contains_eps(&self, p: &Vector, eps: f64) -> bool {
        if self.is_trivial() {
            return true;
        }
        if self.is_infeasible() {
            return false;
        }
        self.n.dot(p) <= self.o + eps
    }

    /// Translate: offset becomes `o + n . v`; normal unchanged.
    pub fn translate(&self, v: &Vector) -> Result<Self> {
        if self.is_trivial() || self.is_infeasible() {
            if v.len() != self.dim() {
                return Err(Error::DimensionMismatch {
                    expected: self.dim(),
                    found: v.len(),
                    context: "Halfspace::translate",
                });
            }
            return Ok(self.clone());
        }
        if v.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: v.len(),
                context: "Halfspace::translate",
            });
        }
        Ok(Self {
            n: self.n.clone(),
            o: self.o + self.n.dot(v),
        })
    }

    /// New halfspace with normal `M . n`, re-normalized; `M` may change the
    /// ambient dimension (`M` is `k x d`, result lives in `R^k`).
    pub fn apply_right(&self, m: &Matrix) -> Result<Self> {
        if m.ncols() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: m.ncols(),
                found: self.dim(),
                context: "Halfspace::apply_right",
            });
        }
        if self.is_trivial() {
            return Ok(Self::trivial(m.nrows()));
        }
        if self.is_infeasible() {
            return Ok(Self::infeasible(m.nrows()));
        }
        let n_new = m * &self.n;
        Ok(Self::normalize(n_new, self.o))
    }

    /// `areClose(n, n') && |o - o'| < tau`.
    pub fn is_close(&self, other: &Self) -> bool {
        if self.dim() != other.dim() {
            return false;
        }
        match (
            self.is_trivial() || self.is_infeasible(),
            other.is_trivial() || other.is_infeasible(),
        ) {
            (true, true) => self.o == other.o,
            (true, false) | (false, true) => false,
            (false, false) => {
                (&self.n - &other.n).norm() < DEFAULT_TAU && tol::eq_default(self.o, other.o)
            }
        }
    }
}

impl fmt::Display for Halfspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_trivial() {
            write!(f, "<trivial halfspace, dim {}>", self.dim())
        } else if self.is_infeasible() {
            write!(f, "<infeasible halfspace, dim {}>", self.dim())
        } else {
            write!(f, "{{ x : {:?} . x <= {} }}", self.n.as_slice(), self.o)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{matrix, vector};

    #[test]
    fn normalize_unit_scales_offset() {
        let h = Halfspace::normalize(vector(&[3.0, 4.0]), 10.0);
        assert!((linalg::norm(h.normal()) - 1.0).abs() < 1e-12);
        assert!((h.offset() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_normal_nonneg_offset_is_trivial() {
        let h = Halfspace::normalize(vector(&[0.0, 0.0]), 1.0);
        assert!(h.is_trivial());
    }

    #[test]
    fn zero_normal_negative_offset_is_infeasible() {
        let h = Halfspace::normalize(vector(&[0.0, 0.0]), -1.0);
        assert!(h.is_infeasible());
    }

    #[test]
    fn flip_flip_is_close_to_original() {
        let h = Halfspace::normalize(vector(&[1.0, 2.0]), 3.0);
        let hh = h.flip().flip();
        assert!(h.is_close(&hh));
    }

    #[test]
    fn flip_of_trivial_is_infeasible() {
        let h = Halfspace::trivial(2);
        assert!(h.flip().is_infeasible());
    }

    #[test]
    fn contains_respects_boundary() {
        let h = Halfspace::normalize(vector(&[1.0, 0.0]), 1.0);
        assert!(h.contains(&vector(&[1.0, 0.0])));
        assert!(!h.contains(&vector(&[2.0, 0.0])));
    }

    #[test]
    fn translate_shifts_offset_only() {
        let h = Halfspace::normalize(vector(&[1.0, 0.0]), 1.0);
        let t = h.translate(&vector(&[2.0, 0.0])).unwrap();
        assert!((t.offset() - 3.0).abs() < 1e-12);
        assert!((t.normal() - h.normal()).norm() < 1e-12);
    }

    #[test]
    fn apply_right_can_change_dimension() {
        let h = Halfspace::normalize(vector(&[1.0, 0.0]), 1.0);
        let m = matrix(2, 1, &[1.0, 0.0]).unwrap(); // project R^1 -> R^2 along x
        // apply_right expects m.ncols() == h.dim(); build the mismatch case
        // as a negative test and a matching 1-column projector separately.
        assert!(h.apply_right(&m).is_err());

        let proj = matrix(1, 2, &[1.0, 0.0]).unwrap();
        let reduced = h.apply_right(&proj).unwrap();
        assert_eq!(reduced.dim(), 1);
    }

    #[test]
    fn apply_right_rank_reducing_to_zero_is_sentinel() {
        let h = Halfspace::normalize(vector(&[0.0, 1.0]), 1.0);
        let m = matrix(1, 2, &[1.0, 0.0]).unwrap(); // kills the y-component
        let reduced = h.apply_right(&m).unwrap();
        assert!(reduced.is_trivial());
    }
}
