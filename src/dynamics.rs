//! Linear stochastic system `x_{t+1} = A x_t + B u_t + w_t` and the dynamics
//! operators (`Post`, `Pre`, `PreR`, `Attr`, `AttrR`, `ActionPolytope`) that
//! map polytopic sets through it.
//!
//! Purpose
//! - These operators are the only place geometry meets control theory: each
//!   composes `Polytope`/`PolytopeUnion` primitives (Minkowski sum,
//!   Pontryagin difference, `applyRight`) into a set-valued predecessor or
//!   successor map. Correctness here determines soundness of the whole
//!   abstraction.
//!
//! References
//! - No direct teacher analogue (the teacher has no dynamical-systems
//!   layer); composition style follows `Polytope::minkowski`/`pontryagin`.

use crate::error::{Error, Result};
use crate::linalg::Matrix;
use crate::polytope::union::PolytopeUnion;
use crate::polytope::Polytope;

/// `(A, B, X, W, U)`: `A` is `d x d`, `B` is `d x m`, `X`/`W` are
/// dimension-`d` polytopes, `U` is a dimension-`m` polytope union.
#[derive(Clone, Debug)]
pub struct Lss {
    a: Matrix,
    b: Matrix,
    x: Polytope,
    w: Polytope,
    u: PolytopeUnion,
}

impl Lss {
    pub fn new(a: Matrix, b: Matrix, x: Polytope, w: Polytope, u: PolytopeUnion) -> Result<Self> {
        if !a.is_square() {
            return Err(Error::DimensionMismatch {
                expected: a.nrows(),
                found: a.ncols(),
                context: "Lss::new (A must be square)",
            });
        }
        let d = a.nrows();
        if b.nrows() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: b.nrows(),
                context: "Lss::new (B rows must match A)",
            });
        }
        let m = b.ncols();
        if x.dim() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: x.dim(),
                context: "Lss::new (X dim)",
            });
        }
        if w.dim() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: w.dim(),
                context: "Lss::new (W dim)",
            });
        }
        for piece in u.pieces() {
            if piece.dim() != m {
                return Err(Error::DimensionMismatch {
                    expected: m,
                    found: piece.dim(),
                    context: "Lss::new (U dim)",
                });
            }
        }
        Ok(Lss { a, b, x, w, u })
    }

    pub fn a(&self) -> &Matrix {
        &self.a
    }
    pub fn b(&self) -> &Matrix {
        &self.b
    }
    pub fn x(&self) -> &Polytope {
        &self.x
    }
    pub fn w(&self) -> &Polytope {
        &self.w
    }
    pub fn u(&self) -> &PolytopeUnion {
        &self.u
    }
    pub fn state_dim(&self) -> usize {
        self.a.nrows()
    }
    pub fn control_dim(&self) -> usize {
        self.b.ncols()
    }

    /// `Post(X, U) = disjunctify({ hull(A.X (+) B.u (+) W) : u in U })`.
    pub fn post(&self, x: &Polytope, u: &PolytopeUnion) -> Result<PolytopeUnion> {
        if x.is_empty() {
            return Ok(PolytopeUnion::empty());
        }
        let ax = x.apply(&self.a)?;
        let mut pieces = Vec::with_capacity(u.len());
        for piece in u.pieces() {
            let bu = piece.apply(&self.b)?;
            let sum = ax.minkowski(&bu)?.minkowski(&self.w)?;
            if !sum.is_empty() {
                pieces.push(sum);
            }
        }
        PolytopeUnion::from_pieces(pieces).disjunctify()
    }

    /// `Post(self.x, self.u)`.
    pub fn post_full(&self) -> Result<PolytopeUnion> {
        self.post(&self.x, &self.u)
    }

    /// `disjunctify({self.x} U Post(self.x, self.u))`.
    pub fn extended_state_space(&self) -> Result<PolytopeUnion> {
        let mut pieces = vec![self.x.clone()];
        pieces.extend(self.post_full()?.into_pieces());
        PolytopeUnion::from_pieces(pieces).disjunctify()
    }

    /// `Pre(X, U, Y)`: points from which some control in `U` drives
    /// *possibly* into `Y`. Union over `(u in U, y in Y)` of
    /// `X ∩ applyRight(A, hull(y ⊖ (B.u (+) W)))`, disjunctified.
    pub fn pre(&self, x: &Polytope, u: &PolytopeUnion, y: &PolytopeUnion) -> Result<PolytopeUnion> {
        if x.is_empty() || y.is_empty() {
            return Ok(PolytopeUnion::empty());
        }
        let mut pieces = Vec::new();
        for u_piece in u.pieces() {
            let bu = u_piece.apply(&self.b)?;
            let buw = bu.minkowski(&self.w)?;
            for y_piece in y.pieces() {
                let diff = y_piece.pontryagin(&buw)?;
                if diff.is_empty() {
                    continue;
                }
                let candidate = diff.apply_right(&self.a)?;
                let inter = x.intersect(std::slice::from_ref(&candidate))?;
                if !inter.is_empty() {
                    pieces.push(inter);
                }
            }
        }
        PolytopeUnion::from_pieces(pieces).disjunctify()
    }

    /// `PreR(X, U, Y)`: the robust variant, via Pontryagin difference.
    /// Precomputes `pontry = pontryagin(Y, W)`; empty if `pontry` is empty;
    /// else union over `u in U` of `X ∩ applyRight(A, hull(pontry ⊖ B.u))`.
    pub fn pre_r(&self, x: &Polytope, u: &PolytopeUnion, y: &PolytopeUnion) -> Result<PolytopeUnion> {
        if x.is_empty() || y.is_empty() {
            return Ok(PolytopeUnion::empty());
        }
        let pontry = PolytopeUnion::pontryagin(y, &self.w)?;
        if pontry.is_empty() {
            return Ok(PolytopeUnion::empty());
        }
        let mut pieces = Vec::new();
        for u_piece in u.pieces() {
            let bu = u_piece.apply(&self.b)?;
            for pontry_piece in pontry.pieces() {
                let diff = pontry_piece.pontryagin(&bu)?;
                if diff.is_empty() {
                    continue;
                }
                let candidate = diff.apply_right(&self.a)?;
                let inter = x.intersect(std::slice::from_ref(&candidate))?;
                if !inter.is_empty() {
                    pieces.push(inter);
                }
            }
        }
        PolytopeUnion::from_pieces(pieces).disjunctify()
    }

    /// `Attr(X, U, Y) = X \ PreR(X, U, extendedX \ Y)`: points that cannot
    /// escape to the exterior of `Y` robustly.
    pub fn attr(&self, x: &Polytope, u: &PolytopeUnion, y: &PolytopeUnion) -> Result<PolytopeUnion> {
        let extended = self.extended_state_space()?;
        let exterior = PolytopeUnion::remove(&extended, y)?;
        let prer = self.pre_r(x, u, &exterior)?;
        PolytopeUnion::remove(&PolytopeUnion::single(x.clone()), &prer)
    }

    /// `AttrR(X, U, Y) = X \ Pre(X, U, extendedX \ Y)`: points that cannot
    /// escape even against an adversarial disturbance.
    pub fn attr_r(&self, x: &Polytope, u: &PolytopeUnion, y: &PolytopeUnion) -> Result<PolytopeUnion> {
        let extended = self.extended_state_space()?;
        let exterior = PolytopeUnion::remove(&extended, y)?;
        let pre = self.pre(x, u, &exterior)?;
        PolytopeUnion::remove(&PolytopeUnion::single(x.clone()), &pre)
    }

    /// `ActionPolytope(x, y)`: controls in `U` such that applying any of
    /// them at some point of `x` could lead into `y`.
    /// `intersect([applyRight(B, hull(y ⊖ (A.x (+) W)))], U)`.
    pub fn action_polytope(&self, x: &Polytope, y: &Polytope) -> Result<PolytopeUnion> {
        if x.is_empty() || y.is_empty() {
            return Ok(PolytopeUnion::empty());
        }
        let ax = x.apply(&self.a)?;
        let axw = ax.minkowski(&self.w)?;
        let diff = y.pontryagin(&axw)?;
        if diff.is_empty() {
            return Ok(PolytopeUnion::empty());
        }
        let candidate = diff.apply_right(&self.b)?;
        PolytopeUnion::single(candidate).intersect(&self.u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{matrix, vector};

    fn square(lo: f64, hi: f64) -> Polytope {
        Polytope::hull(&[
            vector(&[lo, lo]),
            vector(&[hi, lo]),
            vector(&[hi, hi]),
            vector(&[lo, hi]),
        ])
        .unwrap()
    }

    fn identity_system() -> Lss {
        let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let b = matrix(2, 1, &[1.0, 0.0]).unwrap();
        let x = square(-5.0, 5.0);
        let w = Polytope::hull(&[vector(&[-0.1, -0.1]), vector(&[0.1, 0.1]), vector(&[0.1, -0.1])])
            .unwrap();
        let u = PolytopeUnion::single(
            Polytope::hull(&[vector(&[-1.0]), vector(&[1.0])]).unwrap(),
        );
        Lss::new(a, b, x, w, u).unwrap()
    }

    #[test]
    fn constructor_rejects_dimension_mismatch() {
        let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let b = matrix(2, 1, &[1.0, 0.0]).unwrap();
        let x = Polytope::hull(&[vector(&[0.0]), vector(&[1.0])]).unwrap(); // dim 1, not 2
        let w = square(-0.1, 0.1);
        let u = PolytopeUnion::single(Polytope::hull(&[vector(&[-1.0]), vector(&[1.0])]).unwrap());
        assert!(Lss::new(a, b, x, w, u).is_err());
    }

    #[test]
    fn post_full_contains_state_space_under_identity_drift() {
        let lss = identity_system();
        let post = lss.post_full().unwrap();
        // Post(X, U) should extend X by roughly the control+noise range.
        let bbox = post.bounding_box().unwrap();
        assert!(bbox.1[0] > 5.0);
    }

    #[test]
    fn extended_state_space_covers_state_space() {
        let lss = identity_system();
        let extended = lss.extended_state_space().unwrap();
        assert!(extended.covers(&PolytopeUnion::single(lss.x().clone())).unwrap());
    }

    #[test]
    fn pre_r_of_whole_space_is_nonempty() {
        let lss = identity_system();
        let y = PolytopeUnion::single(square(-5.0, 5.0));
        let prer = lss.pre_r(lss.x(), lss.u(), &y).unwrap();
        assert!(!prer.is_empty());
    }

    #[test]
    fn action_polytope_for_reachable_target_is_nonempty() {
        let lss = identity_system();
        let origin = square(-1.0, 1.0);
        let target = square(-2.0, 2.0);
        let controls = lss.action_polytope(&origin, &target).unwrap();
        assert!(!controls.is_empty());
    }

    #[test]
    fn attr_of_whole_extended_space_is_whole_cell() {
        let lss = identity_system();
        let extended = lss.extended_state_space().unwrap();
        let attr = lss.attr(lss.x(), lss.u(), &extended).unwrap();
        assert!((attr.bounding_box().unwrap().1[0] - lss.x().bounding_box().unwrap().1[0]).abs() < 1e-6);
    }
}
