//! Convex polytope: a sum type over `Interval` (1D) and `Polygon` (2D),
//! each with a lazily-memoized dual V-form/H-form representation.
//!
//! Purpose
//! - This crate only ever needs 1D and 2D convex sets (predicate cuts on a
//!   1D/2D state space, and the same for control/disturbance spaces): a
//!   closed sum type lets every higher layer (`dynamics`, `abstraction`)
//!   work against one `Polytope` without matching on dimension itself.
//!
//! References
//! - Teacher precedent: `geom2::ordered::Poly2` (angle-ordered H-form,
//!   deque-sweep `hsi_ordered`), `geom2::util::convex_hull` (Andrew's
//!   monotone chain), `geom4::types::Poly4` (eager dual-representation
//!   pattern, generalized here to a `std::cell::OnceCell` per the Design
//!   Notes' "non-atomic once-cell suffices" guidance).

pub mod interval;
pub mod polygon;
pub mod union;

use interval::Interval;
use polygon::Polygon;

use crate::error::{Error, Result};
use crate::halfspace::Halfspace;
use crate::linalg::{Matrix, Vector};
use crate::tol::DEFAULT_TAU;

/// A convex polytope in `R^1` or `R^2`.
#[derive(Clone, Debug)]
pub enum Polytope {
    Interval(Interval),
    Polygon(Polygon),
}

impl Polytope {
    pub fn empty(dim: usize) -> Result<Self> {
        match dim {
            1 => Ok(Polytope::Interval(Interval::empty())),
            2 => Ok(Polytope::Polygon(Polygon::empty())),
            _ => Err(Error::DimensionMismatch {
                expected: 2,
                found: dim,
                context: "Polytope::empty",
            }),
        }
    }

    /// `hull(points)`: 1D picks the extremes, 2D runs Andrew's monotone
    /// chain. All points must share one dimension (1 or 2).
    pub fn hull(points: &[Vector]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::ValueError {
                message: "Polytope::hull: no points".to_string(),
            });
        }
        let dim = points[0].len();
        if points.iter().any(|p| p.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: points.iter().map(|p| p.len()).max().unwrap_or(dim),
                context: "Polytope::hull",
            });
        }
        match dim {
            1 => {
                let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
                Ok(Polytope::Interval(Interval::hull(&xs)))
            }
            2 => Ok(Polytope::Polygon(Polygon::hull(points))),
            _ => Err(Error::DimensionMismatch {
                expected: 2,
                found: dim,
                context: "Polytope::hull",
            }),
        }
    }

    /// Sort by canonical angle (2D only; 1D has no ordering to establish),
    /// then call `noredund`.
    pub fn intersection(halfspaces: Vec<Halfspace>) -> Result<Self> {
        let dim = halfspaces
            .first()
            .map(|h| h.dim())
            .ok_or_else(|| Error::ValueError {
                message: "Polytope::intersection: no halfspaces".to_string(),
            })?;
        if halfspaces.iter().any(|h| h.dim() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: halfspaces.iter().map(|h| h.dim()).max().unwrap_or(dim),
                context: "Polytope::intersection",
            });
        }
        match dim {
            1 => Ok(Polytope::Interval(Interval::intersection(halfspaces))),
            2 => Ok(Polytope::Polygon(Polygon::intersection(halfspaces))),
            _ => Err(Error::DimensionMismatch {
                expected: 2,
                found: dim,
                context: "Polytope::intersection",
            }),
        }
    }

    /// `noredund`: expects canonical order (2D) already established by the
    /// caller; 1D has no ordering precondition.
    pub fn noredund(dim: usize, halfspaces: Vec<Halfspace>) -> Result<Self> {
        match dim {
            1 => Ok(Polytope::Interval(Interval::noredund(halfspaces))),
            2 => Ok(Polytope::Polygon(Polygon::noredund(halfspaces))),
            _ => Err(Error::DimensionMismatch {
                expected: 2,
                found: dim,
                context: "Polytope::noredund",
            }),
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Polytope::Interval(_) => 1,
            Polytope::Polygon(_) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Polytope::Interval(i) => i.is_empty(),
            Polytope::Polygon(p) => p.is_empty(),
        }
    }

    pub fn vertices(&self) -> Vec<Vector> {
        match self {
            Polytope::Interval(i) => i.vertices(),
            Polytope::Polygon(p) => p.vertices().clone(),
        }
    }

    pub fn halfspaces(&self) -> Vec<Halfspace> {
        match self {
            Polytope::Interval(i) => i.halfspaces().clone(),
            Polytope::Polygon(p) => p.halfspaces().clone(),
        }
    }

    pub fn volume(&self) -> f64 {
        match self {
            Polytope::Interval(i) => i.volume(),
            Polytope::Polygon(p) => p.volume(),
        }
    }

    pub fn centroid(&self) -> Option<Vector> {
        match self {
            Polytope::Interval(i) => i.centroid(),
            Polytope::Polygon(p) => p.centroid(),
        }
    }

    pub fn bounding_box(&self) -> Option<(Vector, Vector)> {
        match self {
            Polytope::Interval(i) => i.bounding_box(),
            Polytope::Polygon(p) => p.bounding_box(),
        }
    }

    pub fn extent(&self) -> Vec<(f64, f64)> {
        match self {
            Polytope::Interval(i) => i.extent(),
            Polytope::Polygon(p) => p.extent(),
        }
    }

    pub fn contains(&self, p: &Vector) -> bool {
        match self {
            Polytope::Interval(i) => i.contains(p),
            Polytope::Polygon(poly) => poly.contains(p),
        }
    }

    pub fn is_same_as(&self, other: &Polytope) -> bool {
        match (self, other) {
            (Polytope::Interval(a), Polytope::Interval(b)) => a.is_same_as(b),
            (Polytope::Polygon(a), Polytope::Polygon(b)) => a.is_same_as(b),
            _ => false,
        }
    }

    pub fn translate(&self, v: &Vector) -> Result<Self> {
        match self {
            Polytope::Interval(i) => Ok(Polytope::Interval(i.translate(v)?)),
            Polytope::Polygon(p) => Ok(Polytope::Polygon(p.translate(v)?)),
        }
    }

    pub fn invert(&self) -> Self {
        match self {
            Polytope::Interval(i) => Polytope::Interval(i.invert()),
            Polytope::Polygon(p) => Polytope::Polygon(p.invert()),
        }
    }

    /// Left-multiply vertices by `m`; may change the ambient dimension
    /// (result dim = `m.nrows()`).
    pub fn apply(&self, m: &Matrix) -> Result<Self> {
        if self.is_empty() {
            return Self::empty(m.nrows());
        }
        let verts = match self {
            Polytope::Interval(i) => i.apply_to_vertices(m)?,
            Polytope::Polygon(p) => p.apply_to_vertices(m)?,
        };
        Self::hull(&verts)
    }

    /// Right-multiply normals by `m`; may change the ambient dimension. For
    /// invertible `m` this equals `apply(m^-1)`.
    pub fn apply_right(&self, m: &Matrix) -> Result<Self> {
        if self.is_empty() {
            return Self::empty(m.nrows());
        }
        let hs = match self {
            Polytope::Interval(i) => i.apply_right(m)?,
            Polytope::Polygon(p) => p.apply_right(m)?,
        };
        Self::intersection(hs)
    }

    pub fn minkowski(&self, other: &Polytope) -> Result<Self> {
        match (self, other) {
            (Polytope::Interval(a), Polytope::Interval(b)) => {
                Ok(Polytope::Interval(a.minkowski(b)))
            }
            (Polytope::Polygon(a), Polytope::Polygon(b)) => Ok(Polytope::Polygon(a.minkowski(b))),
            _ => Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: other.dim(),
                context: "Polytope::minkowski",
            }),
        }
    }

    pub fn pontryagin(&self, other: &Polytope) -> Result<Self> {
        match (self, other) {
            (Polytope::Interval(a), Polytope::Interval(b)) => {
                Ok(Polytope::Interval(a.pontryagin(b)))
            }
            (Polytope::Polygon(a), Polytope::Polygon(b)) => {
                Ok(Polytope::Polygon(a.pontryagin(b)))
            }
            _ => Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: other.dim(),
                context: "Polytope::pontryagin",
            }),
        }
    }

    /// Concatenate halfspace lists and reduce. A 2D fast path merges two
    /// angle-sorted streams when there is exactly one other operand.
    pub fn intersect(&self, others: &[Polytope]) -> Result<Self> {
        if others.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(self.clone());
        }
        if let Polytope::Polygon(p) = self {
            if others.len() == 1 {
                if let Polytope::Polygon(o) = &others[0] {
                    return Ok(Polytope::Polygon(p.intersect_one(o)));
                }
            }
        }
        let dim = self.dim();
        for o in others {
            if o.dim() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found: o.dim(),
                    context: "Polytope::intersect",
                });
            }
        }
        match self {
            Polytope::Interval(a) => {
                let mut all = vec![a];
                let others_iv: Vec<&Interval> = others
                    .iter()
                    .map(|o| match o {
                        Polytope::Interval(i) => i,
                        _ => unreachable!(),
                    })
                    .collect();
                all.extend(others_iv);
                Ok(Polytope::Interval(Interval::intersect_many(&all)))
            }
            Polytope::Polygon(a) => {
                let mut all = vec![a];
                let others_poly: Vec<&Polygon> = others
                    .iter()
                    .map(|o| match o {
                        Polytope::Polygon(p) => p,
                        _ => unreachable!(),
                    })
                    .collect();
                all.extend(others_poly);
                Ok(Polytope::Polygon(Polygon::intersect_many(&all)))
            }
        }
    }

    /// Intersect with extra halfspaces directly (no intermediate
    /// single-halfspace `Polytope`, which would generally be unbounded and
    /// thus collapse to empty under this crate's "no unbounded sets"
    /// convention). Used by the abstraction layer's predicate-driven
    /// decomposition (`X ∩ p`, `X ∩ flip(p1) ∩ ... ∩ flip(pk)`).
    pub(crate) fn cut(&self, extra: &[Halfspace]) -> Result<Self> {
        if extra.is_empty() {
            return Ok(self.clone());
        }
        let mut hs = self.halfspaces();
        hs.extend(extra.iter().cloned());
        Self::intersection(hs)
    }

    /// Recursive: intersect with the first halfspace and its flip, recurse
    /// on the rest, return the union of non-empty pieces.
    pub fn split(&self, halfspaces: &[Halfspace]) -> Result<union::PolytopeUnion> {
        let Some((first, rest)) = halfspaces.split_first() else {
            return Ok(union::PolytopeUnion::from_pieces(if self.is_empty() {
                vec![]
            } else {
                vec![self.clone()]
            }));
        };
        let with_cut = self.cut(std::slice::from_ref(first))?;
        let without_cut = self.cut(std::slice::from_ref(&first.flip()))?;

        let mut pieces = Vec::new();
        if !with_cut.is_empty() {
            pieces.extend(with_cut.split(rest)?.into_pieces());
        }
        if !without_cut.is_empty() {
            pieces.extend(without_cut.split(rest)?.into_pieces());
        }
        Ok(union::PolytopeUnion::from_pieces(pieces))
    }

    /// Regiondiff: `self \ union(others)`, as a union of disjoint pieces.
    pub fn remove(&self, others: &[Polytope]) -> Result<union::PolytopeUnion> {
        if self.is_empty() || others.is_empty() {
            return Ok(union::PolytopeUnion::from_pieces(if self.is_empty() {
                vec![]
            } else {
                vec![self.clone()]
            }));
        }
        let Some((first, rest)) = others.split_first() else {
            return Ok(union::PolytopeUnion::from_pieces(vec![self.clone()]));
        };
        if self.intersect(std::slice::from_ref(first))?.is_empty() {
            return self.remove(rest);
        }
        let mut pieces = Vec::new();
        let mut poly = self.clone();
        for h in first.halfspaces() {
            let candidate = poly.cut(&[h.flip()])?;
            if !candidate.is_empty() {
                pieces.extend(candidate.remove(rest)?.into_pieces());
            }
            poly = poly.cut(&[h.clone()])?;
            if poly.is_empty() {
                break;
            }
        }
        Ok(union::PolytopeUnion::from_pieces(pieces))
    }
}

pub(crate) fn eps() -> f64 {
    DEFAULT_TAU
}
