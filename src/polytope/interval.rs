//! 1D convex polytope: a closed interval `[left, right]`, dual-represented
//! with a lazily-memoized form just like `Polygon`, for symmetry with the
//! 2D case even though both forms are trivial to derive from each other.

use std::cell::OnceCell;

use crate::error::{Error, Result};
use crate::halfspace::Halfspace;
use crate::linalg::{self, Matrix, Vector};
use crate::tol::DEFAULT_TAU;

#[derive(Debug)]
pub struct Interval {
    v: OnceCell<Vec<f64>>,
    h: OnceCell<Vec<Halfspace>>,
}

impl Clone for Interval {
    fn clone(&self) -> Self {
        let out = Interval {
            v: OnceCell::new(),
            h: OnceCell::new(),
        };
        if let Some(v) = self.v.get() {
            let _ = out.v.set(v.clone());
        }
        if let Some(h) = self.h.get() {
            let _ = out.h.set(h.clone());
        }
        out
    }
}

fn left_facing(o: f64) -> Halfspace {
    Halfspace::normalize(linalg::vector(&[-1.0]), -o)
}

fn right_facing(o: f64) -> Halfspace {
    Halfspace::normalize(linalg::vector(&[1.0]), o)
}

impl Interval {
    pub fn empty() -> Self {
        let out = Interval {
            v: OnceCell::new(),
            h: OnceCell::new(),
        };
        let _ = out.v.set(Vec::new());
        let _ = out.h.set(Vec::new());
        out
    }

    pub fn from_bounds(left: f64, right: f64) -> Self {
        if right - left < DEFAULT_TAU {
            return Self::empty();
        }
        let out = Interval {
            v: OnceCell::new(),
            h: OnceCell::new(),
        };
        let _ = out.v.set(vec![left, right]);
        out
    }

    /// `hull` in 1D: leftmost and rightmost point.
    pub fn hull(points: &[f64]) -> Self {
        if points.len() < 2 {
            return Self::empty();
        }
        let left = points.iter().cloned().fold(f64::INFINITY, f64::min);
        let right = points.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self::from_bounds(left, right)
    }

    /// Pick the leftmost right-facing halfspace and the rightmost
    /// left-facing one; empty if their offsets don't overlap by more than
    /// τ.
    pub fn intersection(halfspaces: Vec<Halfspace>) -> Self {
        Self::noredund(halfspaces)
    }

    pub fn noredund(halfspaces: Vec<Halfspace>) -> Self {
        if halfspaces.iter().any(|h| h.is_infeasible()) {
            return Self::empty();
        }
        let mut right_bound = f64::INFINITY;
        let mut left_bound = f64::NEG_INFINITY;
        for h in &halfspaces {
            if h.is_trivial() {
                continue;
            }
            if h.normal()[0] > 0.0 {
                right_bound = right_bound.min(h.offset() / h.normal()[0]);
            } else {
                left_bound = left_bound.max(h.offset() / h.normal()[0]);
            }
        }
        if !right_bound.is_finite() || !left_bound.is_finite() {
            // Unbounded on at least one side: this crate does not represent
            // unbounded polytopes, so treat it as empty.
            return Self::empty();
        }
        Self::from_bounds(left_bound, right_bound)
    }

    pub fn is_empty(&self) -> bool {
        if let Some(v) = self.v.get() {
            return v.len() < 2 || (v[1] - v[0]).abs() < DEFAULT_TAU;
        }
        if let Some(h) = self.h.get() {
            return h.len() < 2;
        }
        true
    }

    fn ensure_v(&self) -> &Vec<f64> {
        self.v.get_or_init(|| {
            let hs = self.h.get().expect("Interval has neither form populated");
            if hs.len() < 2 {
                return Vec::new();
            }
            let mut left = f64::NEG_INFINITY;
            let mut right = f64::INFINITY;
            for h in hs {
                if h.is_trivial() {
                    continue;
                }
                if h.normal()[0] > 0.0 {
                    right = right.min(h.offset() / h.normal()[0]);
                } else {
                    left = left.max(h.offset() / h.normal()[0]);
                }
            }
            if right - left < DEFAULT_TAU {
                Vec::new()
            } else {
                vec![left, right]
            }
        })
    }

    pub fn halfspaces(&self) -> &Vec<Halfspace> {
        self.h.get_or_init(|| {
            let v = self.v.get().expect("Interval has neither form populated");
            if v.len() < 2 {
                return Vec::new();
            }
            vec![left_facing(v[0]), right_facing(v[1])]
        })
    }

    pub fn vertices(&self) -> Vec<Vector> {
        self.ensure_v()
            .iter()
            .map(|x| linalg::vector(&[*x]))
            .collect()
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        let v = self.ensure_v();
        if v.len() < 2 {
            None
        } else {
            Some((v[0], v[1]))
        }
    }

    pub fn volume(&self) -> f64 {
        match self.bounds() {
            Some((l, r)) => (r - l).max(0.0),
            None => 0.0,
        }
    }

    pub fn centroid(&self) -> Option<Vector> {
        self.bounds().map(|(l, r)| linalg::vector(&[(l + r) / 2.0]))
    }

    pub fn bounding_box(&self) -> Option<(Vector, Vector)> {
        self.bounds()
            .map(|(l, r)| (linalg::vector(&[l]), linalg::vector(&[r])))
    }

    pub fn extent(&self) -> Vec<(f64, f64)> {
        match self.bounds() {
            Some(b) => vec![b],
            None => vec![(0.0, 0.0)],
        }
    }

    pub fn contains(&self, p: &Vector) -> bool {
        self.halfspaces().iter().all(|h| h.contains(p))
    }

    pub fn is_same_as(&self, other: &Interval) -> bool {
        match (self.bounds(), other.bounds()) {
            (None, None) => true,
            (Some((l1, r1)), Some((l2, r2))) => {
                (l1 - l2).abs() < DEFAULT_TAU && (r1 - r2).abs() < DEFAULT_TAU
            }
            _ => false,
        }
    }

    pub fn translate(&self, v: &Vector) -> Result<Self> {
        if v.len() != 1 {
            return Err(Error::DimensionMismatch {
                expected: 1,
                found: v.len(),
                context: "Interval::translate",
            });
        }
        Ok(match self.bounds() {
            Some((l, r)) => Self::from_bounds(l + v[0], r + v[0]),
            None => Self::empty(),
        })
    }

    pub fn invert(&self) -> Self {
        match self.bounds() {
            Some((l, r)) => Self::from_bounds(-r, -l),
            None => Self::empty(),
        }
    }

    pub fn apply_to_vertices(&self, m: &Matrix) -> Result<Vec<Vector>> {
        if m.ncols() != 1 {
            return Err(Error::DimensionMismatch {
                expected: 1,
                found: m.ncols(),
                context: "Interval::apply",
            });
        }
        Ok(self.vertices().iter().map(|p| m * p).collect())
    }

    pub fn apply_right(&self, m: &Matrix) -> Result<Vec<Halfspace>> {
        self.halfspaces()
            .iter()
            .map(|h| h.apply_right(m))
            .collect()
    }

    pub fn minkowski(&self, other: &Interval) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some((l1, r1)), Some((l2, r2))) => Self::from_bounds(l1 + l2, r1 + r2),
            _ => Self::empty(),
        }
    }

    pub fn pontryagin(&self, other: &Interval) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some((l1, r1)), Some((l2, r2))) => {
                let width = r2 - l2;
                Self::from_bounds(l1 - l2, r1 - l2 - width)
            }
            (None, _) => Self::empty(),
            (Some(b), None) => Self::from_bounds(b.0, b.1),
        }
    }

    pub fn intersect_many(ivs: &[&Interval]) -> Self {
        let mut left = f64::NEG_INFINITY;
        let mut right = f64::INFINITY;
        for iv in ivs {
            match iv.bounds() {
                Some((l, r)) => {
                    left = left.max(l);
                    right = right.min(r);
                }
                None => return Self::empty(),
            }
        }
        Self::from_bounds(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_of_points_is_bounding_interval() {
        let iv = Interval::hull(&[3.0, -1.0, 2.0]);
        assert_eq!(iv.bounds(), Some((-1.0, 3.0)));
    }

    #[test]
    fn halfspaces_then_vertices_round_trips() {
        let iv = Interval::from_bounds(-2.0, 5.0);
        let hs = iv.halfspaces().clone();
        let rebuilt = Interval::noredund(hs);
        assert!(iv.is_same_as(&rebuilt));
    }

    #[test]
    fn intersect_many_shrinks_to_overlap() {
        let a = Interval::from_bounds(0.0, 5.0);
        let b = Interval::from_bounds(3.0, 8.0);
        let inter = Interval::intersect_many(&[&a, &b]);
        assert_eq!(inter.bounds(), Some((3.0, 5.0)));
    }

    #[test]
    fn disjoint_intervals_intersect_to_empty() {
        let a = Interval::from_bounds(0.0, 1.0);
        let b = Interval::from_bounds(2.0, 3.0);
        assert!(Interval::intersect_many(&[&a, &b]).is_empty());
    }

    #[test]
    fn minkowski_sum_adds_widths() {
        let a = Interval::from_bounds(0.0, 1.0);
        let b = Interval::from_bounds(-1.0, 1.0);
        let sum = a.minkowski(&b);
        assert_eq!(sum.bounds(), Some((-1.0, 2.0)));
    }

    #[test]
    fn pontryagin_difference_shrinks_by_width() {
        let a = Interval::from_bounds(0.0, 4.0);
        let b = Interval::from_bounds(0.0, 1.0);
        let diff = a.pontryagin(&b);
        assert_eq!(diff.bounds(), Some((0.0, 3.0)));
    }

    #[test]
    fn empty_interval_has_zero_volume() {
        let e = Interval::empty();
        assert!(e.is_empty());
        assert_eq!(e.volume(), 0.0);
    }
}
