//! 2D convex polytope: angle-ordered H-form, dual-represented with a
//! lazily-memoized V-form.
//!
//! References
//! - Teacher precedent: `geom2::ordered::Poly2` (angle-sorted, coalesced
//!   H-form, deque-sweep `hsi_ordered`) and `geom2::util::convex_hull`
//!   (Andrew's monotone chain).

use std::cell::OnceCell;
use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::error::{Error, Result};
use crate::halfspace::Halfspace;
use crate::linalg::{self, Matrix, Vector};
use crate::tol::{self, DEFAULT_TAU};

/// Convex polygon in `R^2`, holding whichever of V-form/H-form it was built
/// from; the other is derived lazily and cached.
#[derive(Debug)]
pub struct Polygon {
    h: OnceCell<Vec<Halfspace>>,
    v: OnceCell<Vec<Vector>>,
}

impl Clone for Polygon {
    fn clone(&self) -> Self {
        let out = Polygon {
            h: OnceCell::new(),
            v: OnceCell::new(),
        };
        if let Some(h) = self.h.get() {
            let _ = out.h.set(h.clone());
        }
        if let Some(v) = self.v.get() {
            let _ = out.v.set(v.clone());
        }
        out
    }
}

#[inline]
fn angle_of(n: &Vector) -> f64 {
    n[1].atan2(n[0])
}

#[inline]
fn wrap_angle(a: f64) -> f64 {
    let mut x = a;
    while x <= -PI {
        x += 2.0 * PI;
    }
    while x > PI {
        x -= 2.0 * PI;
    }
    x
}

fn line_intersection(h1: &Halfspace, h2: &Halfspace) -> Option<Vector> {
    let m = linalg::matrix(
        2,
        2,
        &[h1.normal()[0], h1.normal()[1], h2.normal()[0], h2.normal()[1]],
    )
    .ok()?;
    let inv = linalg::try_inverse(&m, "polygon::line_intersection").ok()?;
    Some(&inv * linalg::vector(&[h1.offset(), h2.offset()]))
}

/// Outcome of sweeping an angle-sorted, non-trivial halfspace list.
enum Hpi {
    Empty,
    Unbounded,
    Bounded {
        hs: Vec<Halfspace>,
        verts: Vec<Vector>,
    },
}

/// Deque-sweep half-plane intersection over halfspaces already sorted by
/// canonical 2D angle. Adapted from `geom2::ordered::hsi_ordered`.
fn hpi_2d(sorted: &[Halfspace]) -> Hpi {
    let items: Vec<Halfspace> = sorted
        .iter()
        .filter(|h| !h.is_trivial())
        .cloned()
        .collect();
    if items.iter().any(|h| h.is_infeasible()) {
        return Hpi::Empty;
    }
    if items.is_empty() {
        return Hpi::Unbounded;
    }

    // Fast contradiction check: an antiparallel pair whose offset intervals
    // don't overlap makes the whole intersection empty regardless of the
    // rest of the sweep.
    let angles: Vec<f64> = items.iter().map(|h| angle_of(h.normal())).collect();
    for (i, hi) in items.iter().enumerate() {
        let target = wrap_angle(angles[i] + PI);
        for (j, hj) in items.iter().enumerate() {
            if i == j {
                continue;
            }
            if (angles[j] - target).abs() < DEFAULT_TAU {
                let c1 = hi.offset();
                let c2 = hj.offset();
                if (-c1).max(-c2) > c1.min(c2) + DEFAULT_TAU {
                    return Hpi::Empty;
                }
            }
        }
    }

    let mut dq: VecDeque<Halfspace> = VecDeque::new();
    for h in items.iter() {
        while dq.len() >= 2 {
            let p = line_intersection(&dq[dq.len() - 2], &dq[dq.len() - 1]);
            match p {
                Some(pt) if h.contains_eps(&pt, DEFAULT_TAU) => break,
                _ => {
                    dq.pop_back();
                }
            }
        }
        while dq.len() >= 2 {
            let p = line_intersection(&dq[0], &dq[1]);
            match p {
                Some(pt) if h.contains_eps(&pt, DEFAULT_TAU) => break,
                _ => {
                    dq.pop_front();
                }
            }
        }
        dq.push_back(h.clone());
    }
    while dq.len() >= 3 {
        let n = dq.len();
        let p = line_intersection(&dq[n - 2], &dq[n - 1]);
        match p {
            Some(pt) if dq[0].contains_eps(&pt, DEFAULT_TAU) => break,
            _ => {
                dq.pop_back();
            }
        }
    }
    while dq.len() >= 3 {
        let p = line_intersection(&dq[0], &dq[1]);
        match p {
            Some(pt) if dq[dq.len() - 1].contains_eps(&pt, DEFAULT_TAU) => break,
            _ => {
                dq.pop_front();
            }
        }
    }

    if dq.is_empty() {
        return Hpi::Empty;
    }
    if dq.len() < 3 {
        return Hpi::Unbounded;
    }
    let m = dq.len();
    let mut verts = Vec::with_capacity(m);
    for k in 0..m {
        let i1 = &dq[k];
        let i2 = &dq[(k + 1) % m];
        match line_intersection(i1, i2) {
            Some(p) => verts.push(p),
            None => return Hpi::Unbounded,
        }
    }
    Hpi::Bounded {
        hs: dq.into_iter().collect(),
        verts,
    }
}

/// Sort by canonical 2D angle from `(-1, 0)`, i.e. by `atan2` directly
/// (both conventions produce the same cyclic order; atan2 is simpler and
/// matches the teacher's `angle_of`).
fn sort_by_angle(hs: &mut [Halfspace]) {
    hs.sort_by(|a, b| {
        angle_of(a.normal())
            .partial_cmp(&angle_of(b.normal()))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

impl Polygon {
    pub fn empty() -> Self {
        let out = Polygon {
            h: OnceCell::new(),
            v: OnceCell::new(),
        };
        let _ = out.h.set(Vec::new());
        let _ = out.v.set(Vec::new());
        out
    }

    /// Static constructor: sort, then sweep (`noredund`).
    pub fn intersection(halfspaces: Vec<Halfspace>) -> Self {
        let mut hs = halfspaces;
        sort_by_angle(&mut hs);
        Self::noredund(hs)
    }

    /// Expects `halfspaces` already in canonical angle order.
    pub fn noredund(halfspaces: Vec<Halfspace>) -> Self {
        match hpi_2d(&halfspaces) {
            Hpi::Empty | Hpi::Unbounded => Self::empty(),
            Hpi::Bounded { hs, verts } => {
                let out = Polygon {
                    h: OnceCell::new(),
                    v: OnceCell::new(),
                };
                let _ = out.h.set(hs);
                let _ = out.v.set(verts);
                out
            }
        }
    }

    /// Andrew's monotone chain convex hull; `points` need not be unique or
    /// ordered.
    pub fn hull(points: &[Vector]) -> Self {
        if points.len() < 3 {
            return Self::empty();
        }
        let mut pts = points.to_vec();
        pts.sort_by(|a, b| match a[0].partial_cmp(&b[0]) {
            Some(std::cmp::Ordering::Equal) | None => {
                b[1].partial_cmp(&a[1]).unwrap_or(std::cmp::Ordering::Equal)
            }
            Some(o) => o,
        });
        pts.dedup_by(|a, b| (&*a - &*b).norm() < DEFAULT_TAU);
        if pts.len() < 3 {
            return Self::empty();
        }

        fn cross(a: &Vector, b: &Vector, c: &Vector) -> f64 {
            let ab0 = b[0] - a[0];
            let ab1 = b[1] - a[1];
            let ac0 = c[0] - a[0];
            let ac1 = c[1] - a[1];
            ab0 * ac1 - ab1 * ac0
        }

        let mut lower: Vec<Vector> = Vec::with_capacity(pts.len());
        for p in &pts {
            while lower.len() >= 2
                && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= DEFAULT_TAU
            {
                lower.pop();
            }
            lower.push(p.clone());
        }
        let mut upper: Vec<Vector> = Vec::with_capacity(pts.len());
        for p in pts.iter().rev() {
            while upper.len() >= 2
                && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= DEFAULT_TAU
            {
                upper.pop();
            }
            upper.push(p.clone());
        }
        lower.pop();
        upper.pop();
        let mut hull_verts = lower;
        hull_verts.extend(upper);
        if hull_verts.len() < 3 {
            return Self::empty();
        }

        let out = Polygon {
            h: OnceCell::new(),
            v: OnceCell::new(),
        };
        let _ = out.v.set(hull_verts);
        out
    }

    pub fn is_empty(&self) -> bool {
        if let Some(v) = self.v.get() {
            if v.len() < 3 {
                return true;
            }
        }
        if let Some(h) = self.h.get() {
            if h.len() < 3 {
                return true;
            }
        }
        self.volume().abs() < DEFAULT_TAU
    }

    /// Non-redundant, angle-sorted halfspace list (computed from V-form if
    /// this polygon was built from vertices).
    pub fn halfspaces(&self) -> &Vec<Halfspace> {
        self.h.get_or_init(|| {
            let verts = self.v.get().expect("Polygon has neither form populated");
            if verts.len() < 3 {
                return Vec::new();
            }
            let n = verts.len();
            let mut hs = Vec::with_capacity(n);
            for k in 0..n {
                let p = &verts[k];
                let q = &verts[(k + 1) % n];
                let dx = q[0] - p[0];
                let dy = q[1] - p[1];
                let normal = linalg::vector(&[dy, -dx]);
                let offset = normal.dot(p);
                hs.push(Halfspace::normalize(normal, offset));
            }
            sort_by_angle(&mut hs);
            let mut out: Vec<Halfspace> = Vec::with_capacity(hs.len());
            for h in hs {
                if let Some(last) = out.last_mut() {
                    if (last.normal() - h.normal()).norm() < DEFAULT_TAU {
                        if h.offset() < last.offset() {
                            *last = h;
                        }
                        continue;
                    }
                }
                out.push(h);
            }
            out
        })
    }

    /// CCW vertex list, starting at the intersection of the last and first
    /// canonical halfspaces (computed from H-form if this polygon was built
    /// from halfspaces).
    pub fn vertices(&self) -> &Vec<Vector> {
        self.v.get_or_init(|| {
            let hs = self.h.get().expect("Polygon has neither form populated");
            let n = hs.len();
            if n < 3 {
                return Vec::new();
            }
            let mut verts = Vec::with_capacity(n);
            for k in 0..n {
                let prev = &hs[(k + n - 1) % n];
                match line_intersection(prev, &hs[k]) {
                    Some(p) => verts.push(p),
                    None => return Vec::new(),
                }
            }
            verts
        })
    }

    pub fn volume(&self) -> f64 {
        let verts = self.vertices();
        if verts.len() < 3 {
            return 0.0;
        }
        let n = verts.len();
        let mut acc = 0.0;
        for k in 0..n {
            let p = &verts[k];
            let q = &verts[(k + 1) % n];
            acc += p[0] * q[1] - q[0] * p[1];
        }
        (acc / 2.0).abs()
    }

    pub fn centroid(&self) -> Option<Vector> {
        let verts = self.vertices();
        if verts.len() < 3 {
            return None;
        }
        let area2 = {
            let n = verts.len();
            let mut acc = 0.0;
            for k in 0..n {
                let p = &verts[k];
                let q = &verts[(k + 1) % n];
                acc += p[0] * q[1] - q[0] * p[1];
            }
            acc
        };
        if tol::is_zero(area2, DEFAULT_TAU) {
            return None;
        }
        let n = verts.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for k in 0..n {
            let p = &verts[k];
            let q = &verts[(k + 1) % n];
            let cross = p[0] * q[1] - q[0] * p[1];
            cx += (p[0] + q[0]) * cross;
            cy += (p[1] + q[1]) * cross;
        }
        let factor = 1.0 / (3.0 * area2);
        Some(linalg::vector(&[cx * factor, cy * factor]))
    }

    pub fn bounding_box(&self) -> Option<(Vector, Vector)> {
        let verts = self.vertices();
        if verts.is_empty() {
            return None;
        }
        let mut min = verts[0].clone();
        let mut max = verts[0].clone();
        for p in verts.iter().skip(1) {
            for d in 0..2 {
                if p[d] < min[d] {
                    min[d] = p[d];
                }
                if p[d] > max[d] {
                    max[d] = p[d];
                }
            }
        }
        Some((min, max))
    }

    pub fn extent(&self) -> Vec<(f64, f64)> {
        match self.bounding_box() {
            Some((min, max)) => vec![(min[0], max[0]), (min[1], max[1])],
            None => vec![(0.0, 0.0), (0.0, 0.0)],
        }
    }

    pub fn contains(&self, p: &Vector) -> bool {
        self.halfspaces().iter().all(|h| h.contains(p))
    }

    /// Same dimension, same vertex count, and some cyclic rotation of
    /// `other`'s vertex list τ-matches this one's.
    pub fn is_same_as(&self, other: &Polygon) -> bool {
        let a = self.vertices();
        let b = other.vertices();
        if a.len() != b.len() {
            return a.is_empty() && b.is_empty();
        }
        if a.is_empty() {
            return true;
        }
        let n = a.len();
        for shift in 0..n {
            if (0..n).all(|i| (&a[i] - &b[(i + shift) % n]).norm() < DEFAULT_TAU) {
                return true;
            }
        }
        false
    }

    pub fn translate(&self, v: &Vector) -> Result<Self> {
        if v.len() != 2 {
            return Err(Error::DimensionMismatch {
                expected: 2,
                found: v.len(),
                context: "Polygon::translate",
            });
        }
        if self.is_empty() {
            return Ok(Self::empty());
        }
        let shifted: Vec<Vector> = self.vertices().iter().map(|p| p + v).collect();
        let out = Polygon {
            h: OnceCell::new(),
            v: OnceCell::new(),
        };
        let _ = out.v.set(shifted);
        Ok(out)
    }

    pub fn invert(&self) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        let flipped: Vec<Vector> = self.vertices().iter().map(|p| -p).collect();
        let out = Polygon {
            h: OnceCell::new(),
            v: OnceCell::new(),
        };
        let _ = out.v.set(flipped);
        out
    }

    /// Left-multiply vertices; may change the ambient dimension, so the
    /// result is a `crate::polytope::Polytope` rather than a `Polygon`.
    pub fn apply_to_vertices(&self, m: &Matrix) -> Result<Vec<Vector>> {
        if m.ncols() != 2 {
            return Err(Error::DimensionMismatch {
                expected: 2,
                found: m.ncols(),
                context: "Polygon::apply",
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

    pub fn minkowski(&self, other: &Polygon) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let mut sums = Vec::with_capacity(self.vertices().len() * other.vertices().len());
        for p in self.vertices() {
            for q in other.vertices() {
                sums.push(p + q);
            }
        }
        Self::hull(&sums)
    }

    /// Minkowski difference: for each halfspace `h` of `self` and each
    /// vertex `w` of `-other`, collect `h.translate(w)`, then reduce.
    pub fn pontryagin(&self, other: &Polygon) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        if other.is_empty() {
            return self.clone();
        }
        let neg = other.invert();
        let mut candidates = Vec::with_capacity(self.halfspaces().len() * neg.vertices().len());
        for h in self.halfspaces() {
            for w in neg.vertices() {
                if let Ok(t) = h.translate(w) {
                    candidates.push(t);
                }
            }
        }
        sort_by_angle(&mut candidates);
        // Keep only the tightest offset per direction before reducing,
        // mirroring the coalescing `halfspaces()` performs.
        let mut coalesced: Vec<Halfspace> = Vec::with_capacity(candidates.len());
        for h in candidates {
            if let Some(last) = coalesced.last_mut() {
                if (last.normal() - h.normal()).norm() < DEFAULT_TAU {
                    if h.offset() < last.offset() {
                        *last = h;
                    }
                    continue;
                }
            }
            coalesced.push(h);
        }
        Self::noredund(coalesced)
    }

    /// Concatenate halfspace lists and reduce. A 2D fast path merges two
    /// angle-sorted streams instead of re-sorting when there is exactly one
    /// other operand.
    pub fn intersect_one(&self, other: &Polygon) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let a = self.halfspaces();
        let b = other.halfspaces();
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let ai = angle_of(a[i].normal());
            let bj = angle_of(b[j].normal());
            if ai <= bj {
                merged.push(a[i].clone());
                i += 1;
            } else {
                merged.push(b[j].clone());
                j += 1;
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        Self::noredund(merged)
    }

    pub fn intersect_many(polys: &[&Polygon]) -> Self {
        if polys.iter().any(|p| p.is_empty()) {
            return Self::empty();
        }
        let mut all = Vec::new();
        for p in polys {
            all.extend(p.halfspaces().iter().cloned());
        }
        Self::intersection(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::vector;

    fn unit_square() -> Polygon {
        Polygon::hull(&[
            vector(&[0.0, 0.0]),
            vector(&[1.0, 0.0]),
            vector(&[1.0, 1.0]),
            vector(&[0.0, 1.0]),
        ])
    }

    #[test]
    fn hull_of_square_has_area_one() {
        let sq = unit_square();
        assert!((sq.volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hull_then_halfspaces_then_vertices_round_trips() {
        let sq = unit_square();
        let hs = sq.halfspaces().clone();
        let rebuilt = Polygon::noredund({
            let mut sorted = hs;
            sort_by_angle(&mut sorted);
            sorted
        });
        assert!(sq.is_same_as(&rebuilt));
    }

    #[test]
    fn intersection_of_two_squares_is_unit_square() {
        // [-1, 1] x [-1, 1]
        let left = Polygon::intersection(vec![
            Halfspace::normalize(vector(&[-1.0, 0.0]), 1.0),
            Halfspace::normalize(vector(&[1.0, 0.0]), 1.0),
            Halfspace::normalize(vector(&[0.0, -1.0]), 1.0),
            Halfspace::normalize(vector(&[0.0, 1.0]), 1.0),
        ]);
        // [0, 2] x [0, 2]
        let right = Polygon::intersection(vec![
            Halfspace::normalize(vector(&[-1.0, 0.0]), 0.0),
            Halfspace::normalize(vector(&[1.0, 0.0]), 2.0),
            Halfspace::normalize(vector(&[0.0, -1.0]), 0.0),
            Halfspace::normalize(vector(&[0.0, 1.0]), 2.0),
        ]);
        // overlap: [0, 1] x [0, 1]
        let inter = left.intersect_one(&right);
        assert!((inter.volume() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn disjoint_squares_intersect_to_empty() {
        let a = Polygon::hull(&[
            vector(&[0.0, 0.0]),
            vector(&[1.0, 0.0]),
            vector(&[1.0, 1.0]),
            vector(&[0.0, 1.0]),
        ]);
        let b = Polygon::hull(&[
            vector(&[10.0, 10.0]),
            vector(&[11.0, 10.0]),
            vector(&[11.0, 11.0]),
            vector(&[10.0, 11.0]),
        ]);
        assert!(a.intersect_one(&b).is_empty());
    }

    #[test]
    fn translate_preserves_volume() {
        let sq = unit_square();
        let moved = sq.translate(&vector(&[5.0, -3.0])).unwrap();
        assert!((moved.volume() - sq.volume()).abs() < 1e-9);
    }

    #[test]
    fn minkowski_sum_of_unit_squares_has_area_four() {
        let sq = unit_square();
        let sum = sq.minkowski(&sq);
        assert!((sum.volume() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn pontryagin_difference_shrinks_square() {
        let big = Polygon::hull(&[
            vector(&[-2.0, -2.0]),
            vector(&[2.0, -2.0]),
            vector(&[2.0, 2.0]),
            vector(&[-2.0, 2.0]),
        ]);
        let small = Polygon::hull(&[
            vector(&[-1.0, -1.0]),
            vector(&[1.0, -1.0]),
            vector(&[1.0, 1.0]),
            vector(&[-1.0, 1.0]),
        ]);
        let diff = big.pontryagin(&small);
        assert!((diff.volume() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn empty_polygon_has_zero_volume() {
        let e = Polygon::empty();
        assert!(e.is_empty());
        assert_eq!(e.volume(), 0.0);
    }

    #[test]
    fn centroid_of_square_is_its_center() {
        let sq = unit_square();
        let c = sq.centroid().unwrap();
        assert!((c[0] - 0.5).abs() < 1e-9);
        assert!((c[1] - 0.5).abs() < 1e-9);
    }
}
