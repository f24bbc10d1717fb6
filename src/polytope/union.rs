//! A union of convex polytopes, carried as an ordered list; order is not
//! semantically meaningful, only a representation detail.

use super::Polytope;
use crate::error::Result;
use crate::linalg::Vector;

#[derive(Clone, Debug, Default)]
pub struct PolytopeUnion {
    pieces: Vec<Polytope>,
}

impl PolytopeUnion {
    pub fn empty() -> Self {
        PolytopeUnion { pieces: Vec::new() }
    }

    pub fn from_pieces(pieces: Vec<Polytope>) -> Self {
        PolytopeUnion {
            pieces: pieces.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    pub fn single(p: Polytope) -> Self {
        Self::from_pieces(vec![p])
    }

    pub fn pieces(&self) -> &[Polytope] {
        &self.pieces
    }

    pub fn into_pieces(self) -> Vec<Polytope> {
        self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.iter().all(|p| p.is_empty())
    }

    pub fn extent(&self) -> Vec<(f64, f64)> {
        if self.pieces.is_empty() {
            return Vec::new();
        }
        let dim = self.pieces[0].dim();
        let mut out = vec![(f64::INFINITY, f64::NEG_INFINITY); dim];
        for p in &self.pieces {
            for (d, (lo, hi)) in p.extent().into_iter().enumerate() {
                out[d].0 = out[d].0.min(lo);
                out[d].1 = out[d].1.max(hi);
            }
        }
        out
    }

    pub fn bounding_box(&self) -> Option<(Vector, Vector)> {
        if self.pieces.is_empty() {
            return None;
        }
        let extent = self.extent();
        let min: Vec<f64> = extent.iter().map(|(l, _)| *l).collect();
        let max: Vec<f64> = extent.iter().map(|(_, h)| *h).collect();
        Some((crate::linalg::vector(&min), crate::linalg::vector(&max)))
    }

    /// Convex hull of every vertex of every piece.
    pub fn hull(&self) -> Result<Polytope> {
        let mut all: Vec<Vector> = Vec::new();
        for p in &self.pieces {
            all.extend(p.vertices());
        }
        if all.is_empty() {
            let dim = self.pieces.first().map(|p| p.dim()).unwrap_or(2);
            return Polytope::empty(dim);
        }
        Polytope::hull(&all)
    }

    /// `covers(ys, xs)` = `isEmpty(remove(ys, xs))`: does `self` cover `xs`?
    pub fn covers(&self, xs: &PolytopeUnion) -> Result<bool> {
        Ok(Self::remove(xs, self)?.is_empty())
    }

    /// Mutual covering.
    pub fn is_same_as(&self, other: &PolytopeUnion) -> Result<bool> {
        Ok(self.covers(other)? && other.covers(self)?)
    }

    /// Sort members by descending volume (small-first removal would
    /// amplify numerical noise), then successively subtract previously
    /// accepted members; drop empties.
    pub fn disjunctify(&self) -> Result<Self> {
        let mut sorted: Vec<&Polytope> = self.pieces.iter().filter(|p| !p.is_empty()).collect();
        sorted.sort_by(|a, b| b.volume().partial_cmp(&a.volume()).unwrap());

        let mut accepted: Vec<Polytope> = Vec::new();
        for p in sorted {
            if accepted.is_empty() {
                accepted.push(p.clone());
                continue;
            }
            let remaining = p.remove(&accepted)?;
            accepted.extend(remaining.into_pieces());
        }
        Ok(Self::from_pieces(accepted))
    }

    /// If the hull of the union is covered by the union, return `[hull]`;
    /// otherwise `disjunctify(self)`.
    pub fn simplify(&self) -> Result<Self> {
        if self.is_empty() {
            return Ok(Self::empty());
        }
        let hull = self.hull()?;
        let hull_union = Self::single(hull.clone());
        if self.covers(&hull_union)? {
            return Ok(hull_union);
        }
        self.disjunctify()
    }

    pub fn intersect(&self, other: &PolytopeUnion) -> Result<Self> {
        let mut pieces = Vec::new();
        for a in &self.pieces {
            for b in &other.pieces {
                let inter = a.intersect(std::slice::from_ref(b))?;
                if !inter.is_empty() {
                    pieces.push(inter);
                }
            }
        }
        Self::from_pieces(pieces).disjunctify()
    }

    pub fn do_intersect(&self, other: &PolytopeUnion) -> Result<bool> {
        for a in &self.pieces {
            for b in &other.pieces {
                if !a.intersect(std::slice::from_ref(b))?.is_empty() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Flatten `x.remove(ys)` over `x in xs`.
    pub fn remove(xs: &PolytopeUnion, ys: &PolytopeUnion) -> Result<Self> {
        let mut pieces = Vec::new();
        for x in &xs.pieces {
            pieces.extend(x.remove(&ys.pieces)?.into_pieces());
        }
        Ok(Self::from_pieces(pieces))
    }

    /// `disjunctify([x.minkowski(y) for x in xs])`.
    pub fn minkowski(xs: &PolytopeUnion, y: &Polytope) -> Result<Self> {
        let mut pieces = Vec::new();
        for x in &xs.pieces {
            let s = x.minkowski(y)?;
            if !s.is_empty() {
                pieces.push(s);
            }
        }
        Self::from_pieces(pieces).disjunctify()
    }

    /// Pontryagin does not distribute over unions because of shared edges:
    /// compute the complement of `xs` inside its bounding box, Minkowski-sum
    /// that complement with `invert(y)`, then subtract the result from
    /// `boundingBox.pontryagin(y)` — this also robustly handles shared
    /// edges between `xs` and the bounding box.
    pub fn pontryagin(xs: &PolytopeUnion, y: &Polytope) -> Result<Self> {
        if xs.is_empty() {
            return Ok(Self::empty());
        }
        let bbox_poly = xs.hull()?;
        let bbox = Self::single(bbox_poly.clone());
        let complement = Self::remove(&bbox, xs)?;
        let inflated_complement = Self::minkowski(&complement, &y.invert())?;
        let bbox_pontry = bbox_poly.pontryagin(y)?;
        if bbox_pontry.is_empty() {
            return Ok(Self::empty());
        }
        bbox_pontry.remove(&inflated_complement.into_pieces())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::vector;

    fn square(lo: f64, hi: f64) -> Polytope {
        Polytope::hull(&[
            vector(&[lo, lo]),
            vector(&[hi, lo]),
            vector(&[hi, hi]),
            vector(&[lo, hi]),
        ])
        .unwrap()
    }

    #[test]
    fn disjunctify_overlapping_squares_preserves_area() {
        let a = square(0.0, 2.0);
        let b = square(1.0, 3.0);
        let u = PolytopeUnion::from_pieces(vec![a, b]);
        let d = u.disjunctify().unwrap();
        let total: f64 = d.pieces().iter().map(|p| p.volume()).sum();
        // area(a ∪ b) = 4 + 4 - 1 (overlap) = 7
        assert!((total - 7.0).abs() < 1e-6);
    }

    #[test]
    fn covers_self_is_true() {
        let a = square(0.0, 1.0);
        let u = PolytopeUnion::single(a);
        assert!(u.covers(&u).unwrap());
    }

    #[test]
    fn simplify_single_piece_returns_hull() {
        let a = square(0.0, 1.0);
        let u = PolytopeUnion::single(a);
        let s = u.simplify().unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn remove_flattens_over_members() {
        let a = square(0.0, 2.0);
        let b = square(5.0, 7.0);
        let xs = PolytopeUnion::from_pieces(vec![a, b]);
        let carve = PolytopeUnion::single(square(0.5, 1.5));
        let diff = PolytopeUnion::remove(&xs, &carve).unwrap();
        let total: f64 = diff.pieces().iter().map(|p| p.volume()).sum();
        assert!((total - (4.0 - 1.0 + 4.0)).abs() < 1e-6);
    }

    #[test]
    fn intersect_disjoint_unions_is_empty() {
        let xs = PolytopeUnion::single(square(0.0, 1.0));
        let ys = PolytopeUnion::single(square(5.0, 6.0));
        assert!(xs.intersect(&ys).unwrap().is_empty());
        assert!(!xs.do_intersect(&ys).unwrap());
    }
}
