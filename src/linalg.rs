//! Dense small-matrix/vector primitives with dimension-checked entry points.
//!
//! Purpose
//! - Thin wrapper over `nalgebra`'s dynamically-sized `DVector`/`DMatrix`,
//!   generalized from the teacher's fixed `Vector2`/`Matrix2` because state
//!   dimension `d` and control dimension `m` vary independently across
//!   systems (e.g. a 2D state driven by a 1D control), and rank-reducing
//!   maps (`applyRight`) can change a vector's dimension outright.
//!
//! References
//! - Teacher precedent: `geom2::types::Affine2` (`nalgebra::{Matrix2,
//!   Vector2}`), `geom4::types::Poly4` (`nalgebra::{Matrix4, Vector4}`).

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// A point / direction in `R^d`.
pub type Vector = DVector<f64>;
/// A `rows x cols` dense matrix.
pub type Matrix = DMatrix<f64>;

/// Dimension of a vector.
#[inline]
pub fn dim(v: &Vector) -> usize {
    v.len()
}

/// `M * v`, checking that `M.ncols() == v.len()`.
pub fn mat_vec(m: &Matrix, v: &Vector, context: &'static str) -> Result<Vector> {
    if m.ncols() != v.len() {
        return Err(Error::DimensionMismatch {
            expected: m.ncols(),
            found: v.len(),
            context,
        });
    }
    Ok(m * v)
}

/// `u + v`, checking equal dimension.
pub fn vec_add(u: &Vector, v: &Vector, context: &'static str) -> Result<Vector> {
    if u.len() != v.len() {
        return Err(Error::DimensionMismatch {
            expected: u.len(),
            found: v.len(),
            context,
        });
    }
    Ok(u + v)
}

/// `u - v`, checking equal dimension.
pub fn vec_sub(u: &Vector, v: &Vector, context: &'static str) -> Result<Vector> {
    if u.len() != v.len() {
        return Err(Error::DimensionMismatch {
            expected: u.len(),
            found: v.len(),
            context,
        });
    }
    Ok(u - v)
}

/// Attempt a square-matrix inverse, surfacing singularity as `Error::MathError`.
pub fn try_inverse(m: &Matrix, context: &'static str) -> Result<Matrix> {
    if !m.is_square() {
        return Err(Error::DimensionMismatch {
            expected: m.nrows(),
            found: m.ncols(),
            context,
        });
    }
    m.clone()
        .try_inverse()
        .ok_or(Error::MathError { context })
}

/// Euclidean norm.
#[inline]
pub fn norm(v: &Vector) -> f64 {
    v.norm()
}

/// A vector of `d` zeros.
#[inline]
pub fn zeros(d: usize) -> Vector {
    DVector::zeros(d)
}

/// Build a `Vector` from a slice.
#[inline]
pub fn vector(values: &[f64]) -> Vector {
    DVector::from_row_slice(values)
}

/// Build a `rows x cols` `Matrix` from row-major data.
pub fn matrix(rows: usize, cols: usize, row_major: &[f64]) -> Result<Matrix> {
    if row_major.len() != rows * cols {
        return Err(Error::DimensionMismatch {
            expected: rows * cols,
            found: row_major.len(),
            context: "linalg::matrix",
        });
    }
    Ok(DMatrix::from_row_slice(rows, cols, row_major))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat_vec_checks_dimension() {
        let m = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let v = vector(&[1.0, 2.0, 3.0]);
        assert!(mat_vec(&m, &v, "test").is_err());
    }

    #[test]
    fn mat_vec_identity() {
        let m = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let v = vector(&[1.0, 2.0]);
        let out = mat_vec(&m, &v, "test").unwrap();
        assert_eq!(out.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn singular_matrix_is_math_error() {
        let m = matrix(2, 2, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(matches!(
            try_inverse(&m, "test"),
            Err(Error::MathError { .. })
        ));
    }

    #[test]
    fn non_square_inverse_is_dimension_mismatch() {
        let m = matrix(1, 2, &[1.0, 1.0]).unwrap();
        assert!(matches!(
            try_inverse(&m, "test"),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
