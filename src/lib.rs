//! Polytopic-abstraction controller synthesis for linear stochastic systems.
//!
//! A linear stochastic system is abstracted into a finite two-player
//! probabilistic game over convex-polytope cells, refined on demand, and
//! exposed to an external solver through the `abstraction::GameGraph`
//! view. See `error`, `tol`, `linalg`, `halfspace`, `polytope`, `dynamics`,
//! and `abstraction` for the layer-by-layer build-up.

pub mod abstraction;
pub mod dynamics;
pub mod error;
pub mod halfspace;
pub mod linalg;
pub mod polytope;
pub mod tol;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
