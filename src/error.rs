//! Crate-wide error type.
//!
//! Hand-rolled enum + `Display` + `std::error::Error`, matching the pattern
//! already used inside this codebase's own geometry modules (volume errors)
//! rather than pulling in an error-derive crate: every fallible entry point
//! in this crate returns `Result<T, Error>`.

use std::fmt;

/// Errors raised by the geometry, dynamics, and abstraction layers.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Two operands of a vector/matrix/polytope operation had incompatible
    /// shapes (e.g. applying a `d x m` matrix to a vector of length `!= m`).
    DimensionMismatch {
        expected: usize,
        found: usize,
        context: &'static str,
    },

    /// A linear-algebra step failed numerically (singular inversion, a
    /// division by a near-zero pivot).
    MathError { context: &'static str },

    /// A textual inequation failed to parse.
    ParseError { message: String },

    /// A conversion or partition invariant was violated: a polytope with
    /// neither representation populated, a partition that does not cover
    /// the state it was computed for.
    ValueError { message: String },

    /// An extension point (e.g. a refinery layering generator) has no body
    /// for the requested configuration. Must never be constructed in a
    /// complete, correctly configured build.
    NotImplemented { what: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                expected,
                found,
                context,
            } => write!(
                f,
                "dimension mismatch in {context}: expected {expected}, found {found}"
            ),
            Self::MathError { context } => write!(f, "math error in {context}"),
            Self::ParseError { message } => write!(f, "parse error: {message}"),
            Self::ValueError { message } => write!(f, "value error: {message}"),
            Self::NotImplemented { what } => write!(f, "not implemented: {what}"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_mention_context() {
        let e = Error::DimensionMismatch {
            expected: 2,
            found: 1,
            context: "Halfspace::new",
        };
        assert!(e.to_string().contains("Halfspace::new"));
        assert!(e.to_string().contains('2'));
        assert!(e.to_string().contains('1'));
    }

    #[test]
    fn errors_are_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<Error>();
    }
}
