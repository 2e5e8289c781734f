//! Pure-Rust singular value decomposition for `ndarray`, built on the implicit-shift QR
//! iteration of Golub and Kahan.
//!
//! A matrix is first reduced to upper-bidiagonal form with Householder reflections, then the
//! singular values of the bidiagonal are found by bulge-chasing QR steps with deflation. The
//! same Givens rotations are optionally accumulated into the orthogonal factors.
//!
//! ```
//! use ndarray::array;
//! use linfa_svd_qr::svd::{SvdConfig, SvdImplicitQr};
//!
//! let a = array![[3.0f64, 0.], [4., 5.]];
//! let mut svd = SvdImplicitQr::new(SvdConfig::default());
//! svd.decompose(&a).unwrap();
//! let u = svd.u(false).unwrap();
//! let v = svd.v(false).unwrap();
//! let rebuilt = u.dot(&svd.w().unwrap()).dot(&v.t());
//! assert!((rebuilt - &a).iter().all(|x| x.abs() < 1e-10));
//! ```

pub mod bidiagonal;
pub mod givens;
mod householder;
pub mod implicit_qr;
pub mod svd;

use std::fmt;

use ndarray::ShapeError;
use thiserror::Error;

/// One of the two orthogonal factors of a singular value decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    U,
    V,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::U => write!(f, "U"),
            Factor::V => write!(f, "V"),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinalgError {
    /// Matrix has no rows or no columns
    #[error("Matrix is empty")]
    EmptyMatrix,
    /// Wrong number of rows in matrix
    #[error("Expected {expected} rows, got {actual}")]
    WrongRows { expected: usize, actual: usize },
    /// An internal buffer does not have the shape the algorithm relies on
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// The bidiagonal reduction broke down, usually because of non-finite input
    #[error("Bidiagonal reduction failed")]
    ReductionFailure,
    /// The implicit QR iteration ran out of its iteration budget
    #[error("Implicit QR iteration did not converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },
    /// The factor was not requested when the decomposition was configured
    #[error("{0} was not requested, so it was not computed")]
    NotComputed(Factor),
    /// No successful decomposition is available
    #[error("No successful decomposition is available")]
    NotDecomposed,
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, LinalgError>;
