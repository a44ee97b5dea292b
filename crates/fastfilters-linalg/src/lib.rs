#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Module with the closed-form symmetric eigenvalue solvers.
pub mod eigen;

/// Error types for the linalg module.
pub mod error;

pub use crate::eigen::{
    eigenvalues2d, eigenvalues3d, symmetric_eigenvalues2, symmetric_eigenvalues3,
};
pub use crate::error::LinalgError;
