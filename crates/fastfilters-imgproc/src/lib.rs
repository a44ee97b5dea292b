#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// elementwise combination of arrays.
pub mod combine;

/// dispatch table and scratch allocator shared by all filters.
pub mod context;

/// runtime CPU feature detection.
pub mod cpu;

/// Error types for the imgproc module.
pub mod error;

/// Gaussian derivative feature recipes.
pub mod features;

/// separable filtering module.
pub mod filter;

pub use crate::context::Context;
pub use crate::error::FilterError;
