//! Separable Gaussian derivative filtering.
//!
//! Kernels are built once and bound to a correlation backend. The 1D
//! primitive filters sets of parallel lines; the orchestrator applies one
//! kernel per axis to 2D and 3D arrays.

mod border;
pub use border::{BorderTreatment, GhostSamples, LineBorders, LineEnd};

mod convolution;
pub use convolution::{LineShape, LineStrides, StridedLines, StridedLinesMut, BLOCK_LINES};

/// Recursive Gaussian kernels.
pub mod iir;
pub use iir::IirKernel;

/// Finite impulse response kernels and the axis kernel type.
pub mod kernels;
pub use kernels::{FirKernel, Kernel};

mod options;
pub use options::FilterOptions;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
