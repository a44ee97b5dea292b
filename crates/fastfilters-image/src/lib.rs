#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// allocator trait and the default system allocator.
pub mod allocator;

/// strided array views and owned arrays.
pub mod array;

/// aligned scratch storage.
pub mod buffer;

/// Error types for the image module.
pub mod error;

pub use crate::allocator::{AllocatorError, CpuAllocator, ScratchAllocator, SIMD_ALIGNMENT};
pub use crate::array::{
    Array, Array2, Array3, ArrayLayout, ArrayView, ArrayView2, ArrayView3, ArrayViewMut,
    ArrayViewMut2, ArrayViewMut3,
};
pub use crate::buffer::AlignedBuffer;
pub use crate::error::ImageError;
