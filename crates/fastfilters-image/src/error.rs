use crate::allocator::AllocatorError;

/// An error type for array descriptions and owned arrays.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// An extent or the channel count is zero.
    #[error("Array extents and channel count must be non-zero, got {0:?}")]
    EmptyShape(Vec<usize>),

    /// The strides would make two pixels share memory.
    #[error("Stride {stride} of axis {axis} is smaller than the required {required}")]
    InvalidStride {
        /// The offending axis (`x`, `y` or `z`).
        axis: char,
        /// The stride that was given.
        stride: usize,
        /// The smallest stride that avoids aliasing.
        required: usize,
    },

    /// The span of the array does not fit into the address space.
    #[error("Array layout {0:?} overflows the addressable element range")]
    LayoutOverflow(Vec<usize>),

    /// The backing slice does not cover the described array.
    #[error("Data length ({0}) is smaller than the array extent ({1})")]
    InvalidDataLength(usize, usize),

    /// Two arrays that must agree in shape do not.
    #[error("Array shapes do not match: {0:?} vs {1:?}")]
    SizeMismatch(Vec<usize>, Vec<usize>),

    /// The allocator failed to provide memory.
    #[error(transparent)]
    Allocation(#[from] AllocatorError),
}
