use fastfilters_image::{AllocatorError, ImageError};
use fastfilters_linalg::LinalgError;

use crate::filter::{BorderTreatment, LineEnd};

/// An error type for kernel construction, convolution and the feature recipes.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The Gaussian scale is not a positive finite number in the supported range.
    #[error("Invalid Gaussian scale {0}")]
    InvalidSigma(f64),

    /// The derivative order is larger than two.
    #[error("Derivative order {0} is not supported, the maximum is 2")]
    UnsupportedOrder(u32),

    /// The kernel support `window_ratio * sigma` exceeds [`MAX_RADIUS`] samples.
    ///
    /// [`MAX_RADIUS`]: crate::filter::kernels::MAX_RADIUS
    #[error("Kernel radius {radius} exceeds the maximum of {max} samples")]
    KernelTooLarge {
        /// The requested radius, before rounding.
        radius: f64,
        /// The largest supported radius.
        max: usize,
    },

    /// A kernel was built without coefficients.
    #[error("Kernel must have at least one coefficient")]
    EmptyKernel,

    /// A pointer border was requested without a ghost-sample buffer.
    #[error("Pointer border on the {0} end requires a ghost-sample buffer")]
    MissingBorderBuffer(LineEnd),

    /// The ghost-sample buffer does not cover every line.
    #[error("Ghost-sample buffer on the {end} end holds {len} samples, {required} are required")]
    BorderBufferTooShort {
        /// Which end of the line the buffer belongs to.
        end: LineEnd,
        /// Length of the supplied buffer.
        len: usize,
        /// Smallest length that covers every line.
        required: usize,
    },

    /// The line is shorter than the kernel and one end synthesises its samples.
    #[error("Line of {n_pixels} pixels is shorter than the kernel length {len}")]
    LineTooShort {
        /// Number of pixels along the line.
        n_pixels: usize,
        /// One-sided kernel length.
        len: usize,
    },

    /// The input or output slice cannot hold the described lines.
    #[error("The {which} slice holds {len} elements, {required} are required")]
    SliceTooShort {
        /// `"input"` or `"output"`.
        which: &'static str,
        /// Length of the slice.
        len: usize,
        /// Smallest length that holds every line.
        required: usize,
    },

    /// The line shape has no pixels or no lines.
    #[error("Line shape must be non-empty, got {n_pixels} pixels in {n_outer} lines")]
    EmptyLines {
        /// Number of pixels per line.
        n_pixels: usize,
        /// Number of lines.
        n_outer: usize,
    },

    /// The border treatment cannot be used by this operation.
    #[error("Border treatment {0:?} is not supported by this operation")]
    UnsupportedBorder(BorderTreatment),

    /// The operation needs a different number of channels.
    #[error("Expected {expected} channel(s), got {actual}")]
    ChannelCount {
        /// Channels the operation supports.
        expected: usize,
        /// Channels of the given array.
        actual: usize,
    },

    /// An array view is invalid or two arrays disagree in shape.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Scratch memory could not be allocated.
    #[error(transparent)]
    Allocation(#[from] AllocatorError),

    /// The eigenvalue solver rejected its inputs.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}
