//! Recursive Gaussian smoothing.
//!
//! A third-order causal filter followed by the same filter run anti-causally
//! approximates a Gaussian with a cost independent of sigma. Derivatives are
//! taken as central differences of the smoothed line.
//!
//! # References
//!
//! - I. T. Young and L. J. van Vliet, "Recursive implementation of the Gaussian
//!   filter", Signal Processing 44 (1995) 139-151.

use fastfilters_image::{AlignedBuffer, ScratchAllocator};

use super::{
    border::{pad_line, BorderTreatment, LineBorders},
    convolution::{check_lines, LineShape, StridedLines, StridedLinesMut},
    kernels::{support_radius, MAX_ORDER},
};
use crate::error::FilterError;

/// Smallest sigma for which the recursion coefficients are valid.
pub const MIN_IIR_SIGMA: f64 = 0.5;

/// Padding in multiples of sigma used when the caller passes zero or a negative ratio.
pub const DEFAULT_IIR_WINDOW_RATIO: f32 = 4.0;

/// A recursive Gaussian (derivative) kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct IirKernel {
    order: u32,
    sigma: f64,
    gain: f64,
    feedback: [f64; 3],
    padding: usize,
}

impl IirKernel {
    /// Build the recursion for the `order`-th derivative of a Gaussian.
    ///
    /// Each line is padded with `ceil(window_ratio * sigma) + 1` border samples
    /// per side before the recursion runs; a `window_ratio <= 0` selects
    /// [`DEFAULT_IIR_WINDOW_RATIO`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidSigma` if `sigma` is below [`MIN_IIR_SIGMA`] or not
    /// finite, `UnsupportedOrder` if `order > 2` and `KernelTooLarge` if the
    /// padding exceeds [`MAX_RADIUS`](super::kernels::MAX_RADIUS).
    pub fn gaussian(order: u32, sigma: f64, window_ratio: f32) -> Result<Self, FilterError> {
        if !sigma.is_finite() || sigma < MIN_IIR_SIGMA {
            return Err(FilterError::InvalidSigma(sigma));
        }
        if order > MAX_ORDER {
            return Err(FilterError::UnsupportedOrder(order));
        }

        let ratio = if window_ratio.is_finite() && window_ratio > 0.0 {
            window_ratio
        } else {
            DEFAULT_IIR_WINDOW_RATIO
        };
        let padding = support_radius(ratio, sigma)? + 1;

        let q = if sigma >= 2.5 {
            0.98711 * sigma - 0.96330
        } else {
            3.97156 - 4.14554 * (1.0 - 0.26891 * sigma).sqrt()
        };
        let (q2, q3) = (q * q, q * q * q);
        let b0 = 1.57825 + 2.44413 * q + 1.4281 * q2 + 0.422205 * q3;
        let b1 = 2.44413 * q + 2.85619 * q2 + 1.26661 * q3;
        let b2 = -(1.4281 * q2 + 1.26661 * q3);
        let b3 = 0.422205 * q3;

        let feedback = [b1 / b0, b2 / b0, b3 / b0];
        let gain = 1.0 - feedback.iter().sum::<f64>();

        log::debug!("iir gaussian kernel: order={order} sigma={sigma} q={q:.5} padding={padding}");

        Ok(Self {
            order,
            sigma,
            gain,
            feedback,
            padding,
        })
    }

    /// Derivative order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Scale of the approximated Gaussian.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Number of border samples synthesised on each side before the recursion runs.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Filter every line; the same code serves inner and outer axes.
    pub(crate) fn convolve<A: ScratchAllocator>(
        &self,
        src: StridedLines<'_>,
        mut dst: StridedLinesMut<'_>,
        shape: LineShape,
        borders: &LineBorders<'_>,
        alloc: &A,
    ) -> Result<(), FilterError> {
        check_lines(&src, &dst, shape)?;
        if borders.uses_pointer() {
            return Err(FilterError::UnsupportedBorder(BorderTreatment::Pointer));
        }

        let n = shape.n_pixels;
        let p = self.padding;
        let mut line = AlignedBuffer::zeros(n + 2 * p, alloc.clone())?;
        let mut out = AlignedBuffer::zeros(n, alloc.clone())?;

        for o in 0..shape.n_outer {
            pad_line(&src, o, n, p, borders, line.as_mut_slice());
            self.smooth(line.as_mut_slice());

            let s = line.as_slice();
            let values = out.as_mut_slice();
            match self.order {
                0 => values.copy_from_slice(&s[p..p + n]),
                1 => {
                    for (i, v) in values.iter_mut().enumerate() {
                        *v = 0.5 * (s[p + i + 1] - s[p + i - 1]);
                    }
                }
                _ => {
                    for (i, v) in values.iter_mut().enumerate() {
                        *v = s[p + i + 1] - 2.0 * s[p + i] + s[p + i - 1];
                    }
                }
            }
            dst.write_line(o, out.as_slice());
        }

        Ok(())
    }

    /// Causal then anti-causal pass, each started in the steady state of its first sample.
    fn smooth(&self, line: &mut [f32]) {
        let first = line[0] as f64;
        self.recurse(line.iter_mut(), first);
        let last = line[line.len() - 1] as f64;
        self.recurse(line.iter_mut().rev(), last);
    }

    fn recurse<'a>(&self, samples: impl Iterator<Item = &'a mut f32>, start: f64) {
        let [a1, a2, a3] = self.feedback;
        let (mut w1, mut w2, mut w3) = (start, start, start);
        for v in samples {
            let w = self.gain * *v as f64 + a1 * w1 + a2 * w2 + a3 * w3;
            w3 = w2;
            w2 = w1;
            w1 = w;
            *v = w as f32;
        }
    }
}
