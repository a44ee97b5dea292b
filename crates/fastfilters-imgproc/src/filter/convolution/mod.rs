//! The 1D correlation primitive and its line bookkeeping.
//!
//! A call filters `n_outer` parallel lines of `n_pixels` samples each. The
//! *inner* variant walks one line at a time and runs the arithmetic along the
//! line; the *outer* variant gathers up to [`BLOCK_LINES`] lines into a
//! transposed block so the vector lanes run across lines. Both end in a
//! [`Correlator`], the scalar, AVX or AVX2+FMA realization resolved when the
//! kernel was built.

#[cfg(target_arch = "x86_64")]
mod avx;
#[cfg(target_arch = "x86_64")]
mod fma;
mod scalar;

use std::fmt;

use fastfilters_image::{AlignedBuffer, ScratchAllocator};

use super::{
    border::{pad_block, pad_line, LineBorders},
    kernels::FirKernel,
};
use crate::{cpu::Backend, error::FilterError};

/// Number of lines gathered into one block by the outer variant.
pub const BLOCK_LINES: usize = 32;

/// Number of lines and samples per line of a convolution call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineShape {
    /// Samples along each line.
    pub n_pixels: usize,
    /// Number of parallel lines.
    pub n_outer: usize,
}

impl LineShape {
    /// Create a shape of `n_outer` lines with `n_pixels` samples each.
    pub fn new(n_pixels: usize, n_outer: usize) -> Self {
        Self { n_pixels, n_outer }
    }
}

/// Element strides of a set of parallel lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineStrides {
    /// Distance between neighbouring samples of a line.
    pub pixel: usize,
    /// Distance between the first samples of neighbouring lines.
    pub outer: usize,
}

impl LineStrides {
    /// Create the strides of lines with the given sample and line spacing.
    pub fn new(pixel: usize, outer: usize) -> Self {
        Self { pixel, outer }
    }

    /// Smallest slice length that holds every sample of a non-empty `shape`.
    pub fn required_len(&self, shape: LineShape) -> usize {
        (shape.n_outer - 1) * self.outer + (shape.n_pixels - 1) * self.pixel + 1
    }
}

/// Read-only lines laid out in a slice.
#[derive(Clone, Copy, Debug)]
pub struct StridedLines<'a> {
    /// The samples, starting at sample `0` of line `0`.
    pub data: &'a [f32],
    /// Where the lines live inside `data`.
    pub strides: LineStrides,
}

impl<'a> StridedLines<'a> {
    /// Describe lines inside `data`.
    pub fn new(data: &'a [f32], strides: LineStrides) -> Self {
        Self { data, strides }
    }
}

/// Writable lines laid out in a slice.
#[derive(Debug)]
pub struct StridedLinesMut<'a> {
    /// The samples, starting at sample `0` of line `0`.
    pub data: &'a mut [f32],
    /// Where the lines live inside `data`.
    pub strides: LineStrides,
}

impl<'a> StridedLinesMut<'a> {
    /// Describe lines inside `data`.
    pub fn new(data: &'a mut [f32], strides: LineStrides) -> Self {
        Self { data, strides }
    }

    #[inline]
    pub(crate) fn write_line(&mut self, line: usize, values: &[f32]) {
        let base = line * self.strides.outer;
        let pixel = self.strides.pixel;
        if pixel == 1 {
            self.data[base..base + values.len()].copy_from_slice(values);
        } else {
            for (i, &v) in values.iter().enumerate() {
                self.data[base + i * pixel] = v;
            }
        }
    }
}

/// Check that the shape is non-empty and both slices hold every line.
pub(crate) fn check_lines(
    src: &StridedLines<'_>,
    dst: &StridedLinesMut<'_>,
    shape: LineShape,
) -> Result<(), FilterError> {
    if shape.n_pixels == 0 || shape.n_outer == 0 {
        return Err(FilterError::EmptyLines {
            n_pixels: shape.n_pixels,
            n_outer: shape.n_outer,
        });
    }

    let checks = [
        ("input", src.data.len(), src.strides),
        ("output", dst.data.len(), dst.strides),
    ];
    for (which, len, strides) in checks {
        let required = strides.required_len(shape);
        if len < required {
            return Err(FilterError::SliceTooShort {
                which,
                len,
                required,
            });
        }
    }

    Ok(())
}

type CorrelateFn = unsafe fn(&[f32], usize, &[f32], bool, &mut [f32]);

fn correlate_scalar(
    padded: &[f32],
    tap_stride: usize,
    coefs: &[f32],
    symmetric: bool,
    out: &mut [f32],
) {
    scalar::correlate(padded, tap_stride, coefs, symmetric, out, 0)
}

/// A correlation realization, resolved once from a [`Backend`].
#[derive(Clone, Copy)]
pub(crate) struct Correlator {
    backend: Backend,
    run: CorrelateFn,
}

impl Correlator {
    /// Bind the realization of `backend`; targets without AVX fall back to scalar code.
    pub(crate) fn resolve(backend: Backend) -> Self {
        let run: CorrelateFn = match backend {
            #[cfg(target_arch = "x86_64")]
            Backend::AvxFma => fma::correlate,
            #[cfg(target_arch = "x86_64")]
            Backend::Avx => avx::correlate,
            _ => correlate_scalar,
        };
        Self { backend, run }
    }

    pub(crate) fn backend(&self) -> Backend {
        self.backend
    }

    /// Correlate `coefs` with a padded signal.
    ///
    /// For `j` in `0..out.len()`, with `c = j + radius * tap_stride` and
    /// `d = k * tap_stride`:
    ///
    /// - symmetric:
    ///   `out[j] = coefs[0] * padded[c] + sum_k coefs[k] * (padded[c + d] + padded[c - d])`
    /// - antisymmetric: `out[j] = sum_k coefs[k] * (padded[c + d] - padded[c - d])`
    ///
    /// # Panics
    ///
    /// Panics if `padded` holds fewer than `out.len() + 2 * radius * tap_stride` samples.
    pub(crate) fn correlate(
        &self,
        padded: &[f32],
        tap_stride: usize,
        coefs: &[f32],
        symmetric: bool,
        out: &mut [f32],
    ) {
        let radius = coefs.len() - 1;
        let padded = &padded[..out.len() + 2 * radius * tap_stride];
        // SAFETY: a SIMD backend is only resolved when the processor reports its
        // extensions, and `padded` was sliced to the length the realizations read
        unsafe { (self.run)(padded, tap_stride, coefs, symmetric, out) }
    }
}

impl fmt::Debug for Correlator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Correlator").field(&self.backend).finish()
    }
}

impl PartialEq for Correlator {
    fn eq(&self, other: &Self) -> bool {
        self.backend == other.backend
    }
}

impl FirKernel {
    /// Filter lines whose samples are processed one line at a time.
    ///
    /// Suited to the fastest varying axis: each line is copied into an aligned
    /// scratch line together with its border samples and correlated with
    /// contiguous loads.
    ///
    /// # Arguments
    ///
    /// * `src` - The input lines.
    /// * `dst` - The output lines, same shape as the input.
    /// * `shape` - Number of lines and samples per line.
    /// * `borders` - Border policy of both line ends.
    /// * `alloc` - Provides the scratch memory.
    ///
    /// # Errors
    ///
    /// Nothing is written when the call is rejected:
    ///
    /// - `EmptyLines` or `SliceTooShort` if the shape does not fit the slices,
    /// - `MissingBorderBuffer` or `BorderBufferTooShort` for pointer ends,
    /// - `LineTooShort` if a synthesised end meets a line shorter than the kernel.
    pub fn convolve_inner<A: ScratchAllocator>(
        &self,
        src: StridedLines<'_>,
        mut dst: StridedLinesMut<'_>,
        shape: LineShape,
        borders: &LineBorders<'_>,
        alloc: &A,
    ) -> Result<(), FilterError> {
        self.check_call(&src, &dst, shape, borders)?;

        let radius = self.radius();
        let n = shape.n_pixels;
        let mut padded = AlignedBuffer::zeros(n + 2 * radius, alloc.clone())?;
        let mut line_out = AlignedBuffer::zeros(n, alloc.clone())?;

        let correlator = self.correlator();
        for line in 0..shape.n_outer {
            pad_line(&src, line, n, radius, borders, padded.as_mut_slice());
            correlator.correlate(
                padded.as_slice(),
                1,
                self.coefs(),
                self.is_symmetric(),
                line_out.as_mut_slice(),
            );
            dst.write_line(line, line_out.as_slice());
        }

        Ok(())
    }

    /// Filter lines that are processed in blocks of neighbouring lines.
    ///
    /// Suited to every axis but the fastest varying one: up to
    /// [`BLOCK_LINES`] lines are transposed into an aligned block so that one
    /// vector covers the same sample position of several lines.
    ///
    /// Arguments and errors are the same as for [`FirKernel::convolve_inner`].
    pub fn convolve_outer<A: ScratchAllocator>(
        &self,
        src: StridedLines<'_>,
        mut dst: StridedLinesMut<'_>,
        shape: LineShape,
        borders: &LineBorders<'_>,
        alloc: &A,
    ) -> Result<(), FilterError> {
        self.check_call(&src, &dst, shape, borders)?;

        let radius = self.radius();
        let n = shape.n_pixels;
        let block = BLOCK_LINES.min(shape.n_outer);
        let mut padded = AlignedBuffer::zeros((n + 2 * radius) * block, alloc.clone())?;
        let mut block_out = AlignedBuffer::zeros(n * block, alloc.clone())?;

        let correlator = self.correlator();
        let mut first = 0;
        while first < shape.n_outer {
            let width = block.min(shape.n_outer - first);
            let block_in = &mut padded.as_mut_slice()[..(n + 2 * radius) * width];
            let out = &mut block_out.as_mut_slice()[..n * width];

            pad_block(&src, first, width, n, radius, borders, block_in);
            correlator.correlate(block_in, width, self.coefs(), self.is_symmetric(), out);

            for (p, row) in out.chunks_exact(width).enumerate() {
                let start = first * dst.strides.outer + p * dst.strides.pixel;
                if dst.strides.outer == 1 {
                    dst.data[start..start + width].copy_from_slice(row);
                } else {
                    for (l, &v) in row.iter().enumerate() {
                        dst.data[start + l * dst.strides.outer] = v;
                    }
                }
            }

            first += width;
        }

        Ok(())
    }

    fn check_call(
        &self,
        src: &StridedLines<'_>,
        dst: &StridedLinesMut<'_>,
        shape: LineShape,
        borders: &LineBorders<'_>,
    ) -> Result<(), FilterError> {
        check_lines(src, dst, shape)?;
        borders.validate(shape, self.radius())?;
        if shape.n_pixels < self.len() && !borders.all_pointer() {
            return Err(FilterError::LineTooShort {
                n_pixels: shape.n_pixels,
                len: self.len(),
            });
        }
        Ok(())
    }
}
