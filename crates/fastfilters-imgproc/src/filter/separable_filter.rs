use fastfilters_image::{
    AlignedBuffer, ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3, ScratchAllocator,
};

use super::{
    BorderTreatment, FilterOptions, Kernel, LineBorders, LineShape, LineStrides, StridedLines,
    StridedLinesMut,
};
use crate::{context::Context, error::FilterError};

fn orchestrator_borders(options: &FilterOptions) -> Result<LineBorders<'static>, FilterError> {
    if options.border == BorderTreatment::Pointer {
        return Err(FilterError::UnsupportedBorder(BorderTreatment::Pointer));
    }
    Ok(LineBorders::uniform(options.border))
}

/// Apply one kernel along `x` and one along `y` of a 2D array.
///
/// The `x` pass runs first and writes a single-channel temporary that the `y`
/// pass reads; channels are filtered one after the other and never mix.
///
/// # Arguments
///
/// * `ctx` - Supplies the scratch allocator.
/// * `src` - The input array.
/// * `kernel_x` - The kernel applied along `x`.
/// * `kernel_y` - The kernel applied along `y`.
/// * `dst` - The output array, same extents and channels as `src`.
/// * `options` - The border policy is taken from here; `Pointer` is rejected.
///
/// # Errors
///
/// Returns `SizeMismatch` if the arrays differ in shape, `UnsupportedBorder`
/// for a pointer border, and any error of the 1D passes. The output is
/// unspecified after an error.
///
/// # Examples
///
/// ```
/// use fastfilters_image::{Array2, CpuAllocator};
/// use fastfilters_imgproc::context::Context;
/// use fastfilters_imgproc::filter::{convolve2d, FilterOptions};
///
/// let ctx = Context::new();
/// let kernel = ctx.kernel_fir_gaussian(0, 1.0, 0.0).unwrap();
///
/// let src = Array2::from_shape_val([8, 8], 1, 3.0, CpuAllocator).unwrap();
/// let mut dst = Array2::zeros([8, 8], 1, CpuAllocator).unwrap();
///
/// convolve2d(&ctx, &src.view(), &kernel, &kernel, &mut dst.view_mut(), &FilterOptions::default())
///     .unwrap();
///
/// assert!(dst.as_slice().iter().all(|&v| (v - 3.0).abs() < 1e-5));
/// ```
pub fn convolve2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    kernel_x: &Kernel,
    kernel_y: &Kernel,
    dst: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    src.layout().check_same_shape(dst.layout())?;
    let borders = orchestrator_borders(options)?;

    let [n_x, n_y] = src.layout().extents;
    let [src_x, src_y] = src.layout().strides;
    let [dst_x, dst_y] = dst.layout().strides;
    let alloc = ctx.allocator();
    let mut temp = AlignedBuffer::zeros(n_x * n_y, alloc.clone())?;

    for c in 0..src.n_channels() {
        log::trace!("convolve2d: channel {c}, x pass over {n_y} lines of {n_x}");
        kernel_x.convolve_inner(
            StridedLines::new(&src.data()[c..], LineStrides::new(src_x, src_y)),
            StridedLinesMut::new(temp.as_mut_slice(), LineStrides::new(1, n_x)),
            LineShape::new(n_x, n_y),
            &borders,
            alloc,
        )?;

        log::trace!("convolve2d: channel {c}, y pass over {n_x} lines of {n_y}");
        kernel_y.convolve_outer(
            StridedLines::new(temp.as_slice(), LineStrides::new(n_x, 1)),
            StridedLinesMut::new(&mut dst.data_mut()[c..], LineStrides::new(dst_y, dst_x)),
            LineShape::new(n_y, n_x),
            &borders,
            alloc,
        )?;
    }

    Ok(())
}

/// Apply one kernel along each of `x`, `y` and `z` of a 3D array.
///
/// The passes run in the fixed order `x`, `y`, `z`: `x` from `src` into `dst`,
/// `y` from `dst` into a single-channel temporary and `z` from the temporary
/// back into `dst`.
///
/// # Errors
///
/// Same as [`convolve2d`].
pub fn convolve3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    kernel_x: &Kernel,
    kernel_y: &Kernel,
    kernel_z: &Kernel,
    dst: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    src.layout().check_same_shape(dst.layout())?;
    let borders = orchestrator_borders(options)?;

    let [n_x, n_y, n_z] = src.layout().extents;
    let [src_x, src_y, src_z] = src.layout().strides;
    let [dst_x, dst_y, dst_z] = dst.layout().strides;
    let plane = n_x * n_y;
    let alloc = ctx.allocator();
    let mut temp = AlignedBuffer::zeros(plane * n_z, alloc.clone())?;

    for c in 0..src.n_channels() {
        log::trace!("convolve3d: channel {c}, x pass");
        for z in 0..n_z {
            kernel_x.convolve_inner(
                StridedLines::new(&src.data()[c + z * src_z..], LineStrides::new(src_x, src_y)),
                StridedLinesMut::new(
                    &mut dst.data_mut()[c + z * dst_z..],
                    LineStrides::new(dst_x, dst_y),
                ),
                LineShape::new(n_x, n_y),
                &borders,
                alloc,
            )?;
        }

        log::trace!("convolve3d: channel {c}, y pass");
        for z in 0..n_z {
            kernel_y.convolve_outer(
                StridedLines::new(&dst.data()[c + z * dst_z..], LineStrides::new(dst_y, dst_x)),
                StridedLinesMut::new(
                    &mut temp.as_mut_slice()[z * plane..],
                    LineStrides::new(n_x, 1),
                ),
                LineShape::new(n_y, n_x),
                &borders,
                alloc,
            )?;
        }

        log::trace!("convolve3d: channel {c}, z pass");
        for y in 0..n_y {
            kernel_z.convolve_outer(
                StridedLines::new(&temp.as_slice()[y * n_x..], LineStrides::new(plane, 1)),
                StridedLinesMut::new(
                    &mut dst.data_mut()[c + y * dst_y..],
                    LineStrides::new(dst_z, dst_x),
                ),
                LineShape::new(n_z, n_x),
                &borders,
                alloc,
            )?;
        }
    }

    Ok(())
}
