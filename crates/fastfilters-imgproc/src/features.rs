//! Gaussian derivative features built on the separable convolution.
//!
//! Every recipe takes the filter [`Context`], the input array, its scale(s),
//! the output array(s) and the [`FilterOptions`]. Kernels are built with
//! `options.window_ratio` and the arrays are filtered with `options.border`.
//! Intermediate arrays come from the context allocator and are released when
//! the call returns.
//!
//! # Examples
//!
//! ```
//! use fastfilters_image::{Array2, CpuAllocator};
//! use fastfilters_imgproc::{features::gradmag2d, filter::FilterOptions, Context};
//!
//! let ctx = Context::new();
//! let ramp = Array2::from_shape_fn([32, 32], 1, CpuAllocator, |[x, y], _| {
//!     (3 * x + 4 * y) as f32
//! })
//! .unwrap();
//! let mut mag = Array2::zeros([32, 32], 1, CpuAllocator).unwrap();
//!
//! gradmag2d(&ctx, &ramp.view(), 1.0, &mut mag.view_mut(), &FilterOptions::default()).unwrap();
//!
//! assert!((mag.get([16, 16], 0) - 5.0).abs() < 1e-3);
//! ```

use fastfilters_image::{
    Array, Array2, Array3, ArrayLayout, ArrayView, ArrayView2, ArrayView3, ArrayViewMut2,
    ArrayViewMut3, ScratchAllocator,
};
use fastfilters_linalg::{eigenvalues2d, eigenvalues3d};

use crate::{
    combine::{
        assign, combine_add2d, combine_add3d, combine_addsqrt2d, combine_addsqrt3d, combine_mul2d,
        combine_mul3d,
    },
    context::Context,
    error::FilterError,
    filter::{convolve2d, convolve3d, FilterOptions, Kernel},
};

fn fir<A: ScratchAllocator>(
    ctx: &Context<A>,
    order: u32,
    sigma: f64,
    options: &FilterOptions,
) -> Result<Kernel, FilterError> {
    ctx.kernel_fir_gaussian(order, sigma, options.window_ratio)
}

fn scratch<const D: usize, A: ScratchAllocator>(
    ctx: &Context<A>,
    layout: &ArrayLayout<D>,
) -> Result<Array<D, A>, FilterError> {
    Ok(Array::zeros(layout.extents, layout.n_channels, ctx.allocator().clone())?)
}

fn single_channel<const D: usize>(src: &ArrayView<'_, D>) -> Result<(), FilterError> {
    match src.n_channels() {
        1 => Ok(()),
        actual => Err(FilterError::ChannelCount {
            expected: 1,
            actual,
        }),
    }
}

/// Gaussian smoothing (`order == 0`) or the same derivative order along both axes.
///
/// # Errors
///
/// Returns the kernel builder errors for `order` and `sigma`, and any error of
/// [`convolve2d`].
pub fn gaussian2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    order: u32,
    sigma: f64,
    dst: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let kernel = fir(ctx, order, sigma, options)?;
    convolve2d(ctx, src, &kernel, &kernel, dst, options)
}

/// Gaussian smoothing or the same derivative order along all three axes.
pub fn gaussian3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    order: u32,
    sigma: f64,
    dst: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let kernel = fir(ctx, order, sigma, options)?;
    convolve3d(ctx, src, &kernel, &kernel, &kernel, dst, options)
}

/// Gaussian gradient magnitude `sqrt(Ix² + Iy²)`.
pub fn gradmag2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    sigma: f64,
    dst: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    src.layout().check_same_shape(dst.layout())?;
    let g0 = fir(ctx, 0, sigma, options)?;
    let g1 = fir(ctx, 1, sigma, options)?;

    let mut dx = scratch(ctx, src.layout())?;
    let mut dy = scratch(ctx, src.layout())?;
    convolve2d(ctx, src, &g1, &g0, &mut dx.view_mut(), options)?;
    convolve2d(ctx, src, &g0, &g1, &mut dy.view_mut(), options)?;

    Ok(combine_addsqrt2d(&dx.view(), &dy.view(), dst)?)
}

/// Gaussian gradient magnitude `sqrt(Ix² + Iy² + Iz²)`.
pub fn gradmag3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    sigma: f64,
    dst: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    src.layout().check_same_shape(dst.layout())?;
    let g0 = fir(ctx, 0, sigma, options)?;
    let g1 = fir(ctx, 1, sigma, options)?;

    let mut dx = scratch(ctx, src.layout())?;
    let mut dy = scratch(ctx, src.layout())?;
    let mut dz = scratch(ctx, src.layout())?;
    convolve3d(ctx, src, &g1, &g0, &g0, &mut dx.view_mut(), options)?;
    convolve3d(ctx, src, &g0, &g1, &g0, &mut dy.view_mut(), options)?;
    convolve3d(ctx, src, &g0, &g0, &g1, &mut dz.view_mut(), options)?;

    Ok(combine_addsqrt3d(&dx.view(), &dy.view(), &dz.view(), dst)?)
}

/// Laplacian of Gaussian `Ixx + Iyy`.
pub fn laplacian2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    sigma: f64,
    dst: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    src.layout().check_same_shape(dst.layout())?;
    let g0 = fir(ctx, 0, sigma, options)?;
    let g2 = fir(ctx, 2, sigma, options)?;

    let mut dxx = scratch(ctx, src.layout())?;
    let mut dyy = scratch(ctx, src.layout())?;
    convolve2d(ctx, src, &g2, &g0, &mut dxx.view_mut(), options)?;
    convolve2d(ctx, src, &g0, &g2, &mut dyy.view_mut(), options)?;

    Ok(combine_add2d(&dxx.view(), &dyy.view(), dst)?)
}

/// Laplacian of Gaussian `Ixx + Iyy + Izz`.
pub fn laplacian3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    sigma: f64,
    dst: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    src.layout().check_same_shape(dst.layout())?;
    let g0 = fir(ctx, 0, sigma, options)?;
    let g2 = fir(ctx, 2, sigma, options)?;

    let mut dxx = scratch(ctx, src.layout())?;
    let mut dyy = scratch(ctx, src.layout())?;
    let mut dzz = scratch(ctx, src.layout())?;
    convolve3d(ctx, src, &g2, &g0, &g0, &mut dxx.view_mut(), options)?;
    convolve3d(ctx, src, &g0, &g2, &g0, &mut dyy.view_mut(), options)?;
    convolve3d(ctx, src, &g0, &g0, &g2, &mut dzz.view_mut(), options)?;

    Ok(combine_add3d(&dxx.view(), &dyy.view(), &dzz.view(), dst)?)
}

/// Hessian of Gaussian: the second derivatives `xx`, `xy` and `yy`.
pub fn hog2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    sigma: f64,
    xx: &mut ArrayViewMut2<'_>,
    xy: &mut ArrayViewMut2<'_>,
    yy: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let g0 = fir(ctx, 0, sigma, options)?;
    let g1 = fir(ctx, 1, sigma, options)?;
    let g2 = fir(ctx, 2, sigma, options)?;

    convolve2d(ctx, src, &g2, &g0, xx, options)?;
    convolve2d(ctx, src, &g1, &g1, xy, options)?;
    convolve2d(ctx, src, &g0, &g2, yy, options)
}

/// Hessian of Gaussian in 3D, written as `xx, yy, zz, xy, xz, yz`.
#[allow(clippy::too_many_arguments)]
pub fn hog3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    sigma: f64,
    xx: &mut ArrayViewMut3<'_>,
    yy: &mut ArrayViewMut3<'_>,
    zz: &mut ArrayViewMut3<'_>,
    xy: &mut ArrayViewMut3<'_>,
    xz: &mut ArrayViewMut3<'_>,
    yz: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let g0 = fir(ctx, 0, sigma, options)?;
    let g1 = fir(ctx, 1, sigma, options)?;
    let g2 = fir(ctx, 2, sigma, options)?;

    convolve3d(ctx, src, &g2, &g0, &g0, xx, options)?;
    convolve3d(ctx, src, &g0, &g2, &g0, yy, options)?;
    convolve3d(ctx, src, &g0, &g0, &g2, zz, options)?;
    convolve3d(ctx, src, &g1, &g1, &g0, xy, options)?;
    convolve3d(ctx, src, &g1, &g0, &g1, xz, options)?;
    convolve3d(ctx, src, &g0, &g1, &g1, yz, options)
}

fn smoothed_product2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    (a, b): (&Array2<A>, &Array2<A>),
    product: &mut Array2<A>,
    smooth: &Kernel,
    dst: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    combine_mul2d(&a.view(), &b.view(), &mut product.view_mut())?;
    convolve2d(ctx, &product.view(), smooth, smooth, dst, options)
}

fn smoothed_product3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    (a, b): (&Array3<A>, &Array3<A>),
    product: &mut Array3<A>,
    smooth: &Kernel,
    dst: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    combine_mul3d(&a.view(), &b.view(), &mut product.view_mut())?;
    convolve3d(ctx, &product.view(), smooth, smooth, smooth, dst, options)
}

/// Structure tensor: products of the first derivatives at `sigma_inner`,
/// smoothed with a Gaussian of `sigma_outer`.
///
/// # Arguments
///
/// * `sigma_outer` - Scale of the integration window.
/// * `sigma_inner` - Scale of the gradient.
/// * `xx`, `xy`, `yy` - The tensor entries, same shape as `src`.
#[allow(clippy::too_many_arguments)]
pub fn structure_tensor2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    sigma_outer: f64,
    sigma_inner: f64,
    xx: &mut ArrayViewMut2<'_>,
    xy: &mut ArrayViewMut2<'_>,
    yy: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let g0 = fir(ctx, 0, sigma_inner, options)?;
    let g1 = fir(ctx, 1, sigma_inner, options)?;
    let smooth = fir(ctx, 0, sigma_outer, options)?;

    let mut dx = scratch(ctx, src.layout())?;
    let mut dy = scratch(ctx, src.layout())?;
    let mut product = scratch(ctx, src.layout())?;
    convolve2d(ctx, src, &g1, &g0, &mut dx.view_mut(), options)?;
    convolve2d(ctx, src, &g0, &g1, &mut dy.view_mut(), options)?;

    smoothed_product2d(ctx, (&dx, &dx), &mut product, &smooth, xx, options)?;
    smoothed_product2d(ctx, (&dx, &dy), &mut product, &smooth, xy, options)?;
    smoothed_product2d(ctx, (&dy, &dy), &mut product, &smooth, yy, options)
}

/// Structure tensor in 3D, written as `xx, yy, zz, xy, xz, yz`.
#[allow(clippy::too_many_arguments)]
pub fn structure_tensor3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    sigma_outer: f64,
    sigma_inner: f64,
    xx: &mut ArrayViewMut3<'_>,
    yy: &mut ArrayViewMut3<'_>,
    zz: &mut ArrayViewMut3<'_>,
    xy: &mut ArrayViewMut3<'_>,
    xz: &mut ArrayViewMut3<'_>,
    yz: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let g0 = fir(ctx, 0, sigma_inner, options)?;
    let g1 = fir(ctx, 1, sigma_inner, options)?;
    let smooth = fir(ctx, 0, sigma_outer, options)?;

    let mut dx = scratch(ctx, src.layout())?;
    let mut dy = scratch(ctx, src.layout())?;
    let mut dz = scratch(ctx, src.layout())?;
    let mut product = scratch(ctx, src.layout())?;
    convolve3d(ctx, src, &g1, &g0, &g0, &mut dx.view_mut(), options)?;
    convolve3d(ctx, src, &g0, &g1, &g0, &mut dy.view_mut(), options)?;
    convolve3d(ctx, src, &g0, &g0, &g1, &mut dz.view_mut(), options)?;

    smoothed_product3d(ctx, (&dx, &dx), &mut product, &smooth, xx, options)?;
    smoothed_product3d(ctx, (&dy, &dy), &mut product, &smooth, yy, options)?;
    smoothed_product3d(ctx, (&dz, &dz), &mut product, &smooth, zz, options)?;
    smoothed_product3d(ctx, (&dx, &dy), &mut product, &smooth, xy, options)?;
    smoothed_product3d(ctx, (&dx, &dz), &mut product, &smooth, xz, options)?;
    smoothed_product3d(ctx, (&dy, &dz), &mut product, &smooth, yz, options)
}

/// Solve a dense tensor field and copy the eigenvalues into the output views.
fn eigen_field2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    [xx, xy, yy]: [&Array2<A>; 3],
    ev_small: &mut ArrayViewMut2<'_>,
    ev_big: &mut ArrayViewMut2<'_>,
) -> Result<(), FilterError> {
    let mut small = scratch(ctx, xx.layout())?;
    let mut big = scratch(ctx, xx.layout())?;
    eigenvalues2d(
        xx.as_slice(),
        xy.as_slice(),
        yy.as_slice(),
        small.as_slice_mut(),
        big.as_slice_mut(),
    )?;

    assign(&small.view(), ev_small)?;
    assign(&big.view(), ev_big)?;
    Ok(())
}

/// `entries` is ordered `xx, yy, zz, xy, xz, yz`.
fn eigen_field3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    entries: [&Array3<A>; 6],
    ev0: &mut ArrayViewMut3<'_>,
    ev1: &mut ArrayViewMut3<'_>,
    ev2: &mut ArrayViewMut3<'_>,
) -> Result<(), FilterError> {
    let [xx, yy, zz, xy, xz, yz] = entries;
    let mut fields = [
        scratch(ctx, xx.layout())?,
        scratch(ctx, xx.layout())?,
        scratch(ctx, xx.layout())?,
    ];
    let [l0, l1, l2] = &mut fields;
    eigenvalues3d(
        xx.as_slice(),
        xy.as_slice(),
        xz.as_slice(),
        yy.as_slice(),
        yz.as_slice(),
        zz.as_slice(),
        l0.as_slice_mut(),
        l1.as_slice_mut(),
        l2.as_slice_mut(),
    )?;

    let [l0, l1, l2] = &fields;
    assign(&l0.view(), ev0)?;
    assign(&l1.view(), ev1)?;
    assign(&l2.view(), ev2)?;
    Ok(())
}

/// Eigenvalues of the Hessian of Gaussian, `ev_small <= ev_big` at every pixel.
///
/// # Errors
///
/// Returns `ChannelCount` unless `src` has a single channel, `SizeMismatch`
/// if an output differs in shape, and any error of [`hog2d`].
pub fn hessian_eigenvalues2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    sigma: f64,
    ev_small: &mut ArrayViewMut2<'_>,
    ev_big: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    single_channel(src)?;
    src.layout().check_same_shape(ev_small.layout())?;
    src.layout().check_same_shape(ev_big.layout())?;

    let mut xx = scratch(ctx, src.layout())?;
    let mut xy = scratch(ctx, src.layout())?;
    let mut yy = scratch(ctx, src.layout())?;
    hog2d(
        ctx,
        src,
        sigma,
        &mut xx.view_mut(),
        &mut xy.view_mut(),
        &mut yy.view_mut(),
        options,
    )?;

    eigen_field2d(ctx, [&xx, &xy, &yy], ev_small, ev_big)
}

/// Eigenvalues of the 3D Hessian of Gaussian, ascending `ev0 <= ev1 <= ev2`.
pub fn hessian_eigenvalues3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    sigma: f64,
    ev0: &mut ArrayViewMut3<'_>,
    ev1: &mut ArrayViewMut3<'_>,
    ev2: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    single_channel(src)?;
    for ev in [&*ev0, &*ev1, &*ev2] {
        src.layout().check_same_shape(ev.layout())?;
    }

    let mut entries = [
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
    ];
    let [xx, yy, zz, xy, xz, yz] = &mut entries;
    hog3d(
        ctx,
        src,
        sigma,
        &mut xx.view_mut(),
        &mut yy.view_mut(),
        &mut zz.view_mut(),
        &mut xy.view_mut(),
        &mut xz.view_mut(),
        &mut yz.view_mut(),
        options,
    )?;

    let [xx, yy, zz, xy, xz, yz] = &entries;
    eigen_field3d(ctx, [xx, yy, zz, xy, xz, yz], ev0, ev1, ev2)
}

/// Eigenvalues of the structure tensor, `ev_small <= ev_big` at every pixel.
///
/// # Errors
///
/// Same as [`hessian_eigenvalues2d`].
#[allow(clippy::too_many_arguments)]
pub fn structure_tensor_eigenvalues2d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView2<'_>,
    sigma_outer: f64,
    sigma_inner: f64,
    ev_small: &mut ArrayViewMut2<'_>,
    ev_big: &mut ArrayViewMut2<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    single_channel(src)?;
    src.layout().check_same_shape(ev_small.layout())?;
    src.layout().check_same_shape(ev_big.layout())?;

    let mut xx = scratch(ctx, src.layout())?;
    let mut xy = scratch(ctx, src.layout())?;
    let mut yy = scratch(ctx, src.layout())?;
    structure_tensor2d(
        ctx,
        src,
        sigma_outer,
        sigma_inner,
        &mut xx.view_mut(),
        &mut xy.view_mut(),
        &mut yy.view_mut(),
        options,
    )?;

    eigen_field2d(ctx, [&xx, &xy, &yy], ev_small, ev_big)
}

/// Eigenvalues of the 3D structure tensor, ascending `ev0 <= ev1 <= ev2`.
#[allow(clippy::too_many_arguments)]
pub fn structure_tensor_eigenvalues3d<A: ScratchAllocator>(
    ctx: &Context<A>,
    src: &ArrayView3<'_>,
    sigma_outer: f64,
    sigma_inner: f64,
    ev0: &mut ArrayViewMut3<'_>,
    ev1: &mut ArrayViewMut3<'_>,
    ev2: &mut ArrayViewMut3<'_>,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    single_channel(src)?;
    for ev in [&*ev0, &*ev1, &*ev2] {
        src.layout().check_same_shape(ev.layout())?;
    }

    let mut entries = [
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
        scratch(ctx, src.layout())?,
    ];
    let [xx, yy, zz, xy, xz, yz] = &mut entries;
    structure_tensor3d(
        ctx,
        src,
        sigma_outer,
        sigma_inner,
        &mut xx.view_mut(),
        &mut yy.view_mut(),
        &mut zz.view_mut(),
        &mut xy.view_mut(),
        &mut xz.view_mut(),
        &mut yz.view_mut(),
        options,
    )?;

    let [xx, yy, zz, xy, xz, yz] = &entries;
    eigen_field3d(ctx, [xx, yy, zz, xy, xz, yz], ev0, ev1, ev2)
}
