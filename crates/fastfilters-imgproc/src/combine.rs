use fastfilters_image::{
    ArrayView, ArrayView2, ArrayView3, ArrayViewMut, ArrayViewMut2, ArrayViewMut3, ImageError,
};

/// Write `f` of the co-located elements of `inputs` to every element of `out`.
fn zip_map<const D: usize, const N: usize>(
    inputs: [&ArrayView<'_, D>; N],
    out: &mut ArrayViewMut<'_, D>,
    f: impl Fn([f32; N]) -> f32,
) -> Result<(), ImageError> {
    for input in inputs.iter() {
        input.layout().check_same_shape(out.layout())?;
    }

    let layout = *out.layout();
    for flat in 0..layout.num_pixels() {
        let mut index = [0; D];
        let mut rest = flat;
        for (i, &n) in index.iter_mut().zip(layout.extents.iter()) {
            *i = rest % n;
            rest /= n;
        }
        for c in 0..layout.n_channels {
            let values = inputs.map(|input| input.get(index, c));
            out.set(index, c, f(values));
        }
    }

    Ok(())
}

/// Copy `src` into `dst`, which may have a different stride layout.
pub(crate) fn assign<const D: usize>(
    src: &ArrayView<'_, D>,
    dst: &mut ArrayViewMut<'_, D>,
) -> Result<(), ImageError> {
    zip_map([src], dst, |[v]| v)
}

/// Elementwise sum `out = a + b`.
///
/// # Errors
///
/// If the arrays differ in extents or channels, a `SizeMismatch` error is returned.
///
/// # Examples
///
/// ```
/// use fastfilters_image::{Array2, CpuAllocator};
/// use fastfilters_imgproc::combine::combine_add2d;
///
/// let a = Array2::from_shape_val([4, 4], 1, 1.5, CpuAllocator).unwrap();
/// let b = Array2::from_shape_val([4, 4], 1, 2.0, CpuAllocator).unwrap();
/// let mut out = Array2::zeros([4, 4], 1, CpuAllocator).unwrap();
///
/// combine_add2d(&a.view(), &b.view(), &mut out.view_mut()).unwrap();
///
/// assert!(out.as_slice().iter().all(|&v| v == 3.5));
/// ```
pub fn combine_add2d(
    a: &ArrayView2<'_>,
    b: &ArrayView2<'_>,
    out: &mut ArrayViewMut2<'_>,
) -> Result<(), ImageError> {
    zip_map([a, b], out, |[a, b]| a + b)
}

/// Elementwise sum `out = a + b + c`.
pub fn combine_add3d(
    a: &ArrayView3<'_>,
    b: &ArrayView3<'_>,
    c: &ArrayView3<'_>,
    out: &mut ArrayViewMut3<'_>,
) -> Result<(), ImageError> {
    zip_map([a, b, c], out, |[a, b, c]| a + b + c)
}

/// Elementwise magnitude `out = sqrt(a² + b²)`.
pub fn combine_addsqrt2d(
    a: &ArrayView2<'_>,
    b: &ArrayView2<'_>,
    out: &mut ArrayViewMut2<'_>,
) -> Result<(), ImageError> {
    zip_map([a, b], out, |[a, b]| (a * a + b * b).sqrt())
}

/// Elementwise magnitude `out = sqrt(a² + b² + c²)`.
pub fn combine_addsqrt3d(
    a: &ArrayView3<'_>,
    b: &ArrayView3<'_>,
    c: &ArrayView3<'_>,
    out: &mut ArrayViewMut3<'_>,
) -> Result<(), ImageError> {
    zip_map([a, b, c], out, |[a, b, c]| (a * a + b * b + c * c).sqrt())
}

/// Elementwise product `out = a * b`.
pub fn combine_mul2d(
    a: &ArrayView2<'_>,
    b: &ArrayView2<'_>,
    out: &mut ArrayViewMut2<'_>,
) -> Result<(), ImageError> {
    zip_map([a, b], out, |[a, b]| a * b)
}

/// Elementwise product `out = a * b` of two 3D arrays.
pub fn combine_mul3d(
    a: &ArrayView3<'_>,
    b: &ArrayView3<'_>,
    out: &mut ArrayViewMut3<'_>,
) -> Result<(), ImageError> {
    zip_map([a, b], out, |[a, b]| a * b)
}
