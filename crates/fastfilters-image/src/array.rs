use crate::{
    allocator::{CpuAllocator, ScratchAllocator},
    buffer::AlignedBuffer,
    error::ImageError,
};

/// Extents, strides and channel count of a `D`-dimensional multi-channel array.
///
/// Axis 0 is `x`, axis 1 is `y` and axis 2 (if any) is `z`. Strides are counted
/// in `f32` elements and the channels of a pixel are stored contiguously, so the
/// element `(x, y, z, c)` lives at `z * stride_z + y * stride_y + x * stride_x + c`.
///
/// # Examples
///
/// ```
/// use fastfilters_image::ArrayLayout;
///
/// let layout = ArrayLayout::contiguous([4, 3], 2);
///
/// assert_eq!(layout.strides, [2, 8]);
/// assert_eq!(layout.offset([1, 2], 1), 2 * 8 + 1 * 2 + 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayLayout<const D: usize> {
    /// Number of pixels along each axis.
    pub extents: [usize; D],
    /// Distance in elements between neighbouring pixels along each axis.
    pub strides: [usize; D],
    /// Number of interleaved channels per pixel.
    pub n_channels: usize,
}

impl<const D: usize> ArrayLayout<D> {
    /// Create the dense layout for the given extents: `x` is the fastest axis.
    pub fn contiguous(extents: [usize; D], n_channels: usize) -> Self {
        let mut strides = [0; D];
        let mut stride = n_channels;
        for (s, &n) in strides.iter_mut().zip(extents.iter()) {
            *s = stride;
            stride = stride.saturating_mul(n);
        }
        Self {
            extents,
            strides,
            n_channels,
        }
    }

    /// Offset in elements of channel `c` of the pixel at `index`.
    #[inline]
    pub fn offset(&self, index: [usize; D], c: usize) -> usize {
        index
            .iter()
            .zip(self.strides.iter())
            .fold(c, |acc, (&i, &s)| acc + i * s)
    }

    /// Number of pixels in the array.
    pub fn num_pixels(&self) -> usize {
        self.extents.iter().product()
    }

    /// Smallest slice length that contains every element of the array.
    pub fn required_len(&self) -> usize {
        self.offset(self.extents.map(|n| n.saturating_sub(1)), self.n_channels)
    }

    /// Extents followed by the channel count, used for error reporting.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.extents.to_vec();
        shape.push(self.n_channels);
        shape
    }

    /// Check that the layout is non-empty and that no two pixels alias.
    ///
    /// Every stride must be at least the span of the previous axis, which
    /// restricts views to `x`-fastest orderings. Once this passes, [`offset`]
    /// and [`required_len`] cannot overflow.
    ///
    /// [`offset`]: ArrayLayout::offset
    /// [`required_len`]: ArrayLayout::required_len
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.n_channels == 0 || self.extents.iter().any(|&n| n == 0) {
            return Err(ImageError::EmptyShape(self.shape()));
        }

        let mut required = self.n_channels;
        for (axis, (&stride, &n)) in self.strides.iter().zip(self.extents.iter()).enumerate() {
            if stride < required {
                return Err(ImageError::InvalidStride {
                    axis: AXIS_NAMES[axis.min(AXIS_NAMES.len() - 1)],
                    stride,
                    required,
                });
            }
            required = stride
                .checked_mul(n)
                .ok_or_else(|| ImageError::LayoutOverflow(self.shape()))?;
        }

        Ok(())
    }

    /// Check that the layout describes the same pixels and channels as `other`.
    pub fn check_same_shape(&self, other: &Self) -> Result<(), ImageError> {
        if self.extents != other.extents || self.n_channels != other.n_channels {
            return Err(ImageError::SizeMismatch(self.shape(), other.shape()));
        }
        Ok(())
    }

    fn validate_for(&self, data_len: usize) -> Result<(), ImageError> {
        self.validate()?;
        let required = self.required_len();
        if data_len < required {
            return Err(ImageError::InvalidDataLength(data_len, required));
        }
        Ok(())
    }
}

const AXIS_NAMES: [char; 3] = ['x', 'y', 'z'];

/// Borrowed, read-only, strided view of a multi-channel `f32` array.
///
/// The view never owns the pixels; it only describes where they are.
#[derive(Clone, Copy, Debug)]
pub struct ArrayView<'a, const D: usize> {
    data: &'a [f32],
    layout: ArrayLayout<D>,
}

/// Two dimensional read-only view.
pub type ArrayView2<'a> = ArrayView<'a, 2>;

/// Three dimensional read-only view.
pub type ArrayView3<'a> = ArrayView<'a, 3>;

impl<'a, const D: usize> ArrayView<'a, D> {
    /// Create a view over densely packed pixels.
    ///
    /// # Errors
    ///
    /// If an extent is zero or `data` is too short, an error is returned.
    pub fn new(
        data: &'a [f32],
        extents: [usize; D],
        n_channels: usize,
    ) -> Result<Self, ImageError> {
        Self::from_layout(data, ArrayLayout::contiguous(extents, n_channels))
    }

    /// Create a view with explicit strides.
    ///
    /// # Errors
    ///
    /// If the layout is empty, aliases pixels or does not fit into `data`, an error is returned.
    pub fn from_layout(data: &'a [f32], layout: ArrayLayout<D>) -> Result<Self, ImageError> {
        layout.validate_for(data.len())?;
        Ok(Self { data, layout })
    }

    /// The layout of the view.
    #[inline]
    pub fn layout(&self) -> &ArrayLayout<D> {
        &self.layout
    }

    /// The backing slice, starting at pixel `(0, .., 0)`.
    #[inline]
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    /// Number of channels per pixel.
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.layout.n_channels
    }

    /// Number of pixels along `x`.
    #[inline]
    pub fn n_x(&self) -> usize {
        self.layout.extents[0]
    }

    /// Stride along `x`.
    #[inline]
    pub fn stride_x(&self) -> usize {
        self.layout.strides[0]
    }

    /// Number of pixels along `y`.
    #[inline]
    pub fn n_y(&self) -> usize {
        self.layout.extents[1]
    }

    /// Stride along `y`.
    #[inline]
    pub fn stride_y(&self) -> usize {
        self.layout.strides[1]
    }

    /// Read channel `c` of the pixel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the array.
    #[inline]
    pub fn get(&self, index: [usize; D], c: usize) -> f32 {
        self.data[self.layout.offset(index, c)]
    }
}

impl ArrayView<'_, 3> {
    /// Number of pixels along `z`.
    #[inline]
    pub fn n_z(&self) -> usize {
        self.layout.extents[2]
    }

    /// Stride along `z`.
    #[inline]
    pub fn stride_z(&self) -> usize {
        self.layout.strides[2]
    }
}

/// Borrowed, mutable, strided view of a multi-channel `f32` array.
#[derive(Debug)]
pub struct ArrayViewMut<'a, const D: usize> {
    data: &'a mut [f32],
    layout: ArrayLayout<D>,
}

/// Two dimensional mutable view.
pub type ArrayViewMut2<'a> = ArrayViewMut<'a, 2>;

/// Three dimensional mutable view.
pub type ArrayViewMut3<'a> = ArrayViewMut<'a, 3>;

impl<'a, const D: usize> ArrayViewMut<'a, D> {
    /// Create a mutable view over densely packed pixels.
    ///
    /// # Errors
    ///
    /// If an extent is zero or `data` is too short, an error is returned.
    pub fn new(
        data: &'a mut [f32],
        extents: [usize; D],
        n_channels: usize,
    ) -> Result<Self, ImageError> {
        Self::from_layout(data, ArrayLayout::contiguous(extents, n_channels))
    }

    /// Create a mutable view with explicit strides.
    ///
    /// # Errors
    ///
    /// If the layout is empty, aliases pixels or does not fit into `data`, an error is returned.
    pub fn from_layout(data: &'a mut [f32], layout: ArrayLayout<D>) -> Result<Self, ImageError> {
        layout.validate_for(data.len())?;
        Ok(Self { data, layout })
    }

    /// The layout of the view.
    #[inline]
    pub fn layout(&self) -> &ArrayLayout<D> {
        &self.layout
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn as_view(&self) -> ArrayView<'_, D> {
        ArrayView {
            data: &*self.data,
            layout: self.layout,
        }
    }

    /// Reborrow as a shorter-lived mutable view.
    #[inline]
    pub fn reborrow(&mut self) -> ArrayViewMut<'_, D> {
        ArrayViewMut {
            data: &mut *self.data,
            layout: self.layout,
        }
    }

    /// The backing slice, starting at pixel `(0, .., 0)`.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &*self.data
    }

    /// The backing slice as mutable.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut *self.data
    }

    /// Number of channels per pixel.
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.layout.n_channels
    }

    /// Read channel `c` of the pixel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the array.
    #[inline]
    pub fn get(&self, index: [usize; D], c: usize) -> f32 {
        self.data[self.layout.offset(index, c)]
    }

    /// Write channel `c` of the pixel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the array.
    #[inline]
    pub fn set(&mut self, index: [usize; D], c: usize, value: f32) {
        let offset = self.layout.offset(index, c);
        self.data[offset] = value;
    }
}

/// Owned, dense, 32-byte aligned multi-channel `f32` array.
///
/// The pixels are allocated through a [`ScratchAllocator`] and released on drop.
#[derive(Clone, Debug)]
pub struct Array<const D: usize, A: ScratchAllocator = CpuAllocator> {
    buffer: AlignedBuffer<A>,
    layout: ArrayLayout<D>,
}

/// Owned two dimensional array.
pub type Array2<A = CpuAllocator> = Array<2, A>;

/// Owned three dimensional array.
pub type Array3<A = CpuAllocator> = Array<3, A>;

impl<const D: usize, A: ScratchAllocator> Array<D, A> {
    /// Allocate a zero-filled array.
    ///
    /// # Arguments
    ///
    /// * `extents` - Number of pixels along `x`, `y` (and `z`).
    /// * `n_channels` - Number of channels per pixel.
    /// * `alloc` - The allocator that provides the pixel memory.
    ///
    /// # Errors
    ///
    /// If an extent is zero or the allocation fails, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_image::{Array2, CpuAllocator};
    ///
    /// let array = Array2::zeros([10, 20], 3, CpuAllocator).unwrap();
    ///
    /// assert_eq!(array.layout().extents, [10, 20]);
    /// assert_eq!(array.as_slice().len(), 10 * 20 * 3);
    /// ```
    pub fn zeros(extents: [usize; D], n_channels: usize, alloc: A) -> Result<Self, ImageError> {
        let layout = ArrayLayout::contiguous(extents, n_channels);
        layout.validate()?;
        let buffer = AlignedBuffer::zeros(layout.required_len(), alloc)?;
        Ok(Self { buffer, layout })
    }

    /// Allocate an array filled with `val`.
    pub fn from_shape_val(
        extents: [usize; D],
        n_channels: usize,
        val: f32,
        alloc: A,
    ) -> Result<Self, ImageError> {
        let mut array = Self::zeros(extents, n_channels, alloc)?;
        array.as_slice_mut().fill(val);
        Ok(array)
    }

    /// Allocate an array and copy densely packed pixels into it.
    ///
    /// # Errors
    ///
    /// If the length of `data` does not match the shape, an error is returned.
    pub fn from_shape_slice(
        extents: [usize; D],
        n_channels: usize,
        data: &[f32],
        alloc: A,
    ) -> Result<Self, ImageError> {
        let mut array = Self::zeros(extents, n_channels, alloc)?;
        if data.len() != array.as_slice().len() {
            return Err(ImageError::InvalidDataLength(
                data.len(),
                array.as_slice().len(),
            ));
        }
        array.as_slice_mut().copy_from_slice(data);
        Ok(array)
    }

    /// Allocate an array whose value at every pixel and channel is `f(index, c)`.
    pub fn from_shape_fn<F>(
        extents: [usize; D],
        n_channels: usize,
        alloc: A,
        f: F,
    ) -> Result<Self, ImageError>
    where
        F: Fn([usize; D], usize) -> f32,
    {
        let mut array = Self::zeros(extents, n_channels, alloc)?;
        let layout = array.layout;
        let data = array.as_slice_mut();
        for (flat, pixel) in data.chunks_exact_mut(n_channels).enumerate() {
            let mut index = [0; D];
            let mut rest = flat;
            for (i, &n) in index.iter_mut().zip(layout.extents.iter()) {
                *i = rest % n;
                rest /= n;
            }
            for (c, v) in pixel.iter_mut().enumerate() {
                *v = f(index, c);
            }
        }
        Ok(array)
    }

    /// The layout of the array.
    #[inline]
    pub fn layout(&self) -> &ArrayLayout<D> {
        &self.layout
    }

    /// Number of channels per pixel.
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.layout.n_channels
    }

    /// The pixel data.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        self.buffer.as_slice()
    }

    /// The pixel data as mutable.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        self.buffer.as_mut_slice()
    }

    /// Borrow the array as a read-only view.
    #[inline]
    pub fn view(&self) -> ArrayView<'_, D> {
        ArrayView {
            data: self.buffer.as_slice(),
            layout: self.layout,
        }
    }

    /// Borrow the array as a mutable view.
    #[inline]
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, D> {
        ArrayViewMut {
            data: self.buffer.as_mut_slice(),
            layout: self.layout,
        }
    }

    /// Read channel `c` of the pixel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the array.
    #[inline]
    pub fn get(&self, index: [usize; D], c: usize) -> f32 {
        self.as_slice()[self.layout.offset(index, c)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = ArrayLayout::contiguous([5, 4, 3], 2);
        assert_eq!(layout.strides, [2, 10, 40]);
        assert_eq!(layout.required_len(), 5 * 4 * 3 * 2);
        assert_eq!(layout.num_pixels(), 60);
        assert_eq!(layout.offset([4, 3, 2], 1), 119);
    }

    #[test]
    fn test_view_rejects_short_data() {
        let data = vec![0.0; 11];
        let res = ArrayView2::new(&data, [3, 4], 1);
        assert_eq!(res.unwrap_err(), ImageError::InvalidDataLength(11, 12));
    }

    #[test]
    fn test_view_rejects_empty_shape() {
        let data = vec![0.0; 4];
        let res = ArrayView2::new(&data, [0, 4], 1);
        assert!(matches!(res, Err(ImageError::EmptyShape(_))));
        let res = ArrayView2::new(&data, [2, 2], 0);
        assert!(matches!(res, Err(ImageError::EmptyShape(_))));
    }

    #[test]
    fn test_view_rejects_aliasing_strides() {
        let data = vec![0.0; 64];
        let layout = ArrayLayout {
            extents: [4, 4],
            strides: [1, 3],
            n_channels: 1,
        };
        let res = ArrayView2::from_layout(&data, layout);
        assert_eq!(
            res.unwrap_err(),
            ImageError::InvalidStride {
                axis: 'y',
                stride: 3,
                required: 4
            }
        );

        let layout = ArrayLayout {
            extents: [4, 4],
            strides: [1, 4],
            n_channels: 2,
        };
        let res = ArrayView2::from_layout(&data, layout);
        assert!(matches!(res, Err(ImageError::InvalidStride { axis: 'x', .. })));
    }

    #[test]
    fn test_layout_rejects_overflowing_strides() {
        let data = vec![0.0; 64];
        let layout = ArrayLayout {
            extents: [4, 3],
            strides: [1, usize::MAX / 2],
            n_channels: 1,
        };
        let res = ArrayView2::from_layout(&data, layout);
        assert_eq!(res.unwrap_err(), ImageError::LayoutOverflow(vec![4, 3, 1]));

        let res = Array3::zeros([usize::MAX / 4, 8, 2], 1, CpuAllocator);
        assert!(matches!(res, Err(ImageError::LayoutOverflow(_))));
    }

    #[test]
    fn test_padded_view() -> Result<(), ImageError> {
        // 3x2 pixels stored in rows of 5 elements
        #[rustfmt::skip]
        let data = vec![
            0.0, 1.0, 2.0, -1.0, -1.0,
            3.0, 4.0, 5.0,
        ];
        let layout = ArrayLayout {
            extents: [3, 2],
            strides: [1, 5],
            n_channels: 1,
        };
        let view = ArrayView2::from_layout(&data, layout)?;
        assert_eq!(view.n_x(), 3);
        assert_eq!(view.get([2, 0], 0), 2.0);
        assert_eq!(view.get([0, 1], 0), 3.0);
        Ok(())
    }

    #[test]
    fn test_array_from_shape_fn() -> Result<(), ImageError> {
        let array = Array3::from_shape_fn([4, 3, 2], 2, CpuAllocator, |[x, y, z], c| {
            (x + 10 * y + 100 * z + 1000 * c) as f32
        })?;
        assert_eq!(array.get([3, 2, 1], 1), 1123.0);
        assert_eq!(array.view().get([1, 0, 1], 0), 101.0);
        Ok(())
    }

    #[test]
    fn test_array_view_mut_roundtrip() -> Result<(), ImageError> {
        let mut array = Array2::zeros([3, 3], 1, CpuAllocator)?;
        {
            let mut view = array.view_mut();
            view.set([1, 2], 0, 7.0);
            assert_eq!(view.as_view().get([1, 2], 0), 7.0);
        }
        assert_eq!(array.as_slice()[7], 7.0);
        Ok(())
    }

    #[test]
    fn test_array_from_shape_slice_length_mismatch() {
        let res = Array2::from_shape_slice([2, 2], 1, &[1.0, 2.0, 3.0], CpuAllocator);
        assert!(matches!(res, Err(ImageError::InvalidDataLength(3, 4))));
    }
}
