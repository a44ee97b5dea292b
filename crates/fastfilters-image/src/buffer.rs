//! Aligned, allocator-backed `f32` storage.
//!
//! Scratch lines inside the convolution engine and the pixels of owned arrays
//! both live in an [`AlignedBuffer`]. The memory is requested from a
//! [`ScratchAllocator`] with [`SIMD_ALIGNMENT`] and handed back when the buffer
//! is dropped, so every exit path (including early error returns) releases it.

use std::{alloc::Layout, ptr::NonNull};

use crate::allocator::{AllocatorError, ScratchAllocator, SIMD_ALIGNMENT};

/// Owned, zero-initialised, 32-byte aligned `f32` buffer.
pub struct AlignedBuffer<A: ScratchAllocator> {
    /// The pointer to the buffer memory which must be non-null.
    ptr: NonNull<f32>,
    /// Number of `f32` elements.
    len: usize,
    /// The memory layout used for allocation.
    layout: Layout,
    /// The allocator that owns the memory.
    alloc: A,
}

impl<A: ScratchAllocator> AlignedBuffer<A> {
    /// Allocates `len` zeroed elements through `alloc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is invalid or the allocator fails. A zero
    /// length request is reported as [`AllocatorError::NullPointer`].
    pub fn zeros(len: usize, alloc: A) -> Result<Self, AllocatorError> {
        let size = len
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or(AllocatorError::NullPointer)?;
        let layout =
            Layout::from_size_align(size, SIMD_ALIGNMENT).map_err(AllocatorError::LayoutError)?;
        let raw = alloc.alloc(layout)?;
        let ptr = NonNull::new(raw as *mut f32).ok_or(AllocatorError::NullPointer)?;

        // SAFETY: ptr is valid for `len` f32 writes (just allocated with this size)
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, len);
        }

        Ok(Self {
            ptr,
            len,
            layout,
            alloc,
        })
    }

    /// Allocates a buffer and copies `data` into it.
    pub fn from_slice(data: &[f32], alloc: A) -> Result<Self, AllocatorError> {
        let mut buffer = Self::zeros(data.len(), alloc)?;
        buffer.as_mut_slice().copy_from_slice(data);
        Ok(buffer)
    }

    /// Returns the buffer as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        // SAFETY: ptr is valid and initialised for len elements for the lifetime of self
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the buffer as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        // SAFETY: ptr is valid, initialised and exclusively borrowed through &mut self
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the allocator backing this buffer.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }
}

impl<A: ScratchAllocator> Drop for AlignedBuffer<A> {
    fn drop(&mut self) {
        // SAFETY: ptr and layout were created together during allocation
        self.alloc.dealloc(self.ptr.as_ptr() as *mut u8, self.layout);
    }
}

impl<A: ScratchAllocator> Clone for AlignedBuffer<A> {
    /// Deep copy through the same allocator.
    ///
    /// # Panics
    ///
    /// Panics if the allocator cannot provide memory for the copy.
    fn clone(&self) -> Self {
        match Self::from_slice(self.as_slice(), self.alloc.clone()) {
            Ok(buffer) => buffer,
            Err(e) => panic!("failed to clone aligned buffer: {e}"),
        }
    }
}

// SAFETY: the buffer exclusively owns its memory; the allocator is Send + Sync
unsafe impl<A: ScratchAllocator> Send for AlignedBuffer<A> {}

// SAFETY: shared access only hands out `&[f32]`
unsafe impl<A: ScratchAllocator> Sync for AlignedBuffer<A> {}

impl<A: ScratchAllocator> std::fmt::Debug for AlignedBuffer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CpuAllocator;

    #[test]
    fn test_aligned_buffer_zeros() -> Result<(), AllocatorError> {
        let buffer = AlignedBuffer::zeros(37, CpuAllocator)?;
        assert_eq!(buffer.len(), 37);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.as_slice().as_ptr() as usize % SIMD_ALIGNMENT, 0);
        assert!(buffer.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn test_aligned_buffer_from_slice() -> Result<(), AllocatorError> {
        let buffer = AlignedBuffer::from_slice(&[1.0, 2.0, 3.0], CpuAllocator)?;
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0]);
        let copy = buffer.clone();
        drop(buffer);
        assert_eq!(copy.as_slice(), &[1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_aligned_buffer_empty_fails() {
        assert!(AlignedBuffer::zeros(0, CpuAllocator).is_err());
    }

    #[derive(Clone, Default)]
    struct CountingAllocator {
        live: std::sync::Arc<std::sync::atomic::AtomicIsize>,
    }

    impl ScratchAllocator for CountingAllocator {
        fn alloc(&self, layout: Layout) -> Result<*mut u8, AllocatorError> {
            self.live.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            CpuAllocator.alloc(layout)
        }

        fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            self.live.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            CpuAllocator.dealloc(ptr, layout)
        }
    }

    #[test]
    fn test_aligned_buffer_returns_memory_on_drop() -> Result<(), AllocatorError> {
        let alloc = CountingAllocator::default();
        {
            let _a = AlignedBuffer::zeros(16, alloc.clone())?;
            let _b = AlignedBuffer::zeros(16, alloc.clone())?;
            assert_eq!(alloc.live.load(std::sync::atomic::Ordering::SeqCst), 2);
        }
        assert_eq!(alloc.live.load(std::sync::atomic::Ordering::SeqCst), 0);
        Ok(())
    }
}
