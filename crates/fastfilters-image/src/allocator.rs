use std::alloc;
use std::alloc::Layout;

use thiserror::Error;

/// Alignment in bytes of every buffer handed out by this crate.
///
/// Wide enough for 256-bit AVX loads and stores.
pub const SIMD_ALIGNMENT: usize = 32;

/// An error type for scratch allocator operations.
#[derive(Debug, Error, PartialEq)]
pub enum AllocatorError {
    /// The requested size and alignment do not form a valid layout.
    #[error("Invalid buffer layout {0}")]
    LayoutError(core::alloc::LayoutError),

    /// The allocator returned a null pointer.
    #[error("Null pointer")]
    NullPointer,
}

/// A trait for allocating and deallocating the memory behind arrays and scratch buffers.
///
/// # Safety
///
/// The allocator must be thread-safe: a single allocator is shared by every
/// convolution call issued through a context.
///
/// # Methods
///
/// * `alloc` - Allocates memory with the given layout.
/// * `dealloc` - Deallocates memory previously returned by `alloc` with the same layout.
pub trait ScratchAllocator: Clone + Send + Sync {
    /// Allocates memory with the given layout.
    fn alloc(&self, layout: Layout) -> Result<*mut u8, AllocatorError>;

    /// Deallocates memory with the given layout.
    fn dealloc(&self, ptr: *mut u8, layout: Layout);
}

/// An allocator that forwards to the global system allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuAllocator;

impl ScratchAllocator for CpuAllocator {
    /// Allocates memory with the given layout.
    ///
    /// # Returns
    ///
    /// A non-null pointer to the allocated memory if successful, otherwise an error.
    fn alloc(&self, layout: Layout) -> Result<*mut u8, AllocatorError> {
        if layout.size() == 0 {
            return Err(AllocatorError::NullPointer);
        }
        // SAFETY: layout has a non-zero size (checked above)
        let ptr = unsafe { alloc::alloc(layout) };
        if ptr.is_null() {
            Err(AllocatorError::NullPointer)?
        }
        Ok(ptr)
    }

    /// Deallocates memory with the given layout.
    ///
    /// # Safety
    ///
    /// The pointer must come from `alloc` with the same layout. Null pointers are ignored.
    #[allow(clippy::not_unsafe_ptr_arg_deref)]
    fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if !ptr.is_null() {
            unsafe { alloc::dealloc(ptr, layout) }
        }
    }
}
