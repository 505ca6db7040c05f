use std::ptr::NonNull;

use anyhow::Result;

pub trait RawAllocator {
    /// Hands out `size` bytes aligned to `align`, which must be a power of two.
    fn alloc_raw(&mut self, size: usize, align: usize) -> Result<NonNull<u8>>;
}

/// A contractual trait for allocators that won't move allocated objects while
/// they are borrowed
pub trait StableAllocator {}

#[inline]
pub(crate) fn align_forward(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    let modulo = addr & (align - 1);
    if modulo == 0 {
        addr
    } else {
        addr + (align - modulo)
    }
}
