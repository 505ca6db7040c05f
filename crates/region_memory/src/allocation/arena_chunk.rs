use std::{alloc::Layout, ptr::NonNull};

use anyhow::Result;

use crate::AllocationError;

use super::{
    allocator::{align_forward, RawAllocator, StableAllocator},
    arena_stats::ChunkStats,
};

/// Alignment of every chunk buffer, matching what the system allocator
/// guarantees for plain requests on common targets.
pub const CHUNK_ALIGN: usize = 16;

/// One contiguous block of memory with its own bump cursor.
///
/// Memory is handed out front to back: `[0, offset)` is in use and
/// `[offset, size)` is free. The buffer is zeroed on creation and the tail is
/// zeroed whenever it grows, so every byte in it is initialized.
///
/// Can be used by itself, as it implements [RawAllocator], when there is no
/// need to grow. [Arena](crate::Arena) chains chunks together.
pub struct ArenaChunk {
    memory: NonNull<u8>,
    size: usize,
    offset: usize,
    peak_usage: usize,
    allocation_count: usize,
    total_allocated: usize,
}

// The chunk exclusively owns its buffer.
unsafe impl Send for ArenaChunk {}

impl StableAllocator for ArenaChunk {}

impl ArenaChunk {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            anyhow::bail!(AllocationError::ZeroSizedAllocation)
        }

        let layout = Self::layout(size)?;
        let memory = unsafe { std::alloc::alloc_zeroed(layout) };
        let memory =
            NonNull::new(memory).ok_or(AllocationError::PlatformAllocationFailed { size })?;

        Ok(Self {
            memory,
            size,
            offset: 0,
            peak_usage: 0,
            allocation_count: 0,
            total_allocated: 0,
        })
    }

    fn layout(size: usize) -> Result<Layout> {
        Layout::from_size_align(size, CHUNK_ALIGN)
            .map_err(|_| AllocationError::CapacityOverflow { requested: size }.into())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.size - self.offset
    }

    pub fn peak_usage(&self) -> usize {
        self.peak_usage
    }

    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }

    pub fn total_allocated(&self) -> usize {
        self.total_allocated
    }

    pub fn start(&self) -> *mut u8 {
        self.memory.as_ptr()
    }

    pub fn bump_ptr(&self) -> *mut u8 {
        unsafe { self.memory.as_ptr().add(self.offset) }
    }

    /// The bytes below the cursor.
    pub fn used_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.memory.as_ptr(), self.offset) }
    }

    /// Grows or shrinks the allocation ending exactly at the cursor without
    /// moving it. Returns the allocation start, re-derived from the buffer, or
    /// `None` when `ptr` is not that allocation or the new size does not fit.
    pub fn resize_last(
        &mut self,
        ptr: *const u8,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        let start = self.offset.checked_sub(old_size)?;
        let expected = unsafe { self.memory.as_ptr().add(start) };
        if ptr as usize != expected as usize {
            return None;
        }
        let end = start.checked_add(new_size).filter(|end| *end <= self.size)?;

        self.offset = end;
        self.total_allocated += new_size.saturating_sub(old_size);
        self.peak_usage = self.peak_usage.max(end);
        NonNull::new(expected)
    }

    /// Moves the cursor back to `offset`, forgetting everything above it.
    pub fn rewind(&mut self, offset: usize, allocation_count: usize) {
        self.offset = offset.min(self.size);
        self.allocation_count = allocation_count;
        self.peak_usage = self.peak_usage.max(self.offset);
    }

    pub fn reset(&mut self) {
        self.rewind(0, 0);
    }

    /// Reallocates the backing buffer to `new_size` bytes, keeping
    /// `[0, offset)` intact. The buffer may move.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size == 0 {
            anyhow::bail!(AllocationError::ZeroSizedAllocation)
        }
        if new_size < self.offset {
            anyhow::bail!(AllocationError::ResizeBelowUsage {
                requested: new_size,
                used: self.offset
            })
        }
        // validates the new size against the layout rules before touching the buffer
        Self::layout(new_size)?;

        let old_layout = Self::layout(self.size)?;
        let memory = unsafe { std::alloc::realloc(self.memory.as_ptr(), old_layout, new_size) };
        let memory = NonNull::new(memory)
            .ok_or(AllocationError::PlatformAllocationFailed { size: new_size })?;

        if new_size > self.size {
            unsafe {
                memory
                    .as_ptr()
                    .add(self.size)
                    .write_bytes(0, new_size - self.size)
            };
        }

        self.memory = memory;
        self.size = new_size;
        self.peak_usage = self.peak_usage.min(new_size);
        Ok(())
    }

    pub fn stats(&self) -> ChunkStats {
        ChunkStats {
            capacity: self.size,
            used: self.offset,
            peak: self.peak_usage,
            allocation_count: self.allocation_count,
            total_allocated: self.total_allocated,
        }
    }
}

impl RawAllocator for ArenaChunk {
    fn alloc_raw(&mut self, size: usize, align: usize) -> Result<NonNull<u8>> {
        debug_assert!(align > 0);
        debug_assert!(align.is_power_of_two());

        let cursor = self.bump_ptr() as usize;
        let padding = align_forward(cursor, align) - cursor;

        let end = self
            .offset
            .checked_add(padding)
            .and_then(|start| start.checked_add(size));

        match end {
            Some(end) if end <= self.size => {
                let ptr = unsafe { self.memory.as_ptr().add(self.offset + padding) };
                self.offset = end;
                self.allocation_count += 1;
                self.total_allocated += padding + size;
                self.peak_usage = self.peak_usage.max(end);
                // SAFETY: derived from a non-null buffer pointer
                Ok(unsafe { NonNull::new_unchecked(ptr) })
            }
            _ => anyhow::bail!(AllocationError::OutOfMemory {
                requested: size.saturating_add(padding),
                available: self.remaining()
            }),
        }
    }
}

impl Drop for ArenaChunk {
    fn drop(&mut self) {
        if let Ok(layout) = Self::layout(self.size) {
            unsafe { std::alloc::dealloc(self.memory.as_ptr(), layout) }
        }
    }
}

#[cfg(test)]
mod test {
    use anyhow::Result;

    use super::*;

    #[test]
    fn test_zero_size_chunk() {
        let err = ArenaChunk::new(0).err().unwrap();
        assert_eq!(
            err.downcast_ref::<AllocationError>(),
            Some(&AllocationError::ZeroSizedAllocation)
        );
    }

    #[test]
    fn test_bump_sequence() -> Result<()> {
        let mut chunk = ArenaChunk::new(64)?;
        let base = chunk.start() as usize;

        let a = chunk.alloc_raw(10, 1)?;
        let b = chunk.alloc_raw(6, 1)?;
        let c = chunk.alloc_raw(16, 1)?;

        assert_eq!(a.as_ptr() as usize, base);
        assert_eq!(b.as_ptr() as usize, base + 10);
        assert_eq!(c.as_ptr() as usize, base + 16);
        assert_eq!(chunk.offset(), 32);
        assert_eq!(chunk.allocation_count(), 3);
        assert_eq!(chunk.total_allocated(), 32);

        Ok(())
    }

    #[test]
    fn test_exhaustion() -> Result<()> {
        let mut chunk = ArenaChunk::new(16)?;
        chunk.alloc_raw(12, 1)?;

        let err = chunk.alloc_raw(8, 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AllocationError>(),
            Some(&AllocationError::OutOfMemory {
                requested: 8,
                available: 4
            })
        );
        assert_eq!(chunk.offset(), 12, "failed bump must not move the cursor");

        Ok(())
    }

    #[test]
    fn test_aligned_padding_is_counted() -> Result<()> {
        let mut chunk = ArenaChunk::new(64)?;
        chunk.alloc_raw(3, 1)?;

        let ptr = chunk.alloc_raw(8, 8)?;
        assert_eq!(ptr.as_ptr() as usize % 8, 0);
        // buffer start is CHUNK_ALIGN aligned, so padding is 5
        assert_eq!(chunk.offset(), 16);
        assert_eq!(chunk.total_allocated(), 16);

        Ok(())
    }

    #[test]
    fn test_resize_last() -> Result<()> {
        let mut chunk = ArenaChunk::new(32)?;
        let first = chunk.alloc_raw(4, 1)?;
        let second = chunk.alloc_raw(4, 1)?;

        assert_eq!(chunk.resize_last(first.as_ptr(), 4, 8), None);
        assert_eq!(chunk.resize_last(second.as_ptr(), 4, 20), Some(second));
        assert_eq!(chunk.offset(), 24);
        assert_eq!(chunk.resize_last(second.as_ptr(), 20, 40), None);
        assert_eq!(chunk.resize_last(second.as_ptr(), 20, 2), Some(second));
        assert_eq!(chunk.offset(), 6);
        assert_eq!(chunk.peak_usage(), 24);

        Ok(())
    }

    #[test]
    fn test_reset_keeps_peak() -> Result<()> {
        let mut chunk = ArenaChunk::new(32)?;
        chunk.alloc_raw(20, 1)?;
        chunk.reset();

        assert_eq!(chunk.offset(), 0);
        assert_eq!(chunk.allocation_count(), 0);
        assert_eq!(chunk.peak_usage(), 20);
        assert_eq!(chunk.total_allocated(), 20);

        Ok(())
    }

    #[test]
    fn test_rewind_forward_raises_peak() -> Result<()> {
        let mut chunk = ArenaChunk::new(32)?;
        chunk.alloc_raw(8, 1)?;
        chunk.reset();

        chunk.rewind(24, 2);
        assert_eq!(chunk.offset(), 24);
        assert_eq!(chunk.peak_usage(), 24);

        chunk.rewind(100, 2);
        assert_eq!(chunk.offset(), 32, "cursor is clamped to the capacity");
        assert_eq!(chunk.peak_usage(), 32);

        Ok(())
    }

    #[test]
    fn test_resize_preserves_bytes() -> Result<()> {
        let mut chunk = ArenaChunk::new(16)?;
        let ptr = chunk.alloc_raw(8, 1)?;
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len()) };

        chunk.resize(1024)?;
        assert_eq!(chunk.size(), 1024);
        assert_eq!(chunk.used_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        chunk.resize(8)?;
        assert_eq!(chunk.used_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        let err = chunk.resize(7).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AllocationError>(),
            Some(&AllocationError::ResizeBelowUsage {
                requested: 7,
                used: 8
            })
        );
        assert_eq!(chunk.size(), 8);

        Ok(())
    }
}
