use std::{
    cell::{Cell, RefCell},
    ops::Deref,
    ptr::NonNull,
};

use anyhow::Result;
use region_logger::{arena_debug, arena_error, arena_info, arena_warn};

use super::{
    allocation_error::AllocationError,
    allocator::{RawAllocator, StableAllocator},
    arena_chunk::ArenaChunk,
    arena_stats::ArenaStats,
};

pub const DEFAULT_CHUNK_SIZE: usize = 4096;
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

#[derive(Debug, Clone)]
pub struct ArenaBuilder {
    chunk_size: usize,
    growth_factor: usize,
    label: String,
}

impl Default for ArenaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaBuilder {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            label: String::from("Arena"),
        }
    }

    /// Capacity of the first chunk.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// New chunks are `growth_factor` times the larger of the last chunk and
    /// the request that did not fit.
    pub fn growth_factor(mut self, growth_factor: usize) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn build(self) -> Result<Arena> {
        if self.growth_factor == 0 {
            arena_error!("{}: growth factor must be at least 1", self.label);
            anyhow::bail!(AllocationError::InvalidGrowthFactor)
        }

        let head = ArenaChunk::new(self.chunk_size).map_err(|e| {
            arena_error!("{}: cannot create arena: {}", self.label, e);
            e
        })?;

        arena_debug!("{}: created with a {} byte chunk", self.label, self.chunk_size);

        Ok(Arena {
            label: self.label,
            growth_factor: self.growth_factor,
            chunks: RefCell::new(vec![head]),
            current: Cell::new(0),
        })
    }
}

/// A position inside an [Arena], taken with [Arena::get_mark] and restored
/// with [Arena::reset_to_mark].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark {
    chunk: usize,
    offset: usize,
    allocation_count: usize,
    position: usize,
}

impl Mark {
    /// Index of the chunk holding the cursor.
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Cursor offset inside [Mark::chunk].
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes in use across the whole arena at the time of the mark.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl From<Mark> for usize {
    fn from(mark: Mark) -> usize {
        mark.position
    }
}

/// A region allocator handing out byte slices from a growing list of chunks.
///
/// Allocation bumps a cursor in the current chunk. When a request does not
/// fit, the arena moves on to the next chunk, appending a bigger one if there
/// is none with room. Chunks are never moved or freed before the arena is
/// dropped, so slices stay valid for as long as the arena is borrowed.
/// Memory comes back only in bulk: [Arena::reset], [Arena::reset_to_mark] or
/// dropping the arena. All of these need exclusive access, which ends every
/// outstanding borrow first.
///
/// The arena is `Send` but not `Sync`. Use one arena per thread.
pub struct Arena {
    label: String,
    growth_factor: usize,
    chunks: RefCell<Vec<ArenaChunk>>,
    current: Cell<usize>,
}

impl StableAllocator for Arena {}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("label", &self.label)
            .field("chunks", &self.chunk_count())
            .field("current", &self.current.get())
            .field("used", &self.used())
            .finish()
    }
}

impl Arena {
    pub fn new(chunk_size: usize) -> Result<Self> {
        ArenaBuilder::new().chunk_size(chunk_size).build()
    }

    pub fn builder() -> ArenaBuilder {
        ArenaBuilder::new()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.borrow().len()
    }

    /// Index of the chunk the cursor is in.
    pub fn current_chunk(&self) -> usize {
        self.current.get()
    }

    /// Total capacity of all chunks.
    pub fn capacity(&self) -> usize {
        self.chunks.borrow().iter().map(ArenaChunk::size).sum()
    }

    /// Bytes in use across all chunks, alignment padding included.
    pub fn used(&self) -> usize {
        self.chunks.borrow().iter().map(ArenaChunk::offset).sum()
    }

    /// Allocates `size` bytes. Never fails for lack of room in the existing
    /// chunks, only when the system allocator refuses a new one.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc(&self, size: usize) -> Result<&mut [u8]> {
        self.check_request(size, 1)?;
        let ptr = self.bump(size, 1, 0)?;
        // SAFETY: the bytes are initialized, handed out once and neither
        // moved nor freed while `self` is borrowed
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Allocates `size` bytes starting at a multiple of `align`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_aligned(&self, size: usize, align: usize) -> Result<&mut [u8]> {
        self.check_request(size, align)?;
        let ptr = self.bump(size, align, align)?;
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Allocates a copy of `bytes`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_copy(&self, bytes: &[u8]) -> Result<&mut [u8]> {
        let slice = self.alloc(bytes.len())?;
        slice.copy_from_slice(bytes);
        Ok(slice)
    }

    /// Resizes the allocation held in `block` and stores the resized view
    /// back into it. An empty `block` gets a plain allocation.
    ///
    /// When `block` is the latest allocation in the current chunk and the new
    /// size fits, the cursor is moved and the data stays where it is.
    /// Otherwise a new block is allocated and the first
    /// `min(block.len(), new_size)` bytes are copied over; the old block is
    /// dead space until the next reset. On failure `block` is left untouched.
    pub fn realloc<'a>(&'a self, block: &mut &'a mut [u8], new_size: usize) -> Result<()> {
        self.check_request(new_size, 1)?;
        if block.is_empty() {
            *block = self.alloc(new_size)?;
            return Ok(());
        }

        // moved out of the slot so that no caller borrow overlaps the resized view
        let old = std::mem::take(block);

        let in_place = {
            let mut chunks = self.chunks.borrow_mut();
            let current = self.current.get();
            chunks[current].resize_last(old.as_ptr(), old.len(), new_size)
        };
        if let Some(ptr) = in_place {
            // SAFETY: `[ptr, ptr + new_size)` sits below the cursor of a live
            // chunk and `old`, the only view into it, is not used again
            *block = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), new_size) };
            return Ok(());
        }

        match self.alloc(new_size) {
            Ok(new) => {
                let len = old.len().min(new_size);
                new[..len].copy_from_slice(&old[..len]);
                *block = new;
                Ok(())
            }
            Err(e) => {
                *block = old;
                Err(e)
            }
        }
    }

    pub fn get_mark(&self) -> Mark {
        let chunks = self.chunks.borrow();
        let current = self.current.get();
        let chunk = &chunks[current];

        Mark {
            chunk: current,
            offset: chunk.offset(),
            allocation_count: chunk.allocation_count(),
            position: chunks.iter().map(ArenaChunk::offset).sum(),
        }
    }

    /// Rolls the arena back to `mark`. Chunks created after the mark are kept
    /// for reuse but emptied.
    pub fn reset_to_mark(&mut self, mark: Mark) {
        let chunks = self.chunks.get_mut();
        if mark.chunk >= chunks.len() {
            arena_warn!(
                "{}: mark points to chunk {} but there are only {} chunks, ignoring",
                self.label,
                mark.chunk + 1,
                chunks.len()
            );
            return;
        }

        chunks[mark.chunk].rewind(mark.offset, mark.allocation_count);
        for chunk in chunks[mark.chunk + 1..].iter_mut() {
            chunk.reset();
        }
        self.current.set(mark.chunk);
    }

    /// Empties every chunk. Capacity is kept, peak usage and lifetime totals
    /// are not cleared.
    pub fn reset(&mut self) {
        for chunk in self.chunks.get_mut().iter_mut() {
            chunk.reset();
        }
        self.current.set(0);
    }

    /// Takes a mark that is restored when the returned scope is dropped.
    pub fn scope(&mut self) -> ArenaScope<'_> {
        ArenaScope::new(self)
    }

    /// Resizes the buffer of the chunk the cursor is in.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        let current = self.current.get();
        self.resize_chunk(current, new_size)
    }

    /// Resizes the buffer of a single chunk, keeping its used bytes. The
    /// buffer may move.
    pub fn resize_chunk(&mut self, index: usize, new_size: usize) -> Result<()> {
        let chunks = self.chunks.get_mut();
        let count = chunks.len();
        let chunk = chunks.get_mut(index).ok_or_else(|| {
            arena_warn!(
                "{}: cannot resize chunk {}, there are only {} chunks",
                self.label,
                index + 1,
                count
            );
            AllocationError::ChunkOutOfRange {
                index,
                chunks: count,
            }
        })?;

        chunk.resize(new_size).map_err(|e| {
            arena_warn!(
                "{}: cannot resize chunk {} to {} bytes: {}",
                self.label,
                index + 1,
                new_size,
                e
            );
            e
        })
    }

    /// Used bytes of a chunk. Needs exclusive access so that no allocation is
    /// borrowed while they are read.
    pub fn used_bytes(&mut self, index: usize) -> Option<&[u8]> {
        self.chunks.get_mut().get(index).map(ArenaChunk::used_bytes)
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            label: self.label.clone(),
            chunks: self.chunks.borrow().iter().map(ArenaChunk::stats).collect(),
        }
    }

    pub fn print_stats(&self) {
        arena_info!("\n{}", self.stats());
    }

    /// Releases every chunk.
    pub fn destroy(self) {
        drop(self)
    }

    fn check_request(&self, size: usize, align: usize) -> Result<()> {
        if size == 0 {
            arena_warn!("{}: zero-sized allocation requested", self.label);
            anyhow::bail!(AllocationError::ZeroSizedAllocation)
        }
        if !align.is_power_of_two() {
            arena_warn!("{}: alignment {} is not a power of two", self.label, align);
            anyhow::bail!(AllocationError::InvalidAlignment { alignment: align })
        }
        Ok(())
    }

    /// `reserve` is added to the request when sizing a new chunk, so that
    /// the padding of an aligned request always fits.
    fn bump(&self, size: usize, align: usize, reserve: usize) -> Result<NonNull<u8>> {
        let mut chunks = self.chunks.borrow_mut();

        for index in self.current.get()..chunks.len() {
            match chunks[index].alloc_raw(size, align) {
                Ok(ptr) => {
                    self.current.set(index);
                    return Ok(ptr);
                }
                Err(e) => match e.downcast::<AllocationError>() {
                    Ok(AllocationError::OutOfMemory { .. }) => continue,
                    Ok(e) => anyhow::bail!(e),
                    Err(e) => return Err(e),
                },
            }
        }

        let capacity = self.growth_capacity(&chunks, size, reserve)?;
        let mut chunk = ArenaChunk::new(capacity).map_err(|e| {
            arena_error!("{}: cannot grow arena: {}", self.label, e);
            e
        })?;
        let ptr = chunk.alloc_raw(size, align)?;

        chunks.push(chunk);
        self.current.set(chunks.len() - 1);
        arena_debug!(
            "{}: grown to {} chunks, new chunk holds {} bytes",
            self.label,
            chunks.len(),
            capacity
        );

        Ok(ptr)
    }

    /// Capacity of the chunk appended when nothing fits.
    fn growth_capacity(
        &self,
        chunks: &[ArenaChunk],
        size: usize,
        reserve: usize,
    ) -> Result<usize> {
        let last = chunks.last().map_or(0, ArenaChunk::size);

        size.checked_add(reserve)
            .and_then(|required| required.max(last).checked_mul(self.growth_factor))
            .ok_or_else(|| {
                arena_error!("{}: cannot grow arena for {} bytes", self.label, size);
                AllocationError::CapacityOverflow { requested: size }.into()
            })
    }
}

impl RawAllocator for Arena {
    fn alloc_raw(&mut self, size: usize, align: usize) -> Result<NonNull<u8>> {
        self.check_request(size, align)?;
        self.bump(size, align, align)
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let chunks = self.chunks.get_mut();
        arena_debug!(
            "{}: releasing {} chunks, {} bytes",
            self.label,
            chunks.len(),
            chunks.iter().map(ArenaChunk::size).sum::<usize>()
        );
    }
}

/// Scoped checkpoint. Derefs to the [Arena] for allocation and rolls it back
/// to the mark taken on creation when dropped.
pub struct ArenaScope<'a> {
    arena: &'a mut Arena,
    mark: Mark,
}

impl<'a> ArenaScope<'a> {
    fn new(arena: &'a mut Arena) -> Self {
        Self {
            mark: arena.get_mark(),
            arena,
        }
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }
}

impl Deref for ArenaScope<'_> {
    type Target = Arena;

    fn deref(&self) -> &Self::Target {
        self.arena
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.arena.reset_to_mark(self.mark);
    }
}
