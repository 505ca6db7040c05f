//! Region allocation: byte arenas made of growable chunks with bump
//! allocation, bulk reset, marks and usage statistics.

pub mod allocation;
pub use allocation::{
    allocation_error::AllocationError,
    allocator::*,
    arena::{Arena, ArenaBuilder, ArenaScope, Mark},
    arena_chunk::ArenaChunk,
    arena_stats::{ArenaStats, ChunkStats},
};
