pub mod allocation_error;
pub mod allocator;
pub mod arena;
pub mod arena_chunk;
pub mod arena_stats;
