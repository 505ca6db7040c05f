use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Not enough memory to allocate {requested} bytes, only {available} bytes available")]
    OutOfMemory { requested: usize, available: usize },
    #[error("Zero-sized allocation is requested from an allocator not capable of it")]
    ZeroSizedAllocation,
    #[error("Alignment must be a power of two, got {alignment}")]
    InvalidAlignment { alignment: usize },
    #[error("The system allocator failed to provide {size} bytes")]
    PlatformAllocationFailed { size: usize },
    #[error("Requested size overflows the address space: {requested} bytes")]
    CapacityOverflow { requested: usize },
    #[error("Cannot resize a chunk to {requested} bytes, {used} bytes are in use")]
    ResizeBelowUsage { requested: usize, used: usize },
    #[error("Growth factor must be at least 1")]
    InvalidGrowthFactor,
    #[error("Chunk index {index} is out of range, the arena has {chunks} chunks")]
    ChunkOutOfRange { index: usize, chunks: usize },
}
