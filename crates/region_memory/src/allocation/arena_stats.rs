use std::fmt::Display;

/// Usage snapshot of a single chunk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStats {
    /// Capacity in bytes
    pub capacity: usize,
    /// Bytes below the bump cursor, alignment padding included
    pub used: usize,
    /// Highest cursor position ever reached, survives resets
    pub peak: usize,
    /// Allocations since the last reset
    pub allocation_count: usize,
    /// Bytes handed out over the chunk lifetime, alignment padding included
    pub total_allocated: usize,
}

impl ChunkStats {
    pub fn usage_percent(&self) -> f64 {
        percent(self.used, self.capacity)
    }
}

/// Usage snapshot of a whole arena, chunks in creation order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArenaStats {
    pub label: String,
    pub chunks: Vec<ChunkStats>,
}

impl ArenaStats {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_capacity(&self) -> usize {
        self.chunks.iter().map(|c| c.capacity).sum()
    }

    pub fn total_used(&self) -> usize {
        self.chunks.iter().map(|c| c.used).sum()
    }

    pub fn total_allocations(&self) -> usize {
        self.chunks.iter().map(|c| c.allocation_count).sum()
    }

    pub fn total_allocated(&self) -> usize {
        self.chunks.iter().map(|c| c.total_allocated).sum()
    }

    pub fn usage_percent(&self) -> f64 {
        percent(self.total_used(), self.total_capacity())
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl Display for ArenaStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== {} Statistics ===", self.label)?;

        for (i, chunk) in self.chunks.iter().enumerate() {
            writeln!(f, "Chunk {}:", i + 1)?;
            writeln!(f, "  Size: {} bytes", chunk.capacity)?;
            writeln!(
                f,
                "  Used: {} bytes ({:.2}%)",
                chunk.used,
                chunk.usage_percent()
            )?;
            writeln!(f, "  Peak: {} bytes", chunk.peak)?;
            writeln!(f, "  Allocations: {}", chunk.allocation_count)?;
        }

        writeln!(f)?;
        writeln!(f, "Total Summary:")?;
        writeln!(f, "  Chunks: {}", self.chunk_count())?;
        writeln!(f, "  Total Size: {} bytes", self.total_capacity())?;
        writeln!(
            f,
            "  Total Used: {} bytes ({:.2}%)",
            self.total_used(),
            self.usage_percent()
        )?;
        write!(f, "  Total Allocations: {}", self.total_allocations())
    }
}
