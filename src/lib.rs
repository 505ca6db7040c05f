pub use region_logger as log;
pub use region_memory as memory;
