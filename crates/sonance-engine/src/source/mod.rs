//! In-memory sample sources.

mod memory;

pub use memory::{MemoryReader, MemorySound};
