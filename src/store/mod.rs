//! Per-item delivery state.

pub mod memory;
pub mod traits;

pub use memory::MemoryStateStore;
pub use traits::{StateField, StateStore};
