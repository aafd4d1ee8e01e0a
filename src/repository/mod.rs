//! Repository Layer
//!
//! Data access abstractions and implementations.

mod memory_store;
mod traits;


pub use memory_store::{MemoryStore, WriteOp, WriteRecord};
pub use traits::{SnapshotCallback, TodoQuery, TodoStore};
