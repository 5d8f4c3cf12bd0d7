//! Store abstraction for capability matrices.
//!
//! This module defines the narrow CRUD contract the core depends on. The
//! actual persistent store is an external collaborator; the in-memory
//! backend here backs tests and single-process CLI sessions.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::MatrixStore;
