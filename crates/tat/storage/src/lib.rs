//! Storage abstractions for TAT entities.
//!
//! The engine treats the document store as an external collaborator: it
//! reads an entity, mutates it, and writes it back carrying the version it
//! read. Backends reject a write whose expected version is stale, which
//! closes the lost-update window between two concurrent mutations.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryEntityStore;
pub use traits::{EntityStore, QueryWindow};
