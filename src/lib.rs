//! Companion Memory
//!
//! Retrieval memory engine for a desktop companion agent:
//! - fastembed text embeddings
//! - flat L2 vector index kept in lock-step with a JSON metadata store
//! - similarity search with a tunable relevance threshold
//! - time-based retention via filter + rebuild-with-rollback
//! - small HTTP service exposing the engine to the UI process

pub mod config;
pub mod memory;
pub mod server;

// Re-exports for convenience
pub use config::MemoryConfig;
pub use memory::{Embedder, MemoryEngine, MemoryRecord, Role, SearchHit};
