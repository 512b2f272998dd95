//! Retrieval Memory Module
//!
//! Persists every conversation turn as a timestamped record, embeds it with
//! fastembed, indexes it in a flat L2 index, and answers similarity queries
//! with a tunable relevance threshold.
//!
//! The flat index has no delete primitive, so retention works by filtering
//! the conversation log and rebuilding the whole store, with rollback to the
//! previous state if any record fails to re-embed.

pub mod embedder;
pub mod engine;
pub mod history;
pub mod index;
pub mod record;
pub mod retention;

pub use embedder::{Embedder, FastembedProvider};
pub use engine::MemoryEngine;
pub use history::{ConversationLog, LogMessage};
pub use index::FlatIndex;
pub use record::{MemoryRecord, Role, SearchHit};

use thiserror::Error;

/// Faults callers must tell apart from generic I/O or model errors.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The metadata store and the vector index diverged. Serving from a
    /// desynchronized pair is never allowed, and neither side is "fixed"
    /// by guessing which one is correct.
    #[error("metadata length ({records}) does not match index size ({vectors})")]
    Inconsistent { records: usize, vectors: usize },

    #[error("vector has dimension {got}, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("malformed timestamp {raw:?} (expected YYYY-MM-DD HH:MM:SS)")]
    MalformedTimestamp {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
}
