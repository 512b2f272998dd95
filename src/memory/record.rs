//! Memory record types shared by the engine, the index, and the sweeper.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::MemoryError;

/// Fixed on-disk timestamp layout: local time, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Assistant replies; email-derived summaries are injected with this role.
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One conversation turn committed to memory.
///
/// `vector_idx` is the position of this record's embedding inside the flat
/// index at insertion time. Records and vectors are appended in the same
/// order and never individually removed, so the field always equals the
/// number of records inserted before this one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub vector_idx: usize,
}

/// A search result: the stored record plus its rescaled similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub similarity: f32,
}

/// Generates record ids `{timestamp}_{role}`, suffixing `_{n}` when the
/// same second and role repeat consecutively. Used by the ingest path and
/// by the retention sweep's rebuild, so a sweep reproduces the same ids the
/// original rapid-write ingests got.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: Option<(String, Role)>,
    dups: u32,
}

impl IdSequence {
    pub fn next(&mut self, timestamp: &str, role: Role) -> String {
        let key = (timestamp.to_string(), role);
        if self.last.as_ref() == Some(&key) {
            self.dups += 1;
            format!("{}_{}_{}", timestamp, role.as_str(), self.dups)
        } else {
            self.last = Some(key);
            self.dups = 0;
            format!("{}_{}", timestamp, role.as_str())
        }
    }
}

/// Current local time in the fixed record format.
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored timestamp. Strict: anything outside the fixed format is
/// a typed error the caller must handle, never a silently skipped record.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, MemoryError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|source| {
        MemoryError::MalformedTimestamp {
            raw: raw.to_string(),
            source,
        }
    })
}
