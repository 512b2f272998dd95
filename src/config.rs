//! Engine configuration, resolved once at startup.
//!
//! All values have documented defaults; a missing or unreadable config file
//! warns and falls back instead of erroring mid-operation, and no module
//! re-reads the file afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_model() -> String {
    "all-minilm-l6-v2".to_string()
}

fn default_threshold() -> f32 {
    0.5
}

fn default_max_day() -> i64 {
    7
}

fn default_index_dir() -> String {
    "./vector_db".to_string()
}

fn default_history_file() -> String {
    "chat_history.json".to_string()
}

fn default_port() -> u16 {
    3900
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Embedding model identifier. Changing it changes the vector dimension,
    /// so the persisted index must be wiped or rebuilt along with it.
    #[serde(default = "default_model")]
    pub model: String,

    /// Default similarity threshold for search, in [0, 1].
    #[serde(default = "default_threshold")]
    pub cosine_similarity: f32,

    /// Retention window in days, >= 1.
    #[serde(default = "default_max_day")]
    pub max_day: i64,

    /// Directory holding `chat_index.bin` and `metadata.json`.
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Path of the persisted conversation log.
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Port the memory service listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            cosine_similarity: default_threshold(),
            max_day: default_max_day(),
            index_dir: default_index_dir(),
            history_file: default_history_file(),
            port: default_port(),
        }
    }
}

impl MemoryConfig {
    /// Reads and validates the config file. Any failure falls back to the
    /// defaults with a warning; out-of-range values are clamped.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<MemoryConfig>(&raw) {
                Ok(config) => config,
                Err(err) => {
                    warn!("Invalid config {:?}, using defaults: {err}", path);
                    Self::default()
                }
            },
            Err(err) => {
                warn!("Could not read config {:?}, using defaults: {err}", path);
                Self::default()
            }
        };
        config.validated()
    }

    fn validated(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.cosine_similarity) {
            warn!(
                "cosine_similarity {} outside [0, 1], clamping",
                self.cosine_similarity
            );
            self.cosine_similarity = self.cosine_similarity.clamp(0.0, 1.0);
        }
        if self.max_day < 1 {
            warn!("max_day {} below 1, using 1", self.max_day);
            self.max_day = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let config = MemoryConfig::load("/definitely/not/here/config.json");
        assert_eq!(config.model, "all-minilm-l6-v2");
        assert_eq!(config.max_day, 7);
        assert_eq!(config.cosine_similarity, 0.5);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_day": 30}"#).unwrap();

        let config = MemoryConfig::load(&path);
        assert_eq!(config.max_day, 30);
        assert_eq!(config.model, "all-minilm-l6-v2");
        assert_eq!(config.history_file, "chat_history.json");
    }

    #[test]
    fn invalid_json_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "max_day = 30").unwrap();

        let config = MemoryConfig::load(&path);
        assert_eq!(config.max_day, 7);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cosine_similarity": 1.8, "max_day": 0}"#).unwrap();

        let config = MemoryConfig::load(&path);
        assert_eq!(config.cosine_similarity, 1.0);
        assert_eq!(config.max_day, 1);
    }
}
