//! Persisted conversation log backing the retention sweep.
//!
//! A single JSON file `{"messages": [...]}` shared by the chat save-path and
//! the email-summary producer. A missing, empty, or corrupt file falls back
//! to the empty log so a bad write never blocks the conversation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use super::record::Role;

/// One logged turn. Mirrors the persisted record fields minus the
/// index-derived ones; ids and positions are assigned at (re)ingest time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogFile {
    messages: Vec<LogMessage>,
}

pub struct ConversationLog {
    path: PathBuf,
}

impl ConversationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ordered full read. Unreadable content recovers as an empty log.
    pub async fn load(&self) -> Result<Vec<LogMessage>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading conversation log {:?}", self.path))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<LogFile>(&raw) {
            Ok(log) => Ok(log.messages),
            Err(err) => {
                warn!(
                    "Conversation log {:?} is corrupt, starting from empty: {err}",
                    self.path
                );
                Ok(Vec::new())
            }
        }
    }

    pub async fn append(&self, message: LogMessage) -> Result<()> {
        let mut messages = self.load().await?;
        messages.push(message);
        self.replace(messages).await
    }

    /// Ordered full replace, used by the retention sweep's write-back.
    pub async fn replace(&self, messages: Vec<LogMessage>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.with_context(|| {
                    format!("creating log directory {:?}", parent)
                })?;
            }
        }
        let json = serde_json::to_string_pretty(&LogFile { messages })
            .context("serializing conversation log")?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing conversation log {:?}", self.path))
    }
}
