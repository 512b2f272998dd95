//! Time-based retention sweep.
//!
//! The flat index cannot delete individual vectors, so retention filters the
//! persisted conversation log and rebuilds the engine from the kept tail.
//! Runs on application start; the engine's rollback makes an interrupted or
//! failed sweep harmless to the live store.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use tracing::info;

use super::engine::MemoryEngine;
use super::history::{ConversationLog, LogMessage};
use super::record::{parse_timestamp, IdSequence, MemoryRecord};

/// Splits `messages` into the kept list (age <= `max_days`) and a dropped
/// count. A malformed timestamp aborts the whole pass: silently skipping
/// the record would delete data of indeterminate scope.
pub fn partition_by_age(
    messages: Vec<LogMessage>,
    now: NaiveDateTime,
    max_days: i64,
) -> Result<(Vec<LogMessage>, usize)> {
    let window = Duration::days(max_days);
    let mut keep = Vec::with_capacity(messages.len());
    let mut dropped = 0usize;

    for message in messages {
        let ts = parse_timestamp(&message.timestamp)
            .context("retention sweep aborted on malformed timestamp")?;
        if now - ts > window {
            dropped += 1;
        } else {
            keep.push(message);
        }
    }
    Ok((keep, dropped))
}

/// One sweep pass: filter the log by age, write the kept messages back, then
/// rebuild the engine from them. An empty log just clears the engine.
pub async fn sweep(log: &ConversationLog, engine: &MemoryEngine, max_days: i64) -> Result<()> {
    let messages = log.load().await?;
    if messages.is_empty() {
        info!("Conversation log empty, clearing memory");
        return engine.clear().await;
    }

    let total = messages.len();
    let (keep, dropped) = partition_by_age(messages, Local::now().naive_local(), max_days)?;
    info!(
        "Retention sweep: keeping {} of {} messages ({} dropped, window {} days)",
        keep.len(),
        total,
        dropped,
        max_days
    );

    log.replace(keep.clone()).await?;
    engine.rebuild(records_from_messages(keep)).await
}

/// Maps kept log messages to records in log order, running them through the
/// same id sequence the ingest path uses so same-second duplicates stay
/// disambiguated across sweeps.
pub fn records_from_messages(messages: Vec<LogMessage>) -> Vec<MemoryRecord> {
    let mut ids = IdSequence::default();
    messages
        .into_iter()
        .enumerate()
        .map(|(i, message)| MemoryRecord {
            id: ids.next(&message.timestamp, message.role),
            role: message.role,
            content: message.content,
            timestamp: message.timestamp,
            vector_idx: i,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::Role;

    fn message(content: &str, timestamp: &str) -> LogMessage {
        LogMessage {
            role: Role::User,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn now() -> NaiveDateTime {
        parse_timestamp("2025-06-15 12:00:00").unwrap()
    }

    #[test]
    fn keeps_young_drops_old() {
        let messages = vec![
            message("ancient", "2025-05-01 12:00:00"),
            message("recent", "2025-06-14 12:00:00"),
            message("today", "2025-06-15 09:00:00"),
        ];

        let (keep, dropped) = partition_by_age(messages, now(), 7).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(keep.len(), 2);
        assert_eq!(keep[0].content, "recent");
        assert_eq!(keep[1].content, "today");
    }

    #[test]
    fn boundary_age_is_kept() {
        // Exactly max_days old is not strictly older, so it stays.
        let messages = vec![message("edge", "2025-06-08 12:00:00")];
        let (keep, dropped) = partition_by_age(messages, now(), 7).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(keep.len(), 1);
    }

    #[test]
    fn malformed_timestamp_is_a_hard_error() {
        let messages = vec![
            message("fine", "2025-06-14 12:00:00"),
            message("broken", "yesterday-ish"),
        ];
        assert!(partition_by_age(messages, now(), 7).is_err());
    }

    #[test]
    fn rebuilt_records_keep_same_second_ids_distinct() {
        let records = records_from_messages(vec![
            message("first", "2025-06-14 12:00:00"),
            message("second", "2025-06-14 12:00:00"),
            message("third", "2025-06-14 12:00:01"),
        ]);

        assert_eq!(records[0].id, "2025-06-14 12:00:00_user");
        assert_eq!(records[1].id, "2025-06-14 12:00:00_user_1");
        assert_eq!(records[2].id, "2025-06-14 12:00:01_user");
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.vector_idx, i);
        }
    }

    #[test]
    fn empty_input_partitions_to_empty() {
        let (keep, dropped) = partition_by_age(Vec::new(), now(), 7).unwrap();
        assert!(keep.is_empty());
        assert_eq!(dropped, 0);
    }
}
