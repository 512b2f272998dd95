//! Memory Engine: orchestrates the embedder, the flat index, and the
//! metadata store.
//!
//! One `RwLock` guards the index/metadata pair, so the paired append is a
//! single critical section and readers never observe half of an ingest.
//! Rebuild computes its replacement state off to the side while the live
//! state stays queryable, and commits with one swap; a failure anywhere in
//! the re-embedding loop rolls back by never committing.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::embedder::Embedder;
use super::index::FlatIndex;
use super::record::{IdSequence, MemoryRecord, Role, SearchHit};
use super::MemoryError;

const INDEX_FILENAME: &str = "chat_index.bin";
const METADATA_FILENAME: &str = "metadata.json";

struct EngineState {
    index: FlatIndex,
    records: Vec<MemoryRecord>,
    ids: IdSequence,
}

impl EngineState {
    fn fresh(dimension: usize) -> Self {
        Self {
            index: FlatIndex::new(dimension),
            records: Vec::new(),
            ids: IdSequence::default(),
        }
    }
}

/// The retrieval memory store. Explicitly constructed and passed by handle
/// to every collaborator; its lifetime is scoped to the application run.
pub struct MemoryEngine {
    dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    state: RwLock<EngineState>,
    /// Single-writer guard held for the whole of every mutating operation.
    /// The state lock alone only protects the final swap; without this, an
    /// ingest landing during a rebuild's embed loop would be wiped by the
    /// swap, and two overlapping saves could interleave their file writes.
    writer: Mutex<()>,
}

impl MemoryEngine {
    /// Opens the store under `dir`, loading persisted state when both files
    /// are present, otherwise starting empty. A persisted pair whose lengths
    /// diverge, or an index whose dimension does not match the embedder, is
    /// rejected rather than guessed at.
    pub async fn open(dir: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating memory directory {:?}", dir))?;

        let index_path = dir.join(INDEX_FILENAME);
        let metadata_path = dir.join(METADATA_FILENAME);

        let state = if index_path.exists() && metadata_path.exists() {
            let index = FlatIndex::load(&index_path, embedder.dimension())?;
            let raw = tokio::fs::read_to_string(&metadata_path)
                .await
                .with_context(|| format!("reading {:?}", metadata_path))?;
            let records: Vec<MemoryRecord> =
                serde_json::from_str(&raw).context("parsing metadata.json")?;
            if records.len() != index.len() {
                return Err(MemoryError::Inconsistent {
                    records: records.len(),
                    vectors: index.len(),
                }
                .into());
            }
            info!("Loaded existing memory: {} records", records.len());
            EngineState {
                index,
                records,
                ids: IdSequence::default(),
            }
        } else {
            if index_path.exists() != metadata_path.exists() {
                warn!(
                    "Partial persisted state under {:?} (one of index/metadata missing), starting empty",
                    dir
                );
            } else {
                info!("Creating new memory store in {:?}", dir);
            }
            EngineState::fresh(embedder.dimension())
        };

        Ok(Self {
            dir,
            embedder,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        })
    }

    /// Embeds `content` and appends vector and record as one critical
    /// section; `vector_idx` equals the count of records inserted before it.
    /// Embedding failure leaves both sides untouched. Persistence is
    /// explicit via [`MemoryEngine::save`].
    pub async fn ingest(&self, role: Role, content: &str, timestamp: &str) -> Result<MemoryRecord> {
        let _writer = self.writer.lock().await;

        let texts = [content.to_string()];
        let vector = self
            .embedder
            .embed(&texts)
            .await
            .context("embedding new record")?
            .into_iter()
            .next()
            .context("embedder returned no vector")?;

        let mut state = self.state.write().await;
        let record = MemoryRecord {
            id: state.ids.next(timestamp, role),
            role,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
            vector_idx: state.index.len(),
        };
        state.index.append(&vector)?;
        state.records.push(record.clone());
        debug!("Ingested {} at position {}", record.id, record.vector_idx);
        Ok(record)
    }

    /// Similarity search. Returns an empty set (never an error) when the
    /// index is empty, when the query cannot be embedded, or when the
    /// metadata store has diverged from the index; the last case is a bug
    /// signal and is logged loudly instead of being served.
    ///
    /// Candidates are scored with `max(0, 1 - dist/10)`, a cheap monotonic
    /// rescaling of L2 distance, filtered at `threshold`, and returned best
    /// first, at most `k` of them.
    pub async fn search(&self, query: &str, k: usize, threshold: f32) -> Result<Vec<SearchHit>> {
        if !self.ready_for_search().await {
            return Ok(Vec::new());
        }

        let texts = [query.to_string()];
        let query_vector = match self.embedder.embed(&texts).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.remove(0),
            Ok(_) => return Ok(Vec::new()),
            Err(err) => {
                warn!("Query embedding failed, returning no memories: {err:#}");
                return Ok(Vec::new());
            }
        };

        // Re-checked: a rebuild or clear may have swapped state while the
        // query was being embedded.
        let state = self.state.read().await;
        if state.index.is_empty() || state.records.len() != state.index.len() {
            return Ok(Vec::new());
        }

        let candidates = state.index.search(&query_vector, k)?;
        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter_map(|(idx, dist)| {
                let Some(record) = state.records.get(idx) else {
                    warn!("Candidate position {} outside metadata range", idx);
                    return None;
                };
                let similarity = (1.0 - dist / 10.0).max(0.0);
                (similarity >= threshold).then(|| SearchHit {
                    id: record.id.clone(),
                    role: record.role,
                    content: record.content.clone(),
                    timestamp: record.timestamp.clone(),
                    similarity,
                })
            })
            .collect();

        // Stable sort: equal similarities keep the index's own return order.
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Rebuilds the whole store from an already-filtered record list,
    /// preserving incoming ids, roles, contents, and timestamps. The live
    /// state stays readable while the replacement is computed and is only
    /// swapped in (then persisted) after every record re-embedded; any
    /// failure abandons the replacement and leaves the live state untouched.
    /// Other writers queue behind the rebuild; readers do not.
    pub async fn rebuild(&self, records: Vec<MemoryRecord>) -> Result<()> {
        let _writer = self.writer.lock().await;

        info!("Rebuilding memory from {} records", records.len());
        let started = Instant::now();

        let mut new_index = FlatIndex::new(self.embedder.dimension());
        let mut new_records = Vec::with_capacity(records.len());

        for record in records {
            let texts = [record.content.clone()];
            let vector = self
                .embedder
                .embed(&texts)
                .await
                .with_context(|| format!("re-embedding record {}", record.id))?
                .into_iter()
                .next()
                .context("embedder returned no vector")?;
            let rebuilt = MemoryRecord {
                vector_idx: new_index.len(),
                ..record
            };
            new_index.append(&vector)?;
            new_records.push(rebuilt);
        }

        let count = new_records.len();
        {
            let mut state = self.state.write().await;
            state.index = new_index;
            state.records = new_records;
        }
        self.persist().await.context("persisting rebuilt memory")?;
        info!(
            "Rebuild complete: {} records in {:.2?}",
            count,
            started.elapsed()
        );
        Ok(())
    }

    /// Serializes the index and metadata under the store directory.
    /// Idempotent; called on every rebuild and at shutdown.
    pub async fn save(&self) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.persist().await
    }

    /// Snapshot-and-write, callers must hold the writer lock so the two
    /// file writes never interleave with another save.
    async fn persist(&self) -> Result<()> {
        let (index, records) = {
            let state = self.state.read().await;
            (state.index.clone(), state.records.clone())
        };
        let count = records.len();
        let index_path = self.dir.join(INDEX_FILENAME);
        let metadata_path = self.dir.join(METADATA_FILENAME);

        tokio::task::spawn_blocking(move || -> Result<()> {
            index.save(&index_path)?;
            let json =
                serde_json::to_string_pretty(&records).context("serializing metadata")?;
            std::fs::write(&metadata_path, json)
                .with_context(|| format!("writing {:?}", metadata_path))?;
            Ok(())
        })
        .await
        .context("save task panicked")??;

        debug!("Saved memory: {} records", count);
        Ok(())
    }

    /// Discards all records and persists the empty state. If persisting
    /// fails, falls back to whatever was last durably saved; if that reload
    /// also fails, the engine is left in a defined empty state rather than a
    /// silently corrupt one.
    pub async fn clear(&self) -> Result<()> {
        let _writer = self.writer.lock().await;

        info!("Clearing memory store");
        {
            let mut state = self.state.write().await;
            *state = EngineState::fresh(self.embedder.dimension());
        }

        if let Err(err) = self.persist().await {
            error!("Failed to persist cleared state: {err:#}");
            match self.reload_from_disk().await {
                Ok(n) => warn!("Restored last saved state ({n} records) after failed clear"),
                Err(reload_err) => {
                    error!("Could not restore saved state, leaving memory empty: {reload_err:#}");
                    let mut state = self.state.write().await;
                    *state = EngineState::fresh(self.embedder.dimension());
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Search preconditions: a non-empty index whose metadata store is in
    /// lock-step. Divergence is a bug signal, logged loudly and never
    /// served from.
    async fn ready_for_search(&self) -> bool {
        let state = self.state.read().await;
        if state.index.is_empty() {
            debug!("Search against empty index");
            return false;
        }
        if state.records.len() != state.index.len() {
            error!(
                "{}",
                MemoryError::Inconsistent {
                    records: state.records.len(),
                    vectors: state.index.len(),
                }
            );
            return false;
        }
        true
    }

    /// Number of stored records. Diagnostics only.
    pub async fn size(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Most recent `n` records, oldest first, for prompt context injection.
    pub async fn recent(&self, n: usize) -> Vec<MemoryRecord> {
        let state = self.state.read().await;
        let skip = state.records.len().saturating_sub(n);
        state.records[skip..].to_vec()
    }

    async fn reload_from_disk(&self) -> Result<usize> {
        let index_path = self.dir.join(INDEX_FILENAME);
        let metadata_path = self.dir.join(METADATA_FILENAME);

        let index = FlatIndex::load(&index_path, self.embedder.dimension())?;
        let raw = tokio::fs::read_to_string(&metadata_path)
            .await
            .with_context(|| format!("reading {:?}", metadata_path))?;
        let records: Vec<MemoryRecord> =
            serde_json::from_str(&raw).context("parsing metadata.json")?;
        if records.len() != index.len() {
            return Err(MemoryError::Inconsistent {
                records: records.len(),
                vectors: index.len(),
            }
            .into());
        }

        let count = records.len();
        let mut state = self.state.write().await;
        state.index = index;
        state.records = records;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use tempfile::tempdir;

    /// Deterministic token-bag embedder with an optional poisoned text that
    /// fails the whole batch, for exercising atomicity and rollback.
    struct StubEmbedder {
        dimension: usize,
        fail_on: Option<String>,
    }

    impl StubEmbedder {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                fail_on: None,
            }
        }

        fn failing_on(dimension: usize, text: &str) -> Self {
            Self {
                dimension,
                fail_on: Some(text.to_string()),
            }
        }

        fn vectorize(&self, text: &str) -> Vec<f32> {
            let mut v = vec![0.0f32; self.dimension];
            for token in text.to_lowercase().split_whitespace() {
                let mut hasher = DefaultHasher::new();
                token.hash(&mut hasher);
                v[(hasher.finish() % self.dimension as u64) as usize] += 1.0;
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for x in &mut v {
                    *x /= norm;
                }
            }
            v
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            texts
                .iter()
                .map(|t| {
                    if self.fail_on.as_deref() == Some(t.as_str()) {
                        anyhow::bail!("stub embedder failure on {t:?}");
                    }
                    Ok(self.vectorize(t))
                })
                .collect()
        }
    }

    async fn engine_with(embedder: StubEmbedder) -> (tempfile::TempDir, MemoryEngine) {
        let dir = tempdir().unwrap();
        let engine = MemoryEngine::open(dir.path(), Arc::new(embedder))
            .await
            .unwrap();
        (dir, engine)
    }

    fn record(id: &str, role: Role, content: &str, timestamp: &str) -> MemoryRecord {
        MemoryRecord {
            id: id.to_string(),
            role,
            content: content.to_string(),
            timestamp: timestamp.to_string(),
            vector_idx: 0,
        }
    }

    #[tokio::test]
    async fn ingest_assigns_sequential_positions() {
        let (_dir, engine) = engine_with(StubEmbedder::new(16)).await;

        for (i, content) in ["alpha", "beta", "gamma"].iter().enumerate() {
            let rec = engine
                .ingest(Role::User, content, "2025-01-01 10:00:00")
                .await
                .unwrap();
            assert_eq!(rec.vector_idx, i);
        }
        assert_eq!(engine.size().await, 3);

        let records = engine.recent(10).await;
        for (i, rec) in records.iter().enumerate() {
            assert_eq!(rec.vector_idx, i);
        }
    }

    #[tokio::test]
    async fn ingest_failure_leaves_both_sides_untouched() {
        let (_dir, engine) = engine_with(StubEmbedder::failing_on(16, "poison")).await;

        engine
            .ingest(Role::User, "fine", "2025-01-01 10:00:00")
            .await
            .unwrap();
        let err = engine
            .ingest(Role::User, "poison", "2025-01-01 10:00:01")
            .await;
        assert!(err.is_err());

        assert_eq!(engine.size().await, 1);
        let next = engine
            .ingest(Role::Assistant, "still fine", "2025-01-01 10:00:02")
            .await
            .unwrap();
        assert_eq!(next.vector_idx, 1);
    }

    #[tokio::test]
    async fn same_second_same_role_ids_are_disambiguated() {
        let (_dir, engine) = engine_with(StubEmbedder::new(16)).await;

        let a = engine
            .ingest(Role::User, "first", "2025-01-01 10:00:00")
            .await
            .unwrap();
        let b = engine
            .ingest(Role::User, "second", "2025-01-01 10:00:00")
            .await
            .unwrap();
        let c = engine
            .ingest(Role::User, "third", "2025-01-01 10:00:00")
            .await
            .unwrap();

        assert_eq!(a.id, "2025-01-01 10:00:00_user");
        assert_eq!(b.id, "2025-01-01 10:00:00_user_1");
        assert_eq!(c.id, "2025-01-01 10:00:00_user_2");
    }

    #[tokio::test]
    async fn search_on_empty_engine_returns_empty() {
        let (_dir, engine) = engine_with(StubEmbedder::new(16)).await;
        let hits = engine.search("anything", 5, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_embed_failure_degrades_to_empty() {
        let (_dir, engine) = engine_with(StubEmbedder::failing_on(16, "bad query")).await;
        engine
            .ingest(Role::User, "content", "2025-01-01 10:00:00")
            .await
            .unwrap();
        let hits = engine.search("bad query", 5, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn higher_threshold_yields_subset() {
        let (_dir, engine) = engine_with(StubEmbedder::new(32)).await;
        for (i, content) in ["red fox", "blue whale", "red panda", "green tea"]
            .iter()
            .enumerate()
        {
            engine
                .ingest(Role::User, content, &format!("2025-01-01 10:00:0{i}"))
                .await
                .unwrap();
        }

        let loose = engine.search("red animal", 4, 0.0).await.unwrap();
        let tight = engine.search("red animal", 4, 0.9).await.unwrap();

        let loose_ids: Vec<&str> = loose.iter().map(|h| h.id.as_str()).collect();
        assert!(tight.len() <= loose.len());
        for hit in &tight {
            assert!(loose_ids.contains(&hit.id.as_str()));
            assert!(hit.similarity >= 0.9);
        }
        // Descending similarity.
        for pair in loose.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn rebuild_replaces_state_and_reassigns_positions() {
        let (_dir, engine) = engine_with(StubEmbedder::new(16)).await;
        engine
            .ingest(Role::User, "will be dropped", "2025-01-01 10:00:00")
            .await
            .unwrap();

        let keep = vec![
            record("k1", Role::User, "kept one", "2025-01-02 10:00:00"),
            record("k2", Role::Assistant, "kept two", "2025-01-02 10:00:01"),
        ];
        engine.rebuild(keep).await.unwrap();

        assert_eq!(engine.size().await, 2);
        let records = engine.recent(10).await;
        assert_eq!(records[0].id, "k1");
        assert_eq!(records[0].vector_idx, 0);
        assert_eq!(records[1].id, "k2");
        assert_eq!(records[1].vector_idx, 1);

        let hits = engine.search("kept one", 5, 0.0).await.unwrap();
        assert_eq!(hits[0].id, "k1");
    }

    #[tokio::test]
    async fn rebuild_failure_rolls_back_to_previous_state() {
        let (_dir, engine) = engine_with(StubEmbedder::failing_on(16, "third")).await;
        engine
            .ingest(Role::User, "original one", "2025-01-01 10:00:00")
            .await
            .unwrap();
        engine
            .ingest(Role::Assistant, "original two", "2025-01-01 10:00:01")
            .await
            .unwrap();

        let before_records = engine.recent(10).await;
        let before_hits = engine.search("original one", 5, 0.0).await.unwrap();

        let replacement = vec![
            record("r1", Role::User, "first", "2025-01-02 10:00:00"),
            record("r2", Role::User, "second", "2025-01-02 10:00:01"),
            record("r3", Role::User, "third", "2025-01-02 10:00:02"),
            record("r4", Role::User, "fourth", "2025-01-02 10:00:03"),
            record("r5", Role::User, "fifth", "2025-01-02 10:00:04"),
        ];
        assert!(engine.rebuild(replacement).await.is_err());

        assert_eq!(engine.size().await, 2);
        assert_eq!(engine.recent(10).await, before_records);

        let after_hits = engine.search("original one", 5, 0.0).await.unwrap();
        assert_eq!(after_hits.len(), before_hits.len());
        for (a, b) in after_hits.iter().zip(&before_hits) {
            assert_eq!(a.id, b.id);
            assert!((a.similarity - b.similarity).abs() < 1e-6);
        }
    }

    /// Embedder that parks on one specific text until released, so a test
    /// can hold a rebuild mid-loop while another writer tries to land.
    struct GatedEmbedder {
        inner: StubEmbedder,
        gated_text: String,
        entered: Arc<tokio::sync::Notify>,
        release: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl Embedder for GatedEmbedder {
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.iter().any(|t| *t == self.gated_text) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.embed(texts).await
        }
    }

    #[tokio::test]
    async fn ingest_during_rebuild_is_not_lost() {
        let entered = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let embedder = GatedEmbedder {
            inner: StubEmbedder::new(16),
            gated_text: "slow record".to_string(),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        };

        let dir = tempdir().unwrap();
        let engine = Arc::new(
            MemoryEngine::open(dir.path(), Arc::new(embedder))
                .await
                .unwrap(),
        );
        engine
            .ingest(Role::User, "seed", "2025-01-01 10:00:00")
            .await
            .unwrap();

        let rebuild_engine = Arc::clone(&engine);
        let rebuild = tokio::spawn(async move {
            rebuild_engine
                .rebuild(vec![
                    record("r1", Role::User, "slow record", "2025-01-02 10:00:00"),
                    record("r2", Role::User, "calm record", "2025-01-02 10:00:01"),
                ])
                .await
        });

        // Rebuild is now parked inside its embed loop.
        entered.notified().await;

        let ingest_engine = Arc::clone(&engine);
        let ingest = tokio::spawn(async move {
            ingest_engine
                .ingest(Role::User, "concurrent turn", "2025-01-02 10:00:02")
                .await
        });
        tokio::task::yield_now().await;
        release.notify_one();

        rebuild.await.unwrap().unwrap();
        let ingested = ingest.await.unwrap().unwrap();

        // The ingest queued behind the rebuild instead of being wiped by
        // its swap: both rebuilt records and the new turn are live.
        assert_eq!(engine.size().await, 3);
        assert_eq!(ingested.vector_idx, 2);
        let records = engine.recent(10).await;
        assert!(records.iter().any(|r| r.content == "concurrent turn"));
        assert!(!records.iter().any(|r| r.content == "seed"));
    }

    #[tokio::test]
    async fn rebuild_with_empty_list_empties_the_store() {
        let (_dir, engine) = engine_with(StubEmbedder::new(16)).await;
        engine
            .ingest(Role::User, "something", "2025-01-01 10:00:00")
            .await
            .unwrap();

        engine.rebuild(Vec::new()).await.unwrap();
        assert_eq!(engine.size().await, 0);
        assert!(engine.search("something", 5, 0.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_and_reopen_reproduce_search_orderings() {
        let dir = tempdir().unwrap();
        {
            let engine = MemoryEngine::open(dir.path(), Arc::new(StubEmbedder::new(32)))
                .await
                .unwrap();
            for (i, content) in ["morning coffee", "evening tea", "coffee beans"]
                .iter()
                .enumerate()
            {
                engine
                    .ingest(Role::User, content, &format!("2025-01-01 10:00:0{i}"))
                    .await
                    .unwrap();
            }
            engine.save().await.unwrap();
            // save is idempotent
            engine.save().await.unwrap();
        }

        let reopened = MemoryEngine::open(dir.path(), Arc::new(StubEmbedder::new(32)))
            .await
            .unwrap();
        assert_eq!(reopened.size().await, 3);

        let hits = reopened.search("coffee", 3, 0.0).await.unwrap();
        assert_eq!(hits.len(), 3);
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn reopen_rejects_dimension_change() {
        let dir = tempdir().unwrap();
        {
            let engine = MemoryEngine::open(dir.path(), Arc::new(StubEmbedder::new(16)))
                .await
                .unwrap();
            engine
                .ingest(Role::User, "hello", "2025-01-01 10:00:00")
                .await
                .unwrap();
            engine.save().await.unwrap();
        }

        let err = MemoryEngine::open(dir.path(), Arc::new(StubEmbedder::new(64))).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn clear_persists_an_empty_store() {
        let dir = tempdir().unwrap();
        let engine = MemoryEngine::open(dir.path(), Arc::new(StubEmbedder::new(16)))
            .await
            .unwrap();
        engine
            .ingest(Role::User, "to be cleared", "2025-01-01 10:00:00")
            .await
            .unwrap();
        engine.save().await.unwrap();

        engine.clear().await.unwrap();
        assert_eq!(engine.size().await, 0);

        let reopened = MemoryEngine::open(dir.path(), Arc::new(StubEmbedder::new(16)))
            .await
            .unwrap();
        assert_eq!(reopened.size().await, 0);
    }
}
