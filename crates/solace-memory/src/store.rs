// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process vector store implementing [`MemoryStoreAdapter`].
//!
//! Records are partitioned by namespace and searched by cosine similarity
//! over embeddings from an [`EmbeddingAdapter`]. An optional JSON snapshot
//! keeps the store across restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use solace_core::error::SolaceError;
use solace_core::traits::{EmbeddingAdapter, MemoryStoreAdapter, PluginAdapter};
use solace_core::types::{AdapterType, EmbeddingInput, HealthStatus, MemoryQuery, MemoryRecord};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::types::{cosine_similarity, StoredMemory};

type Namespaces = HashMap<String, Vec<StoredMemory>>;

fn storage_err(
    message: impl Into<String>,
    e: impl std::error::Error + Send + Sync + 'static,
) -> SolaceError {
    SolaceError::Storage {
        message: message.into(),
        source: Some(Box::new(e)),
    }
}

pub struct VectorMemoryStore {
    embedder: Arc<dyn EmbeddingAdapter>,
    namespaces: RwLock<Namespaces>,
    snapshot: Option<PathBuf>,
}

impl VectorMemoryStore {
    /// Creates an empty, process-local store.
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            embedder,
            namespaces: RwLock::new(HashMap::new()),
            snapshot: None,
        }
    }

    /// Opens a store backed by a JSON snapshot, loading it if it exists.
    pub async fn open(
        embedder: Arc<dyn EmbeddingAdapter>,
        path: impl Into<PathBuf>,
    ) -> Result<Self, SolaceError> {
        let path = path.into();
        let namespaces = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Namespaces>(&bytes)
                .map_err(|e| storage_err(format!("corrupt memory snapshot {}", path.display()), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(storage_err(
                    format!("failed to read memory snapshot {}", path.display()),
                    e,
                ));
            }
        };
        info!(
            path = %path.display(),
            namespaces = namespaces.len(),
            "opened memory snapshot"
        );
        Ok(Self {
            embedder,
            namespaces: RwLock::new(namespaces),
            snapshot: Some(path),
        })
    }

    /// Namespaces currently holding at least one record.
    pub async fn namespaces(&self) -> Vec<String> {
        self.namespaces
            .read()
            .await
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(ns, _)| ns.clone())
            .collect()
    }

    /// Number of records in `namespace`.
    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, Vec::len)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, SolaceError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SolaceError::Internal("embedding returned no results".to_string()))
    }

    /// Writes the snapshot while the caller holds the write lock.
    async fn persist(&self, namespaces: &Namespaces) -> Result<(), SolaceError> {
        let Some(ref path) = self.snapshot else {
            return Ok(());
        };
        write_snapshot(path, namespaces).await
    }
}

async fn write_snapshot(path: &Path, namespaces: &Namespaces) -> Result<(), SolaceError> {
    let bytes = serde_json::to_vec(namespaces)
        .map_err(|e| storage_err("failed to encode memory snapshot", e))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_err("failed to create snapshot directory", e))?;
    }
    // Write then rename so a crash never leaves a truncated snapshot.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| storage_err(format!("failed to write {}", tmp.display()), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| storage_err(format!("failed to replace {}", path.display()), e))
}

#[async_trait]
impl PluginAdapter for VectorMemoryStore {
    fn name(&self) -> &str {
        "vector-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MemoryStore
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        self.embedder.health_check().await
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        let namespaces = self.namespaces.read().await;
        self.persist(&namespaces).await
    }
}

#[async_trait]
impl MemoryStoreAdapter for VectorMemoryStore {
    async fn add(&self, record: MemoryRecord) -> Result<(), SolaceError> {
        let embedding = self.embed_one(&record.text).await?;
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(record.namespace.clone())
            .or_default()
            .push(StoredMemory {
                id: record.id,
                text: record.text,
                metadata: record.metadata,
                embedding,
                created_at: chrono::Utc::now().to_rfc3339(),
            });

        // A record that never reached the snapshot must not be searchable.
        if let Err(e) = self.persist(&namespaces).await {
            if let Some(records) = namespaces.get_mut(&record.namespace) {
                records.pop();
                if records.is_empty() {
                    namespaces.remove(&record.namespace);
                }
            }
            return Err(e);
        }
        debug!(namespace = record.namespace.as_str(), "memory record added");
        Ok(())
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<String>, SolaceError> {
        let query_embedding = self.embed_one(&query.query).await?;
        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(&query.namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &StoredMemory)> = records
            .iter()
            .filter(|r| r.matches(&query.filter))
            .filter_map(|r| match cosine_similarity(&query_embedding, &r.embedding) {
                Some(score) => Some((score, r)),
                None => {
                    warn!(
                        id = r.id.as_str(),
                        stored = r.embedding.len(),
                        query = query_embedding.len(),
                        "skipping memory with mismatched embedding dimension"
                    );
                    None
                }
            })
            .filter(|(score, _)| *score >= query.score_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(query.k);
        Ok(scored.into_iter().map(|(_, r)| r.text.clone()).collect())
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), SolaceError> {
        let mut namespaces = self.namespaces.write().await;
        let Some(removed) = namespaces.remove(namespace) else {
            return self.persist(&namespaces).await;
        };
        if let Err(e) = self.persist(&namespaces).await {
            namespaces.insert(namespace.to_string(), removed);
            return Err(e);
        }
        info!(namespace, removed = removed.len(), "deleted namespace");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use solace_core::types::{EmbeddingOutput, SESSION_ID_KEY};

    use super::*;

    /// Maps each text to a fixed vector by keyword.
    struct KeywordEmbedder;

    #[async_trait]
    impl PluginAdapter for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Embedding
        }
        async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), SolaceError> {
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingAdapter for KeywordEmbedder {
        async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, SolaceError> {
            let embeddings = input
                .texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        if t.contains("cat") { 1.0 } else { 0.0 },
                        if t.contains("garden") { 1.0 } else { 0.0 },
                        if t.contains("tea") { 0.5 } else { 0.0 },
                    ]
                })
                .collect();
            Ok(EmbeddingOutput {
                embeddings,
                dimensions: 3,
            })
        }
    }

    fn record(ns: &str, thread: &str, text: &str) -> MemoryRecord {
        MemoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            namespace: ns.to_string(),
            metadata: HashMap::from([(SESSION_ID_KEY.to_string(), thread.to_string())]),
        }
    }

    fn query(ns: &str, thread: &str, q: &str, threshold: f32) -> MemoryQuery {
        MemoryQuery {
            query: q.to_string(),
            namespace: ns.to_string(),
            filter: HashMap::from([(SESSION_ID_KEY.to_string(), thread.to_string())]),
            k: 3,
            score_threshold: threshold,
        }
    }

    #[tokio::test]
    async fn search_ranks_and_filters() {
        let store = VectorMemoryStore::new(Arc::new(KeywordEmbedder));
        store.add(record("alice", "t1", "Human: my cat\nAI: nice")).await.unwrap();
        store.add(record("alice", "t1", "Human: my garden and cat")).await.unwrap();
        store.add(record("alice", "t1", "Human: about tea")).await.unwrap();
        store.add(record("alice", "t2", "Human: another cat")).await.unwrap();
        store.add(record("bob", "t1", "Human: bob's cat")).await.unwrap();

        let hits = store.search(query("alice", "t1", "cat", 0.5)).await.unwrap();
        assert_eq!(
            hits,
            vec!["Human: my cat\nAI: nice", "Human: my garden and cat"]
        );
    }

    #[tokio::test]
    async fn search_truncates_to_k() {
        let store = VectorMemoryStore::new(Arc::new(KeywordEmbedder));
        for i in 0..5 {
            store.add(record("alice", "t1", &format!("cat {i}"))).await.unwrap();
        }
        let mut q = query("alice", "t1", "cat", 0.0);
        q.k = 2;
        assert_eq!(store.search(q).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_namespace_is_empty() {
        let store = VectorMemoryStore::new(Arc::new(KeywordEmbedder));
        assert!(store.search(query("nobody", "t1", "cat", 0.0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_all_is_namespace_wide() {
        let store = VectorMemoryStore::new(Arc::new(KeywordEmbedder));
        store.add(record("alice", "t1", "cat")).await.unwrap();
        store.add(record("alice", "t2", "cat")).await.unwrap();
        store.add(record("bob", "t1", "cat")).await.unwrap();

        store.delete_all("alice").await.unwrap();
        assert_eq!(store.len("alice").await, 0);
        assert_eq!(store.len("bob").await, 1);
        assert_eq!(store.namespaces().await, vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");

        let store = VectorMemoryStore::open(Arc::new(KeywordEmbedder), &path).await.unwrap();
        store.add(record("alice", "t1", "my cat")).await.unwrap();
        drop(store);

        let reopened = VectorMemoryStore::open(Arc::new(KeywordEmbedder), &path).await.unwrap();
        assert_eq!(reopened.len("alice").await, 1);
        let hits = reopened.search(query("alice", "t1", "cat", 0.5)).await.unwrap();
        assert_eq!(hits, vec!["my cat"]);
    }

    #[tokio::test]
    async fn failed_snapshot_write_keeps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("sub");
        let store = VectorMemoryStore::open(Arc::new(KeywordEmbedder), blocker.join("memories.json"))
            .await
            .unwrap();
        // The snapshot directory cannot be created while a file sits at its path.
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = store.add(record("alice", "t1", "my cat")).await.unwrap_err();
        assert!(matches!(err, SolaceError::Storage { .. }), "{err}");
        assert_eq!(store.len("alice").await, 0);
        assert!(store.namespaces().await.is_empty());
        let hits = store.search(query("alice", "t1", "cat", 0.0)).await.unwrap();
        assert!(hits.is_empty());

        std::fs::remove_file(&blocker).unwrap();
        store.add(record("alice", "t1", "my cat")).await.unwrap();
        assert_eq!(store.len("alice").await, 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("sub");
        let store = VectorMemoryStore::open(Arc::new(KeywordEmbedder), blocker.join("memories.json"))
            .await
            .unwrap();
        store.add(record("alice", "t1", "my cat")).await.unwrap();

        std::fs::remove_dir_all(&blocker).unwrap();
        std::fs::write(&blocker, "not a directory").unwrap();
        assert!(store.delete_all("alice").await.is_err());
        assert_eq!(store.len("alice").await, 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");
        std::fs::write(&path, "not json").unwrap();
        let result = VectorMemoryStore::open(Arc::new(KeywordEmbedder), &path).await;
        assert!(matches!(result, Err(SolaceError::Storage { .. })));
    }
}
