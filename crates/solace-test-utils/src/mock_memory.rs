// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording memory store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use solace_core::error::SolaceError;
use solace_core::traits::{MemoryStoreAdapter, PluginAdapter};
use solace_core::types::{AdapterType, HealthStatus, MemoryQuery, MemoryRecord};

/// In-memory store that records every call.
///
/// `search` returns the newest matching records first, ignoring
/// similarity. Writes and searches can be made to fail.
#[derive(Default)]
pub struct MockMemoryStore {
    records: Mutex<Vec<MemoryRecord>>,
    queries: Mutex<Vec<MemoryQuery>>,
    deletes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_search: AtomicBool,
}

impl MockMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    /// Every record passed to `add`, in call order.
    pub async fn adds(&self) -> Vec<MemoryRecord> {
        self.records.lock().await.clone()
    }

    pub async fn queries(&self) -> Vec<MemoryQuery> {
        self.queries.lock().await.clone()
    }

    /// Number of `delete_all` calls.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockMemoryStore {
    fn name(&self) -> &str {
        "mock-memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MemoryStore
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        Ok(())
    }
}

#[async_trait]
impl MemoryStoreAdapter for MockMemoryStore {
    async fn add(&self, record: MemoryRecord) -> Result<(), SolaceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SolaceError::Storage {
                message: "mock store rejected write".into(),
                source: None,
            });
        }
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<String>, SolaceError> {
        self.queries.lock().await.push(query.clone());
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(SolaceError::Storage {
                message: "mock store search failed".into(),
                source: None,
            });
        }
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.namespace == query.namespace)
            .filter(|r| {
                query
                    .filter
                    .iter()
                    .all(|(k, v)| r.metadata.get(k) == Some(v))
            })
            .take(query.k)
            .map(|r| r.text.clone())
            .collect())
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), SolaceError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.records.lock().await.retain(|r| r.namespace != namespace);
        Ok(())
    }
}
