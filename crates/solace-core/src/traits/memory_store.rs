// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory store adapter trait.

use async_trait::async_trait;

use crate::error::SolaceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MemoryQuery, MemoryRecord};

/// A similarity-searchable store partitioned by namespace.
///
/// Records are immutable once written. Deletion is namespace-wide.
#[async_trait]
pub trait MemoryStoreAdapter: PluginAdapter {
    /// Writes one record.
    async fn add(&self, record: MemoryRecord) -> Result<(), SolaceError>;

    /// Returns matching record texts, highest similarity first.
    async fn search(&self, query: MemoryQuery) -> Result<Vec<String>, SolaceError>;

    /// Removes every record in `namespace`.
    async fn delete_all(&self, namespace: &str) -> Result<(), SolaceError>;
}
