// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that every collaborator implements.

use async_trait::async_trait;

use crate::error::SolaceError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Solace adapters.
///
/// Provider, embedding, emotion, memory-store and speech adapters build on
/// this trait for identity, lifecycle, and health checks. Adapters are
/// constructed by the process bootstrap and injected into the pipeline;
/// nothing in the core creates them lazily.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of collaborator this adapter represents.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, SolaceError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), SolaceError>;
}
