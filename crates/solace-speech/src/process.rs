// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle tracking for the TTS worker child process.

use std::fmt;

use solace_core::error::SolaceError;
use tokio::process::Child;

/// ```text
/// Pending → Starting → Running → Stopped
///               ↓          ↓
///             Failed     Failed
/// ```
/// Failed and Stopped may return to Pending for a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Pending,
    Starting,
    Running,
    Failed,
    Stopped,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Starting)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::Failed)
                | (Self::Running, Self::Stopped)
                | (Self::Running, Self::Failed)
                | (Self::Failed, Self::Pending)
                | (Self::Stopped, Self::Pending)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        })
    }
}

/// A worker child with its lifecycle state. Killed on drop.
pub struct WorkerProcess {
    state: ProcessState,
    child: Option<Child>,
    name: String,
}

impl WorkerProcess {
    pub fn new(name: &str) -> Self {
        Self {
            state: ProcessState::Pending,
            child: None,
            name: name.to_owned(),
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_alive(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            _ => false,
        }
    }

    pub fn transition(&mut self, target: ProcessState) -> Result<(), SolaceError> {
        if !self.state.can_transition_to(target) {
            return Err(SolaceError::Internal(format!(
                "invalid worker state transition: {} -> {} ({})",
                self.state, target, self.name
            )));
        }
        tracing::debug!(worker = %self.name, from = %self.state, to = %target, "worker state transition");
        self.state = target;
        Ok(())
    }

    /// Attaches a freshly spawned child and moves to Starting.
    pub fn attach(&mut self, child: Child) -> Result<(), SolaceError> {
        self.transition(ProcessState::Starting)?;
        self.child = Some(child);
        Ok(())
    }

    pub fn child_mut(&mut self) -> Option<&mut Child> {
        self.child.as_mut()
    }

    /// Kills the child without waiting and records the failure.
    pub fn fail(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
        self.child = None;
        self.state = ProcessState::Failed;
    }

    /// Kills and reaps the child, ending in Stopped.
    pub async fn kill(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
        self.child = None;
        self.state = ProcessState::Stopped;
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
            tracing::debug!(worker = %self.name, "killed worker process on drop");
        }
    }
}

impl fmt::Debug for WorkerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerProcess")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("has_child", &self.child.is_some())
            .finish()
    }
}
