//! Download task structures and status tracking

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::identifier::ResourceIdentifier;

/// Task execution status
///
/// `Pending → InFlight → (Succeeded | Failed)`, or `Pending → (Skipped | Failed)`
/// when the task resolves without a request. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Scheduled, no request issued yet
    #[default]
    Pending,
    /// Holding a worker slot
    InFlight,
    /// Archive written to its destination
    Succeeded,
    /// Gave up; the last error is recorded in the outcome
    Failed,
    /// Destination already present, nothing fetched
    Skipped,
}

impl TaskStatus {
    /// Whether no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::Failed)
                | (Self::InFlight, Self::Succeeded)
                | (Self::InFlight, Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid task transition {from} -> {to}")]
pub struct InvalidTransition {
    /// Status before the attempted change
    pub from: TaskStatus,
    /// Requested status
    pub to: TaskStatus,
}

/// One scheduled download
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Font slug
    pub identifier: ResourceIdentifier,
    /// Final archive path
    pub destination: PathBuf,
    attempts: u32,
    status: TaskStatus,
}

impl DownloadTask {
    /// Create a pending task
    pub fn new(identifier: ResourceIdentifier, destination: PathBuf) -> Self {
        Self {
            identifier,
            destination,
            attempts: 0,
            status: TaskStatus::Pending,
        }
    }

    /// Current status
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Requests issued so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Move to `next` if the state machine allows it
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Count a new request; only valid while in flight
    pub fn record_attempt(&mut self) -> Result<u32, InvalidTransition> {
        if self.status != TaskStatus::InFlight {
            return Err(InvalidTransition {
                from: self.status,
                to: TaskStatus::InFlight,
            });
        }
        self.attempts += 1;
        Ok(self.attempts)
    }
}
