//! Lifecycle states for node actions and sagas

use serde::{Deserialize, Serialize};

/// Lifecycle of one node action within a saga
///
/// ```text
/// Unknown --probe--> Ready | NotNeeded | Error
/// Ready --forward--> Done | Error
/// Done --backward--> RolledBack | Error
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeActionState {
    /// Not probed yet
    Unknown,
    /// Probe shows the action still has to be applied
    Ready,
    /// Probe shows the effect is already present
    NotNeeded,
    /// Forward succeeded
    Done,
    /// Backward succeeded
    RolledBack,
    /// Last operation exhausted its retries
    Error,
}

impl NodeActionState {
    /// No further transition happens without a new operation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NotNeeded | Self::Done | Self::RolledBack | Self::Error
        )
    }

    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Ready => "READY",
            Self::NotNeeded => "NOT_NEEDED",
            Self::Done => "DONE",
            Self::RolledBack => "ROLLED_BACK",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for NodeActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one saga run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaState {
    /// Not run yet
    Pending,
    /// Status phase failed, or rollback failed
    Error,
    /// Every required forward succeeded
    Done,
    /// A forward failed and every compensation succeeded
    RolledBack,
}

impl SagaState {
    /// The saga has run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Error => "ERROR",
            Self::Done => "DONE",
            Self::RolledBack => "ROLLED_BACK",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three sequential phases of a saga run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Probe current state on every node
    Status,
    /// Apply the action on ready nodes
    Forward,
    /// Compensate nodes whose forward succeeded
    Backward,
}

impl Phase {
    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a saga ended in [`SagaState::Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaFailure {
    /// A status probe exhausted its retries; nothing was applied
    StatusProbe,
    /// A compensation exhausted its retries; nodes are left unreconciled
    Rollback,
}

impl SagaFailure {
    /// Rollback failures leave the cluster in a mixed state
    pub fn requires_manual_intervention(&self) -> bool {
        matches!(self, Self::Rollback)
    }
}

impl std::fmt::Display for SagaFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatusProbe => f.write_str("status probe failed"),
            Self::Rollback => f.write_str("rollback failed, manual check needed"),
        }
    }
}
