//! Per-node units of work
//!
//! A [`NodeAction`] drives one node through probe, forward and backward.
//! The two [`ActionKind`]s are mirror images: deleting is creating with
//! forward/backward and the two probe outcomes swapped.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    GroupName, Node, NodeActionState, NodeClient, NodeError, NodeResponse, Operation, RetryPolicy,
    SagaError, SagaStats,
};

/// Which action a saga applies on every node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Make the group exist everywhere
    CreateGroup,
    /// Make the group absent everywhere
    DeleteGroup,
}

impl ActionKind {
    /// Selector string, as accepted by `FromStr`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateGroup => "create_group",
            Self::DeleteGroup => "delete_group",
        }
    }

    /// Call that applies the action
    pub fn forward(&self) -> Operation {
        match self {
            Self::CreateGroup => Operation::CreateGroup,
            Self::DeleteGroup => Operation::DeleteGroup,
        }
    }

    /// Call that undoes a successful forward
    pub fn backward(&self) -> Operation {
        match self {
            Self::CreateGroup => Operation::DeleteGroup,
            Self::DeleteGroup => Operation::CreateGroup,
        }
    }

    /// State after a probe finds the group on the node
    pub fn when_present(&self) -> NodeActionState {
        match self {
            Self::CreateGroup => NodeActionState::NotNeeded,
            Self::DeleteGroup => NodeActionState::Ready,
        }
    }

    /// State after a probe gets 404 from the node
    pub fn when_absent(&self) -> NodeActionState {
        match self {
            Self::CreateGroup => NodeActionState::Ready,
            Self::DeleteGroup => NodeActionState::NotNeeded,
        }
    }
}

impl FromStr for ActionKind {
    type Err = SagaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_group" => Ok(Self::CreateGroup),
            "delete_group" => Ok(Self::DeleteGroup),
            other => Err(SagaError::UnknownAction(other.into())),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action against one node.
///
/// `status` is only written by this action's own operations, each of which
/// sets it before returning.
pub struct NodeAction {
    kind: ActionKind,
    node: Node,
    status: NodeActionState,
    client: NodeClient,
    retry: RetryPolicy,
    stats: Arc<SagaStats>,
}

impl NodeAction {
    /// Create an action in state `Unknown` with the default retry policy
    pub fn new(kind: ActionKind, node: Node, client: NodeClient) -> Self {
        Self {
            kind,
            node,
            status: NodeActionState::Unknown,
            client,
            retry: RetryPolicy::default(),
            stats: Arc::new(SagaStats::new()),
        }
    }

    /// Override the retry policy of every operation
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn with_stats(mut self, stats: Arc<SagaStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Which action this node applies
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Node this action targets
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Current lifecycle state
    pub fn status(&self) -> NodeActionState {
        self.status
    }

    /// Retry policy applied to every call
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn set_retry_policy(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    /// Probe the node and classify it as `Ready` or `NotNeeded`.
    ///
    /// A 404 is an answer, not a failure: it is consumed here and never
    /// reaches the caller.
    pub async fn get_current_status(
        &mut self,
        group: &GroupName,
    ) -> Result<NodeActionState, NodeError> {
        let outcome = self.call(Operation::GetGroup, group).await;

        self.status = match &outcome {
            Ok(_) => self.kind.when_present(),
            Err(NodeError::GroupNotFound { .. }) => self.kind.when_absent(),
            Err(_) => NodeActionState::Error,
        };

        match outcome {
            Ok(_) | Err(NodeError::GroupNotFound { .. }) => Ok(self.status),
            Err(error) => Err(error),
        }
    }

    /// Apply the action: `Done` on success, `Error` once retries run out.
    pub async fn forward(&mut self, group: &GroupName) -> Result<NodeResponse, NodeError> {
        let outcome = self.call(self.kind.forward(), group).await;
        self.status = match outcome {
            Ok(_) => NodeActionState::Done,
            Err(_) => NodeActionState::Error,
        };
        outcome
    }

    /// Undo a forward: `RolledBack` on success, `Error` once retries run out.
    pub async fn backward(&mut self, group: &GroupName) -> Result<NodeResponse, NodeError> {
        let outcome = self.call(self.kind.backward(), group).await;
        self.status = match outcome {
            Ok(_) => NodeActionState::RolledBack,
            Err(_) => NodeActionState::Error,
        };
        outcome
    }

    async fn call(
        &self,
        operation: Operation,
        group: &GroupName,
    ) -> Result<NodeResponse, NodeError> {
        self.retry
            .run(operation, || {
                SagaStats::incr(&self.stats.remote_calls);
                self.client.execute(operation, &self.node, group)
            })
            .await
    }
}

impl std::fmt::Debug for NodeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeAction")
            .field("kind", &self.kind)
            .field("node", &self.node)
            .field("status", &self.status)
            .finish()
    }
}
