//! Saga context and identity types

use serde::{Deserialize, Serialize};

use reqwest::Url;

use crate::{ActionKind, NodeError};

/// Address of one remote node (base URL, e.g. `http://node1.cluster.com`).
///
/// Trailing slashes are stripped, so `http://x/a` and `http://x/a/` are the
/// same node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Node(Box<str>);

impl Node {
    /// Create a node from its address
    pub fn new(address: impl Into<Box<str>>) -> Self {
        let address = address.into();
        match address.strip_suffix('/') {
            Some(_) => Self(address.trim_end_matches('/').into()),
            None => Self(address),
        }
    }

    /// Get the raw address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{node}/v1/group`, target of create and delete
    pub fn group_url(&self) -> String {
        format!("{}/v1/group", self.0)
    }

    /// `{node}/v1/group/{name}`, target of the status probe.
    ///
    /// The name is percent-encoded as a single path segment.
    pub fn group_status_url(&self, group: &GroupName) -> Result<Url, NodeError> {
        let mut url =
            Url::parse(&self.group_url()).map_err(|e| NodeError::transport(self, e))?;
        url.path_segments_mut()
            .map_err(|()| NodeError::transport(self, "address cannot carry a path"))?
            .push(group.as_str());
        Ok(url)
    }
}

impl From<&str> for Node {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Node {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}

impl From<Node> for String {
    fn from(node: Node) -> Self {
        node.0.into()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the group a saga creates or deletes
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(Box<str>);

impl GroupName {
    /// Create a group name
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Self(name.into())
    }

    /// Get the raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for GroupName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Debug for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupName({})", self.0)
    }
}

impl std::fmt::Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a saga execution within this process
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SagaId(pub u64);

impl SagaId {
    /// Allocate the next saga ID
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for SagaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SagaId({})", self.0)
    }
}

impl std::fmt::Display for SagaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation context shared (read-only) by every part of one saga run
#[derive(Clone)]
pub struct SagaContext {
    /// Unique saga execution identifier
    pub saga_id: SagaId,
    /// Which action this saga applies
    pub action: ActionKind,
    /// Group the saga targets
    pub group: GroupName,
    /// When the saga was built (millis since UNIX epoch)
    pub saga_started_at_millis: u64,
}

impl SagaContext {
    /// Create a context for a new saga
    pub fn new(action: ActionKind, group: GroupName) -> Self {
        Self {
            saga_id: SagaId::next(),
            action,
            group,
            saga_started_at_millis: Self::now_millis(),
        }
    }

    /// Get current time in milliseconds since UNIX epoch
    pub fn now_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Calculate elapsed time since the saga was built
    pub fn elapsed_millis(&self) -> u64 {
        Self::now_millis().saturating_sub(self.saga_started_at_millis)
    }
}

impl std::fmt::Debug for SagaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaContext")
            .field("saga_id", &self.saga_id)
            .field("action", &self.action)
            .field("group", &self.group)
            .finish()
    }
}
