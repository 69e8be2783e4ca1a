//! Error types for node calls and saga construction

use crate::Node;

/// Error from a single remote node operation
#[derive(Clone, Debug, thiserror::Error)]
pub enum NodeError {
    /// Generic failure - unexpected status or transport error. Retriable.
    #[error("node {node} failed (status {}): {msg}", display_code(.code))]
    Failed {
        /// Node that produced the failure
        node: Node,
        /// HTTP status code, `None` when the request never got a response
        code: Option<u16>,
        /// Response body or transport detail
        msg: Box<str>,
    },
    /// The status probe answered 404: the group is absent on this node
    #[error("group not found on node {node}")]
    GroupNotFound {
        /// Node that reported the absence
        node: Node,
    },
    /// Every attempt of the retry policy failed
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of calls issued
        attempts: u32,
        /// Last underlying failure
        last: Box<NodeError>,
    },
}

fn display_code(code: &Option<u16>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".into())
}

impl NodeError {
    /// Build a transport failure (no HTTP status received)
    pub fn transport(node: &Node, error: impl std::fmt::Display) -> Self {
        Self::Failed {
            node: node.clone(),
            code: None,
            msg: error.to_string().into(),
        }
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Check if this is the semantic "absent" answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GroupNotFound { .. })
    }

    /// Node the error originated from
    pub fn node(&self) -> &Node {
        match self {
            Self::Failed { node, .. } => node,
            Self::GroupNotFound { node } => node,
            Self::RetriesExhausted { last, .. } => last.node(),
        }
    }

    /// HTTP status of the underlying failure, if any
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Failed { code, .. } => *code,
            Self::GroupNotFound { .. } => Some(404),
            Self::RetriesExhausted { last, .. } => last.code(),
        }
    }

    /// The innermost failure (unwraps `RetriesExhausted`)
    pub fn last_failure(&self) -> &NodeError {
        match self {
            Self::RetriesExhausted { last, .. } => last.last_failure(),
            other => other,
        }
    }
}

/// Error from building a saga
#[derive(Debug, thiserror::Error)]
pub enum SagaError {
    /// Action selector is neither `create_group` nor `delete_group`
    #[error("unknown action: {0}")]
    UnknownAction(Box<str>),
    /// HTTP client could not be built
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}
