//! HTTP client for the node group API
//!
//! Every node exposes the same three endpoints:
//!
//! | Operation | Request | Success |
//! |---|---|---|
//! | create | `POST {node}/v1/group` with `{"groupId": name}` | 201 |
//! | delete | `DELETE {node}/v1/group` with `{"groupId": name}` | 200 |
//! | status | `GET {node}/v1/group/{name}` | 200, 404 means absent |
//!
//! Any other status is a [`NodeError::Failed`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GroupName, Node, NodeError, SagaError};

/// Body exchanged with nodes on every group call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPayload {
    /// Group name, serialized as `groupId`
    #[serde(rename = "groupId")]
    pub group_id: String,
}

impl GroupPayload {
    /// Payload naming `group`
    pub fn new(group: &GroupName) -> Self {
        Self {
            group_id: group.as_str().to_string(),
        }
    }
}

/// One remote group operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET {node}/v1/group/{name}`
    GetGroup,
    /// `POST {node}/v1/group`
    CreateGroup,
    /// `DELETE {node}/v1/group`
    DeleteGroup,
}

impl Operation {
    /// Operation name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetGroup => "get_group",
            Self::CreateGroup => "create_group",
            Self::DeleteGroup => "delete_group",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful answer from a node
#[derive(Clone, Debug)]
pub struct NodeResponse {
    /// HTTP status the node answered with
    pub status: StatusCode,
    /// Raw response body
    pub body: String,
}

impl NodeResponse {
    async fn read(node: &Node, response: reqwest::Response) -> Result<Self, NodeError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NodeError::transport(node, e))?;
        Ok(Self { status, body })
    }

    /// Decode the `{"groupId": ...}` body, if the node sent one
    pub fn group(&self) -> Option<GroupPayload> {
        serde_json::from_str(&self.body).ok()
    }

    fn into_failure(self, node: &Node) -> NodeError {
        NodeError::Failed {
            node: node.clone(),
            code: Some(self.status.as_u16()),
            msg: self.body.into(),
        }
    }
}

/// Stateless client for the node group API.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone, Debug, Default)]
pub struct NodeClient {
    http: Client,
}

impl NodeClient {
    /// Create a client with no request timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client whose requests time out after `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, SagaError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Dispatch `operation` against `node`
    pub async fn execute(
        &self,
        operation: Operation,
        node: &Node,
        group: &GroupName,
    ) -> Result<NodeResponse, NodeError> {
        match operation {
            Operation::GetGroup => self.get_group(node, group).await,
            Operation::CreateGroup => self.create_group(node, group).await,
            Operation::DeleteGroup => self.delete_group(node, group).await,
        }
    }

    /// Create `group` on `node`. Succeeds only on 201.
    pub async fn create_group(
        &self,
        node: &Node,
        group: &GroupName,
    ) -> Result<NodeResponse, NodeError> {
        debug!(node = %node, group = %group, "Creating group");
        let response = self
            .http
            .post(node.group_url())
            .json(&GroupPayload::new(group))
            .send()
            .await
            .map_err(|e| NodeError::transport(node, e))?;
        let response = NodeResponse::read(node, response).await?;

        if response.status != StatusCode::CREATED {
            return Err(response.into_failure(node));
        }
        debug!(node = %node, group = %group, "Group created");
        Ok(response)
    }

    /// Delete `group` from `node`. Succeeds only on 200.
    pub async fn delete_group(
        &self,
        node: &Node,
        group: &GroupName,
    ) -> Result<NodeResponse, NodeError> {
        debug!(node = %node, group = %group, "Deleting group");
        let response = self
            .http
            .delete(node.group_url())
            .json(&GroupPayload::new(group))
            .send()
            .await
            .map_err(|e| NodeError::transport(node, e))?;
        let response = NodeResponse::read(node, response).await?;

        if response.status != StatusCode::OK {
            return Err(response.into_failure(node));
        }
        debug!(node = %node, group = %group, "Group deleted");
        Ok(response)
    }

    /// Fetch `group` from `node`. 404 maps to [`NodeError::GroupNotFound`].
    pub async fn get_group(
        &self,
        node: &Node,
        group: &GroupName,
    ) -> Result<NodeResponse, NodeError> {
        debug!(node = %node, group = %group, "Getting group");
        let url = node.group_status_url(group)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| NodeError::transport(node, e))?;
        let response = NodeResponse::read(node, response).await?;

        match response.status {
            StatusCode::OK => {
                debug!(node = %node, group = %group, "Group found");
                Ok(response)
            }
            StatusCode::NOT_FOUND => {
                debug!(node = %node, group = %group, "Group not found");
                Err(NodeError::GroupNotFound { node: node.clone() })
            }
            _ => Err(response.into_failure(node)),
        }
    }
}
