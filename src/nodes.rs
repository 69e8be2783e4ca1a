//! Node list loading
//!
//! The node file is a JSON array of address strings:
//!
//! ```json
//! ["http://node1.cluster.com", "http://node2.cluster.com"]
//! ```

use std::path::Path;

use serde_json::Value;

use crate::Node;

/// Error from loading a node file
#[derive(Debug, thiserror::Error)]
pub enum NodeListError {
    /// File could not be read
    #[error("cannot read node file: {0}")]
    Io(#[from] std::io::Error),
    /// File is not JSON
    #[error("node file is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Top-level value is not an array
    #[error("node file must contain a JSON array")]
    NotAnArray,
    /// An entry is not a string
    #[error("node entry {index} is not a string")]
    NotAString {
        /// Position of the entry in the array
        index: usize,
    },
}

/// Read and validate a node file. Duplicates are kept; the saga collapses them.
pub fn load_nodes(path: impl AsRef<Path>) -> Result<Vec<Node>, NodeListError> {
    let raw = std::fs::read_to_string(path)?;
    parse_nodes(&raw)
}

/// Validate node-list JSON
pub fn parse_nodes(raw: &str) -> Result<Vec<Node>, NodeListError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(entries) = value else {
        return Err(NodeListError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::String(address) => Ok(Node::from(address)),
            _ => Err(NodeListError::NotAString { index }),
        })
        .collect()
}
