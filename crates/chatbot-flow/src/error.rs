//! Error types for flow definitions.

use thiserror::Error;

/// Problems with a flow definition.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The stored definition is not a valid flow document.
    #[error("invalid flow definition: {0}")]
    Parse(#[from] serde_json::Error),

    /// `startNodeId` does not key into `nodes`.
    #[error("start node not found: {0}")]
    MissingStartNode(String),

    /// An option points at a node that does not exist.
    #[error("node {node_id} option {index} points to unknown node {next_node_id}")]
    DanglingOption {
        node_id: String,
        index: usize,
        next_node_id: String,
    },

    /// An option can never be selected.
    #[error("node {node_id} option {index} has no keywords and no label")]
    EmptyOption { node_id: String, index: usize },
}
