//! Errors raised while editing or building a graph.

use thiserror::Error;

use crate::value::{LiteralError, SocketType};

use super::edge::EdgeId;
use super::node::NodeId;

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The specified edge was not found in the graph.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// The id is above [`NodeId::MAX`].
    #[error("node id {0} is out of range")]
    NodeIdOutOfRange(NodeId),

    /// A node with this id already exists.
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    /// No node type is registered under this name.
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    /// The node has no socket with this name.
    #[error("node {node} has no {direction} socket '{socket}'")]
    UnknownSocket {
        /// Node that was searched.
        node: NodeId,
        /// `"input"` or `"output"`.
        direction: &'static str,
        /// The missing socket name.
        socket: String,
    },

    /// The output type cannot feed the input type.
    #[error("cannot connect {from} output to {to} input")]
    TypeMismatch {
        /// Producer socket type.
        from: SocketType,
        /// Consumer socket type.
        to: SocketType,
    },

    /// The input already has a producer.
    #[error("input '{socket}' of node {node} is already connected")]
    InputOccupied {
        /// Consumer node.
        node: NodeId,
        /// Consumer input name.
        socket: String,
    },

    /// Adding this edge would create a dependency cycle.
    #[error("adding this edge would create a cycle")]
    CycleDetected,

    /// A literal could not be parsed for its input.
    #[error("node {node}, input '{socket}': {source}")]
    InvalidLiteral {
        /// Node owning the input.
        node: NodeId,
        /// Input name.
        socket: String,
        /// Parse failure.
        #[source]
        source: LiteralError,
    },
}

/// A graph description that could not be turned into a graph.
///
/// Construction is all-or-nothing: no partially built graph survives. The
/// offending node, if any, is named so editors can attach the message to it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to build graph: {source}")]
pub struct BuildError {
    /// Node the problem is attached to.
    pub node: Option<NodeId>,
    /// What went wrong.
    #[source]
    pub source: GraphError,
}

impl BuildError {
    /// Attaches `source` to `node`.
    pub fn at(node: NodeId, source: GraphError) -> Self {
        Self {
            node: Some(node),
            source,
        }
    }

    /// Human-readable issue text for an editor.
    pub fn issue(&self) -> String {
        self.source.to_string()
    }
}

impl From<GraphError> for BuildError {
    fn from(source: GraphError) -> Self {
        Self { node: None, source }
    }
}
