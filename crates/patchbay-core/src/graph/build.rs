//! Construction of a [`Graph`] from a [`GraphDescription`].
//!
//! Building runs in phases:
//!
//! 1. **Nodes**: instantiate every node through the type registry, with its
//!    static sockets, embedded resource payloads and bypass flag.
//! 2. **Links**: wire every enabled link with the same checks as
//!    [`Graph::connect`]. Dynamic links may stay unresolved.
//! 3. **Literals**: parse input literals. Literals for sockets that do not
//!    exist yet are kept for dynamic sockets declared later.
//! 4. **Order**: a final Kahn pass confirms the graph is acyclic.
//! 5. **Init**: every node's `init` runs, producers first.
//!
//! Any failure aborts the whole build; no partially built graph escapes.

use crate::description::GraphDescription;
use crate::value::Value;

use super::edge::Remap;
use super::env::GraphEnv;
use super::error::{BuildError, GraphError};
use super::node::{Bypass, Node, NodeId};
use super::processing::Graph;
use super::socket::{InputSocket, OutputSocket};
use super::store::NodeData;

/// Creates node `id` of type `type_name` with its static sockets.
pub(crate) fn instantiate(
    env: &GraphEnv,
    id: NodeId,
    type_name: &str,
) -> Result<NodeData, GraphError> {
    let (descriptor, node) = env
        .node_types
        .create(type_name)
        .ok_or_else(|| GraphError::UnknownNodeType(type_name.to_string()))?;

    let mut data = NodeData::new(id, type_name, Bypass::new(node));
    for decl in &descriptor.inputs {
        let mut socket = InputSocket::new(decl.name.clone(), decl.ty);
        if let Some(text) = &decl.default {
            match Value::parse_literal(decl.ty, text) {
                Ok(value) => socket.default = Some(value),
                Err(err) => {
                    tracing::warn!(type_name, socket = %decl.name, %err, "ignoring bad registration default");
                }
            }
        }
        data.inputs.push(socket);
    }
    data.outputs = descriptor
        .outputs
        .iter()
        .map(|decl| OutputSocket::new(decl.name.clone(), decl.ty, env.block_size))
        .collect();
    data.static_inputs = data.inputs.len();
    data.static_outputs = data.outputs.len();
    Ok(data)
}

impl Graph {
    /// Builds a graph from `desc`.
    ///
    /// Fails with the offending node on unknown node types, unknown sockets,
    /// incompatible socket types, a second producer for one input, dependency
    /// cycles and unparsable literals.
    pub fn build(desc: &GraphDescription, env: GraphEnv) -> Result<Self, BuildError> {
        let mut graph = Graph::new(env);
        graph.initialized = false;

        for node in &desc.nodes {
            let mut data = instantiate(&graph.env, node.id, &node.type_name)
                .map_err(|e| BuildError::at(node.id, e))?;
            data.resources.clone_from(&node.resources);
            if node.passthrough
                && let Some(inner) = data.node.as_mut()
            {
                inner.set_bypassed(true);
            }
            graph
                .store
                .insert_node(data)
                .map_err(|e| BuildError::at(node.id, e))?;
            tracing::debug!(node = %node.id, type_name = %node.type_name, "created node");
        }

        for link in desc.links.iter().filter(|l| l.enabled) {
            graph
                .link(
                    link.from_node,
                    &link.from_socket,
                    link.to_node,
                    &link.to_socket,
                    Remap::from_params(&link.params),
                    link.dynamic,
                )
                .map_err(|e| BuildError::at(link.to_node, e))?;
        }

        for node in &desc.nodes {
            for (socket, text) in &node.inputs {
                graph
                    .apply_literal(node.id, socket, text)
                    .map_err(|e| BuildError::at(node.id, e))?;
            }
        }

        let order = graph.store.topological_order()?;

        for id in order {
            graph.frame().with_node(id, |node, ctx| node.init(ctx));
        }
        graph.initialized = true;
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );
        Ok(graph)
    }

    /// Applies a description literal. Empty literals mean "no literal".
    fn apply_literal(&mut self, id: NodeId, socket: &str, text: &str) -> Result<(), GraphError> {
        if text.is_empty() {
            return Ok(());
        }
        let node = self.store.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        let Some(index) = node.input_index(socket) else {
            node.pending_literals
                .insert(socket.to_string(), text.to_string());
            return Ok(());
        };
        let input = &mut node.inputs[index];
        let value = Value::parse_literal(input.ty, text).map_err(|source| {
            GraphError::InvalidLiteral {
                node: id,
                socket: socket.to_string(),
                source,
            }
        })?;
        input.literal = Some(value);
        Ok(())
    }
}
