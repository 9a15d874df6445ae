//! Runtime-declared sockets.
//!
//! Some nodes only know their sockets after they have looked at their
//! environment: a voice host exposes one input per control value of its
//! sub-graph, and that set changes when the sub-graph is edited. Such sockets
//! are appended after the node type's static sockets and can be replaced at
//! any time from the node's context.
//!
//! Edges attached to dynamic sockets are tracked by *socket name*. When the
//! dynamic list is replaced, every such edge is re-resolved by name: edges
//! whose name survives keep working (at a possibly different index), edges
//! whose name vanished become unresolved and the consumer falls back to its
//! literal or default. If the name comes back later the edge resolves again.

use crate::value::Value;

use super::node::NodeId;
use super::socket::{DynamicSocket, InputSocket, OutputSocket};
use super::store::GraphStore;

fn unchanged<'a>(
    current: impl ExactSizeIterator<Item = (&'a str, crate::value::SocketType)>,
    wanted: &[DynamicSocket],
) -> bool {
    current.len() == wanted.len()
        && current
            .zip(wanted)
            .all(|((name, ty), w)| name == w.name && ty == w.ty)
}

impl GraphStore {
    pub(crate) fn set_dynamic_inputs(&mut self, id: NodeId, sockets: &[DynamicSocket]) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let start = node.static_inputs;
        if unchanged(
            node.inputs[start..].iter().map(|s| (s.name.as_str(), s.ty)),
            sockets,
        ) {
            return false;
        }

        // Keep editor literals of sockets that are about to disappear.
        for socket in node.inputs.drain(start..) {
            if let Some(literal) = socket.literal.as_ref().and_then(literal_text) {
                node.pending_literals.entry(socket.name).or_insert(literal);
            }
        }
        for decl in sockets {
            let mut socket = InputSocket::new(decl.name.clone(), decl.ty);
            socket.literal = node
                .pending_literals
                .get(&decl.name)
                .and_then(|text| Value::parse_literal(decl.ty, text).ok());
            node.inputs.push(socket);
        }

        let incoming = node.incoming.clone();
        for edge_id in incoming {
            let Some(edge) = self.edge_mut(edge_id) else {
                continue;
            };
            if edge.to_socket.is_some_and(|s| s < start) {
                continue;
            }
            let to_name = edge.to_name.clone();
            let resolved = self.node(id).and_then(|n| {
                n.inputs
                    .iter()
                    .enumerate()
                    .skip(start)
                    .find(|(_, s)| s.name == to_name && s.source.is_none())
                    .map(|(i, _)| i)
            });
            if let Some(edge) = self.edge_mut(edge_id) {
                edge.to_socket = resolved;
            }
            if let Some(index) = resolved {
                if let Some(node) = self.node_mut(id) {
                    node.inputs[index].source = Some(edge_id);
                }
            } else {
                tracing::debug!(node = %id, socket = %to_name, "dynamic input link unresolved");
            }
        }
        tracing::debug!(node = %id, count = sockets.len(), "dynamic inputs replaced");
        true
    }

    pub(crate) fn set_dynamic_outputs(
        &mut self,
        id: NodeId,
        outputs: &mut Vec<OutputSocket>,
        sockets: &[DynamicSocket],
        block_size: usize,
    ) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let start = node.static_outputs;
        if unchanged(
            outputs[start..].iter().map(|s| (s.name.as_str(), s.ty)),
            sockets,
        ) {
            return false;
        }

        outputs.truncate(start);
        outputs.extend(
            sockets
                .iter()
                .map(|decl| OutputSocket::new(decl.name.clone(), decl.ty, block_size)),
        );

        let outgoing = node.outgoing.clone();
        for edge_id in outgoing {
            let Some(edge) = self.edge_mut(edge_id) else {
                continue;
            };
            if edge.from_socket.is_some_and(|s| s < start) {
                continue;
            }
            let resolved = outputs
                .iter()
                .enumerate()
                .skip(start)
                .find(|(_, s)| s.name == edge.from_name)
                .map(|(i, _)| i);
            if resolved.is_none() {
                tracing::debug!(node = %id, socket = %edge.from_name, "dynamic output link unresolved");
            }
            edge.from_socket = resolved;
        }
        tracing::debug!(node = %id, count = sockets.len(), "dynamic outputs replaced");
        true
    }
}

/// Text form of a literal, for carrying it over a socket rebuild.
fn literal_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Color(c) => Some(c.to_hex()),
        Value::Channel(c) => Some(
            c.data
                .iter()
                .map(f32::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}
