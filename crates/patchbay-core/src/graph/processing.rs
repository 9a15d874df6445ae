//! Graph instance: mutation API, inspection, and per-frame execution.
//!
//! [`Graph`] owns the node and edge storage, the control bridge shared with
//! the UI, the audio output bus and a built-in [`Scheduler`]. It is mutated
//! with the editing methods below and advanced with [`Graph::tick`] and
//! [`Graph::draw`].

use std::sync::Arc;

use crate::control::ControlBridge;
use crate::render::DrawBackend;
use crate::signal::SignalFloat;
use crate::value::Value;

use super::build::instantiate;
use super::context::Frame;
use super::edge::{Edge, EdgeId, Remap};
use super::env::GraphEnv;
use super::error::GraphError;
use super::node::{Node, NodeId, NodeReport};
use super::schedule::Scheduler;
use super::store::GraphStore;

/// A live graph instance.
pub struct Graph {
    pub(crate) store: GraphStore,
    pub(crate) env: GraphEnv,
    pub(crate) controls: Arc<ControlBridge>,
    pub(crate) bus: SignalFloat,
    scheduler: Scheduler,
    /// Cleared while `build` is still wiring; nodes are not shut unless
    /// they were initialized.
    pub(crate) initialized: bool,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(env: GraphEnv) -> Self {
        let bus = SignalFloat::new(env.block_size);
        Self {
            store: GraphStore::default(),
            env,
            controls: Arc::new(ControlBridge::new()),
            bus,
            scheduler: Scheduler::new(),
            initialized: true,
        }
    }

    pub(crate) fn frame(&mut self) -> Frame<'_> {
        Frame {
            store: &mut self.store,
            env: &self.env,
            controls: &self.controls,
            bus: &mut self.bus,
        }
    }

    // --- Node mutations ---

    /// Adds a node of type `type_name` and runs its `init`.
    pub fn add_node(&mut self, type_name: &str) -> Result<NodeId, GraphError> {
        let id = NodeId(self.store.capacity().max(1) as u32);
        let data = instantiate(&self.env, id, type_name)?;
        self.store.insert_node(data)?;
        self.frame().with_node(id, |node, ctx| node.init(ctx));
        tracing::debug!(node = %id, type_name, "graph_add");
        Ok(id)
    }

    /// Removes a node and every edge attached to it, after running its
    /// `shut`.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.store.node(id).ok_or(GraphError::NodeNotFound(id))?;
        let edge_ids: Vec<EdgeId> = node
            .incoming
            .iter()
            .chain(node.outgoing.iter())
            .copied()
            .collect();

        if self.initialized {
            self.frame().with_node(id, |node, ctx| node.shut(ctx));
        }
        for edge_id in edge_ids {
            self.store.remove_edge(edge_id);
        }
        self.store.nodes[id.slot()] = None;
        tracing::debug!(node = %id, "graph_remove");
        Ok(())
    }

    /// Connects output `output` of `from` to input `input` of `to`.
    ///
    /// Fails if either end is missing, the socket types cannot be wired, the
    /// input already has a producer, or the edge would close a cycle.
    pub fn connect(
        &mut self,
        from: NodeId,
        output: &str,
        to: NodeId,
        input: &str,
    ) -> Result<EdgeId, GraphError> {
        self.link(from, output, to, input, None, false)
    }

    /// Shared by `connect` and `build`. Dynamic links may name sockets that
    /// do not exist yet; they stay unresolved until declared.
    pub(crate) fn link(
        &mut self,
        from: NodeId,
        output: &str,
        to: NodeId,
        input: &str,
        remap: Option<Remap>,
        dynamic: bool,
    ) -> Result<EdgeId, GraphError> {
        let producer = self.store.node(from).ok_or(GraphError::NodeNotFound(from))?;
        let consumer = self.store.node(to).ok_or(GraphError::NodeNotFound(to))?;

        let from_socket = producer.output_index(output);
        let to_socket = consumer.input_index(input);
        if !dynamic {
            if from_socket.is_none() {
                return Err(GraphError::UnknownSocket {
                    node: from,
                    direction: "output",
                    socket: output.to_string(),
                });
            }
            if to_socket.is_none() {
                return Err(GraphError::UnknownSocket {
                    node: to,
                    direction: "input",
                    socket: input.to_string(),
                });
            }
        }

        if let (Some(o), Some(i)) = (from_socket, to_socket) {
            let from_ty = producer.outputs[o].ty;
            let to_ty = consumer.inputs[i].ty;
            if !to_ty.accepts(from_ty) {
                return Err(GraphError::TypeMismatch {
                    from: from_ty,
                    to: to_ty,
                });
            }
        }

        if let Some(i) = to_socket
            && consumer.inputs[i].source.is_some()
        {
            return Err(GraphError::InputOccupied {
                node: to,
                socket: input.to_string(),
            });
        }

        // A cycle exists if `to` can already reach `from` via existing edges.
        if from == to || self.store.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }

        let edge_id = self.store.allocate_edge_id();
        self.store.insert_edge(
            edge_id,
            Edge {
                from,
                from_socket,
                from_name: output.to_string(),
                to,
                to_socket,
                to_name: input.to_string(),
                remap,
            },
        );
        if from_socket.is_none() || to_socket.is_none() {
            tracing::debug!(%from, output, %to, input, "graph_connect: dynamic link pending");
        } else {
            tracing::debug!(%from, output, %to, input, "graph_connect");
        }
        Ok(edge_id)
    }

    /// Removes an edge. The consumer input falls back to its literal or
    /// default.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<(), GraphError> {
        self.store
            .remove_edge(id)
            .ok_or(GraphError::EdgeNotFound(id))?;
        tracing::debug!(edge = %id, "graph_disconnect");
        Ok(())
    }

    /// Sets the literal of input `socket` of node `id`. An empty text clears
    /// it.
    pub fn set_input_literal(
        &mut self,
        id: NodeId,
        socket: &str,
        text: &str,
    ) -> Result<(), GraphError> {
        let node = self.store.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        let index = node
            .input_index(socket)
            .ok_or_else(|| GraphError::UnknownSocket {
                node: id,
                direction: "input",
                socket: socket.to_string(),
            })?;
        let input = &mut node.inputs[index];
        input.literal = if text.is_empty() {
            None
        } else {
            Some(
                Value::parse_literal(input.ty, text).map_err(|source| {
                    GraphError::InvalidLiteral {
                        node: id,
                        socket: socket.to_string(),
                        source,
                    }
                })?,
            )
        };
        Ok(())
    }

    /// Turns passthrough on or off for node `id`.
    pub fn set_bypass(&mut self, id: NodeId, bypassed: bool) {
        if let Some(node) = self.store.node_mut(id).and_then(|n| n.node.as_mut()) {
            node.set_bypassed(bypassed);
        }
    }

    /// Returns whether node `id` is bypassed.
    pub fn is_bypassed(&self, id: NodeId) -> bool {
        self.store.node(id).is_some_and(|n| n.is_bypassed())
    }

    // --- Inspection ---

    /// Editor-facing issue attached to node `id`.
    pub fn issue(&self, id: NodeId) -> Option<&str> {
        self.store.node(id)?.issue.as_deref()
    }

    /// Diagnostic report for node `id`: type, sockets, then the node's own
    /// lines.
    pub fn describe(&self, id: NodeId) -> Option<NodeReport> {
        let data = self.store.node(id)?;
        let mut report = NodeReport::new();
        report.add("type", &data.type_name);
        if data.is_bypassed() {
            report.line("bypassed");
        }
        if let Some(issue) = &data.issue {
            report.add("issue", issue);
        }
        for (i, input) in data.inputs.iter().enumerate() {
            let state = if self.store.upstream(id, i).is_some() {
                "connected"
            } else if input.literal.is_some() {
                "literal"
            } else {
                "default"
            };
            report.add(&format!("in {}", input.name), format_args!("{} ({state})", input.ty));
        }
        for output in &data.outputs {
            report.add(&format!("out {}", output.name), output.ty);
        }
        if let Some(node) = &data.node {
            report.newline();
            node.describe(&mut report);
        }
        Some(report)
    }

    /// Ids of every node, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.store.node_ids().collect()
    }

    /// Returns the number of active (non-removed) nodes.
    pub fn node_count(&self) -> usize {
        self.store.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns the number of active edges.
    pub fn edge_count(&self) -> usize {
        self.store.edges.iter().filter(|e| e.is_some()).count()
    }

    /// Type name of node `id`.
    pub fn type_name(&self, id: NodeId) -> Option<&str> {
        self.store.node(id).map(|n| n.type_name.as_str())
    }

    /// Current value of output `name` of node `id`.
    pub fn output_value(&self, id: NodeId, name: &str) -> Option<&Value> {
        let node = self.store.node(id)?;
        let index = node.output_index(name)?;
        node.outputs.get(index).map(|s| &s.value)
    }

    /// Names of the inputs of node `id`, static then dynamic.
    pub fn input_names(&self, id: NodeId) -> Vec<&str> {
        self.store
            .node(id)
            .map(|n| n.inputs.iter().map(|s| s.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Whether input `name` of node `id` is fed by a resolved edge.
    pub fn is_input_connected(&self, id: NodeId, name: &str) -> bool {
        self.store
            .node(id)
            .and_then(|n| n.input_index(name))
            .is_some_and(|i| self.store.upstream(id, i).is_some())
    }

    /// A dependency order of every node (producers first).
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        self.store.topological_order()
    }

    // --- Execution ---

    /// Advances every node by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        scheduler.tick(self, dt);
        self.scheduler = scheduler;
    }

    /// Runs every node's draw hooks against `backend`.
    pub fn draw(&mut self, backend: &mut dyn DrawBackend) {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        scheduler.draw(self, backend);
        self.scheduler = scheduler;
    }

    /// Control values, flags, events and memory of this instance.
    pub fn controls(&self) -> &Arc<ControlBridge> {
        &self.controls
    }

    /// Mix written by `audio.output`-style nodes during the last tick.
    pub fn output_bus(&self) -> &SignalFloat {
        &self.bus
    }

    /// Host environment.
    pub fn env(&self) -> &GraphEnv {
        &self.env
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.env.sample_rate
    }

    /// Returns the block size.
    pub fn block_size(&self) -> usize {
        self.env.block_size
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        if !self.initialized {
            return;
        }
        let ids: Vec<NodeId> = self.store.node_ids().collect();
        for id in ids {
            self.frame().with_node(id, |node, ctx| node.shut(ctx));
        }
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("sample_rate", &self.env.sample_rate)
            .field("block_size", &self.env.block_size)
            .finish()
    }
}
