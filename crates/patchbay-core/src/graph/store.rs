//! Node and edge storage shared by the graph, its contexts and the scheduler.
//!
//! Nodes live in a `Vec<Option<NodeData>>` indexed by [`NodeId`], edges in a
//! `Vec<Option<Edge>>` indexed by [`EdgeId`]. Removed entries become `None`;
//! ids are never reused within a graph. Node ids above [`NodeId::MAX`] are
//! refused.

use std::collections::BTreeMap;

use crate::description::ResourceDescription;
use crate::value::Value;

use super::edge::{Edge, EdgeId, Remap};
use super::error::GraphError;
use super::node::{Bypass, Node, NodeFlags, NodeId};
use super::socket::{InputSocket, OutputSocket};

/// Internal bookkeeping for a node in the graph.
pub(crate) struct NodeData {
    pub id: NodeId,
    pub type_name: String,
    /// `None` while the node is being dispatched.
    pub node: Option<Bypass>,
    pub inputs: Vec<InputSocket>,
    /// Empty while the node is being dispatched; the context holds them.
    pub outputs: Vec<OutputSocket>,
    /// Inputs before this index are declared by the node type.
    pub static_inputs: usize,
    /// Outputs before this index are declared by the node type.
    pub static_outputs: usize,
    /// Edges arriving at this node, including unresolved ones.
    pub incoming: Vec<EdgeId>,
    /// Edges leaving this node, including unresolved ones.
    pub outgoing: Vec<EdgeId>,
    /// Literals for inputs that do not exist (yet), keyed by socket name.
    pub pending_literals: BTreeMap<String, String>,
    /// Embedded resource payloads from the description.
    pub resources: Vec<ResourceDescription>,
    /// Editor-facing problem description.
    pub issue: Option<String>,
}

impl NodeData {
    pub fn new(id: NodeId, type_name: impl Into<String>, node: Bypass) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            node: Some(node),
            inputs: Vec::new(),
            outputs: Vec::new(),
            static_inputs: 0,
            static_outputs: 0,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            pending_literals: BTreeMap::new(),
            resources: Vec::new(),
            issue: None,
        }
    }

    /// Scheduler flags; empty while the node is being dispatched.
    pub fn flags(&self) -> NodeFlags {
        self.node.as_ref().map_or(NodeFlags::NONE, |n| n.flags())
    }

    pub fn is_bypassed(&self) -> bool {
        self.node.as_ref().is_some_and(Bypass::is_bypassed)
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s.name == name)
    }
}

#[derive(Default)]
pub(crate) struct GraphStore {
    pub nodes: Vec<Option<NodeData>>,
    pub edges: Vec<Option<Edge>>,
    pub next_edge_id: u32,
}

impl GraphStore {
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.slot())?.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.slot())?.as_mut()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize)?.as_ref()
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0 as usize)?.as_mut()
    }

    /// One past the highest node id ever stored.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().flatten().map(|n| n.id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn insert_node(&mut self, data: NodeData) -> Result<(), GraphError> {
        if data.id > NodeId::MAX {
            return Err(GraphError::NodeIdOutOfRange(data.id));
        }
        let slot = data.id.slot();
        if slot >= self.nodes.len() {
            self.nodes.resize_with(slot + 1, || None);
        }
        if self.nodes[slot].is_some() {
            return Err(GraphError::DuplicateNode(data.id));
        }
        self.nodes[slot] = Some(data);
        Ok(())
    }

    pub fn allocate_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }

    /// Stores `edge` under `id` and wires adjacency and the consumer's input.
    pub fn insert_edge(&mut self, id: EdgeId, edge: Edge) {
        let idx = id.0 as usize;
        if idx >= self.edges.len() {
            self.edges.resize_with(idx + 1, || None);
        }
        self.next_edge_id = self.next_edge_id.max(id.0 + 1);
        let (from, to, to_socket) = (edge.from, edge.to, edge.to_socket);
        self.edges[idx] = Some(edge);
        if let Some(node) = self.node_mut(from) {
            node.outgoing.push(id);
        }
        if let Some(node) = self.node_mut(to) {
            node.incoming.push(id);
            if let Some(input) = to_socket.and_then(|s| node.inputs.get_mut(s)) {
                input.source = Some(id);
            }
        }
    }

    /// Removes an edge and detaches it from both nodes.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.get_mut(id.0 as usize)?.take()?;
        if let Some(node) = self.node_mut(edge.from) {
            node.outgoing.retain(|&e| e != id);
        }
        if let Some(node) = self.node_mut(edge.to) {
            node.incoming.retain(|&e| e != id);
            for input in &mut node.inputs {
                if input.source == Some(id) {
                    input.source = None;
                }
            }
        }
        Some(edge)
    }

    /// The `k`-th predecessor of `node`, following incoming edges.
    ///
    /// Unresolved edges still count as dependencies.
    pub fn predecessor(&self, node: NodeId, k: usize) -> Option<NodeId> {
        let id = *self.node(node)?.incoming.get(k)?;
        self.edge(id).map(|e| e.from)
    }

    /// Whether `to` is reachable from `from` by following edges forward.
    pub fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.slot();
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;

            if let Some(node) = self.node(current) {
                for &edge_id in &node.outgoing {
                    if let Some(edge) = self.edge(edge_id) {
                        stack.push(edge.to);
                    }
                }
            }
        }
        false
    }

    /// Kahn's topological sort over every node and edge.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        let mut active_count = 0usize;

        for (i, slot) in self.nodes.iter().enumerate() {
            if let Some(node) = slot {
                active_count += 1;
                in_degree[i] = node
                    .incoming
                    .iter()
                    .filter(|&&e| self.edge(e).is_some())
                    .count() as u32;
            }
        }

        // Reverse so that popping yields ascending ids among ready nodes.
        let mut queue: Vec<usize> = (0..n)
            .rev()
            .filter(|&i| self.nodes[i].is_some() && in_degree[i] == 0)
            .collect();

        let mut sorted = Vec::with_capacity(active_count);

        while let Some(idx) = queue.pop() {
            let Some(node) = &self.nodes[idx] else {
                continue;
            };
            sorted.push(node.id);
            for &edge_id in &node.outgoing {
                if let Some(edge) = self.edge(edge_id) {
                    let to_idx = edge.to.slot();
                    in_degree[to_idx] -= 1;
                    if in_degree[to_idx] == 0 {
                        queue.push(to_idx);
                    }
                }
            }
        }

        if sorted.len() != active_count {
            return Err(GraphError::CycleDetected);
        }
        Ok(sorted)
    }

    /// The value currently feeding `input` of `node`, with the edge's remap.
    pub fn upstream(&self, node: NodeId, input: usize) -> Option<(&Value, Option<Remap>)> {
        let socket = self.node(node)?.inputs.get(input)?;
        let edge = self.edge(socket.source?)?;
        let from_socket = edge.from_socket?;
        let producer = self.node(edge.from)?;
        let output = producer.outputs.get(from_socket)?;
        Some((&output.value, edge.remap))
    }

    /// The `k`-th edge leaving `output` of `node` that ends on a resolved input.
    pub fn trigger_target(&self, node: NodeId, output: usize, k: usize) -> Option<(NodeId, usize)> {
        self.node(node)?
            .outgoing
            .iter()
            .filter_map(|&e| self.edge(e))
            .filter(|e| e.from_socket == Some(output))
            .filter_map(|e| Some((e.to, e.to_socket?)))
            .nth(k)
    }
}
