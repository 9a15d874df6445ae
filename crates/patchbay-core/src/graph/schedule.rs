//! Tick and draw traversals.
//!
//! A [`Scheduler`] walks a [`Graph`] once per frame. Each walk gets a fresh
//! traversal id; a node is visited when its mark in the scheduler's side table
//! differs from the current id, and marked on entry, so every node runs at
//! most once per traversal no matter how many consumers reach it.
//!
//! The marks live in the scheduler, not in the nodes, so several schedulers
//! (say, an audio tick and an editor preview) can walk the same graph without
//! stepping on each other.
//!
//! # Tick
//!
//! Roots (nodes flagged [`NodeFlags::ROOT`]) are visited first, then every
//! node not yet reached. A visit recurses into unvisited predecessors (every
//! incoming edge, triggers included) and then ticks the node. Nodes with
//! [`NodeFlags::CUSTOM_TRAVERSE_TICK`] get a [`SubTraversal`] instead of the
//! recursion and may tick their upstream several times per frame.
//!
//! # Draw
//!
//! Each visit runs `before_draw`, then the producers of `Draw` inputs, then
//! the remaining predecessors, then `draw` and `after_draw`. Nodes not
//! reachable from a root are drawn inside a scratch surface so their state
//! stays current without reaching the screen.

use crate::render::DrawBackend;
use crate::value::{SocketType, SurfaceId};

use super::context::{DrawContext, Frame, Inputs};
use super::env::GraphEnv;
use super::node::{Node, NodeFlags, NodeId};
use super::processing::Graph;
use super::store::GraphStore;

/// Traversal state for ticking and drawing graphs.
#[derive(Debug, Default)]
pub struct Scheduler {
    tick_marks: Vec<u64>,
    draw_marks: Vec<u64>,
    next_id: u64,
}

impl Scheduler {
    /// Creates a scheduler with empty side tables.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn fit(&mut self, capacity: usize) {
        if self.tick_marks.len() < capacity {
            self.tick_marks.resize(capacity, 0);
            self.draw_marks.resize(capacity, 0);
        }
    }

    /// Advances every node of `graph` by `dt` seconds.
    pub fn tick(&mut self, graph: &mut Graph, dt: f32) {
        let id = self.allocate_id();
        graph.controls.sync(dt);
        graph.bus.set_scalar(0.0);
        self.fit(graph.store.capacity());

        let mut frame = graph.frame();
        let roots: Vec<NodeId> = frame
            .store
            .node_ids()
            .filter(|&n| frame.store.node(n).is_some_and(|d| d.flags().contains(NodeFlags::ROOT)))
            .collect();
        for node in roots {
            if self.tick_marks[node.slot()] != id {
                self.visit_tick(&mut frame, node, id, dt);
            }
        }
        for slot in 0..frame.store.capacity() {
            let node = NodeId(slot as u32);
            if frame.store.contains(node) && self.tick_marks[slot] != id {
                self.visit_tick(&mut frame, node, id, dt);
            }
        }
    }

    fn visit_tick(&mut self, frame: &mut Frame<'_>, node: NodeId, id: u64, dt: f32) {
        self.tick_marks[node.slot()] = id;
        let custom = frame
            .store
            .node(node)
            .is_some_and(|d| d.flags().contains(NodeFlags::CUSTOM_TRAVERSE_TICK));

        if custom {
            self.custom_tick(frame, node, id, dt);
        } else {
            self.tick_predecessors(frame, node, id, dt);
        }

        frame.with_node(node, |n, ctx| n.tick(ctx, dt));
    }

    fn tick_predecessors(&mut self, frame: &mut Frame<'_>, node: NodeId, id: u64, dt: f32) {
        let mut k = 0;
        while let Some(pred) = frame.store.predecessor(node, k) {
            if self.tick_marks.get(pred.slot()).is_some_and(|&m| m != id) {
                self.visit_tick(frame, pred, id, dt);
            }
            k += 1;
        }
    }

    fn custom_tick(&mut self, frame: &mut Frame<'_>, node: NodeId, id: u64, dt: f32) {
        let Some(mut owned) = frame.store.node_mut(node).and_then(|d| d.node.take()) else {
            return;
        };
        {
            let mut traversal = SubTraversal {
                scheduler: self,
                frame: frame.reborrow(),
                node,
            };
            owned.custom_traverse_tick(&mut traversal, dt);
        }
        if let Some(data) = frame.store.node_mut(node) {
            data.node = Some(owned);
        }
        // Sub-ticks ran under their own ids; the whole upstream counts as
        // visited for this frame.
        self.mark_upstream(frame.store, node, id);
    }

    fn mark_upstream(&mut self, store: &GraphStore, node: NodeId, id: u64) {
        let mut k = 0;
        while let Some(pred) = store.predecessor(node, k) {
            if self.tick_marks.get(pred.slot()).is_some_and(|&m| m != id) {
                self.tick_marks[pred.slot()] = id;
                self.mark_upstream(store, pred, id);
            }
            k += 1;
        }
    }

    /// Draws every node of `graph` through `backend`.
    pub fn draw(&mut self, graph: &Graph, backend: &mut dyn DrawBackend) {
        let id = self.allocate_id();
        self.fit(graph.store.capacity());
        let store = &graph.store;
        let env = &graph.env;

        let roots: Vec<NodeId> = store
            .node_ids()
            .filter(|&n| store.node(n).is_some_and(|d| d.flags().contains(NodeFlags::ROOT)))
            .collect();
        let mut walk = DrawWalk {
            scheduler: self,
            store,
            env,
            backend,
            id,
        };
        for node in roots {
            walk.visit_if_unmarked(node);
        }

        let remaining = (0..store.capacity())
            .map(|slot| NodeId(slot as u32))
            .any(|n| store.contains(n) && walk.scheduler.draw_marks[n.slot()] != id);
        if remaining {
            walk.backend.push_surface(SurfaceId::SCRATCH, 0, 0);
            for slot in 0..store.capacity() {
                walk.visit_if_unmarked(NodeId(slot as u32));
            }
            walk.backend.pop_surface();
        }
    }
}

struct DrawWalk<'s, 'g, 'b> {
    scheduler: &'s mut Scheduler,
    store: &'g GraphStore,
    env: &'g GraphEnv,
    backend: &'b mut dyn DrawBackend,
    id: u64,
}

/// The part of a draw walk a [`SubDraw`] needs.
trait DrawVisit {
    fn store(&self) -> &GraphStore;
    fn visit_if_unmarked(&mut self, node: NodeId);
    fn visit_draw_inputs(&mut self, node: NodeId);
}

impl DrawVisit for DrawWalk<'_, '_, '_> {
    fn store(&self) -> &GraphStore {
        self.store
    }

    fn visit_if_unmarked(&mut self, node: NodeId) {
        let unmarked = self.store.contains(node)
            && self
                .scheduler
                .draw_marks
                .get(node.slot())
                .is_some_and(|&m| m != self.id);
        if unmarked {
            self.visit(node);
        }
    }

    fn visit_draw_inputs(&mut self, node: NodeId) {
        let inputs = Inputs {
            store: self.store,
            id: node,
        };
        for i in 0..inputs.len() {
            if inputs.info(i).is_some_and(|info| info.ty == SocketType::Draw) {
                if let Some(producer) = inputs.producer(i) {
                    self.visit_if_unmarked(producer);
                }
            }
        }
    }
}

impl DrawWalk<'_, '_, '_> {
    fn visit(&mut self, node: NodeId) {
        self.scheduler.draw_marks[node.slot()] = self.id;
        let store = self.store;
        let Some(owned) = store.node(node).and_then(|d| d.node.as_ref()) else {
            return;
        };

        owned.before_draw(&mut self.context(node));

        if owned.flags().contains(NodeFlags::CUSTOM_TRAVERSE_DRAW) {
            let mut sub = SubDraw { walk: self, node };
            owned.custom_traverse_draw(&mut sub);
        } else {
            self.visit_draw_inputs(node);
            let mut k = 0;
            while let Some(pred) = store.predecessor(node, k) {
                self.visit_if_unmarked(pred);
                k += 1;
            }
        }

        owned.draw(&mut self.context(node));
        owned.after_draw(&mut self.context(node));
    }

    fn context(&mut self, node: NodeId) -> DrawContext<'_> {
        DrawContext {
            store: self.store,
            env: self.env,
            id: node,
            backend: &mut *self.backend,
        }
    }
}

/// Handed to [`Node::custom_traverse_tick`].
pub struct SubTraversal<'a> {
    scheduler: &'a mut Scheduler,
    frame: Frame<'a>,
    node: NodeId,
}

impl SubTraversal<'_> {
    /// Ticks the node's whole upstream once, under a fresh traversal id.
    ///
    /// Call it several times to sub-sample the upstream within one frame.
    pub fn tick_predecessors(&mut self, dt: f32) {
        let id = self.scheduler.allocate_id();
        let node = self.node;
        self.scheduler
            .tick_predecessors(&mut self.frame, node, id, dt);
    }

    /// The node's inputs as they stand after the latest sub-tick.
    pub fn inputs(&self) -> Inputs<'_> {
        Inputs {
            store: &*self.frame.store,
            id: self.node,
        }
    }
}

/// Handed to [`Node::custom_traverse_draw`].
pub struct SubDraw<'a> {
    walk: &'a mut dyn DrawVisit,
    node: NodeId,
}

impl SubDraw<'_> {
    /// Draws the producer of input `input`, if not drawn yet this frame.
    pub fn draw_input(&mut self, input: usize) {
        let producer = Inputs {
            store: self.walk.store(),
            id: self.node,
        }
        .producer(input);
        if let Some(producer) = producer {
            self.walk.visit_if_unmarked(producer);
        }
    }

    /// Default order: `Draw` inputs first, then every other predecessor.
    pub fn draw_predecessors(&mut self) {
        self.walk.visit_draw_inputs(self.node);
        let mut k = 0;
        while let Some(pred) = self.walk.store().predecessor(self.node, k) {
            self.walk.visit_if_unmarked(pred);
            k += 1;
        }
    }

    /// Number of inputs on the node.
    pub fn input_count(&self) -> usize {
        Inputs {
            store: self.walk.store(),
            id: self.node,
        }
        .len()
    }
}
