//! The node trait and the passthrough decorator.
//!
//! Every node type implements [`Node`]. The graph never stores a bare node:
//! each one is wrapped in a [`Bypass`] decorator that implements passthrough
//! (input 0 copied to output 0, `tick` and `draw` skipped) so concrete nodes
//! never have to check a bypass flag themselves.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::value::{SocketType, TriggerData, Value};

use super::context::{DrawContext, NodeContext};
use super::schedule::{SubDraw, SubTraversal};

/// Unique identifier for a node in a graph.
///
/// Ids come from the graph description and stay stable across edits. They
/// also key the node's shared resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Highest id a graph will store.
    ///
    /// Node storage is indexed by id, so larger ids are rejected with
    /// [`GraphError::NodeIdOutOfRange`](super::GraphError::NodeIdOutOfRange).
    pub const MAX: NodeId = NodeId(1 << 16);

    /// Wraps a raw id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Returns a sentinel value used for uninitialized node references.
    #[inline]
    pub fn sentinel() -> Self {
        Self(u32::MAX)
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Behavior flags a node reports to the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// No special behavior.
    pub const NONE: Self = Self(0);
    /// The node drives its own upstream ticking via [`Node::custom_traverse_tick`].
    pub const CUSTOM_TRAVERSE_TICK: Self = Self(1);
    /// The node drives its own upstream drawing via [`Node::custom_traverse_draw`].
    pub const CUSTOM_TRAVERSE_DRAW: Self = Self(1 << 1);
    /// Traversals start from this node (displays, audio outputs).
    pub const ROOT: Self = Self(1 << 2);

    /// Whether every flag in `other` is set.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Human-readable diagnostics about a node, shown by editors and the CLI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeReport {
    lines: Vec<String>,
}

impl NodeReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `key: value` line.
    pub fn add(&mut self, key: &str, value: impl fmt::Display) {
        self.lines.push(format!("{key}: {value}"));
    }

    /// Appends a free-form line.
    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Appends an empty separator line.
    pub fn newline(&mut self) {
        self.lines.push(String::new());
    }

    /// All lines in insertion order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for NodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A processing unit in the graph.
///
/// Nodes read inputs and write outputs through the context they are handed;
/// they never hold references to other nodes. Only `tick` is required.
///
/// # Lifecycle
///
/// 1. The factory creates the node; the graph allocates its declared sockets.
/// 2. Links and literals are applied.
/// 3. [`init`](Self::init) runs once. Acquire resources, register control
///    values and declare dynamic sockets here.
/// 4. [`tick`](Self::tick) and the draw hooks run every frame.
/// 5. [`shut`](Self::shut) runs when the node is removed or the graph is
///    dropped. Release whatever `init` acquired.
pub trait Node: Send {
    /// One-time setup after the node is wired into the graph.
    fn init(&mut self, _ctx: &mut NodeContext<'_>) {}

    /// Advances the node by `dt` seconds, after all predecessors ticked.
    fn tick(&mut self, ctx: &mut NodeContext<'_>, dt: f32);

    /// Handles a trigger arriving on trigger input `input`.
    ///
    /// Runs synchronously inside the producer's `tick` or trigger handler.
    fn handle_trigger(&mut self, _ctx: &mut NodeContext<'_>, _input: usize, _data: &TriggerData) {}

    /// Called before any predecessor is drawn. Push state here.
    fn before_draw(&self, _ctx: &mut DrawContext<'_>) {}

    /// Draws the node, after its predecessors.
    fn draw(&self, _ctx: &mut DrawContext<'_>) {}

    /// Called after [`draw`](Self::draw). Pop what `before_draw` pushed.
    fn after_draw(&self, _ctx: &mut DrawContext<'_>) {}

    /// Replaces the scheduler's predecessor recursion during tick.
    ///
    /// Only called when [`flags`](Self::flags) contains
    /// [`NodeFlags::CUSTOM_TRAVERSE_TICK`].
    fn custom_traverse_tick(&mut self, traversal: &mut SubTraversal<'_>, dt: f32) {
        traversal.tick_predecessors(dt);
    }

    /// Replaces the scheduler's predecessor recursion during draw.
    ///
    /// Only called when [`flags`](Self::flags) contains
    /// [`NodeFlags::CUSTOM_TRAVERSE_DRAW`].
    fn custom_traverse_draw(&self, traversal: &mut SubDraw<'_>) {
        traversal.draw_predecessors();
    }

    /// Releases resources and registrations made in `init`.
    fn shut(&mut self, _ctx: &mut NodeContext<'_>) {}

    /// Appends diagnostics to `report`.
    fn describe(&self, _report: &mut NodeReport) {}

    /// Scheduler behavior flags.
    fn flags(&self) -> NodeFlags {
        NodeFlags::NONE
    }
}

/// Passthrough decorator around every node in a graph.
///
/// While bypassed, input 0 is forwarded to output 0 each tick, a trigger on
/// input 0 is re-fired on output 0, and every other hook of the inner node is
/// skipped. `init` and `shut` always reach the inner node.
pub struct Bypass {
    inner: Box<dyn Node>,
    bypassed: bool,
}

impl Bypass {
    /// Wraps `inner`, initially active.
    pub fn new(inner: Box<dyn Node>) -> Self {
        Self {
            inner,
            bypassed: false,
        }
    }

    /// Whether passthrough is on.
    #[inline]
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Turns passthrough on or off.
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    /// The wrapped node.
    pub fn inner(&self) -> &dyn Node {
        self.inner.as_ref()
    }

    fn forward(ctx: &mut NodeContext<'_>) {
        let (inputs, mut outputs) = ctx.io();
        let (Some(input), Some(output)) = (inputs.info(0), outputs.socket_type(0)) else {
            return;
        };
        match output {
            SocketType::Signal => {
                let value = inputs.signal(0, 0.0);
                if let Some(out) = outputs.signal_mut(0) {
                    out.set(value);
                }
            }
            SocketType::Bool | SocketType::Int | SocketType::Float => {
                outputs.set_float(0, inputs.float(0, 0.0));
            }
            SocketType::Trigger | SocketType::Draw => {}
            _ if input.ty == output => {
                if let Some(value) = inputs.value(0) {
                    let value: Value = value.clone();
                    outputs.set_value(0, value);
                }
            }
            _ => {}
        }
    }
}

impl Node for Bypass {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        self.inner.init(ctx);
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, dt: f32) {
        if self.bypassed {
            Self::forward(ctx);
        } else {
            self.inner.tick(ctx, dt);
        }
    }

    fn handle_trigger(&mut self, ctx: &mut NodeContext<'_>, input: usize, data: &TriggerData) {
        if !self.bypassed {
            self.inner.handle_trigger(ctx, input, data);
            return;
        }
        let forwards = input == 0 && ctx.outputs().socket_type(0) == Some(SocketType::Trigger);
        if forwards {
            ctx.trigger_with(0, *data);
        }
    }

    fn before_draw(&self, ctx: &mut DrawContext<'_>) {
        if !self.bypassed {
            self.inner.before_draw(ctx);
        }
    }

    fn draw(&self, ctx: &mut DrawContext<'_>) {
        if !self.bypassed {
            self.inner.draw(ctx);
        }
    }

    fn after_draw(&self, ctx: &mut DrawContext<'_>) {
        if !self.bypassed {
            self.inner.after_draw(ctx);
        }
    }

    fn custom_traverse_tick(&mut self, traversal: &mut SubTraversal<'_>, dt: f32) {
        self.inner.custom_traverse_tick(traversal, dt);
    }

    fn custom_traverse_draw(&self, traversal: &mut SubDraw<'_>) {
        self.inner.custom_traverse_draw(traversal);
    }

    fn shut(&mut self, ctx: &mut NodeContext<'_>) {
        self.inner.shut(ctx);
    }

    fn describe(&self, report: &mut NodeReport) {
        self.inner.describe(report);
    }

    /// Bypassed nodes fall back to plain traversal; only `ROOT` survives.
    fn flags(&self) -> NodeFlags {
        let flags = self.inner.flags();
        if self.bypassed {
            if flags.contains(NodeFlags::ROOT) {
                NodeFlags::ROOT
            } else {
                NodeFlags::NONE
            }
        } else {
            flags
        }
    }
}
