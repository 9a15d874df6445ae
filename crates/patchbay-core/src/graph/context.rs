//! Views handed to nodes while they run.
//!
//! A node never holds references into the graph. Instead, every hook receives
//! a context:
//!
//! - [`NodeContext`] for `init`, `tick`, `handle_trigger` and `shut`. It reads
//!   inputs through [`Inputs`], writes the node's own outputs through
//!   [`Outputs`], fires triggers and edits the node's dynamic sockets.
//! - [`DrawContext`] for the draw hooks: read-only graph access plus the
//!   [`DrawBackend`].
//!
//! While a node is dispatched its outputs are moved out of the store and into
//! the context, so reading upstream values and writing own outputs can happen
//! side by side (see [`NodeContext::io`]).

use crate::control::ControlBridge;
use crate::render::DrawBackend;
use crate::resource::{Resource, ResourceHandle};
use crate::signal::{SignalFloat, SignalRef};
use crate::value::{Channel, Color, ImageHandle, SocketType, TriggerData, Value};

use super::env::GraphEnv;
use super::node::{Bypass, Node, NodeId};
use super::socket::{DynamicSocket, InputInfo, OutputSocket};
use super::store::GraphStore;

/// Mutable graph state threaded through a traversal.
pub(crate) struct Frame<'a> {
    pub store: &'a mut GraphStore,
    pub env: &'a GraphEnv,
    pub controls: &'a ControlBridge,
    pub bus: &'a mut SignalFloat,
}

impl Frame<'_> {
    pub fn reborrow(&mut self) -> Frame<'_> {
        Frame {
            store: &mut *self.store,
            env: self.env,
            controls: self.controls,
            bus: &mut *self.bus,
        }
    }

    /// Runs `f` on node `id` with a context for it.
    ///
    /// Returns `None` if the node does not exist or is already being
    /// dispatched further up the stack.
    pub fn with_node<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut Bypass, &mut NodeContext<'_>) -> R,
    ) -> Option<R> {
        let data = self.store.node_mut(id)?;
        let Some(mut node) = data.node.take() else {
            tracing::debug!(node = %id, "node is already executing, dispatch skipped");
            return None;
        };
        let mut outputs = std::mem::take(&mut data.outputs);
        let result = {
            let mut ctx = NodeContext {
                frame: self.reborrow(),
                id,
                outputs: &mut outputs,
            };
            f(&mut node, &mut ctx)
        };
        if let Some(data) = self.store.node_mut(id) {
            data.outputs = outputs;
            data.node = Some(node);
        }
        Some(result)
    }
}

/// Context for a node's `init`, `tick`, `handle_trigger` and `shut`.
pub struct NodeContext<'a> {
    pub(crate) frame: Frame<'a>,
    pub(crate) id: NodeId,
    pub(crate) outputs: &'a mut Vec<OutputSocket>,
}

impl NodeContext<'_> {
    /// Id of the node being run.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Host environment.
    pub fn env(&self) -> &GraphEnv {
        self.frame.env
    }

    /// Audio sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.frame.env.sample_rate
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.frame.env.block_size
    }

    /// Control values, flags and events of this graph instance.
    pub fn controls(&self) -> &ControlBridge {
        self.frame.controls
    }

    /// Read access to this node's inputs.
    pub fn inputs(&self) -> Inputs<'_> {
        Inputs {
            store: &*self.frame.store,
            id: self.id,
        }
    }

    /// Write access to this node's outputs.
    pub fn outputs(&mut self) -> Outputs<'_> {
        Outputs {
            sockets: &mut *self.outputs,
        }
    }

    /// Inputs and outputs at the same time.
    ///
    /// ```rust,ignore
    /// let (inputs, mut outputs) = ctx.io();
    /// let a = inputs.signal(0, 0.0);
    /// if let Some(out) = outputs.signal_mut(0) {
    ///     out.set(a);
    /// }
    /// ```
    pub fn io(&mut self) -> (Inputs<'_>, Outputs<'_>) {
        (
            Inputs {
                store: &*self.frame.store,
                id: self.id,
            },
            Outputs {
                sockets: &mut *self.outputs,
            },
        )
    }

    /// Fires trigger output `output` without payload.
    pub fn trigger(&mut self, output: usize) {
        self.trigger_with(output, TriggerData::None);
    }

    /// Fires trigger output `output`.
    ///
    /// Every connected consumer's [`Node::handle_trigger`] runs before this
    /// returns. Consumers that are themselves mid-dispatch further up the stack
    /// are skipped.
    pub fn trigger_with(&mut self, output: usize, data: TriggerData) {
        match self.outputs.get_mut(output) {
            Some(socket) if socket.ty == SocketType::Trigger => {
                socket.value = Value::Trigger(data);
            }
            _ => return,
        }
        // Consumers may read our outputs, so put them back while delivering.
        self.swap_outputs();
        let mut k = 0;
        while let Some((target, input)) = self.frame.store.trigger_target(self.id, output, k) {
            let delivered = self
                .frame
                .with_node(target, |node, ctx| node.handle_trigger(ctx, input, &data));
            if delivered.is_none() {
                tracing::warn!(from = %self.id, to = %target, "trigger dropped, target is executing");
            }
            k += 1;
        }
        self.swap_outputs();
    }

    fn swap_outputs(&mut self) {
        if let Some(data) = self.frame.store.node_mut(self.id) {
            std::mem::swap(&mut data.outputs, self.outputs);
        }
    }

    /// Adds `input` (a signal) times `gain` to the graph's audio output bus.
    pub fn mix_to_bus(&mut self, input: usize, gain: f32) {
        let inputs = Inputs {
            store: &*self.frame.store,
            id: self.id,
        };
        self.frame.bus.add_mul(inputs.signal(input, 0.0), gain);
    }

    /// Adds this node's own signal output `output` times `gain` to the bus.
    pub fn mix_output_to_bus(&mut self, output: usize, gain: f32) {
        if let Some(OutputSocket {
            value: Value::Signal(signal),
            ..
        }) = self.outputs.get(output)
        {
            self.frame.bus.add_mul(signal.view(), gain);
        }
    }

    /// Replaces the node's dynamic inputs.
    ///
    /// Returns `false` without touching anything when the list is unchanged.
    /// Edges to surviving names are kept; edges to removed names become
    /// unresolved until the name reappears.
    pub fn set_dynamic_inputs(&mut self, sockets: &[DynamicSocket]) -> bool {
        self.frame.store.set_dynamic_inputs(self.id, sockets)
    }

    /// Replaces the node's dynamic outputs, with the same rules as inputs.
    pub fn set_dynamic_outputs(&mut self, sockets: &[DynamicSocket]) -> bool {
        let block_size = self.frame.env.block_size;
        self.frame
            .store
            .set_dynamic_outputs(self.id, self.outputs, sockets, block_size)
    }

    /// Index of the first dynamic input.
    pub fn dynamic_inputs_start(&self) -> usize {
        self.frame.store.node(self.id).map_or(0, |n| n.static_inputs)
    }

    /// Acquires (or creates) the shared resource `(this node, type_name, name)`.
    ///
    /// The node's embedded payload for that type and name, if any, seeds a
    /// newly created resource. Pair every successful call with
    /// [`release_resource`](Self::release_resource).
    pub fn acquire_resource<T: Resource>(
        &mut self,
        type_name: &str,
        name: &str,
    ) -> Option<ResourceHandle<T>> {
        let payload = self.frame.store.node(self.id).and_then(|n| {
            n.resources
                .iter()
                .find(|r| r.kind == type_name && r.name == name)
                .map(|r| r.data.as_str())
        });
        let handle = self
            .frame
            .env
            .resources
            .acquire::<T>(self.id, type_name, name, payload);
        if handle.is_none() {
            self.set_issue(format!("failed to create resource {type_name}/{name}"));
        }
        handle
    }

    /// Releases a handle obtained from [`acquire_resource`](Self::acquire_resource).
    pub fn release_resource<T: Resource>(&mut self, handle: ResourceHandle<T>) {
        self.frame.env.resources.release(handle);
    }

    /// Attaches an editor-facing issue to this node.
    pub fn set_issue(&mut self, issue: impl Into<String>) {
        if let Some(data) = self.frame.store.node_mut(self.id) {
            data.issue = Some(issue.into());
        }
    }

    /// Clears the node's issue.
    pub fn clear_issue(&mut self) {
        if let Some(data) = self.frame.store.node_mut(self.id) {
            data.issue = None;
        }
    }
}

/// Read access to a node's inputs.
///
/// Every getter resolves in the same order: the connected upstream output,
/// then the editor literal, then the registration default, then the
/// caller-supplied default. Out-of-range indices read as unconnected.
#[derive(Clone, Copy)]
pub struct Inputs<'a> {
    pub(crate) store: &'a GraphStore,
    pub(crate) id: NodeId,
}

impl<'a> Inputs<'a> {
    /// Number of inputs, static and dynamic.
    pub fn len(&self) -> usize {
        self.store.node(self.id).map_or(0, |n| n.inputs.len())
    }

    /// Whether the node has no inputs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of input `i`.
    pub fn name(&self, i: usize) -> Option<&'a str> {
        let node = self.store.node(self.id)?;
        node.inputs.get(i).map(|s| s.name.as_str())
    }

    /// Index of the input called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.store.node(self.id)?.input_index(name)
    }

    /// Socket facts, or `None` if the input does not exist.
    pub fn info(&self, i: usize) -> Option<InputInfo> {
        let socket = self.store.node(self.id)?.inputs.get(i)?;
        Some(InputInfo {
            ty: socket.ty,
            connected: self.store.upstream(self.id, i).is_some(),
            has_literal: socket.literal.is_some(),
        })
    }

    /// Whether a resolved edge feeds input `i`.
    pub fn is_connected(&self, i: usize) -> bool {
        self.store.upstream(self.id, i).is_some()
    }

    fn fallback(&self, i: usize) -> Option<&'a Value> {
        let socket = self.store.node(self.id)?.inputs.get(i)?;
        socket.literal.as_ref().or(socket.default.as_ref())
    }

    /// The raw value feeding input `i`: upstream, literal or default.
    pub fn value(&self, i: usize) -> Option<&'a Value> {
        match self.store.upstream(self.id, i) {
            Some((value, _)) => Some(value),
            None => self.fallback(i),
        }
    }

    /// Numeric input, with link remapping applied.
    pub fn float(&self, i: usize, default: f32) -> f32 {
        match self.store.upstream(self.id, i) {
            Some((value, remap)) => value
                .as_float()
                .map_or(default, |v| remap.map_or(v, |r| r.apply(v))),
            None => self
                .fallback(i)
                .and_then(Value::as_float)
                .unwrap_or(default),
        }
    }

    /// Integer input.
    pub fn int(&self, i: usize, default: i32) -> i32 {
        match self.value(i) {
            Some(Value::Int(v)) => *v,
            Some(_) => self.float(i, default as f32) as i32,
            None => default,
        }
    }

    /// Boolean input.
    pub fn bool(&self, i: usize, default: bool) -> bool {
        match self.value(i) {
            Some(Value::Bool(v)) => *v,
            Some(_) => self.float(i, if default { 1.0 } else { 0.0 }) != 0.0,
            None => default,
        }
    }

    /// Text input.
    pub fn string<'s>(&self, i: usize, default: &'s str) -> &'s str
    where
        'a: 's,
    {
        match self.value(i) {
            Some(Value::String(s)) => s.as_str(),
            _ => default,
        }
    }

    /// Signal input. Unconnected and numeric inputs read as scalars.
    pub fn signal(&self, i: usize, default: f32) -> SignalRef<'a> {
        match self.value(i) {
            Some(Value::Signal(s)) => SignalRef::Buffer(s),
            Some(_) => SignalRef::Scalar(self.float(i, default)),
            None => SignalRef::Scalar(default),
        }
    }

    /// Channel input, if one is available.
    pub fn channel(&self, i: usize) -> Option<&'a Channel> {
        match self.value(i) {
            Some(Value::Channel(c)) => Some(c),
            _ => None,
        }
    }

    /// Color input.
    pub fn color(&self, i: usize, default: Color) -> Color {
        match self.value(i) {
            Some(Value::Color(c)) => *c,
            _ => default,
        }
    }

    /// Image input; the 2×2 black image when nothing valid is connected.
    pub fn image(&self, i: usize) -> ImageHandle {
        match self.value(i) {
            Some(Value::Image(img)) => *img,
            _ => ImageHandle::black(),
        }
    }

    /// Producer of input `i`, if connected.
    pub fn producer(&self, i: usize) -> Option<NodeId> {
        let socket = self.store.node(self.id)?.inputs.get(i)?;
        let edge = self.store.edge(socket.source?)?;
        edge.from_socket.map(|_| edge.from)
    }
}

/// Write access to the outputs of the node being run.
pub struct Outputs<'a> {
    sockets: &'a mut Vec<OutputSocket>,
}

impl Outputs<'_> {
    /// Number of outputs, static and dynamic.
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Whether the node has no outputs.
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    /// Type of output `i`.
    pub fn socket_type(&self, i: usize) -> Option<SocketType> {
        self.sockets.get(i).map(|s| s.ty)
    }

    /// Current value of output `i`.
    pub fn value(&self, i: usize) -> Option<&Value> {
        self.sockets.get(i).map(|s| &s.value)
    }

    /// Replaces output `i` with `value` if the types agree.
    pub fn set_value(&mut self, i: usize, value: Value) {
        let Some(socket) = self.sockets.get_mut(i) else {
            return;
        };
        if std::mem::discriminant(&socket.value) == std::mem::discriminant(&value) {
            socket.value = value;
        } else {
            tracing::debug!(output = %socket.name, "value type does not match output socket");
        }
    }

    /// Writes a number, converted to the socket's numeric type.
    pub fn set_float(&mut self, i: usize, v: f32) {
        let Some(socket) = self.sockets.get_mut(i) else {
            return;
        };
        match &mut socket.value {
            Value::Float(f) => *f = v,
            Value::Int(n) => *n = v as i32,
            Value::Bool(b) => *b = v != 0.0,
            Value::Signal(s) => s.set_scalar(v),
            _ => {}
        }
    }

    /// Writes an integer output.
    pub fn set_int(&mut self, i: usize, v: i32) {
        if let Some(OutputSocket {
            value: Value::Int(n),
            ..
        }) = self.sockets.get_mut(i)
        {
            *n = v;
        } else {
            self.set_float(i, v as f32);
        }
    }

    /// Writes a boolean output.
    pub fn set_bool(&mut self, i: usize, v: bool) {
        self.set_float(i, if v { 1.0 } else { 0.0 });
    }

    /// Writes a text output, reusing its allocation.
    pub fn set_string(&mut self, i: usize, v: &str) {
        if let Some(OutputSocket {
            value: Value::String(s),
            ..
        }) = self.sockets.get_mut(i)
        {
            s.clear();
            s.push_str(v);
        }
    }

    /// Writes a color output.
    pub fn set_color(&mut self, i: usize, v: Color) {
        self.set_value(i, Value::Color(v));
    }

    /// Writes an image output.
    pub fn set_image(&mut self, i: usize, v: ImageHandle) {
        self.set_value(i, Value::Image(v));
    }

    /// Signal output `i` for writing.
    pub fn signal_mut(&mut self, i: usize) -> Option<&mut SignalFloat> {
        match &mut self.sockets.get_mut(i)?.value {
            Value::Signal(s) => Some(s),
            _ => None,
        }
    }

    /// Channel output `i` for writing.
    pub fn channel_mut(&mut self, i: usize) -> Option<&mut Channel> {
        match &mut self.sockets.get_mut(i)?.value {
            Value::Channel(c) => Some(c),
            _ => None,
        }
    }
}

/// Context for a node's draw hooks.
pub struct DrawContext<'a> {
    pub(crate) store: &'a GraphStore,
    pub(crate) env: &'a GraphEnv,
    pub(crate) id: NodeId,
    pub(crate) backend: &'a mut dyn DrawBackend,
}

impl<'a> DrawContext<'a> {
    /// Id of the node being drawn.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Host environment.
    pub fn env(&self) -> &GraphEnv {
        self.env
    }

    /// Read access to this node's inputs.
    pub fn inputs(&self) -> Inputs<'_> {
        Inputs {
            store: self.store,
            id: self.id,
        }
    }

    /// Current value of one of this node's outputs.
    pub fn output(&self, i: usize) -> Option<&Value> {
        self.store
            .node(self.id)?
            .outputs
            .get(i)
            .map(|s| &s.value)
    }

    /// The rendering collaborator.
    pub fn backend(&mut self) -> &mut (dyn DrawBackend + 'a) {
        &mut *self.backend
    }
}
