//! Nodes reading the graph's [`ControlBridge`](patchbay_core::ControlBridge).
//!
//! Control values, flags, events and memory slots are addressed by name. The
//! name is an ordinary input, so it can change while the graph runs; the
//! control value node re-registers under the new name when it does.

use patchbay_core::{ControlSpec, Node, NodeContext, NodeReport, NodeTypeDescriptor, SocketType};

/// `audio.controlValue`: exposes a UI-controlled, smoothed value.
///
/// Registers `name` with the bridge while the name is non-empty and outputs
/// its current value. Several nodes may register the same name; the value
/// lives until the last of them lets go.
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `name` | string | |
/// | `min` | float | 0 |
/// | `max` | float | 1 |
/// | `smoothness` | float | 0 |
/// | `default` | float | 0 |
///
/// Output `value` (float).
#[derive(Debug, Clone, Default)]
pub struct ControlValueNode {
    registered: Option<String>,
}

impl ControlValueNode {
    /// Input `name`.
    pub const INPUT_NAME: usize = 0;
    /// Input `min`.
    pub const INPUT_MIN: usize = 1;
    /// Input `max`.
    pub const INPUT_MAX: usize = 2;
    /// Input `smoothness`.
    pub const INPUT_SMOOTHNESS: usize = 3;
    /// Input `default`.
    pub const INPUT_DEFAULT: usize = 4;
    /// Output `value`.
    pub const OUTPUT_VALUE: usize = 0;

    /// Creates an unregistered node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets of `audio.controlValue`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.controlValue")
            .description("Value set from the UI, smoothed per tick")
            .input("name", SocketType::String)
            .input_with_default("min", SocketType::Float, "0")
            .input_with_default("max", SocketType::Float, "1")
            .input_with_default("smoothness", SocketType::Float, "0")
            .input_with_default("default", SocketType::Float, "0")
            .output("value", SocketType::Float)
    }

    fn sync_registration(&mut self, ctx: &mut NodeContext<'_>) {
        let inputs = ctx.inputs();
        let name = inputs.string(Self::INPUT_NAME, "");
        if self.registered.as_deref() == Some(name) || (name.is_empty() && self.registered.is_none()) {
            return;
        }
        let spec = ControlSpec::new(
            inputs.float(Self::INPUT_MIN, 0.0),
            inputs.float(Self::INPUT_MAX, 1.0),
            inputs.float(Self::INPUT_DEFAULT, 0.0),
        )
        .with_smoothness(inputs.float(Self::INPUT_SMOOTHNESS, 0.0));
        let name = name.to_string();

        let controls = ctx.controls();
        if let Some(old) = self.registered.take() {
            controls.unregister(&old);
        }
        if !name.is_empty() {
            controls.register(&name, spec);
            self.registered = Some(name);
        }
    }
}

impl Node for ControlValueNode {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        self.sync_registration(ctx);
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        self.sync_registration(ctx);
        let value = match &self.registered {
            Some(name) => ctx.controls().current(name),
            None => None,
        }
        .unwrap_or_else(|| ctx.inputs().float(Self::INPUT_DEFAULT, 0.0));
        ctx.outputs().set_float(Self::OUTPUT_VALUE, value);
    }

    fn shut(&mut self, ctx: &mut NodeContext<'_>) {
        if let Some(name) = self.registered.take() {
            ctx.controls().unregister(&name);
        }
    }

    fn describe(&self, report: &mut NodeReport) {
        match &self.registered {
            Some(name) => report.add("registered", name),
            None => report.line("no name"),
        }
    }
}

/// `audio.event`: fires its trigger on ticks where the UI triggered the
/// named event.
#[derive(Debug, Clone, Default)]
pub struct EventNode;

impl EventNode {
    /// Input `name`.
    pub const INPUT_NAME: usize = 0;
    /// Output `trigger`.
    pub const OUTPUT_TRIGGER: usize = 0;

    /// Creates an event node.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `audio.event`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.event")
            .description("Fires when the named event is triggered from the UI")
            .input("name", SocketType::String)
            .output("trigger", SocketType::Trigger)
    }
}

impl Node for EventNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let active = {
            let name = ctx.inputs().string(Self::INPUT_NAME, "");
            !name.is_empty() && ctx.controls().event_active(name)
        };
        if active {
            ctx.trigger(Self::OUTPUT_TRIGGER);
        }
    }
}

/// `audio.flag`: whether the named flag is set.
#[derive(Debug, Clone, Default)]
pub struct FlagNode;

impl FlagNode {
    /// Input `name`.
    pub const INPUT_NAME: usize = 0;
    /// Output `set`.
    pub const OUTPUT_SET: usize = 0;

    /// Creates a flag node.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `audio.flag`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.flag")
            .description("Reads a flag set from the UI")
            .input("name", SocketType::String)
            .output("set", SocketType::Bool)
    }
}

impl Node for FlagNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let set = ctx.controls().is_flag_set(ctx.inputs().string(Self::INPUT_NAME, ""));
        ctx.outputs().set_bool(Self::OUTPUT_SET, set);
    }
}

/// `audio.memory`: reads a four-component memory slot.
///
/// Slots named after a control value mirror its current `x` and `y`.
#[derive(Debug, Clone, Default)]
pub struct MemoryNode;

impl MemoryNode {
    /// Input `name`.
    pub const INPUT_NAME: usize = 0;

    /// Creates a memory node.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `audio.memory`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.memory")
            .description("Reads a memory slot shared with the UI")
            .input("name", SocketType::String)
            .output("x", SocketType::Float)
            .output("y", SocketType::Float)
            .output("z", SocketType::Float)
            .output("w", SocketType::Float)
    }
}

impl Node for MemoryNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let slot = ctx
            .controls()
            .memory(ctx.inputs().string(Self::INPUT_NAME, ""))
            .unwrap_or_default();
        let mut outputs = ctx.outputs();
        for (i, v) in slot.into_iter().enumerate() {
            outputs.set_float(i, v);
        }
    }
}
