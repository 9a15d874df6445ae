//! Trigger sources and consumers.

use patchbay_core::{Node, NodeContext, NodeReport, NodeTypeDescriptor, SocketType, TriggerData};

/// `trigger.timer`: fires every `interval` seconds.
///
/// Fires at most once per tick; a non-positive interval never fires.
#[derive(Debug, Clone, Default)]
pub struct TimerNode {
    elapsed: f32,
}

impl TimerNode {
    /// Input `interval`.
    pub const INPUT_INTERVAL: usize = 0;
    /// Output `trigger`.
    pub const OUTPUT_TRIGGER: usize = 0;

    /// Creates a timer at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets of `trigger.timer`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("trigger.timer")
            .description("Periodic trigger")
            .input_with_default("interval", SocketType::Float, "1")
            .output("trigger", SocketType::Trigger)
    }
}

impl Node for TimerNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, dt: f32) {
        let interval = ctx.inputs().float(Self::INPUT_INTERVAL, 1.0);
        if interval <= 0.0 || !interval.is_finite() {
            self.elapsed = 0.0;
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= interval {
            // Drop whole missed periods so a long frame fires once.
            self.elapsed = (self.elapsed - interval) % interval;
            ctx.trigger(Self::OUTPUT_TRIGGER);
        }
    }
}

/// `trigger.counter`: counts `increment` triggers until `reset`.
#[derive(Debug, Clone, Default)]
pub struct CounterNode {
    count: i32,
}

impl CounterNode {
    /// Input `increment`.
    pub const INPUT_INCREMENT: usize = 0;
    /// Input `reset`.
    pub const INPUT_RESET: usize = 1;
    /// Output `count`.
    pub const OUTPUT_COUNT: usize = 0;

    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets of `trigger.counter`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("trigger.counter")
            .description("Counts triggers")
            .input("increment", SocketType::Trigger)
            .input("reset", SocketType::Trigger)
            .output("count", SocketType::Int)
    }
}

impl Node for CounterNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        ctx.outputs().set_int(Self::OUTPUT_COUNT, self.count);
    }

    fn handle_trigger(&mut self, ctx: &mut NodeContext<'_>, input: usize, _data: &TriggerData) {
        match input {
            Self::INPUT_INCREMENT => self.count = self.count.saturating_add(1),
            Self::INPUT_RESET => self.count = 0,
            _ => return,
        }
        ctx.outputs().set_int(Self::OUTPUT_COUNT, self.count);
    }

    fn describe(&self, report: &mut NodeReport) {
        report.add("count", self.count);
    }
}
