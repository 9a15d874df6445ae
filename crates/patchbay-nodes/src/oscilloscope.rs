//! `channel.oscilloscope`: records an x/y trace at a rate above the frame
//! rate.
//!
//! Instead of being ticked once after its upstream, the node splits each
//! frame into `round(sampleRate * dt)` sub-steps, re-ticks its upstream once
//! per sub-step and records one `(x, y)` pair each time. The trace is exposed
//! as two channels and drawn as a line strip.

use patchbay_core::{
    Color, DrawContext, Node, NodeContext, NodeFlags, NodeReport, NodeTypeDescriptor, SocketType,
    SubTraversal,
};

/// Upper bound on sub-steps per frame.
pub const MAX_SUBSTEPS: usize = 4096;

/// Oscilloscope node. See the [module docs](self).
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `x` | float | 0 |
/// | `y` | float | 0 |
/// | `sampleRate` | float (Hz) | 1000 |
///
/// Outputs `x`, `y` (channel) and `draw`.
#[derive(Debug, Clone, Default)]
pub struct OscilloscopeNode {
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl OscilloscopeNode {
    /// Input `x`.
    pub const INPUT_X: usize = 0;
    /// Input `y`.
    pub const INPUT_Y: usize = 1;
    /// Input `sampleRate`.
    pub const INPUT_SAMPLE_RATE: usize = 2;
    /// Output `x`.
    pub const OUTPUT_X: usize = 0;
    /// Output `y`.
    pub const OUTPUT_Y: usize = 1;
    /// Output `draw`.
    pub const OUTPUT_DRAW: usize = 2;

    /// Creates an oscilloscope with an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets of `channel.oscilloscope`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("channel.oscilloscope")
            .description("Samples x/y above the frame rate and draws the trace")
            .input_with_default("x", SocketType::Float, "0")
            .input_with_default("y", SocketType::Float, "0")
            .input_with_default("sampleRate", SocketType::Float, "1000")
            .output("x", SocketType::Channel)
            .output("y", SocketType::Channel)
            .output("draw", SocketType::Draw)
    }

    /// Sub-steps for one frame of `dt` seconds.
    pub fn substeps(sample_rate: f32, dt: f32) -> usize {
        let steps = (sample_rate * dt).round();
        if steps.is_finite() && steps >= 1.0 {
            (steps as usize).min(MAX_SUBSTEPS)
        } else {
            1
        }
    }

    /// The trace of the latest frame.
    pub fn trace(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

impl Node for OscilloscopeNode {
    fn custom_traverse_tick(&mut self, traversal: &mut SubTraversal<'_>, dt: f32) {
        let sample_rate = traversal.inputs().float(Self::INPUT_SAMPLE_RATE, 1000.0);
        let steps = Self::substeps(sample_rate, dt);
        let sub_dt = dt / steps as f32;

        self.xs.clear();
        self.ys.clear();
        for _ in 0..steps {
            traversal.tick_predecessors(sub_dt);
            let inputs = traversal.inputs();
            self.xs.push(inputs.float(Self::INPUT_X, 0.0));
            self.ys.push(inputs.float(Self::INPUT_Y, 0.0));
        }
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let mut outputs = ctx.outputs();
        if let Some(x) = outputs.channel_mut(Self::OUTPUT_X) {
            x.set_samples(self.xs.iter().copied(), true);
        }
        if let Some(y) = outputs.channel_mut(Self::OUTPUT_Y) {
            y.set_samples(self.ys.iter().copied(), true);
        }
    }

    fn draw(&self, ctx: &mut DrawContext<'_>) {
        if self.xs.len() < 2 {
            return;
        }
        let points: Vec<(f32, f32)> = self.trace().collect();
        ctx.backend().draw_lines(&points, Color::WHITE);
    }

    fn describe(&self, report: &mut NodeReport) {
        report.add("samples", self.xs.len());
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags::CUSTOM_TRAVERSE_TICK
    }
}
