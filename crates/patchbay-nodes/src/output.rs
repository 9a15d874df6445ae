//! Graph audio output.

use patchbay_core::{Node, NodeContext, NodeFlags, NodeTypeDescriptor, SocketType};

/// `audio.output`: mixes its input into the graph's output bus.
///
/// A root, so everything feeding it is ticked every frame even when nothing
/// else consumes it.
#[derive(Debug, Clone, Default)]
pub struct OutputNode;

impl OutputNode {
    /// Input `audio`.
    pub const INPUT_AUDIO: usize = 0;
    /// Input `gain`.
    pub const INPUT_GAIN: usize = 1;

    /// Creates an output.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `audio.output`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.output")
            .description("Mixes a signal into the graph output")
            .input_with_default("audio", SocketType::Signal, "0")
            .input_with_default("gain", SocketType::Float, "1")
    }
}

impl Node for OutputNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let gain = ctx.inputs().float(Self::INPUT_GAIN, 1.0);
        ctx.mix_to_bus(Self::INPUT_AUDIO, gain);
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags::ROOT
    }
}
