//! Constant sources.

use patchbay_core::{Node, NodeContext, NodeTypeDescriptor, SocketType};

/// `value.literal`: outputs its input; used as a constant source.
#[derive(Debug, Clone, Default)]
pub struct LiteralNode;

impl LiteralNode {
    /// Input `value`.
    pub const INPUT_VALUE: usize = 0;
    /// Output `value`.
    pub const OUTPUT_VALUE: usize = 0;

    /// Creates a literal.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `value.literal`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("value.literal")
            .description("Constant value")
            .input_with_default("value", SocketType::Float, "0")
            .output("value", SocketType::Float)
    }
}

impl Node for LiteralNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let (inputs, mut outputs) = ctx.io();
        outputs.set_float(Self::OUTPUT_VALUE, inputs.float(Self::INPUT_VALUE, 0.0));
    }
}
