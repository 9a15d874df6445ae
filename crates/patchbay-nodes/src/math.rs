//! Binary arithmetic on signals.
//!
//! Scalars broadcast against vectors, and two scalar operands produce a
//! scalar result without touching the output buffer. Non-finite operands
//! read as 0 and a non-finite result is written as 0.

use patchbay_core::{Node, NodeContext, NodeReport, NodeTypeDescriptor, SocketType};

/// Arithmetic operation of a [`MathNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`, `0` where `b` is `0` or the quotient overflows
    Div,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
}

impl MathOp {
    /// Every operation, in registration order.
    pub const ALL: [Self; 6] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Min,
        Self::Max,
    ];

    /// Node type name, e.g. `"math.add"`.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Add => "math.add",
            Self::Sub => "math.sub",
            Self::Mul => "math.mul",
            Self::Div => "math.div",
            Self::Min => "math.min",
            Self::Max => "math.max",
        }
    }

    const fn summary(self) -> &'static str {
        match self {
            Self::Add => "Adds two signals",
            Self::Sub => "Subtracts b from a",
            Self::Mul => "Multiplies two signals",
            Self::Div => "Divides a by b; division by zero yields zero",
            Self::Min => "Smaller of two signals",
            Self::Max => "Larger of two signals",
        }
    }

    /// Applies the operation to one pair of samples.
    ///
    /// The result is always finite.
    #[inline]
    pub fn apply(self, a: f32, b: f32) -> f32 {
        let a = finite_or_zero(a);
        let b = finite_or_zero(b);
        let result = match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        };
        finite_or_zero(result)
    }
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// `result = a <op> b`.
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `a` | audioValue | 0 |
/// | `b` | audioValue | 0 |
///
/// Output `result` (audioValue).
#[derive(Debug, Clone)]
pub struct MathNode {
    op: MathOp,
}

impl MathNode {
    /// Input `a`.
    pub const INPUT_A: usize = 0;
    /// Input `b`.
    pub const INPUT_B: usize = 1;
    /// Output `result`.
    pub const OUTPUT_RESULT: usize = 0;

    /// Creates a node computing `op`.
    pub fn new(op: MathOp) -> Self {
        Self { op }
    }

    /// Sockets of the node type for `op`.
    pub fn descriptor(op: MathOp) -> NodeTypeDescriptor {
        NodeTypeDescriptor::new(op.type_name())
            .description(op.summary())
            .input_with_default("a", SocketType::Signal, "0")
            .input_with_default("b", SocketType::Signal, "0")
            .output("result", SocketType::Signal)
    }
}

impl Node for MathNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let op = self.op;
        let (inputs, mut outputs) = ctx.io();
        let a = inputs.signal(Self::INPUT_A, 0.0);
        let b = inputs.signal(Self::INPUT_B, 0.0);
        if let Some(result) = outputs.signal_mut(Self::OUTPUT_RESULT) {
            result.set_binary(a, b, |a, b| op.apply(a, b));
        }
    }

    fn describe(&self, report: &mut NodeReport) {
        report.add("op", format!("{:?}", self.op));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(MathOp::Div.apply(3.0, 0.0), 0.0);
        assert_eq!(MathOp::Div.apply(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        assert_eq!(MathOp::Add.apply(f32::NAN, 1.0), 1.0);
        assert_eq!(MathOp::Mul.apply(f32::INFINITY, 2.0), 0.0);
        assert_eq!(MathOp::Div.apply(1.0, 1e-39), 0.0);
        assert_eq!(MathOp::Mul.apply(f32::MAX, 2.0), 0.0);
        assert_eq!(MathOp::Max.apply(f32::NEG_INFINITY, -3.0), 0.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(MathOp::Min.apply(-1.0, 2.0), -1.0);
        assert_eq!(MathOp::Max.apply(-1.0, 2.0), 2.0);
    }

    #[test]
    fn test_type_names_are_unique() {
        let mut names: Vec<_> = MathOp::ALL.iter().map(|op| op.type_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MathOp::ALL.len());
    }

    #[test]
    fn test_descriptor_sockets() {
        let d = MathNode::descriptor(MathOp::Sub);
        assert_eq!(d.type_name, "math.sub");
        assert_eq!(d.input_index("b"), Some(MathNode::INPUT_B));
        assert_eq!(d.output_index("result"), Some(MathNode::OUTPUT_RESULT));
    }
}
