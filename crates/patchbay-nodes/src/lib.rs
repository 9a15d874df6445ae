//! Patchbay Nodes - built-in node types
//!
//! This crate provides the node types patchbay graphs are made of, built on
//! patchbay-core:
//!
//! - [`MathNode`] - `math.*` binary signal arithmetic
//! - [`DelayNode`] - `audio.delay` fractional-free delay line
//! - [`SineNode`] and [`WavetableNode`] - oscillators
//! - [`OutputNode`] - `audio.output`, mixes into the graph output bus
//! - [`ControlValueNode`], [`EventNode`], [`FlagNode`], [`MemoryNode`] -
//!   values shared with the UI thread
//! - [`TimerNode`] and [`CounterNode`] - trigger sources and consumers
//! - [`LiteralNode`] - constant source
//! - [`OscilloscopeNode`] - sub-frame sampling through a custom traversal
//! - [`CameraNode`], [`SurfaceNode`], [`PrimitiveNode`], [`SequenceNode`],
//!   [`DisplayNode`] - draw nodes
//! - [`PolyNode`] - `audio.graph.poly`, hosts sub-graph instances as voices
//!
//! Every node type exposes a `descriptor()` with its sockets. Registering
//! them under their type names is left to patchbay-registry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use patchbay_core::NodeTypeRegistry;
//! use patchbay_nodes::{MathNode, MathOp, OutputNode};
//!
//! let mut types = NodeTypeRegistry::new();
//! types.register(MathNode::descriptor(MathOp::Mul), || Box::new(MathNode::new(MathOp::Mul)));
//! types.register(OutputNode::descriptor(), || Box::new(OutputNode::new()));
//! ```

pub mod control;
pub mod delay;
pub mod draw;
pub mod math;
pub mod oscillator;
pub mod oscilloscope;
pub mod output;
pub mod poly;
pub mod trigger;
pub mod value;

// Re-export main types at crate root
pub use control::{ControlValueNode, EventNode, FlagNode, MemoryNode};
pub use delay::{DelayLine, DelayNode, MAX_DELAY_SAMPLES, MAX_DELAY_SECONDS};
pub use draw::{CameraNode, DisplayNode, PrimitiveNode, SequenceNode, SurfaceNode};
pub use math::{MathNode, MathOp};
pub use oscillator::{SineNode, WAVETABLE_RESOURCE, Wavetable, WavetableNode};
pub use oscilloscope::OscilloscopeNode;
pub use output::OutputNode;
pub use poly::{PolyNode, VoiceError};
pub use trigger::{CounterNode, TimerNode};
pub use value::LiteralNode;
