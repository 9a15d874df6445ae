//! Patchbay Core - node graph kernel for real-time audio and visuals
//!
//! This crate provides the data model and execution engine behind patchbay
//! graphs: typed sockets, nodes, construction from graph files, per-frame
//! traversal and the state shared with a UI thread.
//!
//! # Core Abstractions
//!
//! ## Values
//!
//! - [`SocketType`] and [`Value`] - the ten socket types and their payloads
//! - [`SignalFloat`] - block-sized audio signal with a scalar fast path
//! - [`SignalRef`] - borrowed signal read, never allocates for scalars
//!
//! ## Graph
//!
//! - [`Graph`] - a live instance: editing, inspection, tick and draw
//! - [`Node`] - behavior of one node, driven through [`NodeContext`] and
//!   [`DrawContext`]
//! - [`NodeTypeRegistry`] - node types available to construction
//! - [`GraphDescription`] - the XML graph file model
//! - [`Scheduler`] - visit-once tick and draw traversals
//!
//! ## Shared State
//!
//! - [`ResourceRegistry`] - reference-counted resources keyed by node
//! - [`ControlBridge`] - control values, flags, events and memory shared
//!   with the UI thread
//!
//! ## Collaborators
//!
//! - [`DrawBackend`] - rendering interface used by draw hooks
//! - [`AudioSource`] and [`GraphStream`] - pull audio out of a graph
//!
//! # Example
//!
//! ```rust,ignore
//! use patchbay_core::{Graph, GraphDescription, GraphEnv, GraphStream, AudioSource};
//!
//! let desc = GraphDescription::parse(&std::fs::read_to_string("synth.xml")?)?;
//! let graph = Graph::build(&desc, env)?;
//!
//! let mut stream = GraphStream::new(graph);
//! let mut buffer = [0.0f32; 512];
//! stream.provide(&mut buffer);
//! ```

pub mod control;
pub mod description;
pub mod graph;
pub mod render;
pub mod resource;
pub mod signal;
pub mod stream;
pub mod value;

pub use control::{ControlBridge, ControlSnapshot, ControlSpec};
pub use description::{
    DescriptionError, GraphDescription, LinkDescription, NodeDescription, ResourceDescription,
};
pub use graph::{
    BuildError, Bypass, DrawContext, DynamicSocket, EdgeId, Graph, GraphEnv, GraphError,
    InputInfo, Inputs, Node, NodeContext, NodeFactory, NodeFlags, NodeId, NodeReport,
    NodeTypeDescriptor, NodeTypeRegistry, Outputs, Remap, Scheduler, SocketDecl, SubDraw,
    SubTraversal,
};
pub use render::{BlendMode, DrawBackend, DrawCommand, RecordingBackend, Shape};
pub use resource::{Resource, ResourceError, ResourceHandle, ResourceKey, ResourceRegistry};
pub use signal::{SignalFloat, SignalRef};
pub use stream::{AudioSource, GraphStream};
pub use value::{
    Channel, Color, ImageHandle, LiteralError, SocketType, SurfaceId, TriggerData, Value,
};
