//! Node graph engine: storage, editing, and traversal.
//!
//! A graph is a set of nodes with typed input and output sockets, wired by
//! directed edges from an output to an input. Each frame the graph is
//! *ticked* (every node advances once, after its producers) and optionally
//! *drawn* (every node's draw hooks run, nested around its producers).
//!
//! # Architecture
//!
//! - [`Graph`] owns the topology, the output values of every node, the
//!   [`ControlBridge`](crate::ControlBridge) shared with the UI and the audio
//!   output bus. It is edited with [`add_node`](Graph::add_node),
//!   [`connect`](Graph::connect) and friends, or built in one step from a
//!   [`GraphDescription`](crate::GraphDescription) with [`Graph::build`].
//! - [`Node`] is the behavior of one node. Nodes never hold references into
//!   the graph; each hook receives a [`NodeContext`] or [`DrawContext`] that
//!   reads inputs, writes the node's own outputs and fires triggers.
//! - [`Bypass`] wraps every node and implements passthrough, so concrete
//!   nodes never check a bypass flag.
//! - [`Scheduler`] holds the per-traversal visited marks. [`Graph::tick`]
//!   and [`Graph::draw`] use a built-in one.
//!
//! # Input resolution
//!
//! An input reads, in order: the connected upstream output (remapped when
//! the link carries range params), the editor literal, the registration
//! default, the caller's default.
//!
//! # Triggers
//!
//! Firing a trigger output runs every connected consumer's
//! [`Node::handle_trigger`] synchronously, before the firing call returns.
//!
//! # Example
//!
//! ```rust,ignore
//! use patchbay_core::{Graph, GraphEnv};
//!
//! let mut graph = Graph::new(env);
//! let osc = graph.add_node("audio.sine")?;
//! let out = graph.add_node("audio.output")?;
//! graph.connect(osc, "audio", out, "audio")?;
//! graph.set_input_literal(osc, "frequency", "220")?;
//!
//! graph.tick(env.block_duration());
//! let block = graph.output_bus();
//! ```

mod build;
mod context;
mod dynamic;
pub mod edge;
pub mod env;
pub mod error;
pub mod node;
mod processing;
pub mod schedule;
pub mod socket;
mod store;
pub mod types;

pub use context::{DrawContext, Inputs, NodeContext, Outputs};
pub use edge::{EdgeId, Remap};
pub use env::GraphEnv;
pub use error::{BuildError, GraphError};
pub use node::{Bypass, Node, NodeFlags, NodeId, NodeReport};
pub use processing::Graph;
pub use schedule::{Scheduler, SubDraw, SubTraversal};
pub use socket::{DynamicSocket, InputInfo, SocketDecl};
pub use types::{NodeFactory, NodeTypeDescriptor, NodeTypeRegistry};
