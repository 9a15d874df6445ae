//! Node type registry: descriptors and factories, keyed by type name.
//!
//! Built explicitly at startup (see the `patchbay-registry` crate for the
//! built-in set) and shared read-only through [`GraphEnv`](super::GraphEnv).
//!
//! # Example
//!
//! ```rust,ignore
//! use patchbay_core::{NodeTypeDescriptor, NodeTypeRegistry, SocketType};
//!
//! let mut registry = NodeTypeRegistry::new();
//! registry.register(
//!     NodeTypeDescriptor::new("math.add")
//!         .input_with_default("a", SocketType::Signal, "0")
//!         .input_with_default("b", SocketType::Signal, "0")
//!         .output("result", SocketType::Signal),
//!     || Box::new(MathNode::new(MathOp::Add)),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use crate::value::SocketType;

use super::node::Node;
use super::socket::SocketDecl;

/// Creates a fresh node instance.
pub type NodeFactory = Arc<dyn Fn() -> Box<dyn Node> + Send + Sync>;

/// Static description of a node type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeDescriptor {
    /// Unique type name used in graph files (e.g. `"math.add"`).
    pub type_name: String,
    /// Short name for editors.
    pub display_name: String,
    /// One-line description.
    pub description: String,
    /// Static inputs, in index order.
    pub inputs: Vec<SocketDecl>,
    /// Static outputs, in index order.
    pub outputs: Vec<SocketDecl>,
}

impl NodeTypeDescriptor {
    /// Creates a descriptor without sockets.
    ///
    /// The display name defaults to the last `.`-separated part of the type
    /// name.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let display_name = type_name
            .rsplit('.')
            .next()
            .unwrap_or(&type_name)
            .to_string();
        Self {
            type_name,
            display_name,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Adds an input without default.
    pub fn input(mut self, name: impl Into<String>, ty: SocketType) -> Self {
        self.inputs.push(SocketDecl::new(name, ty));
        self
    }

    /// Adds an input with a default literal.
    pub fn input_with_default(
        mut self,
        name: impl Into<String>,
        ty: SocketType,
        default: impl Into<String>,
    ) -> Self {
        self.inputs.push(SocketDecl::new(name, ty).with_default(default));
        self
    }

    /// Adds an output.
    pub fn output(mut self, name: impl Into<String>, ty: SocketType) -> Self {
        self.outputs.push(SocketDecl::new(name, ty));
        self
    }

    /// Index of the input called `name`.
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s.name == name)
    }

    /// Index of the output called `name`.
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s.name == name)
    }
}

struct NodeTypeEntry {
    descriptor: NodeTypeDescriptor,
    factory: NodeFactory,
}

/// Registry of available node types.
#[derive(Default)]
pub struct NodeTypeRegistry {
    entries: Vec<NodeTypeEntry>,
}

impl NodeTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node type. A previous registration of the same name is
    /// replaced.
    pub fn register<F>(&mut self, descriptor: NodeTypeDescriptor, factory: F)
    where
        F: Fn() -> Box<dyn Node> + Send + Sync + 'static,
    {
        let entry = NodeTypeEntry {
            descriptor,
            factory: Arc::new(factory),
        };
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.descriptor.type_name == entry.descriptor.type_name)
        {
            tracing::warn!(type_name = %entry.descriptor.type_name, "node type registered twice, replacing");
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Descriptor for `type_name`.
    pub fn descriptor(&self, type_name: &str) -> Option<&NodeTypeDescriptor> {
        self.entry(type_name).map(|e| &e.descriptor)
    }

    /// Creates a node of type `type_name`.
    pub fn create(&self, type_name: &str) -> Option<(&NodeTypeDescriptor, Box<dyn Node>)> {
        self.entry(type_name)
            .map(|e| (&e.descriptor, (e.factory)()))
    }

    /// All descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeTypeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, type_name: &str) -> Option<&NodeTypeEntry> {
        self.entries
            .iter()
            .find(|e| e.descriptor.type_name == type_name)
    }
}

impl fmt::Debug for NodeTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.descriptor.type_name))
            .finish()
    }
}
