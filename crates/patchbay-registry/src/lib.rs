//! Built-in node and resource types for patchbay graphs.
//!
//! This crate collects every node type from patchbay-nodes into a
//! [`NodeTypeRegistry`] and every resource type into a [`ResourceRegistry`],
//! ready to be shared by graph instances through a [`GraphEnv`]. It also
//! groups node types into categories for listings and editors.
//!
//! # Features
//!
//! - **Type Discovery**: list all built-in node types with their sockets
//! - **Factory Pattern**: graph construction creates nodes by type name
//! - **Category System**: node types organized by what they work on
//!
//! # Example
//!
//! ```rust
//! use patchbay_registry::{BuiltinRegistry, NodeCategory};
//!
//! let registry = BuiltinRegistry::new();
//!
//! for descriptor in registry.types_in_category(NodeCategory::Draw) {
//!     println!("{}: {}", descriptor.type_name, descriptor.description);
//! }
//!
//! // Ready-to-use environment for building graphs.
//! let env = registry.into_env();
//! assert!(env.node_types.descriptor("audio.delay").is_some());
//! ```

use std::sync::Arc;

use patchbay_core::{GraphEnv, Node, NodeTypeDescriptor, NodeTypeRegistry, ResourceRegistry};
use patchbay_nodes::{
    CameraNode, ControlValueNode, CounterNode, DelayNode, DisplayNode, EventNode, FlagNode,
    LiteralNode, MathNode, MathOp, MemoryNode, OscilloscopeNode, OutputNode, PolyNode,
    PrimitiveNode, SequenceNode, SineNode, SurfaceNode, TimerNode, WAVETABLE_RESOURCE, Wavetable,
    WavetableNode,
};

/// Category of node type for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Binary arithmetic on signals
    Math,
    /// Audio-rate sources, processors and sinks
    Audio,
    /// Values, flags, events and memory shared with the UI
    Control,
    /// Trigger sources and consumers
    Trigger,
    /// Constant sources
    Value,
    /// Channel producers
    Channel,
    /// Draw nodes
    Draw,
}

impl NodeCategory {
    /// Every category, in listing order.
    pub const ALL: [Self; 7] = [
        Self::Math,
        Self::Audio,
        Self::Control,
        Self::Trigger,
        Self::Value,
        Self::Channel,
        Self::Draw,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Math => "Math",
            NodeCategory::Audio => "Audio",
            NodeCategory::Control => "Control",
            NodeCategory::Trigger => "Trigger",
            NodeCategory::Value => "Value",
            NodeCategory::Channel => "Channel",
            NodeCategory::Draw => "Draw",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            NodeCategory::Math => "Add, subtract, multiply, divide, min and max on signals",
            NodeCategory::Audio => "Oscillators, delays, outputs and sub-graph voices",
            NodeCategory::Control => "Control values, flags, events and memory set from the UI",
            NodeCategory::Trigger => "Timers, counters and other trigger plumbing",
            NodeCategory::Value => "Constant sources",
            NodeCategory::Channel => "Nodes producing channel buffers",
            NodeCategory::Draw => "Cameras, surfaces, primitives and displays",
        }
    }
}

struct CategoryEntry {
    type_name: String,
    category: NodeCategory,
}

/// Registry of all built-in node types.
///
/// Wraps the [`NodeTypeRegistry`] handed to graphs and remembers the
/// category of each type.
pub struct BuiltinRegistry {
    node_types: NodeTypeRegistry,
    categories: Vec<CategoryEntry>,
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinRegistry {
    /// Create a new registry with all built-in node types registered.
    pub fn new() -> Self {
        let mut registry = Self {
            node_types: NodeTypeRegistry::new(),
            categories: Vec::with_capacity(24),
        };
        registry.register_builtin_types();
        tracing::debug!(count = registry.len(), "registered built-in node types");
        registry
    }

    fn register_builtin_types(&mut self) {
        // Math
        for op in MathOp::ALL {
            self.register(NodeCategory::Math, MathNode::descriptor(op), move || {
                Box::new(MathNode::new(op))
            });
        }

        // Audio
        self.register(NodeCategory::Audio, SineNode::descriptor(), || {
            Box::new(SineNode::new())
        });
        self.register(NodeCategory::Audio, DelayNode::descriptor(), || {
            Box::new(DelayNode::new())
        });
        self.register(NodeCategory::Audio, WavetableNode::descriptor(), || {
            Box::new(WavetableNode::new())
        });
        self.register(NodeCategory::Audio, OutputNode::descriptor(), || {
            Box::new(OutputNode::new())
        });
        self.register(NodeCategory::Audio, PolyNode::descriptor(), || {
            Box::new(PolyNode::new())
        });

        // Control
        self.register(NodeCategory::Control, ControlValueNode::descriptor(), || {
            Box::new(ControlValueNode::new())
        });
        self.register(NodeCategory::Control, EventNode::descriptor(), || {
            Box::new(EventNode::new())
        });
        self.register(NodeCategory::Control, FlagNode::descriptor(), || {
            Box::new(FlagNode::new())
        });
        self.register(NodeCategory::Control, MemoryNode::descriptor(), || {
            Box::new(MemoryNode::new())
        });

        // Trigger
        self.register(NodeCategory::Trigger, TimerNode::descriptor(), || {
            Box::new(TimerNode::new())
        });
        self.register(NodeCategory::Trigger, CounterNode::descriptor(), || {
            Box::new(CounterNode::new())
        });

        // Value
        self.register(NodeCategory::Value, LiteralNode::descriptor(), || {
            Box::new(LiteralNode::new())
        });

        // Channel
        self.register(NodeCategory::Channel, OscilloscopeNode::descriptor(), || {
            Box::new(OscilloscopeNode::new())
        });

        // Draw
        self.register(NodeCategory::Draw, CameraNode::descriptor(), || {
            Box::new(CameraNode::new())
        });
        self.register(NodeCategory::Draw, SurfaceNode::descriptor(), || {
            Box::new(SurfaceNode::new())
        });
        self.register(NodeCategory::Draw, PrimitiveNode::descriptor(), || {
            Box::new(PrimitiveNode::new())
        });
        self.register(NodeCategory::Draw, SequenceNode::descriptor(), || {
            Box::new(SequenceNode::new())
        });
        self.register(NodeCategory::Draw, DisplayNode::descriptor(), || {
            Box::new(DisplayNode::new())
        });
    }

    /// Register a node type under `category`.
    fn register<F>(&mut self, category: NodeCategory, descriptor: NodeTypeDescriptor, factory: F)
    where
        F: Fn() -> Box<dyn Node> + Send + Sync + 'static,
    {
        self.categories.push(CategoryEntry {
            type_name: descriptor.type_name.clone(),
            category,
        });
        self.node_types.register(descriptor, factory);
    }

    /// Returns descriptors for all registered node types.
    pub fn all_types(&self) -> Vec<&NodeTypeDescriptor> {
        self.node_types.iter().collect()
    }

    /// Returns descriptors for node types in a specific category.
    pub fn types_in_category(&self, category: NodeCategory) -> Vec<&NodeTypeDescriptor> {
        self.categories
            .iter()
            .filter(|e| e.category == category)
            .filter_map(|e| self.node_types.descriptor(&e.type_name))
            .collect()
    }

    /// Get a descriptor by type name.
    pub fn get(&self, type_name: &str) -> Option<&NodeTypeDescriptor> {
        self.node_types.descriptor(type_name)
    }

    /// Category of a registered type.
    pub fn category(&self, type_name: &str) -> Option<NodeCategory> {
        self.categories
            .iter()
            .find(|e| e.type_name == type_name)
            .map(|e| e.category)
    }

    /// The underlying node type registry.
    pub fn node_types(&self) -> &NodeTypeRegistry {
        &self.node_types
    }

    /// Consumes the registry, keeping only what graph construction needs.
    pub fn into_node_types(self) -> NodeTypeRegistry {
        self.node_types
    }

    /// Environment with the built-in node and resource types and default
    /// sample rate and block size.
    pub fn into_env(self) -> GraphEnv {
        GraphEnv::new(Arc::new(self.node_types), Arc::new(resource_types()))
    }

    /// Returns the number of registered node types.
    pub fn len(&self) -> usize {
        self.node_types.len()
    }

    /// Returns true if no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty()
    }
}

/// Registry of all built-in resource types.
pub fn resource_types() -> ResourceRegistry {
    let mut resources = ResourceRegistry::new();
    resources.register_type::<Wavetable>(WAVETABLE_RESOURCE, Wavetable::default);
    resources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = BuiltinRegistry::new();
        assert_eq!(registry.len(), 24);
    }

    #[test]
    fn test_get_type() {
        let registry = BuiltinRegistry::new();

        let delay = registry.get("audio.delay");
        assert!(delay.is_some());
        assert_eq!(delay.unwrap().input_index("maxDelay"), Some(2));

        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_types_by_category() {
        let registry = BuiltinRegistry::new();

        assert_eq!(registry.types_in_category(NodeCategory::Math).len(), 6);
        assert_eq!(registry.types_in_category(NodeCategory::Audio).len(), 5);
        assert_eq!(registry.types_in_category(NodeCategory::Control).len(), 4);
        assert_eq!(registry.types_in_category(NodeCategory::Trigger).len(), 2);
        assert_eq!(registry.types_in_category(NodeCategory::Value).len(), 1);
        assert_eq!(registry.types_in_category(NodeCategory::Channel).len(), 1);
        assert_eq!(registry.types_in_category(NodeCategory::Draw).len(), 5);
    }

    #[test]
    fn test_every_type_has_a_category() {
        let registry = BuiltinRegistry::new();
        let categorized: usize = NodeCategory::ALL
            .iter()
            .map(|&c| registry.types_in_category(c).len())
            .sum();
        assert_eq!(categorized, registry.len());

        assert_eq!(registry.category("draw.sequence"), Some(NodeCategory::Draw));
        assert_eq!(registry.category("nonexistent"), None);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(NodeCategory::Math.name(), "Math");
        assert_eq!(NodeCategory::Control.name(), "Control");
        assert!(NodeCategory::ALL.iter().all(|c| !c.description().is_empty()));
    }

    #[test]
    fn test_all_types_can_be_created() {
        let registry = BuiltinRegistry::new();

        for descriptor in registry.all_types() {
            let created = registry.node_types().create(&descriptor.type_name);
            assert!(
                created.is_some(),
                "Failed to create node type: {}",
                descriptor.type_name
            );
        }
    }

    #[test]
    fn test_resource_types() {
        let resources = resource_types();
        assert!(resources.has_type(WAVETABLE_RESOURCE));
        assert!(!resources.has_type("nonexistent"));
    }
}
