//! Static checks on graph descriptions.
//!
//! Reports the problems [`Graph::build`](patchbay_core::Graph::build) would
//! reject, without creating any node. Unlike construction, which stops at the
//! first problem, validation collects all of them so an editor or the CLI can
//! show everything at once.
//!
//! # Example
//!
//! ```rust
//! use patchbay_config::validate_description;
//! use patchbay_core::GraphDescription;
//! use patchbay_registry::BuiltinRegistry;
//!
//! let registry = BuiltinRegistry::new();
//! let mut desc = GraphDescription::new();
//! let osc = desc.add_node("audio.sine");
//! let out = desc.add_node("audio.output");
//! desc.link(osc, "audio", out, "audio");
//!
//! validate_description(&desc, registry.node_types()).expect("valid graph");
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use patchbay_core::{
    GraphDescription, LinkDescription, NodeId, NodeTypeDescriptor, NodeTypeRegistry, SocketType,
    Value,
};
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Two nodes share an id.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    /// A node id is above [`NodeId::MAX`].
    #[error("node id {0} is out of range")]
    NodeIdOutOfRange(NodeId),

    /// Unknown node type.
    #[error("node {node}: unknown node type '{type_name}'")]
    UnknownNodeType {
        /// Node with the unknown type.
        node: NodeId,
        /// The unregistered type name.
        type_name: String,
    },

    /// A link names a node that does not exist.
    #[error("link {link}: node {node} does not exist")]
    MissingNode {
        /// Link id.
        link: u32,
        /// The missing node.
        node: NodeId,
    },

    /// A static link names a socket the node type does not have.
    #[error("link {link}: node {node} has no {direction} socket '{socket}'")]
    UnknownSocket {
        /// Link id.
        link: u32,
        /// Node that was searched.
        node: NodeId,
        /// `"input"` or `"output"`.
        direction: &'static str,
        /// The missing socket name.
        socket: String,
    },

    /// The producer's output type cannot feed the consumer's input type.
    #[error("link {link}: cannot connect {from} to {to}")]
    TypeMismatch {
        /// Link id.
        link: u32,
        /// Producer type.
        from: SocketType,
        /// Consumer type.
        to: SocketType,
    },

    /// A second link feeds an input that already has a producer.
    #[error("link {link}: input '{socket}' of node {node} already has a producer")]
    InputOccupied {
        /// Link id.
        link: u32,
        /// Consumer node.
        node: NodeId,
        /// The occupied input.
        socket: String,
    },

    /// An input literal does not parse for its socket type.
    #[error("node {node}: invalid literal '{text}' for {ty} input '{socket}'")]
    InvalidLiteral {
        /// Node carrying the literal.
        node: NodeId,
        /// Input name.
        socket: String,
        /// Input type.
        ty: SocketType,
        /// The literal text.
        text: String,
    },

    /// Enabled links form a dependency cycle through these nodes.
    #[error("dependency cycle through nodes {}", format_nodes(.0))]
    Cycle(Vec<NodeId>),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

fn format_nodes(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates `desc` against the node types in `types`.
///
/// Returns the single problem found, or [`ValidationError::Multiple`] when
/// there are several.
pub fn validate_description(
    desc: &GraphDescription,
    types: &NodeTypeRegistry,
) -> ValidationResult<()> {
    let mut errors = collect_errors(desc, types);
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Every problem in `desc`, in file order.
pub fn collect_errors(desc: &GraphDescription, types: &NodeTypeRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut descriptors: BTreeMap<NodeId, Option<&NodeTypeDescriptor>> = BTreeMap::new();
    for node in &desc.nodes {
        if node.id > NodeId::MAX {
            errors.push(ValidationError::NodeIdOutOfRange(node.id));
        }
        let descriptor = types.descriptor(&node.type_name);
        if descriptor.is_none() {
            errors.push(ValidationError::UnknownNodeType {
                node: node.id,
                type_name: node.type_name.clone(),
            });
        }
        if descriptors.insert(node.id, descriptor).is_some() {
            errors.push(ValidationError::DuplicateNode(node.id));
        }

        let Some(descriptor) = descriptor else {
            continue;
        };
        for (socket, text) in &node.inputs {
            // Unknown names may be dynamic sockets declared at runtime.
            let Some(decl) = descriptor.inputs.iter().find(|s| &s.name == socket) else {
                continue;
            };
            if !text.is_empty() && Value::parse_literal(decl.ty, text).is_err() {
                errors.push(ValidationError::InvalidLiteral {
                    node: node.id,
                    socket: socket.clone(),
                    ty: decl.ty,
                    text: text.clone(),
                });
            }
        }
    }

    let mut occupied: HashSet<(NodeId, &str)> = HashSet::new();
    for link in desc.links.iter().filter(|l| l.enabled) {
        check_link(link, &descriptors, &mut occupied, &mut errors);
    }

    if let Some(cycle) = find_cycle(desc, &descriptors) {
        errors.push(ValidationError::Cycle(cycle));
    }

    errors
}

fn check_link<'a>(
    link: &'a LinkDescription,
    descriptors: &BTreeMap<NodeId, Option<&NodeTypeDescriptor>>,
    occupied: &mut HashSet<(NodeId, &'a str)>,
    errors: &mut Vec<ValidationError>,
) {
    let mut endpoint = |node: NodeId| match descriptors.get(&node) {
        Some(descriptor) => *descriptor,
        None => {
            errors.push(ValidationError::MissingNode {
                link: link.id,
                node,
            });
            None
        }
    };
    let producer = endpoint(link.from_node);
    let consumer = endpoint(link.to_node);
    let (Some(producer), Some(consumer)) = (producer, consumer) else {
        return;
    };

    let from = producer.outputs.iter().find(|s| s.name == link.from_socket);
    let to = consumer.inputs.iter().find(|s| s.name == link.to_socket);
    if !link.dynamic {
        if from.is_none() {
            errors.push(ValidationError::UnknownSocket {
                link: link.id,
                node: link.from_node,
                direction: "output",
                socket: link.from_socket.clone(),
            });
        }
        if to.is_none() {
            errors.push(ValidationError::UnknownSocket {
                link: link.id,
                node: link.to_node,
                direction: "input",
                socket: link.to_socket.clone(),
            });
        }
    }

    if let (Some(from), Some(to)) = (from, to)
        && !to.ty.accepts(from.ty)
    {
        errors.push(ValidationError::TypeMismatch {
            link: link.id,
            from: from.ty,
            to: to.ty,
        });
    }

    if !occupied.insert((link.to_node, link.to_socket.as_str())) {
        errors.push(ValidationError::InputOccupied {
            link: link.id,
            node: link.to_node,
            socket: link.to_socket.clone(),
        });
    }
}

/// Nodes left over by Kahn's algorithm, i.e. on or behind a cycle.
fn find_cycle(
    desc: &GraphDescription,
    descriptors: &BTreeMap<NodeId, Option<&NodeTypeDescriptor>>,
) -> Option<Vec<NodeId>> {
    let mut indegree: BTreeMap<NodeId, usize> = descriptors.keys().map(|&id| (id, 0)).collect();
    let mut consumers: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let edges: BTreeSet<(NodeId, NodeId)> = desc
        .links
        .iter()
        .filter(|l| l.enabled)
        .filter(|l| descriptors.contains_key(&l.from_node) && descriptors.contains_key(&l.to_node))
        .map(|l| (l.from_node, l.to_node))
        .collect();
    for &(from, to) in &edges {
        consumers.entry(from).or_default().push(to);
        *indegree.entry(to).or_default() += 1;
    }

    let mut ready: Vec<NodeId> = indegree
        .iter()
        .filter(|&(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect();
    while let Some(node) = ready.pop() {
        indegree.remove(&node);
        for next in consumers.get(&node).into_iter().flatten() {
            if let Some(d) = indegree.get_mut(next) {
                *d -= 1;
                if *d == 0 {
                    ready.push(*next);
                }
            }
        }
    }

    (!indegree.is_empty()).then(|| indegree.into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_registry::BuiltinRegistry;

    fn types() -> NodeTypeRegistry {
        BuiltinRegistry::new().into_node_types()
    }

    #[test]
    fn test_valid_chain() {
        let mut desc = GraphDescription::new();
        let osc = desc.add_node("audio.sine");
        desc.set_input(osc, "frequency", "220");
        let out = desc.add_node("audio.output");
        desc.link(osc, "audio", out, "audio");

        assert_eq!(validate_description(&desc, &types()), Ok(()));
    }

    #[test]
    fn test_unknown_type() {
        let mut desc = GraphDescription::new();
        let bad = desc.add_node("audio.theremin");

        assert_eq!(
            validate_description(&desc, &types()),
            Err(ValidationError::UnknownNodeType {
                node: bad,
                type_name: "audio.theremin".to_string(),
            })
        );
    }

    #[test]
    fn test_node_id_out_of_range() {
        let mut desc = GraphDescription::new();
        let osc = desc.add_node("audio.sine");
        let huge = NodeId::new(4_000_000_000);
        desc.node_mut(osc).unwrap().id = huge;

        assert_eq!(
            validate_description(&desc, &types()),
            Err(ValidationError::NodeIdOutOfRange(huge))
        );
    }

    #[test]
    fn test_unknown_socket_and_type_mismatch() {
        let mut desc = GraphDescription::new();
        let timer = desc.add_node("trigger.timer");
        let delay = desc.add_node("audio.delay");
        desc.link(timer, "trigger", delay, "value");
        desc.link(timer, "tick", delay, "delay");

        let errors = collect_errors(&desc, &types());
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(matches!(errors[0], ValidationError::TypeMismatch { to: SocketType::Signal, .. }));
        assert!(matches!(
            errors[1],
            ValidationError::UnknownSocket { direction: "output", ref socket, .. } if socket == "tick"
        ));
    }

    #[test]
    fn test_dynamic_links_skip_socket_checks() {
        let mut desc = GraphDescription::new();
        let literal = desc.add_node("value.literal");
        let poly = desc.add_node("audio.graph.poly");
        let link = desc.link(literal, "value", poly, "pitch");
        desc.link_mut(link).unwrap().dynamic = true;
        desc.set_input(poly, "cutoff", "0.5");

        assert_eq!(validate_description(&desc, &types()), Ok(()));
    }

    #[test]
    fn test_invalid_literal() {
        let mut desc = GraphDescription::new();
        let timer = desc.add_node("trigger.timer");
        desc.set_input(timer, "interval", "soon");

        assert!(matches!(
            validate_description(&desc, &types()),
            Err(ValidationError::InvalidLiteral { ty: SocketType::Float, .. })
        ));
    }

    #[test]
    fn test_second_producer() {
        let mut desc = GraphDescription::new();
        let a = desc.add_node("value.literal");
        let b = desc.add_node("value.literal");
        let out = desc.add_node("audio.output");
        desc.link(a, "value", out, "audio");
        desc.link(b, "value", out, "audio");

        assert!(matches!(
            validate_description(&desc, &types()),
            Err(ValidationError::InputOccupied { .. })
        ));
    }

    #[test]
    fn test_cycle() {
        let mut desc = GraphDescription::new();
        let a = desc.add_node("math.add");
        let b = desc.add_node("math.mul");
        let c = desc.add_node("audio.output");
        desc.link(a, "result", b, "a");
        desc.link(b, "result", a, "a");
        desc.link(b, "result", c, "audio");

        match validate_description(&desc, &types()) {
            Err(ValidationError::Cycle(nodes)) => {
                assert!(nodes.contains(&a) && nodes.contains(&b));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_disabled_links_are_ignored() {
        let mut desc = GraphDescription::new();
        let a = desc.add_node("math.add");
        let b = desc.add_node("math.add");
        desc.link(a, "result", b, "a");
        let back = desc.link(b, "result", a, "a");
        desc.link_mut(back).unwrap().enabled = false;

        assert_eq!(validate_description(&desc, &types()), Ok(()));
    }

    #[test]
    fn test_collects_everything() {
        let mut desc = GraphDescription::new();
        desc.add_node("nope.a");
        desc.add_node("nope.b");

        match validate_description(&desc, &types()) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
