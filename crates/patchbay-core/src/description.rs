//! Serialized form of a graph: nodes, literals, embedded resources and links.
//!
//! A [`GraphDescription`] is what editors save and what
//! [`Graph::build`](crate::Graph::build) consumes. The on-disk format is XML:
//!
//! ```xml
//! <graph nextNodeId="3" nextLinkId="2">
//!   <node id="1" typeName="audio.sine">
//!     <input socket="frequency" value="220"/>
//!   </node>
//!   <node id="2" typeName="audio.output" passthrough="0"/>
//!   <link id="1" srcNodeId="2" srcNodeSocketName="audio"
//!         dstNodeId="1" dstNodeSocketName="audio"/>
//! </graph>
//! ```
//!
//! In a `<link>`, the `src*` attributes name the consuming node and input and
//! the `dst*` attributes the producing node and output. The Rust types use
//! `from_*` for the producer and `to_*` for the consumer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::NodeId;

/// A graph description that could not be read or written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptionError {
    /// The XML is malformed or does not have the graph shape.
    #[error("failed to parse graph description: {0}")]
    Parse(String),
    /// The description could not be written out.
    #[error("failed to serialize graph description: {0}")]
    Serialize(String),
}

/// A resource payload embedded in a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDescription {
    /// Registered resource type.
    pub kind: String,
    /// Name of the resource within its node.
    pub name: String,
    /// Payload text handed to the resource's `load`.
    pub data: String,
}

/// One node of a description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDescription {
    /// Stable node id.
    pub id: NodeId,
    /// Registered node type.
    pub type_name: String,
    /// Whether the node starts bypassed.
    pub passthrough: bool,
    /// Editor-only value, round-tripped untouched.
    pub editor_value: Option<String>,
    /// Input literals by socket name.
    pub inputs: BTreeMap<String, String>,
    /// Embedded resource payloads.
    pub resources: Vec<ResourceDescription>,
}

impl NodeDescription {
    /// Payload for resource `(kind, name)`.
    pub fn resource(&self, kind: &str, name: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.name == name)
            .map(|r| r.data.as_str())
    }

    /// Stores the payload for resource `(kind, name)`, replacing any previous one.
    pub fn set_resource(&mut self, kind: &str, name: &str, data: impl Into<String>) {
        let data = data.into();
        if let Some(existing) = self
            .resources
            .iter_mut()
            .find(|r| r.kind == kind && r.name == name)
        {
            existing.data = data;
        } else {
            self.resources.push(ResourceDescription {
                kind: kind.to_string(),
                name: name.to_string(),
                data,
            });
        }
    }
}

/// One link of a description, from a producer output to a consumer input.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescription {
    /// Stable link id.
    pub id: u32,
    /// Disabled links are kept in the file but not wired.
    pub enabled: bool,
    /// Whether either end is a dynamic socket.
    pub dynamic: bool,
    /// Producing node.
    pub from_node: NodeId,
    /// Producing output name.
    pub from_socket: String,
    /// Consuming node.
    pub to_node: NodeId,
    /// Consuming input name.
    pub to_socket: String,
    /// Free-form link parameters (`in.min`, `out.max`, ...).
    pub params: BTreeMap<String, String>,
}

/// A complete graph description.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDescription {
    /// Nodes in file order.
    pub nodes: Vec<NodeDescription>,
    /// Links in file order.
    pub links: Vec<LinkDescription>,
    /// Id the next added node gets.
    pub next_node_id: u32,
    /// Id the next added link gets.
    pub next_link_id: u32,
}

impl Default for GraphDescription {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphDescription {
    /// Creates an empty description. Ids start at 1.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            next_node_id: 1,
            next_link_id: 1,
        }
    }

    /// Appends a node of type `type_name` and returns its id.
    pub fn add_node(&mut self, type_name: &str) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(NodeDescription {
            id,
            type_name: type_name.to_string(),
            ..NodeDescription::default()
        });
        id
    }

    /// Node `id`.
    pub fn node(&self, id: NodeId) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node `id` for editing.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeDescription> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Sets the literal of input `socket` on node `id`.
    ///
    /// Returns `false` if the node does not exist.
    pub fn set_input(&mut self, id: NodeId, socket: &str, value: impl Into<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.inputs.insert(socket.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// Links output `from_socket` of `from` to input `to_socket` of `to`.
    pub fn link(&mut self, from: NodeId, from_socket: &str, to: NodeId, to_socket: &str) -> u32 {
        let id = self.next_link_id;
        self.next_link_id += 1;
        self.links.push(LinkDescription {
            id,
            enabled: true,
            dynamic: false,
            from_node: from,
            from_socket: from_socket.to_string(),
            to_node: to,
            to_socket: to_socket.to_string(),
            params: BTreeMap::new(),
        });
        id
    }

    /// Link `id` for editing.
    pub fn link_mut(&mut self, id: u32) -> Option<&mut LinkDescription> {
        self.links.iter_mut().find(|l| l.id == id)
    }

    /// Parses the XML form.
    pub fn parse(xml: &str) -> Result<Self, DescriptionError> {
        let raw: GraphXml =
            quick_xml::de::from_str(xml).map_err(|e| DescriptionError::Parse(e.to_string()))?;
        Ok(raw.into())
    }

    /// Writes the XML form, indented by two spaces.
    pub fn to_xml_string(&self) -> Result<String, DescriptionError> {
        let raw = GraphXml::from(self);
        let mut out = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut out);
        serializer.indent(' ', 2);
        raw.serialize(serializer)
            .map_err(|e| DescriptionError::Serialize(e.to_string()))?;
        Ok(out)
    }
}

impl std::str::FromStr for GraphDescription {
    type Err = DescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_flag(text: Option<&str>, default: bool) -> bool {
    match text.map(str::trim) {
        Some("1" | "true") => true,
        Some("0" | "false") => false,
        _ => default,
    }
}

fn flag_text(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "graph")]
struct GraphXml {
    #[serde(rename = "@nextNodeId", default)]
    next_node_id: u32,
    #[serde(rename = "@nextLinkId", default)]
    next_link_id: u32,
    #[serde(rename = "node", default)]
    nodes: Vec<NodeXml>,
    #[serde(rename = "link", default)]
    links: Vec<LinkXml>,
}

#[derive(Serialize, Deserialize)]
struct NodeXml {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@typeName")]
    type_name: String,
    #[serde(rename = "@passthrough", default, skip_serializing_if = "Option::is_none")]
    passthrough: Option<String>,
    #[serde(rename = "@editorValue", default, skip_serializing_if = "Option::is_none")]
    editor_value: Option<String>,
    #[serde(rename = "input", default)]
    inputs: Vec<InputXml>,
    #[serde(rename = "resource", default)]
    resources: Vec<ResourceXml>,
}

#[derive(Serialize, Deserialize)]
struct InputXml {
    #[serde(rename = "@socket")]
    socket: String,
    #[serde(rename = "@value", default)]
    value: String,
}

#[derive(Serialize, Deserialize)]
struct ResourceXml {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    data: String,
}

#[derive(Serialize, Deserialize)]
struct LinkXml {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@enabled", default, skip_serializing_if = "Option::is_none")]
    enabled: Option<String>,
    #[serde(rename = "@dynamic", default, skip_serializing_if = "Option::is_none")]
    dynamic: Option<String>,
    #[serde(rename = "@srcNodeId")]
    src_node_id: u32,
    #[serde(rename = "@srcNodeSocketName")]
    src_socket: String,
    #[serde(rename = "@dstNodeId")]
    dst_node_id: u32,
    #[serde(rename = "@dstNodeSocketName")]
    dst_socket: String,
    #[serde(rename = "param", default)]
    params: Vec<ParamXml>,
}

#[derive(Serialize, Deserialize)]
struct ParamXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@value")]
    value: String,
}

impl From<GraphXml> for GraphDescription {
    fn from(raw: GraphXml) -> Self {
        let nodes: Vec<NodeDescription> = raw
            .nodes
            .into_iter()
            .map(|n| NodeDescription {
                id: NodeId::new(n.id),
                type_name: n.type_name,
                passthrough: parse_flag(n.passthrough.as_deref(), false),
                editor_value: n.editor_value,
                inputs: n.inputs.into_iter().map(|i| (i.socket, i.value)).collect(),
                resources: n
                    .resources
                    .into_iter()
                    .map(|r| ResourceDescription {
                        kind: r.kind,
                        name: r.name,
                        data: r.data,
                    })
                    .collect(),
            })
            .collect();
        let links: Vec<LinkDescription> = raw
            .links
            .into_iter()
            .map(|l| LinkDescription {
                id: l.id,
                enabled: parse_flag(l.enabled.as_deref(), true),
                dynamic: parse_flag(l.dynamic.as_deref(), false),
                from_node: NodeId::new(l.dst_node_id),
                from_socket: l.dst_socket,
                to_node: NodeId::new(l.src_node_id),
                to_socket: l.src_socket,
                params: l.params.into_iter().map(|p| (p.name, p.value)).collect(),
            })
            .collect();

        // Files written by hand may omit or understate the counters.
        let max_node = nodes.iter().map(|n| n.id.index()).max().unwrap_or(0);
        let max_link = links.iter().map(|l| l.id).max().unwrap_or(0);
        Self {
            next_node_id: raw.next_node_id.max(max_node.saturating_add(1)),
            next_link_id: raw.next_link_id.max(max_link.saturating_add(1)),
            nodes,
            links,
        }
    }
}

impl From<&GraphDescription> for GraphXml {
    fn from(desc: &GraphDescription) -> Self {
        Self {
            next_node_id: desc.next_node_id,
            next_link_id: desc.next_link_id,
            nodes: desc
                .nodes
                .iter()
                .map(|n| NodeXml {
                    id: n.id.index(),
                    type_name: n.type_name.clone(),
                    passthrough: n.passthrough.then(|| flag_text(true)),
                    editor_value: n.editor_value.clone(),
                    inputs: n
                        .inputs
                        .iter()
                        .map(|(socket, value)| InputXml {
                            socket: socket.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                    resources: n
                        .resources
                        .iter()
                        .map(|r| ResourceXml {
                            kind: r.kind.clone(),
                            name: r.name.clone(),
                            data: r.data.clone(),
                        })
                        .collect(),
                })
                .collect(),
            links: desc
                .links
                .iter()
                .map(|l| LinkXml {
                    id: l.id,
                    enabled: (!l.enabled).then(|| flag_text(false)),
                    dynamic: l.dynamic.then(|| flag_text(true)),
                    src_node_id: l.to_node.index(),
                    src_socket: l.to_socket.clone(),
                    dst_node_id: l.from_node.index(),
                    dst_socket: l.from_socket.clone(),
                    params: l
                        .params
                        .iter()
                        .map(|(name, value)| ParamXml {
                            name: name.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
