//! Graph edge types.
//!
//! An `Edge` connects one output socket to one input socket. Sockets are
//! remembered both by index and by name: dynamic sockets can disappear and
//! come back, and an edge whose socket is currently missing stays in the graph
//! *unresolved* (its index is `None`) until a socket with the same name shows
//! up again.

use std::collections::BTreeMap;
use std::fmt;

use super::node::NodeId;

/// Unique identifier for an edge in a graph.
///
/// Edge IDs come from the graph description (link ids) or are assigned
/// sequentially by live edits. They are never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Linear remapping applied to numeric values read through an edge.
///
/// Built from the `in.min`, `in.max`, `out.min` and `out.max` link params.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Remap {
    /// Input range start.
    pub in_min: f32,
    /// Input range end.
    pub in_max: f32,
    /// Output range start.
    pub out_min: f32,
    /// Output range end.
    pub out_max: f32,
}

impl Remap {
    /// Extracts a remap from link params, if any of the four keys is present.
    ///
    /// Missing keys default to the unit range. Unparsable values count as `0`.
    pub fn from_params(params: &BTreeMap<String, String>) -> Option<Self> {
        const KEYS: [&str; 4] = ["in.min", "in.max", "out.min", "out.max"];
        if !KEYS.iter().any(|k| params.contains_key(*k)) {
            return None;
        }
        let get = |key: &str, default: f32| {
            params
                .get(key)
                .map_or(default, |v| v.trim().parse().unwrap_or(0.0))
        };
        Some(Self {
            in_min: get("in.min", 0.0),
            in_max: get("in.max", 1.0),
            out_min: get("out.min", 0.0),
            out_max: get("out.max", 1.0),
        })
    }

    /// Maps `value` from the input range onto the output range.
    pub fn apply(&self, value: f32) -> f32 {
        let span = self.in_max - self.in_min;
        if span == 0.0 {
            return self.out_min;
        }
        let t = (value - self.in_min) / span;
        self.out_min + t * (self.out_max - self.out_min)
    }
}

/// A directed connection from an output socket to an input socket.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    /// Producing node.
    pub from: NodeId,
    /// Output index on the producer, `None` while unresolved.
    pub from_socket: Option<usize>,
    /// Output socket name on the producer.
    pub from_name: String,
    /// Consuming node.
    pub to: NodeId,
    /// Input index on the consumer, `None` while unresolved.
    pub to_socket: Option<usize>,
    /// Input socket name on the consumer.
    pub to_name: String,
    /// Optional numeric remapping.
    pub remap: Option<Remap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn no_remap_without_keys() {
        assert!(Remap::from_params(&params(&[("color", "red")])).is_none());
    }

    #[test]
    fn remap_defaults_to_unit_range() {
        let remap = Remap::from_params(&params(&[("out.max", "10")])).unwrap();
        assert_eq!(remap.apply(0.5), 5.0);
    }

    #[test]
    fn degenerate_input_range_yields_out_min() {
        let remap = Remap::from_params(&params(&[("in.min", "1"), ("in.max", "1")])).unwrap();
        assert_eq!(remap.apply(3.0), 0.0);
    }
}
