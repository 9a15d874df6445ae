//! Property-based tests for the patchbay-core graph engine.
//!
//! Random topologies check the traversal invariants (every node once per
//! frame, producers first, no cycles ever accepted). Resources are released
//! in random orders, and the numeric helpers are checked over random ranges.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use patchbay_core::{
    ControlBridge, ControlSpec, Graph, GraphEnv, Node, NodeContext, NodeId, NodeTypeDescriptor,
    NodeTypeRegistry, Remap, Resource, ResourceError, ResourceRegistry, SignalFloat, SocketType,
    Value,
};
use proptest::prelude::*;

/// Logs its id on every tick.
struct Recorder {
    log: Arc<Mutex<Vec<NodeId>>>,
}

impl Node for Recorder {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        self.log.lock().push(ctx.id());
    }
}

const INPUTS: usize = 4;

fn recorder_graph(log: &Arc<Mutex<Vec<NodeId>>>) -> Graph {
    let mut types = NodeTypeRegistry::new();
    let mut descriptor = NodeTypeDescriptor::new("test.recorder").output("out", SocketType::Float);
    for i in 0..INPUTS {
        descriptor = descriptor.input(format!("in{i}"), SocketType::Float);
    }
    let log = Arc::clone(log);
    types.register(descriptor, move || {
        Box::new(Recorder {
            log: Arc::clone(&log),
        })
    });
    Graph::new(GraphEnv::new(
        Arc::new(types),
        Arc::new(ResourceRegistry::new()),
    ))
}

static CREATED: AtomicUsize = AtomicUsize::new(0);
static DROPPED: AtomicUsize = AtomicUsize::new(0);

/// Counts constructions and drops.
struct Counted;

impl Counted {
    fn new() -> Self {
        CREATED.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        DROPPED.fetch_add(1, Ordering::SeqCst);
    }
}

impl Resource for Counted {
    fn load(&mut self, _payload: &str) -> Result<(), ResourceError> {
        Ok(())
    }

    fn save(&self) -> String {
        String::new()
    }
}

/// Up to 12 nodes and 30 candidate edges `(from, to, input)`.
fn topology() -> impl Strategy<Value = (usize, Vec<(usize, usize, usize)>)> {
    (2usize..12).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n, 0..INPUTS), 0..30),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever edges are attempted, accepted ones never form a cycle, and a
    /// frame ticks every node exactly once with producers first.
    #[test]
    fn frames_visit_each_node_once_in_dependency_order((n, edges) in topology()) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut graph = recorder_graph(&log);
        let ids: Vec<NodeId> = (0..n).map(|_| graph.add_node("test.recorder").unwrap()).collect();

        let mut accepted = Vec::new();
        for (from, to, input) in edges {
            let (from, to) = (ids[from], ids[to]);
            if graph.connect(from, "out", to, &format!("in{input}")).is_ok() {
                accepted.push((from, to));
            }
        }

        prop_assert!(graph.topological_order().is_ok());
        prop_assert_eq!(graph.edge_count(), accepted.len());

        for _ in 0..2 {
            log.lock().clear();
            graph.tick(0.01);
            let ticks = log.lock().clone();
            prop_assert_eq!(ticks.len(), n);
            let pos = |id: NodeId| ticks.iter().position(|&t| t == id);
            for &id in &ids {
                prop_assert!(pos(id).is_some(), "{} never ticked", id);
            }
            for &(from, to) in &accepted {
                prop_assert!(pos(from) < pos(to), "{} ticked after {}", from, to);
            }
        }
    }

    /// Values inside the input range land inside the output range.
    #[test]
    fn remap_stays_in_output_range(
        in_min in -100.0f32..100.0,
        in_span in 0.01f32..100.0,
        out_min in -100.0f32..100.0,
        out_span in 0.0f32..100.0,
        t in 0.0f32..=1.0,
    ) {
        let remap = Remap {
            in_min,
            in_max: in_min + in_span,
            out_min,
            out_max: out_min + out_span,
        };
        let out = remap.apply(in_min + t * in_span);
        let eps = 1e-3 * (1.0 + out_min.abs() + out_span);
        prop_assert!(out >= out_min - eps && out <= out_min + out_span + eps, "{}", out);
    }

    /// Smoothed values move monotonically toward the target without
    /// overshooting it.
    #[test]
    fn smoothing_never_overshoots(
        smoothness in 0.0f32..=1.0,
        target in 0.0f32..=1.0,
        steps in prop::collection::vec(0.0001f32..0.1, 1..50),
    ) {
        let bridge = ControlBridge::new();
        bridge.register("x", ControlSpec::new(0.0, 1.0, 0.0).with_smoothness(smoothness));
        bridge.set_desired("x", target);

        let mut previous = 0.0f32;
        for dt in steps {
            bridge.sync(dt);
            let current = bridge.current("x").unwrap();
            prop_assert!(current >= previous - 1e-6 && current <= target + 1e-6,
                "current {} after {}, target {}", current, previous, target);
            previous = current;
        }
    }

    /// Float literals parse back to the value they were printed from.
    #[test]
    fn float_literals_parse_exactly(v in -1.0e6f32..1.0e6) {
        let parsed = Value::parse_literal(SocketType::Float, &v.to_string()).unwrap();
        prop_assert_eq!(parsed, Value::Float(v));
    }

    /// However the holders release it, a shared resource is built once and
    /// dropped once, on the last release.
    #[test]
    fn resources_drop_once_in_any_release_order(
        order in (1usize..16).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let mut registry = ResourceRegistry::new();
        registry.register_type::<Counted>("counted", Counted::new);
        let node = NodeId::new(7);
        let created = CREATED.load(Ordering::SeqCst);
        let dropped = DROPPED.load(Ordering::SeqCst);

        let mut handles: Vec<_> = order
            .iter()
            .map(|_| registry.acquire::<Counted>(node, "counted", "shared", None).map(Some))
            .collect::<Option<Vec<_>>>()
            .unwrap();
        prop_assert_eq!(CREATED.load(Ordering::SeqCst), created + 1);
        prop_assert_eq!(registry.ref_count(node, "counted", "shared"), order.len());

        for (released, &i) in order.iter().enumerate() {
            let handle = handles[i].take().unwrap();
            let last = registry.release(handle);
            prop_assert_eq!(last, released + 1 == order.len());
            let expected_drops = usize::from(last);
            prop_assert_eq!(DROPPED.load(Ordering::SeqCst), dropped + expected_drops);
        }
        prop_assert!(registry.is_empty());
        prop_assert_eq!(CREATED.load(Ordering::SeqCst), created + 1);
    }

    /// A scalar expands to a vector of itself, and setting a scalar after a
    /// vector leaves no stale samples behind.
    #[test]
    fn scalar_and_vector_round_trip(
        samples in prop::collection::vec(-10.0f32..10.0, 1..256),
        v in -10.0f32..10.0,
    ) {
        let mut signal = SignalFloat::from_samples(&samples);
        prop_assert!(!signal.is_scalar());

        signal.set_scalar(v);
        prop_assert!(signal.is_scalar());
        prop_assert!((0..signal.len()).all(|i| signal.sample(i) == v));

        prop_assert!(signal.expanded().iter().all(|&s| s == v));
        prop_assert_eq!(signal.mean(), v);
    }
}
