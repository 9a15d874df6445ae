//! Integration tests for the patchbay-core graph engine.
//!
//! Exercises whole graphs through the public API with small test-only node
//! types: traversal order, trigger delivery, passthrough, dynamic sockets,
//! draw nesting, all-or-nothing construction, graph files, control values
//! shared with another thread and resource lifetimes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use patchbay_core::{
    Color, ControlSpec, DrawCommand, DrawContext, DynamicSocket, Graph, GraphDescription,
    GraphEnv, GraphError, Node, NodeContext, NodeFlags, NodeId, NodeTypeDescriptor,
    NodeTypeRegistry, RecordingBackend, Resource, ResourceError, ResourceHandle,
    ResourceRegistry, Shape, SocketType, SubTraversal, SurfaceId, TriggerData, Value,
};

type Log = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Test nodes
// ============================================================================

/// `out = in + aux + 1`, logging every lifecycle hook.
struct Step {
    log: Log,
}

impl Node for Step {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        self.log.lock().push(format!("init {}", ctx.id().index()));
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        self.log.lock().push(format!("tick {}", ctx.id().index()));
        let (inputs, mut outputs) = ctx.io();
        outputs.set_float(0, inputs.float(0, 0.0) + inputs.float(1, 0.0) + 1.0);
    }

    fn shut(&mut self, ctx: &mut NodeContext<'_>) {
        self.log.lock().push(format!("shut {}", ctx.id().index()));
    }
}

/// Fires its trigger output once per tick, carrying a float payload.
struct Fire {
    log: Log,
}

impl Node for Fire {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        self.log.lock().push("fire begin".into());
        ctx.trigger_with(0, TriggerData::Float(2.5));
        self.log.lock().push("fire end".into());
    }
}

/// Counts triggers and remembers the last payload.
struct Sink {
    log: Log,
    hits: i32,
}

impl Node for Sink {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {
        self.log.lock().push("sink tick".into());
    }

    fn handle_trigger(&mut self, ctx: &mut NodeContext<'_>, _input: usize, data: &TriggerData) {
        self.log.lock().push("sink handled".into());
        self.hits += 1;
        let mut outputs = ctx.outputs();
        outputs.set_int(0, self.hits);
        outputs.set_float(1, data.as_float());
    }
}

/// Re-fires every trigger it receives.
struct Relay {
    log: Log,
}

impl Node for Relay {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn handle_trigger(&mut self, ctx: &mut NodeContext<'_>, _input: usize, data: &TriggerData) {
        self.log.lock().push("relay handled".into());
        ctx.trigger_with(0, *data);
    }
}

/// Declares one float input per comma-separated name and sums them.
struct Mixer;

impl Node for Mixer {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let names: Vec<DynamicSocket> = ctx
            .inputs()
            .string(0, "")
            .split(',')
            .filter(|n| !n.is_empty())
            .map(|n| DynamicSocket::new(n.trim(), SocketType::Float))
            .collect();
        ctx.set_dynamic_inputs(&names);

        let start = ctx.dynamic_inputs_start();
        let (inputs, mut outputs) = ctx.io();
        let sum: f32 = (start..inputs.len()).map(|i| inputs.float(i, 0.0)).sum();
        outputs.set_float(0, sum);
    }
}

/// Outputs how many times it has ticked.
struct Counter {
    n: f32,
}

impl Node for Counter {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        self.n += 1.0;
        ctx.outputs().set_float(0, self.n);
    }
}

/// Ticks its upstream four times per frame and outputs the sum of the reads.
struct Oversample {
    acc: f32,
}

impl Node for Oversample {
    fn custom_traverse_tick(&mut self, traversal: &mut SubTraversal<'_>, dt: f32) {
        self.acc = 0.0;
        for _ in 0..4 {
            traversal.tick_predecessors(dt / 4.0);
            self.acc += traversal.inputs().float(0, 0.0);
        }
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        ctx.outputs().set_float(0, self.acc);
    }

    // A root, so the frame reaches it before any plain visit of its upstream.
    fn flags(&self) -> NodeFlags {
        NodeFlags::CUSTOM_TRAVERSE_TICK | NodeFlags::ROOT
    }
}

/// Draw root rendering into its own surface.
struct Screen;

impl Node for Screen {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn before_draw(&self, ctx: &mut DrawContext<'_>) {
        ctx.backend().push_surface(SurfaceId(7), 64, 64);
    }

    fn after_draw(&self, ctx: &mut DrawContext<'_>) {
        let backend = ctx.backend();
        backend.pop_surface();
        backend.present(Default::default());
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags::ROOT
    }
}

/// Draws one rect sized after its node id, inside its own matrix.
struct Layer;

impl Node for Layer {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn before_draw(&self, ctx: &mut DrawContext<'_>) {
        ctx.backend().push_matrix();
    }

    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let size = ctx.id().index() as f32;
        ctx.backend().draw_primitive(Shape::Rect, size, Color::WHITE);
    }

    fn after_draw(&self, ctx: &mut DrawContext<'_>) {
        ctx.backend().pop_matrix();
    }
}

/// Reads control value `cutoff`, registered for the node's lifetime.
struct Knob;

impl Node for Knob {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        ctx.controls()
            .register("cutoff", ControlSpec::new(0.0, 100.0, 10.0));
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let value = ctx.controls().current("cutoff").unwrap_or(0.0);
        ctx.outputs().set_float(0, value);
    }

    fn shut(&mut self, ctx: &mut NodeContext<'_>) {
        ctx.controls().unregister("cutoff");
    }
}

static NOTES_CREATED: AtomicUsize = AtomicUsize::new(0);
static NOTES_DROPPED: AtomicUsize = AtomicUsize::new(0);

struct Note {
    text: String,
}

impl Note {
    fn new() -> Self {
        NOTES_CREATED.fetch_add(1, Ordering::SeqCst);
        Self {
            text: String::new(),
        }
    }
}

impl Drop for Note {
    fn drop(&mut self) {
        NOTES_DROPPED.fetch_add(1, Ordering::SeqCst);
    }
}

impl Resource for Note {
    fn load(&mut self, payload: &str) -> Result<(), ResourceError> {
        self.text = payload.to_string();
        Ok(())
    }

    fn save(&self) -> String {
        self.text.clone()
    }
}

/// Holds a `note` resource from `init` to `shut` and outputs its text.
#[derive(Default)]
struct Noted {
    note: Option<ResourceHandle<Note>>,
}

impl Node for Noted {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        self.note = ctx.acquire_resource::<Note>("note", "text");
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        if let Some(note) = &self.note {
            let text = note.lock().text.clone();
            ctx.outputs().set_string(0, &text);
        }
    }

    fn shut(&mut self, ctx: &mut NodeContext<'_>) {
        if let Some(note) = self.note.take() {
            ctx.release_resource(note);
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn env_with_log(log: &Log) -> GraphEnv {
    let mut types = NodeTypeRegistry::new();

    let l = log.clone();
    types.register(
        NodeTypeDescriptor::new("test.step")
            .input_with_default("in", SocketType::Float, "0")
            .input_with_default("aux", SocketType::Float, "0")
            .output("out", SocketType::Float),
        move || Box::new(Step { log: l.clone() }),
    );
    let l = log.clone();
    types.register(
        NodeTypeDescriptor::new("test.fire").output("fire", SocketType::Trigger),
        move || Box::new(Fire { log: l.clone() }),
    );
    let l = log.clone();
    types.register(
        NodeTypeDescriptor::new("test.sink")
            .input("event", SocketType::Trigger)
            .output("hits", SocketType::Int)
            .output("payload", SocketType::Float),
        move || {
            Box::new(Sink {
                log: l.clone(),
                hits: 0,
            })
        },
    );
    let l = log.clone();
    types.register(
        NodeTypeDescriptor::new("test.relay")
            .input("event", SocketType::Trigger)
            .output("out", SocketType::Trigger),
        move || Box::new(Relay { log: l.clone() }),
    );
    types.register(
        NodeTypeDescriptor::new("test.mixer")
            .input("names", SocketType::String)
            .output("sum", SocketType::Float),
        || Box::new(Mixer),
    );
    types.register(
        NodeTypeDescriptor::new("test.counter").output("count", SocketType::Float),
        || Box::new(Counter { n: 0.0 }),
    );
    types.register(
        NodeTypeDescriptor::new("test.oversample")
            .input("in", SocketType::Float)
            .output("sum", SocketType::Float),
        || Box::new(Oversample { acc: 0.0 }),
    );
    types.register(
        NodeTypeDescriptor::new("test.screen").input("scene", SocketType::Draw),
        || Box::new(Screen),
    );
    types.register(
        NodeTypeDescriptor::new("test.layer")
            .input("below", SocketType::Draw)
            .output("draw", SocketType::Draw),
        || Box::new(Layer),
    );
    types.register(
        NodeTypeDescriptor::new("test.knob").output("value", SocketType::Float),
        || Box::new(Knob),
    );
    types.register(
        NodeTypeDescriptor::new("test.noted").output("text", SocketType::String),
        || Box::new(Noted::default()),
    );

    let mut resources = ResourceRegistry::new();
    resources.register_type::<Note>("note", Note::new);

    GraphEnv::new(Arc::new(types), Arc::new(resources))
}

fn env() -> GraphEnv {
    env_with_log(&Log::default())
}

fn float(graph: &Graph, id: patchbay_core::NodeId, name: &str) -> f32 {
    graph
        .output_value(id, name)
        .and_then(Value::as_float)
        .unwrap_or(f32::NAN)
}

// ============================================================================
// 1. Traversal
// ============================================================================

#[test]
fn diamond_ticks_each_node_once_producers_first() {
    let log = Log::default();
    let mut graph = Graph::new(env_with_log(&log));
    let a = graph.add_node("test.step").unwrap();
    let b = graph.add_node("test.step").unwrap();
    let c = graph.add_node("test.step").unwrap();
    let d = graph.add_node("test.step").unwrap();
    graph.connect(a, "out", b, "in").unwrap();
    graph.connect(a, "out", c, "in").unwrap();
    graph.connect(b, "out", d, "in").unwrap();
    graph.connect(c, "out", d, "aux").unwrap();
    log.lock().clear();

    graph.tick(0.01);

    let ticks = log.lock().clone();
    assert_eq!(ticks.len(), 4, "every node ticks exactly once: {ticks:?}");
    assert_eq!(ticks[0], format!("tick {}", a.index()));
    assert_eq!(ticks[3], format!("tick {}", d.index()));
    // a = 1, b = c = 2, d = 2 + 2 + 1
    assert_eq!(float(&graph, d, "out"), 5.0);
}

#[test]
fn topological_order_lists_producers_first() {
    let mut graph = Graph::new(env());
    let a = graph.add_node("test.step").unwrap();
    let b = graph.add_node("test.step").unwrap();
    let c = graph.add_node("test.step").unwrap();
    graph.connect(c, "out", b, "in").unwrap();
    graph.connect(b, "out", a, "in").unwrap();

    let order = graph.topological_order().unwrap();
    let pos = |id| order.iter().position(|&n| n == id).unwrap();
    assert!(pos(c) < pos(b));
    assert!(pos(b) < pos(a));
}

#[test]
fn cycles_are_rejected_and_leave_graph_unchanged() {
    let mut graph = Graph::new(env());
    let a = graph.add_node("test.step").unwrap();
    let b = graph.add_node("test.step").unwrap();
    let c = graph.add_node("test.step").unwrap();
    graph.connect(a, "out", b, "in").unwrap();
    graph.connect(b, "out", c, "in").unwrap();

    assert_eq!(
        graph.connect(c, "out", a, "in"),
        Err(GraphError::CycleDetected)
    );
    assert_eq!(
        graph.connect(a, "out", a, "aux"),
        Err(GraphError::CycleDetected)
    );
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.topological_order().is_ok());
}

#[test]
fn custom_traversal_sub_samples_upstream() {
    let mut graph = Graph::new(env());
    let counter = graph.add_node("test.counter").unwrap();
    let over = graph.add_node("test.oversample").unwrap();
    graph.connect(counter, "count", over, "in").unwrap();

    graph.tick(0.01);
    // Upstream ran four times: 1 + 2 + 3 + 4.
    assert_eq!(float(&graph, over, "sum"), 10.0);
    // The main pass does not tick the counter a fifth time.
    assert_eq!(float(&graph, counter, "count"), 4.0);

    graph.tick(0.01);
    assert_eq!(float(&graph, over, "sum"), 5.0 + 6.0 + 7.0 + 8.0);
}

// ============================================================================
// 2. Triggers and passthrough
// ============================================================================

#[test]
fn triggers_are_delivered_before_fire_returns() {
    let log = Log::default();
    let mut graph = Graph::new(env_with_log(&log));
    let fire = graph.add_node("test.fire").unwrap();
    let sink = graph.add_node("test.sink").unwrap();
    graph.connect(fire, "fire", sink, "event").unwrap();

    graph.tick(0.01);

    assert_eq!(
        *log.lock(),
        vec!["fire begin", "sink handled", "fire end", "sink tick"]
    );
    assert_eq!(graph.output_value(sink, "hits"), Some(&Value::Int(1)));
    assert_eq!(float(&graph, sink, "payload"), 2.5);
}

#[test]
fn triggers_chain_through_relays_and_bypass() {
    let log = Log::default();
    let mut graph = Graph::new(env_with_log(&log));
    let fire = graph.add_node("test.fire").unwrap();
    let relay = graph.add_node("test.relay").unwrap();
    let sink = graph.add_node("test.sink").unwrap();
    graph.connect(fire, "fire", relay, "event").unwrap();
    graph.connect(relay, "out", sink, "event").unwrap();

    graph.tick(0.01);
    assert_eq!(
        log.lock()[..4],
        ["fire begin", "relay handled", "sink handled", "fire end"]
    );

    // Bypassed, the relay's handler is skipped but the trigger still passes.
    graph.set_bypass(relay, true);
    log.lock().clear();
    graph.tick(0.01);
    assert!(!log.lock().iter().any(|l| l == "relay handled"));
    assert_eq!(graph.output_value(sink, "hits"), Some(&Value::Int(2)));
    assert_eq!(float(&graph, sink, "payload"), 2.5);
}

#[test]
fn passthrough_forwards_first_input() {
    let mut graph = Graph::new(env());
    let a = graph.add_node("test.step").unwrap();
    let b = graph.add_node("test.step").unwrap();
    let c = graph.add_node("test.step").unwrap();
    graph.connect(a, "out", b, "in").unwrap();
    graph.connect(b, "out", c, "in").unwrap();
    graph.set_input_literal(a, "in", "1").unwrap();

    graph.tick(0.01);
    assert_eq!(float(&graph, c, "out"), 4.0);

    graph.set_bypass(b, true);
    graph.tick(0.01);
    assert_eq!(float(&graph, b, "out"), 2.0);
    assert_eq!(float(&graph, c, "out"), 3.0);
}

#[test]
fn passthrough_flag_from_description() {
    let mut desc = GraphDescription::new();
    let a = desc.add_node("test.step");
    let b = desc.add_node("test.step");
    desc.set_input(a, "in", "3");
    desc.link(a, "out", b, "in");
    desc.node_mut(b).unwrap().passthrough = true;

    let mut graph = Graph::build(&desc, env()).unwrap();
    assert!(graph.is_bypassed(b));
    graph.tick(0.01);
    assert_eq!(float(&graph, b, "out"), 4.0);
}

// ============================================================================
// 3. Dynamic sockets
// ============================================================================

#[test]
fn dynamic_links_survive_socket_rebuilds() {
    let mut desc = GraphDescription::new();
    let src = desc.add_node("test.step");
    let mixer = desc.add_node("test.mixer");
    desc.set_input(src, "in", "4");
    desc.set_input(mixer, "names", "a,b");
    desc.set_input(mixer, "a", "10");
    let link = desc.link(src, "out", mixer, "b");
    desc.link_mut(link).unwrap().dynamic = true;

    let mut graph = Graph::build(&desc, env()).unwrap();
    graph.tick(0.01);
    assert!(graph.is_input_connected(mixer, "b"));
    assert_eq!(float(&graph, mixer, "sum"), 15.0);

    // Dropping "b" leaves the edge pending.
    graph.set_input_literal(mixer, "names", "a").unwrap();
    graph.tick(0.01);
    assert!(!graph.is_input_connected(mixer, "b"));
    assert_eq!(float(&graph, mixer, "sum"), 10.0);
    assert_eq!(graph.edge_count(), 1);

    // Bringing it back, at a different index, resolves it again.
    graph.set_input_literal(mixer, "names", "b,a").unwrap();
    graph.tick(0.01);
    assert!(graph.is_input_connected(mixer, "b"));
    assert_eq!(graph.input_names(mixer), vec!["names", "b", "a"]);
    assert_eq!(float(&graph, mixer, "sum"), 15.0);
}

#[test]
fn static_links_to_missing_sockets_fail() {
    let mut desc = GraphDescription::new();
    let src = desc.add_node("test.step");
    let mixer = desc.add_node("test.mixer");
    desc.link(src, "out", mixer, "b");

    let err = Graph::build(&desc, env()).unwrap_err();
    assert_eq!(err.node, Some(mixer));
    assert!(matches!(err.source, GraphError::UnknownSocket { .. }));
}

// ============================================================================
// 4. Draw
// ============================================================================

#[test]
fn draw_nests_producers_inside_consumers() {
    let mut graph = Graph::new(env());
    let screen = graph.add_node("test.screen").unwrap();
    let top = graph.add_node("test.layer").unwrap();
    let bottom = graph.add_node("test.layer").unwrap();
    let orphan = graph.add_node("test.layer").unwrap();
    graph.connect(bottom, "draw", top, "below").unwrap();
    graph.connect(top, "draw", screen, "scene").unwrap();

    let mut backend = RecordingBackend::new();
    graph.draw(&mut backend);

    let rect = |id: patchbay_core::NodeId| {
        DrawCommand::Primitive(Shape::Rect, id.index() as f32, Color::WHITE)
    };
    let expected = vec![
        DrawCommand::PushSurface(SurfaceId(7), 64, 64),
        DrawCommand::PushMatrix,
        DrawCommand::PushMatrix,
        rect(bottom),
        DrawCommand::PopMatrix,
        rect(top),
        DrawCommand::PopMatrix,
        DrawCommand::PopSurface,
        DrawCommand::Present(Default::default()),
        DrawCommand::PushSurface(SurfaceId::SCRATCH, 0, 0),
        DrawCommand::PushMatrix,
        rect(orphan),
        DrawCommand::PopMatrix,
        DrawCommand::PopSurface,
    ];
    assert_eq!(backend.commands(), expected.as_slice());
    assert!(backend.is_balanced());
}

#[test]
fn draw_without_orphans_skips_scratch_surface() {
    let mut graph = Graph::new(env());
    let screen = graph.add_node("test.screen").unwrap();
    let layer = graph.add_node("test.layer").unwrap();
    graph.connect(layer, "draw", screen, "scene").unwrap();

    let mut backend = RecordingBackend::new();
    graph.draw(&mut backend);
    assert!(
        !backend
            .commands()
            .contains(&DrawCommand::PushSurface(SurfaceId::SCRATCH, 0, 0))
    );
}

// ============================================================================
// 5. Construction
// ============================================================================

#[test]
fn failed_build_never_inits_or_shuts() {
    let log = Log::default();
    let mut desc = GraphDescription::new();
    let a = desc.add_node("test.step");
    let b = desc.add_node("test.step");
    desc.link(a, "out", b, "missing");

    assert!(Graph::build(&desc, env_with_log(&log)).is_err());
    assert!(log.lock().is_empty(), "{:?}", log.lock());
}

#[test]
fn build_inits_producers_first_and_drop_shuts_all() {
    let log = Log::default();
    let mut desc = GraphDescription::new();
    let consumer = desc.add_node("test.step");
    let producer = desc.add_node("test.step");
    desc.link(producer, "out", consumer, "in");

    let graph = Graph::build(&desc, env_with_log(&log)).unwrap();
    assert_eq!(
        *log.lock(),
        vec![
            format!("init {}", producer.index()),
            format!("init {}", consumer.index()),
        ]
    );

    log.lock().clear();
    drop(graph);
    let shuts = log.lock().clone();
    assert_eq!(shuts.len(), 2);
    assert!(shuts.iter().all(|l| l.starts_with("shut")));
}

#[test]
fn graph_file_round_trip_builds_the_same_graph() {
    let mut desc = GraphDescription::new();
    let a = desc.add_node("test.step");
    let b = desc.add_node("test.step");
    desc.set_input(a, "in", "2");
    desc.set_input(b, "aux", "0.5");
    let link = desc.link(a, "out", b, "in");
    let params = &mut desc.link_mut(link).unwrap().params;
    params.insert("out.min".into(), "0".into());
    params.insert("out.max".into(), "2".into());

    let xml = desc.to_xml_string().unwrap();
    let parsed = GraphDescription::parse(&xml).unwrap();
    assert_eq!(parsed, desc);

    let mut graph = Graph::build(&parsed, env()).unwrap();
    graph.tick(0.01);
    // a.out = 3, remapped from [0, 1] to [0, 2] = 6, + 0.5 + 1
    assert_eq!(float(&graph, b, "out"), 7.5);
}

#[test]
fn graph_file_with_huge_node_id_is_rejected() {
    let xml = r#"<graph>
  <node id="1" typeName="test.step"/>
  <node id="4000000000" typeName="test.step"/>
  <node id="4294967295" typeName="test.step"/>
</graph>"#;
    let desc = GraphDescription::parse(xml).unwrap();
    assert_eq!(desc.next_node_id, u32::MAX);

    let err = Graph::build(&desc, env()).unwrap_err();
    assert_eq!(err.node, Some(NodeId::new(4_000_000_000)));
    assert!(matches!(err.source, GraphError::NodeIdOutOfRange(_)));
}

#[test]
fn added_node_ids_continue_after_built_ones() {
    let mut desc = GraphDescription::new();
    desc.add_node("test.step");
    let last = desc.add_node("test.step");
    let mut graph = Graph::build(&desc, env()).unwrap();
    let added = graph.add_node("test.step").unwrap();
    assert!(added.index() > last.index());
    assert_eq!(graph.node_count(), 3);
}

// ============================================================================
// 6. Shared state
// ============================================================================

#[test]
fn control_values_cross_threads() {
    let mut graph = Graph::new(env());
    let knob = graph.add_node("test.knob").unwrap();
    let controls = Arc::clone(graph.controls());

    let snapshot = controls.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "cutoff");
    assert_eq!(snapshot[0].current[0], 10.0);

    let ui = thread::spawn(move || {
        assert!(controls.set_desired("cutoff", 42.0));
        assert!(!controls.set_desired("missing", 1.0));
    });
    ui.join().unwrap();

    graph.tick(0.01);
    assert_eq!(float(&graph, knob, "value"), 42.0);

    let controls = Arc::clone(graph.controls());
    graph.remove_node(knob).unwrap();
    assert!(controls.names().is_empty());
}

#[test]
fn resources_are_created_and_dropped_once() {
    let mut desc = GraphDescription::new();
    let id = desc.add_node("test.noted");
    desc.node_mut(id)
        .unwrap()
        .set_resource("note", "text", "hello");

    let env = env();
    let resources = Arc::clone(&env.resources);
    let mut graph = Graph::build(&desc, env).unwrap();
    assert_eq!(NOTES_CREATED.load(Ordering::SeqCst), 1);
    assert_eq!(resources.ref_count(id, "note", "text"), 1);

    graph.tick(0.01);
    assert_eq!(
        graph.output_value(id, "text"),
        Some(&Value::String("hello".into()))
    );
    let saved = resources.save_all();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1, "hello");

    drop(graph);
    assert_eq!(resources.ref_count(id, "note", "text"), 0);
    assert!(resources.is_empty());
    assert_eq!(NOTES_CREATED.load(Ordering::SeqCst), 1);
    assert_eq!(NOTES_DROPPED.load(Ordering::SeqCst), 1);
}
