//! Criterion benchmarks for the node graph engine (`patchbay-core::graph`).
//!
//! Measures graph overhead independently of node cost using a trivial `Gain`
//! node. Two axes:
//!
//! - **Build** - description to live graph (instantiate + link + Kahn + init)
//! - **Tick** - one frame of traversal at varying block sizes
//!
//! Run with: `cargo bench -p patchbay-core -- graph/`
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use patchbay_core::{
    Graph, GraphDescription, GraphEnv, Node, NodeContext, NodeFlags, NodeId, NodeTypeDescriptor,
    NodeTypeRegistry, ResourceRegistry, SocketType,
};

const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ---------------------------------------------------------------------------
// Trivial nodes, isolating traversal overhead from node cost
// ---------------------------------------------------------------------------

/// `out = in * 0.9 + aux`.
struct Gain;

impl Node for Gain {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let (inputs, mut outputs) = ctx.io();
        let a = inputs.signal(0, 0.5);
        let b = inputs.signal(1, 0.0);
        if let Some(out) = outputs.signal_mut(0) {
            out.set_binary(a, b, |a, b| a * 0.9 + b);
        }
    }
}

/// Mixes its input into the output bus.
struct Output;

impl Node for Output {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        ctx.mix_to_bus(0, 1.0);
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags::ROOT
    }
}

fn env(block_size: usize) -> GraphEnv {
    let mut types = NodeTypeRegistry::new();
    types.register(
        NodeTypeDescriptor::new("bench.gain")
            .input("in", SocketType::Signal)
            .input("aux", SocketType::Signal)
            .output("out", SocketType::Signal),
        || Box::new(Gain),
    );
    types.register(
        NodeTypeDescriptor::new("bench.output").input("in", SocketType::Signal),
        || Box::new(Output),
    );
    GraphEnv::new(Arc::new(types), Arc::new(ResourceRegistry::new())).with_block_size(block_size)
}

// ---------------------------------------------------------------------------
// Graph descriptions
// ---------------------------------------------------------------------------

fn linear(n: usize) -> GraphDescription {
    let mut desc = GraphDescription::new();
    let mut prev: Option<NodeId> = None;
    for _ in 0..n {
        let node = desc.add_node("bench.gain");
        if let Some(prev) = prev {
            desc.link(prev, "out", node, "in");
        }
        prev = Some(node);
    }
    let output = desc.add_node("bench.output");
    if let Some(prev) = prev {
        desc.link(prev, "out", output, "in");
    }
    desc
}

/// Source fanned out to `width` parallel gains, summed pairwise into one output.
fn diamond(width: usize) -> GraphDescription {
    let mut desc = GraphDescription::new();
    let source = desc.add_node("bench.gain");
    let mut layer: Vec<NodeId> = (0..width)
        .map(|_| {
            let node = desc.add_node("bench.gain");
            desc.link(source, "out", node, "in");
            node
        })
        .collect();
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| {
                let node = desc.add_node("bench.gain");
                desc.link(pair[0], "out", node, "in");
                if let Some(&b) = pair.get(1) {
                    desc.link(b, "out", node, "aux");
                }
                node
            })
            .collect();
    }
    let output = desc.add_node("bench.output");
    desc.link(layer[0], "out", output, "in");
    desc
}

// ---------------------------------------------------------------------------
// Build benchmarks
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/build");
    let env = env(256);

    for (name, desc) in [
        ("linear_5", linear(5)),
        ("linear_20", linear(20)),
        ("diamond_8", diamond(8)),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(Graph::build(black_box(&desc), env.clone()).unwrap()));
        });
    }

    // Graph file parsing on top of construction
    let xml = diamond(8).to_xml_string().unwrap();
    group.bench_function("diamond_8_from_xml", |b| {
        b.iter(|| {
            let desc = GraphDescription::parse(black_box(&xml)).unwrap();
            black_box(Graph::build(&desc, env.clone()).unwrap());
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Tick benchmarks
// ---------------------------------------------------------------------------

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/tick");

    for &block_size in BLOCK_SIZES {
        let env = env(block_size);
        let dt = env.block_duration();

        let mut chain = Graph::build(&linear(20), env.clone()).unwrap();
        group.bench_with_input(
            BenchmarkId::new("linear_20", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    chain.tick(dt);
                    black_box(chain.output_bus());
                });
            },
        );

        let mut wide = Graph::build(&diamond(16), env).unwrap();
        group.bench_with_input(
            BenchmarkId::new("diamond_16", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    wide.tick(dt);
                    black_box(wide.output_bus());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_tick);
criterion_main!(benches);
