//! Headless tick and draw command.

use std::path::PathBuf;

use clap::Args;
use patchbay_config::EngineConfig;
use patchbay_core::RecordingBackend;

use super::common::{build_graph, report_issues};

#[derive(Args)]
pub struct RunArgs {
    /// Graph file (XML)
    graph: PathBuf,

    /// Number of frames to tick and draw
    #[arg(long, default_value = "1")]
    frames: u32,

    /// Seconds per frame (defaults to 1 / frame_rate)
    #[arg(long)]
    dt: Option<f32>,

    /// Print a report for every node afterwards
    #[arg(long)]
    describe: bool,
}

pub fn run(args: RunArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let dt = args.dt.unwrap_or_else(|| config.frame_dt());
    if !(dt.is_finite() && dt >= 0.0) {
        anyhow::bail!("--dt must be a non-negative number of seconds, got {dt}");
    }

    let mut graph = build_graph(&args.graph, config)?;

    let mut commands = 0;
    for frame in 0..args.frames {
        graph.tick(dt);
        let mut backend = RecordingBackend::new();
        graph.draw(&mut backend);
        if !backend.is_balanced() {
            tracing::warn!(frame, "draw traversal left unbalanced pushes");
        }
        commands += backend.commands().len();
    }

    let peak = (0..graph.block_size())
        .map(|i| graph.output_bus().sample(i).abs())
        .fold(0.0f32, f32::max);
    println!(
        "{} frames of {dt:.4}s: {} nodes, {} edges, {commands} draw commands, output peak {peak:.4}",
        args.frames,
        graph.node_count(),
        graph.edge_count()
    );

    let controls = graph.controls().names();
    if !controls.is_empty() {
        println!("controls: {}", controls.join(", "));
    }

    if args.describe {
        for id in graph.node_ids() {
            if let Some(report) = graph.describe(id) {
                println!();
                println!("node {id}");
                print!("{report}");
            }
        }
    }

    report_issues(&graph);
    Ok(())
}
