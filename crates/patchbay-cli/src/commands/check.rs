//! Graph file validation command.

use std::path::PathBuf;

use clap::Args;
use patchbay_config::{EngineConfig, collect_errors, load_graph};

#[derive(Args)]
pub struct CheckArgs {
    /// Graph file (XML)
    graph: PathBuf,
}

pub fn run(args: CheckArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let desc = load_graph(&args.graph)?;
    let env = config.env();
    let errors = collect_errors(&desc, &env.node_types);

    if errors.is_empty() {
        println!(
            "{}: ok ({} nodes, {} links)",
            args.graph.display(),
            desc.nodes.len(),
            desc.links.len()
        );
        return Ok(());
    }

    for error in &errors {
        println!("{}: {}", args.graph.display(), error);
    }
    anyhow::bail!(
        "{} problem{} found in '{}'",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" },
        args.graph.display()
    )
}
