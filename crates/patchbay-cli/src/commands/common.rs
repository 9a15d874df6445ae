//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::Context;
use patchbay_config::{EngineConfig, load_graph};
use patchbay_core::Graph;

/// Load engine settings from `path`, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Load a graph file and build it against the built-in node types.
///
/// The graph file's directory is searched for sub-graph files before the
/// configured search paths.
pub fn build_graph(path: &Path, config: &EngineConfig) -> anyhow::Result<Graph> {
    let desc = load_graph(path)?;
    let mut env = config.env();
    if let Some(dir) = path.parent() {
        env.search_paths.insert(0, dir.to_path_buf());
    }
    let graph = Graph::build(&desc, env)
        .with_context(|| format!("failed to build graph '{}'", path.display()))?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph built"
    );
    Ok(graph)
}

/// Print every node issue; returns how many there were.
pub fn report_issues(graph: &Graph) -> usize {
    let mut count = 0;
    for id in graph.node_ids() {
        if let Some(issue) = graph.issue(id) {
            let type_name = graph.type_name(id).unwrap_or("?");
            eprintln!("warning: node {id} ({type_name}): {issue}");
            count += 1;
        }
    }
    count
}
