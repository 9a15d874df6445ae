//! Integration tests for patchbay-config.
//!
//! These tests exercise settings and graph files on disk.

use patchbay_config::{
    ConfigError, EngineConfig, ValidationError, load_graph, save_graph, validate_description,
};
use patchbay_core::{Graph, GraphDescription};
use tempfile::TempDir;

fn sine_graph() -> GraphDescription {
    let mut desc = GraphDescription::new();
    let sine = desc.add_node("audio.sine");
    desc.set_input(sine, "frequency", "440");
    let out = desc.add_node("audio.output");
    desc.link(sine, "audio", out, "audio");
    desc
}

#[test]
fn test_engine_config_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("engine.toml");

    let config = EngineConfig {
        sample_rate: 48000,
        block_size: 128,
        frame_rate: 30,
        search_paths: Vec::new(),
    };
    config.save(&path).expect("save");

    let loaded = EngineConfig::load(&path).expect("load");
    assert_eq!(loaded, config);
}

#[test]
fn test_relative_search_paths_resolve_against_config_dir() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("engine.toml");
    std::fs::write(&path, "search_paths = [\"graphs\", \"/abs/graphs\"]\n").unwrap();

    let loaded = EngineConfig::load(&path).expect("load");
    assert_eq!(loaded.search_paths[0], temp_dir.path().join("graphs"));
    assert_eq!(loaded.search_paths[1], std::path::PathBuf::from("/abs/graphs"));
}

#[test]
fn test_missing_config_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_graph_file_round_trip_builds() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graphs").join("sine.xml");

    save_graph(&sine_graph(), &path).expect("save");
    let loaded = load_graph(&path).expect("load");
    assert_eq!(loaded.nodes.len(), 2);
    assert_eq!(loaded.links.len(), 1);

    let config = EngineConfig::default();
    let env = config.env();
    validate_description(&loaded, &env.node_types).expect("valid");

    let mut graph = Graph::build(&loaded, env).expect("build");
    graph.tick(config.block_dt());
    assert!((0..graph.block_size()).any(|i| graph.output_bus().sample(i) != 0.0));
}

#[test]
fn test_malformed_graph_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.xml");
    std::fs::write(&path, "<graph><node id=\"1\"").unwrap();

    let err = load_graph(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Graph { .. }), "got {err:?}");
    assert!(err.to_string().contains("broken.xml"));
}

#[test]
fn test_loaded_graph_with_problems_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.xml");

    let mut desc = sine_graph();
    desc.add_node("audio.theremin");
    let out = desc.nodes[1].id;
    let sine = desc.nodes[0].id;
    desc.link(sine, "audio", out, "audio");
    save_graph(&desc, &path).unwrap();

    let loaded = load_graph(&path).unwrap();
    let types = EngineConfig::default().env().node_types;
    match validate_description(&loaded, &types) {
        Err(ValidationError::Multiple(errors)) => {
            assert!(
                errors
                    .iter()
                    .any(|e| matches!(e, ValidationError::UnknownNodeType { .. }))
            );
            assert!(
                errors
                    .iter()
                    .any(|e| matches!(e, ValidationError::InputOccupied { .. }))
            );
        }
        other => panic!("expected multiple errors, got {other:?}"),
    }

    let config_err: ConfigError = validate_description(&loaded, &types).unwrap_err().into();
    assert!(config_err.to_string().starts_with("graph does not validate"));
}
