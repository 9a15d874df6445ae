//! Configuration and graph files for patchbay.
//!
//! This crate provides the file-facing side of the engine: the engine
//! settings file, graph file loading and saving, and static validation of
//! graph descriptions against the registered node types.
//!
//! # Features
//!
//! - **Engine Settings**: sample rate, block size, frame rate and search
//!   paths from a TOML file
//! - **Graph Files**: load and save XML graph descriptions with path-carrying
//!   errors
//! - **Validation**: report every problem a graph would fail to build with,
//!   without building it
//!
//! # Example
//!
//! ```rust,no_run
//! use patchbay_config::{EngineConfig, load_graph, validate_description};
//! use patchbay_core::Graph;
//!
//! let config = EngineConfig::load("engine.toml").unwrap();
//! let env = config.env();
//!
//! let desc = load_graph("synth.xml").unwrap();
//! validate_description(&desc, &env.node_types).unwrap();
//!
//! let mut graph = Graph::build(&desc, env).unwrap();
//! graph.tick(config.block_dt());
//! ```

mod engine;
mod error;
mod graph_file;

/// Graph description validation.
pub mod validation;

pub use engine::EngineConfig;
pub use error::ConfigError;
pub use graph_file::{load_graph, save_graph};
pub use validation::{ValidationError, ValidationResult, collect_errors, validate_description};

/// Re-export commonly used types from patchbay-registry
pub use patchbay_registry::{BuiltinRegistry, NodeCategory};
