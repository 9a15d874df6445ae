//! Process-wide settings and registries shared by every graph instance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::resource::ResourceRegistry;

use super::types::NodeTypeRegistry;

/// Everything a graph needs from its host.
///
/// Cheap to clone: registries are shared behind `Arc`. Sub-graphs hosted by a
/// node get a clone of their parent's environment.
#[derive(Clone)]
pub struct GraphEnv {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Samples per audio block; the length of every signal buffer.
    pub block_size: usize,
    /// Node types available to graph construction.
    pub node_types: Arc<NodeTypeRegistry>,
    /// Shared resources keyed by node, type and name.
    pub resources: Arc<ResourceRegistry>,
    /// Directories searched for files named by graphs (sub-graphs, tables).
    pub search_paths: Vec<PathBuf>,
}

impl GraphEnv {
    /// Default sample rate.
    pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
    /// Default block size.
    pub const DEFAULT_BLOCK_SIZE: usize = 256;

    /// Creates an environment at 44.1 kHz with 256-sample blocks.
    pub fn new(node_types: Arc<NodeTypeRegistry>, resources: Arc<ResourceRegistry>) -> Self {
        Self {
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            block_size: Self::DEFAULT_BLOCK_SIZE,
            node_types,
            resources,
            search_paths: Vec::new(),
        }
    }

    /// Sets the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the block size (at least one sample).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Appends a search directory.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Duration of one audio block in seconds.
    pub fn block_duration(&self) -> f32 {
        self.block_size as f32 / self.sample_rate
    }

    /// Resolves a file name against the search paths.
    ///
    /// Absolute paths and names not found in any search directory are
    /// returned unchanged.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| path.to_path_buf())
    }
}
