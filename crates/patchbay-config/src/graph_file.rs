//! Reading and writing graph files.

use std::path::Path;

use patchbay_core::GraphDescription;

use crate::error::ConfigError;

/// Load a graph description from an XML file.
pub fn load_graph(path: impl AsRef<Path>) -> Result<GraphDescription, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let desc = GraphDescription::parse(&content).map_err(|e| ConfigError::graph(path, e))?;
    tracing::debug!(
        path = %path.display(),
        nodes = desc.nodes.len(),
        links = desc.links.len(),
        "loaded graph"
    );
    Ok(desc)
}

/// Save a graph description to an XML file, creating parent directories.
pub fn save_graph(desc: &GraphDescription, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    let content = desc.to_xml_string().map_err(|e| ConfigError::graph(path, e))?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
    Ok(())
}
