//! Graph and config file reading, layout and SVG writing
//!
//! Formats are picked from the file extension: `.json` through serde_json,
//! `.yaml`/`.yml` through serde_yaml.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GraphConfig;
use crate::model::{GraphInput, GraphModel, NodeId};
use crate::render::RenderScene;
use crate::svg::render_svg;

/// Errors that can occur during reading or writing
#[derive(Error, Debug)]
pub enum IoError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),

    /// A rendering/writing error occurred
    #[error("write error: {0}")]
    Write(String),
}

/// Result type for reader/writer operations
pub type IoResult<T> = Result<T, IoError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> IoResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;

        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Final position of one node, as written by `write_layout`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

impl NodePosition {
    pub fn collect(model: &GraphModel) -> Vec<NodePosition> {
        model
            .nodes()
            .iter()
            .map(|node| NodePosition {
                id: node.id.clone(),
                x: node.position.x,
                y: node.position.y,
            })
            .collect()
    }
}

fn read_as<T: DeserializeOwned>(path: &Path) -> IoResult<T> {
    let format = Format::from_path(path)?;
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, bytes = text.len(), "reading");

    match format {
        Format::Json => serde_json::from_str(&text).map_err(|e| IoError::Parse(e.to_string())),
        Format::Yaml => serde_yaml::from_str(&text).map_err(|e| IoError::Parse(e.to_string())),
    }
}

/// Read a `{ nodes, edges }` graph file
pub fn read_graph(path: &Path) -> IoResult<GraphInput> {
    read_as(path)
}

/// Read a config file; missing keys fall back to defaults
pub fn read_config(path: &Path) -> IoResult<GraphConfig> {
    read_as(path)
}

fn ensure_parent(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write node positions as a JSON array of `{ id, x, y }`
pub fn write_layout(path: &Path, positions: &[NodePosition]) -> IoResult<()> {
    let json =
        serde_json::to_string_pretty(positions).map_err(|e| IoError::Write(e.to_string()))?;
    ensure_parent(path)?;
    fs::write(path, json)?;
    Ok(())
}

/// Render a scene to an SVG file
pub fn write_svg(path: &Path, scene: &RenderScene) -> IoResult<()> {
    let svg = render_svg(scene).map_err(|e| IoError::Write(e.to_string()))?;
    ensure_parent(path)?;
    fs::write(path, svg)?;
    Ok(())
}
