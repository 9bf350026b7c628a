use std::path::PathBuf;

/// Errors that can occur during asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse FBX file '{0}': {1}")]
    Parse(PathBuf, #[source] crate::fbx::ParseError),

    #[error("failed to import '{0}': {1}")]
    ImportFailed(PathBuf, String),

    #[error("no mesh found in '{0}'")]
    NoMesh(PathBuf),

    #[error("polygon vertex {index} references control point {control_point}, but the mesh has {vertex_count}")]
    IndexOutOfRange {
        index: usize,
        control_point: u32,
        vertex_count: usize,
    },

    #[error("failed to load image '{0}': {1}")]
    ImageLoadFailed(PathBuf, String),
}
