use serde::{Deserialize, Serialize};

/// Which parts of a mesh the FBX importer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub normals: bool,
    pub uvs: bool,
    pub colors: bool,
    /// Resolve the textures of the first material.
    pub textures: bool,
    /// Log unsupported or malformed layers at `warn` instead of `debug`.
    pub warn_unsupported: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            normals: true,
            uvs: true,
            colors: true,
            textures: true,
            warn_unsupported: true,
        }
    }
}

impl ImportSettings {
    /// Positions and indices only.
    pub fn geometry_only() -> Self {
        Self {
            normals: false,
            uvs: false,
            colors: false,
            textures: false,
            ..Self::default()
        }
    }
}
