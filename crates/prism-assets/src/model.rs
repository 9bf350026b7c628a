//! The imported, render-ready model.

use bytemuck::{Pod, Zeroable};
use prism_core::Color;

use crate::layer::{AttributeKind, Unsupported};
use crate::scene::MaterialSlot;

/// One model vertex. Its index in [`ModelAsset::vertices`] is the source
/// control-point index.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const WHITE: [f32; 4] = Color::WHITE.to_array();

    /// A vertex at `position` with opaque white color and zero normal/uv.
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0; 3],
            color: Self::WHITE,
            uv: [0.0; 2],
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::at([0.0; 3])
    }
}

/// A UV sampled once per polygon corner.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Uv {
    pub point: [f32; 2],
}

/// A texture file referenced by the model's material.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    pub path: String,
    /// UV set this texture samples.
    pub uv_set: String,
    pub slot: MaterialSlot,
}

/// Something the importer skipped or could not read completely.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportWarning {
    #[error(transparent)]
    UnsupportedLayer(#[from] Unsupported),

    #[error("uv set '{set}' uses an unsupported mapping, all uv sets were skipped")]
    UvImportAborted { set: String },

    #[error("{attribute} layer '{layer}' stops at position {position}: {reason}")]
    MalformedLayer {
        attribute: AttributeKind,
        layer: String,
        position: usize,
        reason: String,
    },
}

/// Non-fatal findings collected during one import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    pub fn push(&mut self, warning: impl Into<ImportWarning>) {
        self.warnings.push(warning.into());
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Unsupported layer cells recorded for `attribute`.
    pub fn unsupported(&self, attribute: AttributeKind) -> impl Iterator<Item = &Unsupported> + '_ {
        self.warnings.iter().filter_map(move |w| match w {
            ImportWarning::UnsupportedLayer(u) if u.attribute == attribute => Some(u),
            _ => None,
        })
    }
}

/// A triangle mesh imported from an FBX file.
///
/// `indices` is a triangle list into `vertices`. When the mesh carries
/// per-corner UVs they are in `uv_points`, one per index in visit order, and
/// `Vertex::uv` stays zero.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub uv_points: Vec<Uv>,
    pub textures: Vec<TextureRef>,
    pub report: ImportReport,
    vertex_colors: bool,
}

impl ModelAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// UV set of the last texture resolved, or `""` without textures.
    pub fn uv_set_name(&self) -> &str {
        self.textures.last().map_or("", |t| t.uv_set.as_str())
    }

    /// Texture paths in resolution order.
    pub fn texture_paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.textures.iter().map(|t| t.path.as_str())
    }

    /// Whether any vertex color layer was imported into `Vertex::color`.
    pub fn has_vertex_colors(&self) -> bool {
        self.vertex_colors
    }

    pub(crate) fn mark_vertex_colors(&mut self) {
        self.vertex_colors = true;
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex data as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
