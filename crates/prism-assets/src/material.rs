use tracing::debug;

use crate::model::{ModelAsset, TextureRef};
use crate::scene::{FileTexture, MaterialSlot, SurfaceMaterial};

/// Slots scanned for textures, in order. Transparency is not imported.
pub const RESOLVED_SLOTS: [MaterialSlot; 4] = [
    MaterialSlot::Diffuse,
    MaterialSlot::Ambient,
    MaterialSlot::Emissive,
    MaterialSlot::Specular,
];

/// Append the textures of `material` to `asset.textures`.
///
/// A slot with layered textures contributes every file texture of every
/// layer, in order, and its directly connected files are ignored. A slot
/// without layered textures contributes its directly connected files.
pub fn resolve_textures(material: &SurfaceMaterial, asset: &mut ModelAsset) {
    for slot in RESOLVED_SLOTS {
        let Some(property) = material.find_property(slot) else {
            continue;
        };

        let before = asset.textures.len();
        if property.layered.is_empty() {
            push_all(asset, slot, &property.files);
        } else {
            for layered in &property.layered {
                push_all(asset, slot, &layered.files);
            }
        }

        debug!(
            "Material '{}' {:?}: {} textures",
            material.name,
            slot,
            asset.textures.len() - before
        );
    }
}

fn push_all(asset: &mut ModelAsset, slot: MaterialSlot, files: &[FileTexture]) {
    asset.textures.extend(files.iter().map(|file| TextureRef {
        path: file.relative_path.clone(),
        uv_set: file.uv_set.clone(),
        slot,
    }));
}
