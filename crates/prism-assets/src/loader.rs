//! FBX model loading.
//!
//! [`FbxLoader`] runs one import end to end: open a session, import and
//! triangulate the scene, then assemble the first mesh and resolve the
//! textures of the first material into a [`ModelAsset`].

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::assembler;
use crate::error::AssetError;
use crate::material::resolve_textures;
use crate::model::ModelAsset;
use crate::session::{FbxSessionProvider, ImportSession, SessionProvider};
use crate::settings::ImportSettings;

/// Loads FBX files into [`ModelAsset`]s.
#[derive(Debug, Clone, Default)]
pub struct FbxLoader<P = FbxSessionProvider> {
    provider: P,
    settings: ImportSettings,
}

impl FbxLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: SessionProvider> FbxLoader<P> {
    /// A loader that opens its sessions from `provider`.
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            settings: ImportSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Import the first mesh in the file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ModelAsset, AssetError> {
        self.load_with_settings(path, self.settings)
    }

    /// Like [`load`](Self::load), with `settings` in place of the loader's own
    /// for this call only.
    pub fn load_with_settings(
        &self,
        path: impl AsRef<Path>,
        settings: ImportSettings,
    ) -> Result<ModelAsset, AssetError> {
        let path = path.as_ref();

        let mut scene = {
            let mut session = self.provider.open()?;
            let mut scene = match session.import(path) {
                Ok(scene) => scene,
                Err(e) => {
                    error!("Import of '{}' failed: {}", path.display(), e);
                    return Err(e);
                }
            };
            session.triangulate(&mut scene);
            scene
        };

        let Some(mesh) = scene.meshes.first_mut() else {
            error!("No mesh in '{}'", path.display());
            return Err(AssetError::NoMesh(path.to_path_buf()));
        };
        if mesh.name.is_empty() {
            mesh.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        let mesh = &scene.meshes[0];

        let mut asset = ModelAsset::new(mesh.name.clone());
        assembler::load_vertices(mesh, &mut asset);
        assembler::load_indices(mesh, &mut asset)?;
        if settings.normals {
            assembler::load_normals(mesh, &mut asset);
        }
        if settings.uvs {
            assembler::load_uvs(mesh, &mut asset);
        }
        if settings.colors {
            assembler::load_vertex_colors(mesh, &mut asset);
        }
        if settings.textures {
            if let Some(material) = scene.materials.first() {
                resolve_textures(material, &mut asset);
            }
        }

        log_report(&asset, &settings);
        info!(
            "Loaded model '{}': {} vertices, {} triangles, {} uv points, {} textures",
            asset.name,
            asset.vertices.len(),
            asset.triangle_count(),
            asset.uv_points.len(),
            asset.textures.len()
        );

        Ok(asset)
    }
}

fn log_report(asset: &ModelAsset, settings: &ImportSettings) {
    for warning in &asset.report.warnings {
        if settings.warn_unsupported {
            warn!("Model '{}': {}", asset.name, warning);
        } else {
            debug!("Model '{}': {}", asset.name, warning);
        }
    }
}
