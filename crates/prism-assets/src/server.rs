use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::AssetError;
use crate::handle::{next_asset_id, AssetHandle, AssetId};
use crate::loader::FbxLoader;
use crate::model::ModelAsset;
use crate::settings::ImportSettings;
use crate::texture::{self, TextureAsset};

/// Loads, caches and hands out models and textures.
pub struct AssetServer {
    base_path: PathBuf,
    loader: FbxLoader,
    models: HashMap<AssetId, ModelAsset>,
    model_paths: HashMap<AssetId, PathBuf>,
    textures: HashMap<AssetId, TextureAsset>,
    path_to_model: HashMap<PathBuf, AssetHandle<ModelAsset>>,
    path_to_texture: HashMap<PathBuf, AssetHandle<TextureAsset>>,
}

impl AssetServer {
    /// Create a server that resolves relative paths against `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("AssetServer created with base path: {}", base_path.display());
        Self {
            base_path,
            loader: FbxLoader::new(),
            models: HashMap::new(),
            model_paths: HashMap::new(),
            textures: HashMap::new(),
            path_to_model: HashMap::new(),
            path_to_texture: HashMap::new(),
        }
    }

    pub fn with_import_settings(mut self, settings: ImportSettings) -> Self {
        self.loader = self.loader.with_settings(settings);
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Import an FBX model. Loading the same path again returns the cached
    /// handle.
    pub fn load_model(&mut self, path: &Path) -> Result<AssetHandle<ModelAsset>, AssetError> {
        let full_path = self.resolve(path);

        if let Some(&handle) = self.path_to_model.get(&full_path) {
            return Ok(handle);
        }

        let model = self.loader.load(&full_path)?;

        let id = next_asset_id();
        let handle = AssetHandle::new(id);
        self.models.insert(id, model);
        self.model_paths.insert(id, full_path.clone());
        self.path_to_model.insert(full_path, handle);

        Ok(handle)
    }

    /// Decode an image file. Loading the same path again returns the cached
    /// handle.
    pub fn load_texture(&mut self, path: &Path) -> Result<AssetHandle<TextureAsset>, AssetError> {
        let full_path = self.resolve(path);

        if let Some(&handle) = self.path_to_texture.get(&full_path) {
            return Ok(handle);
        }

        if !full_path.exists() {
            return Err(AssetError::NotFound(full_path));
        }

        let tex = texture::load_texture(&full_path)?;
        let id = next_asset_id();
        let handle = AssetHandle::new(id);
        self.textures.insert(id, tex);
        self.path_to_texture.insert(full_path, handle);

        Ok(handle)
    }

    /// Load every texture a model references, relative to the model's own
    /// directory. Textures that fail to load are logged and skipped.
    pub fn load_model_textures(
        &mut self,
        model: AssetHandle<ModelAsset>,
    ) -> Vec<AssetHandle<TextureAsset>> {
        let (Some(asset), Some(model_path)) =
            (self.models.get(&model.id()), self.model_paths.get(&model.id()))
        else {
            return Vec::new();
        };

        let dir = model_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let paths: Vec<PathBuf> = asset.texture_paths().map(|p| dir.join(p)).collect();

        let mut handles = Vec::new();
        for path in paths {
            match self.load_texture(&path) {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("Skipping texture of '{}': {}", asset_name(&self.models, model), e),
            }
        }
        handles
    }

    pub fn get_model(&self, handle: AssetHandle<ModelAsset>) -> Option<&ModelAsset> {
        self.models.get(&handle.id())
    }

    pub fn get_texture(&self, handle: AssetHandle<TextureAsset>) -> Option<&TextureAsset> {
        self.textures.get(&handle.id())
    }

    pub fn is_model_loaded(&self, handle: AssetHandle<ModelAsset>) -> bool {
        self.models.contains_key(&handle.id())
    }

    pub fn is_texture_loaded(&self, handle: AssetHandle<TextureAsset>) -> bool {
        self.textures.contains_key(&handle.id())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn asset_name(models: &HashMap<AssetId, ModelAsset>, handle: AssetHandle<ModelAsset>) -> &str {
    models.get(&handle.id()).map_or("?", |m| m.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRIANGLE: &str = r#"
Objects:  {
	Geometry: 1, "Geometry::Tri", "Mesh" {
		Vertices: *9 {
			a: 0,0,0,1,0,0,0,1,0
		}
		PolygonVertexIndex: *3 {
			a: 0,1,-3
		}
	}
	Material: 2, "Material::m", "" {
	}
	Texture: 3, "Texture::t", "" {
		RelativeFilename: "missing.png"
	}
}
Connections:  {
	C: "OP",3,2, "DiffuseColor"
}
"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-server-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_model_returns_error() {
        let mut server = AssetServer::new("/nonexistent");
        match server.load_model(Path::new("does_not_exist.fbx")) {
            Err(AssetError::NotFound(_)) => {}
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn missing_texture_returns_error() {
        let mut server = AssetServer::new("/nonexistent");
        assert!(server.load_texture(Path::new("does_not_exist.png")).is_err());
    }

    #[test]
    fn resolve_absolute_and_relative_paths() {
        let server = AssetServer::new("/home/user/assets");
        assert_eq!(
            server.resolve(Path::new("/absolute/model.fbx")),
            PathBuf::from("/absolute/model.fbx")
        );
        assert_eq!(
            server.resolve(Path::new("models/box.fbx")),
            PathBuf::from("/home/user/assets/models/box.fbx")
        );
    }

    #[test]
    fn models_are_cached_by_path() {
        let dir = scratch_dir("cache");
        fs::write(dir.join("tri.fbx"), TRIANGLE).unwrap();

        let mut server = AssetServer::new(&dir);
        let first = server.load_model(Path::new("tri.fbx")).unwrap();
        let second = server.load_model(&dir.join("tri.fbx")).unwrap();
        assert_eq!(first, second);
        assert!(server.is_model_loaded(first));

        let model = server.get_model(first).unwrap();
        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.texture_paths().collect::<Vec<_>>(), vec!["missing.png"]);

        // The referenced texture does not exist and is skipped.
        assert!(server.load_model_textures(first).is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
