//! Import sessions.
//!
//! A session is the scope one import runs in. The loader opens a session
//! from a [`SessionProvider`], imports a [`Scene`] through it, and drops it
//! before returning on every path, so a provider can observe exactly when
//! sessions begin and end.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::AssetError;
use crate::fbx::Document;
use crate::scene::Scene;
use crate::triangulate::triangulate_scene;

/// One open import session.
pub trait ImportSession {
    /// Read the file at `path` into a scene.
    fn import(&mut self, path: &Path) -> Result<Scene, AssetError>;

    /// Convert every polygon of the scene into triangles.
    fn triangulate(&mut self, scene: &mut Scene) {
        triangulate_scene(scene);
    }
}

/// Opens import sessions.
pub trait SessionProvider {
    type Session: ImportSession;

    fn open(&self) -> Result<Self::Session, AssetError>;
}

/// Sessions backed by the built-in FBX reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct FbxSessionProvider;

impl SessionProvider for FbxSessionProvider {
    type Session = FbxSession;

    fn open(&self) -> Result<FbxSession, AssetError> {
        debug!("FBX session opened");
        Ok(FbxSession { imported: 0 })
    }
}

#[derive(Debug)]
pub struct FbxSession {
    imported: usize,
}

impl ImportSession for FbxSession {
    fn import(&mut self, path: &Path) -> Result<Scene, AssetError> {
        let data = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AssetError::NotFound(path.to_path_buf()),
            _ => AssetError::Io(path.to_path_buf(), e),
        })?;

        let document =
            Document::parse(&data).map_err(|e| AssetError::Parse(path.to_path_buf(), e))?;
        let scene = Scene::from_document(&document);
        self.imported += 1;

        info!(
            "Imported '{}' (FBX {}): {} meshes, {} materials",
            path.display(),
            document.version,
            scene.meshes.len(),
            scene.materials.len()
        );
        Ok(scene)
    }
}

impl Drop for FbxSession {
    fn drop(&mut self) {
        debug!("FBX session released after {} imports", self.imported);
    }
}
