//! Prism Assets - FBX mesh import and asset management
//!
//! Reads binary and ASCII FBX files into a [`Scene`], then flattens its first
//! mesh into a render-ready [`ModelAsset`]: one vertex per control point, a
//! triangle index list, per-corner UVs, and the texture files of the first
//! material.

pub mod assembler;
mod error;
pub mod fbx;
mod handle;
pub mod layer;
mod loader;
pub mod material;
mod model;
pub mod remap;
pub mod scene;
mod server;
pub mod session;
mod settings;
mod texture;
pub mod triangulate;

pub use error::AssetError;
pub use handle::{AssetHandle, AssetId};
pub use layer::{AttributeKind, LayerElement, MappingMode, ReadStrategy, ReferenceMode, Unsupported};
pub use loader::FbxLoader;
pub use model::{ImportReport, ImportWarning, ModelAsset, TextureRef, Uv, Vertex};
pub use scene::{MaterialSlot, Scene};
pub use server::AssetServer;
pub use session::{FbxSessionProvider, ImportSession, SessionProvider};
pub use settings::ImportSettings;
pub use texture::{decode_texture, load_texture, TextureAsset};
