//! Prism Render - OpenGL drawing of imported models
//!
//! Uploads a [`Shape`] into one vertex array, builds a shader program that
//! binds the `position` and `color` attributes, and draws it spinning about
//! the Y axis. All matrix math lives in [`RenderState`] and needs no context.

mod error;
mod renderer;
pub mod scene;
mod shader;
mod shape;
pub mod vertex;

pub use error::RenderError;
pub use renderer::Renderer;
pub use scene::{projection, FrameUniforms, RenderState};
pub use shader::ShaderSources;
pub use shape::Shape;
