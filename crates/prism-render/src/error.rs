use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read shader {0}")]
    ShaderRead(PathBuf, #[source] io::Error),

    #[error("shader compilation failed: {0}")]
    Compile(String),

    #[error("program link failed: {0}")]
    Link(String),

    #[error("OpenGL error: {0}")]
    Gl(String),
}
