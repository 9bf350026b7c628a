//! Shader sources and program linking

use std::fs;
use std::path::Path;

use glow::HasContext;
use tracing::debug;

use crate::error::RenderError;
use crate::vertex::{ATTRIBUTES, FRAGMENT_OUTPUT};

/// Vertex and fragment shader text, read verbatim from disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<Vec<u8>>, fragment: impl Into<Vec<u8>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read both shader files as raw bytes.
    pub fn read(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let read = |path: &Path| fs::read(path).map_err(|e| RenderError::ShaderRead(path.to_path_buf(), e));
        Ok(Self {
            vertex: read(vertex_path.as_ref())?,
            fragment: read(fragment_path.as_ref())?,
        })
    }

    /// Pass-through shaders for the `position`/`color` layout.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_VERTEX, BUILTIN_FRAGMENT)
    }
}

const BUILTIN_VERTEX: &str = "#version 150
uniform mat4 model_view;
uniform mat4 projection;
in vec3 position;
in vec4 color;
out vec4 frag_color;
void main() {
    frag_color = color;
    gl_Position = projection * model_view * vec4(position, 1.0);
}
";

const BUILTIN_FRAGMENT: &str = "#version 150
in vec4 frag_color;
out vec4 fragment;
void main() {
    fragment = frag_color;
}
";

fn source_text(stage: &str, bytes: &[u8]) -> Result<String, RenderError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| RenderError::Compile(format!("{stage} shader is not UTF-8: {e}")))
}

/// Compile one stage.
///
/// # Safety
/// `gl` must be current on this thread.
pub(crate) unsafe fn compile(gl: &glow::Context, kind: u32, stage: &str, bytes: &[u8]) -> Result<glow::Shader, RenderError> {
    let source = source_text(stage, bytes)?;
    let shader = gl.create_shader(kind).map_err(RenderError::Gl)?;
    gl.shader_source(shader, &source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(RenderError::Compile(format!("{stage}: {}", log.trim_end())));
    }
    Ok(shader)
}

/// Compile both stages and link them, binding the vertex attributes and the
/// fragment output by name first.
///
/// # Safety
/// `gl` must be current on this thread.
pub(crate) unsafe fn link(gl: &glow::Context, sources: &ShaderSources) -> Result<glow::Program, RenderError> {
    let vertex = compile(gl, glow::VERTEX_SHADER, "vertex", &sources.vertex)?;
    let fragment = match compile(gl, glow::FRAGMENT_SHADER, "fragment", &sources.fragment) {
        Ok(shader) => shader,
        Err(e) => {
            gl.delete_shader(vertex);
            return Err(e);
        }
    };

    let program = match gl.create_program() {
        Ok(program) => program,
        Err(e) => {
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            return Err(RenderError::Gl(e));
        }
    };
    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    for attr in ATTRIBUTES {
        gl.bind_attrib_location(program, attr.location, attr.name);
    }
    gl.bind_frag_data_location(program, 0, FRAGMENT_OUTPUT);
    gl.link_program(program);

    gl.detach_shader(program, vertex);
    gl.detach_shader(program, fragment);
    gl.delete_shader(vertex);
    gl.delete_shader(fragment);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(RenderError::Link(log.trim_end().to_string()));
    }
    debug!("Linked shader program");
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_reports_the_missing_file() {
        let dir = std::env::temp_dir().join(format!("prism-shader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let vert = dir.join("shape.vert");
        fs::write(&vert, b"void main() {}").unwrap();

        let missing = dir.join("missing.frag");
        match ShaderSources::read(&vert, &missing) {
            Err(RenderError::ShaderRead(path, _)) => assert_eq!(path, missing),
            other => panic!("unexpected {other:?}"),
        }

        fs::write(dir.join("shape.frag"), b"void main() {}").unwrap();
        let sources = ShaderSources::read(&vert, dir.join("shape.frag")).unwrap();
        assert_eq!(sources.vertex, b"void main() {}");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn builtin_shaders_use_the_bound_names() {
        let sources = ShaderSources::builtin();
        let vertex = std::str::from_utf8(&sources.vertex).unwrap();
        let fragment = std::str::from_utf8(&sources.fragment).unwrap();
        for attr in ATTRIBUTES {
            assert!(vertex.contains(&format!("in vec{} {};", attr.components, attr.name)));
        }
        assert!(vertex.contains("uniform mat4 model_view;"));
        assert!(fragment.contains(&format!("out vec4 {FRAGMENT_OUTPUT};")));
    }

    #[test]
    fn non_utf8_source_is_a_compile_error() {
        assert!(matches!(source_text("vertex", &[0xff, 0xfe]), Err(RenderError::Compile(_))));
    }
}
