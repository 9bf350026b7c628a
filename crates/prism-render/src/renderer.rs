use std::sync::Arc;

use glam::Mat4;
use glow::HasContext;
use tracing::{error, info, warn};

use crate::error::RenderError;
use crate::scene::{FrameUniforms, RenderState};
use crate::shader::{self, ShaderSources};
use crate::shape::Shape;
use crate::vertex::{ATTRIBUTES, STRIDE};

/// Draws one [`Shape`] with its own shader program and buffers.
pub struct Renderer {
    gl: Arc<glow::Context>,
    /// `None` when the program failed to build; drawing is then skipped.
    program: Option<glow::Program>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: i32,
    state: RenderState,
}

impl Renderer {
    /// Upload `shape` and build its program.
    ///
    /// Shader failures are logged and leave the renderer without a program.
    /// Only failures to allocate GL objects are returned.
    pub fn new(gl: Arc<glow::Context>, shape: &Shape, sources: &ShaderSources) -> Result<Self, RenderError> {
        let index_count = i32::try_from(shape.index_count())
            .map_err(|_| RenderError::Gl(format!("{} indices exceed the draw limit", shape.index_count())))?;

        let program = match unsafe { shader::link(&gl, sources) } {
            Ok(program) => Some(program),
            Err(e) => {
                error!("Shader program for '{}' unusable: {}", shape.model().name, e);
                None
            }
        };

        // Objects created so far are deleted if a later allocation fails.
        let mut pending = Rollback::new(|object| unsafe { delete(&gl, object) });
        if let Some(program) = program {
            pending.push(GlObject::Program(program));
        }

        unsafe {
            let vao = gl.create_vertex_array().map_err(RenderError::Gl)?;
            pending.push(GlObject::VertexArray(vao));
            let vbo = gl.create_buffer().map_err(RenderError::Gl)?;
            pending.push(GlObject::Buffer(vbo));
            let ebo = gl.create_buffer().map_err(RenderError::Gl)?;
            pending.push(GlObject::Buffer(ebo));

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, shape.vertex_bytes(), glow::STATIC_DRAW);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, shape.index_bytes(), glow::STATIC_DRAW);

            for attr in ATTRIBUTES {
                gl.enable_vertex_attrib_array(attr.location);
                gl.vertex_attrib_pointer_f32(attr.location, attr.components, glow::FLOAT, false, STRIDE, attr.offset);
            }
            gl.bind_vertex_array(None);

            info!(
                "Uploaded '{}': {} vertices, {} triangles",
                shape.model().name,
                shape.model().vertices.len(),
                index_count / 3
            );

            pending.commit();
            Ok(Self {
                gl,
                program,
                vao,
                vbo,
                ebo,
                index_count,
                state: RenderState::default(),
            })
        }
    }

    /// Advance the rotation and draw. Returns `false` if nothing was drawn.
    pub fn draw(&mut self, projection: Mat4) -> bool {
        let Some(program) = self.program else {
            warn!("Skipping draw without a shader program");
            return false;
        };
        if self.index_count == 0 {
            return false;
        }

        self.state.advance();
        let uniforms = FrameUniforms::new(&self.state, projection);

        unsafe {
            let gl = &self.gl;
            gl.use_program(Some(program));
            let model_view = gl.get_uniform_location(program, "model_view");
            let projection = gl.get_uniform_location(program, "projection");
            gl.uniform_matrix_4_f32_slice(model_view.as_ref(), false, uniforms.model_view_slice());
            gl.uniform_matrix_4_f32_slice(projection.as_ref(), false, uniforms.projection_slice());

            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
            gl.bind_vertex_array(None);
            gl.use_program(None);
        }
        true
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        unsafe {
            if let Some(program) = self.program.take() {
                delete(&self.gl, GlObject::Program(program));
            }
            delete(&self.gl, GlObject::Buffer(self.ebo));
            delete(&self.gl, GlObject::Buffer(self.vbo));
            delete(&self.gl, GlObject::VertexArray(self.vao));
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum GlObject {
    Program(glow::Program),
    VertexArray(glow::VertexArray),
    Buffer(glow::Buffer),
}

/// # Safety
/// `gl` must be current on this thread and own `object`.
unsafe fn delete(gl: &glow::Context, object: GlObject) {
    match object {
        GlObject::Program(program) => gl.delete_program(program),
        GlObject::VertexArray(vao) => gl.delete_vertex_array(vao),
        GlObject::Buffer(buffer) => gl.delete_buffer(buffer),
    }
}

/// Releases everything pushed onto it, newest first, when dropped before
/// [`commit`](Self::commit).
struct Rollback<T, F: FnMut(T)> {
    objects: Vec<T>,
    release: F,
}

impl<T, F: FnMut(T)> Rollback<T, F> {
    fn new(release: F) -> Self {
        Self {
            objects: Vec::new(),
            release,
        }
    }

    fn push(&mut self, object: T) {
        self.objects.push(object);
    }

    /// Keep everything pushed so far.
    fn commit(mut self) {
        self.objects.clear();
    }
}

impl<T, F: FnMut(T)> Drop for Rollback<T, F> {
    fn drop(&mut self) {
        while let Some(object) = self.objects.pop() {
            (self.release)(object);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn allocate(released: &RefCell<Vec<&'static str>>, fail_at: Option<&'static str>) -> Result<(), String> {
        let mut pending = Rollback::new(|name| released.borrow_mut().push(name));
        for name in ["program", "vao", "vbo", "ebo"] {
            if fail_at == Some(name) {
                return Err(format!("{name} unavailable"));
            }
            pending.push(name);
        }
        pending.commit();
        Ok(())
    }

    #[test]
    fn failed_allocation_releases_earlier_objects_newest_first() {
        let released = RefCell::new(Vec::new());
        assert!(allocate(&released, Some("ebo")).is_err());
        assert_eq!(*released.borrow(), vec!["vbo", "vao", "program"]);
    }

    #[test]
    fn committed_objects_are_kept() {
        let released = RefCell::new(Vec::new());
        allocate(&released, None).unwrap();
        assert!(released.borrow().is_empty());
    }

    #[test]
    fn nothing_to_release_when_the_first_allocation_fails() {
        let released = RefCell::new(Vec::new());
        assert!(allocate(&released, Some("program")).is_err());
        assert!(released.borrow().is_empty());
    }
}
