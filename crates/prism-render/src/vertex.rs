//! GPU vertex layout of imported models

use std::mem::{offset_of, size_of};

use prism_assets::Vertex;

/// One vertex attribute the shader program consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input name, bound to `location` before linking.
    pub name: &'static str,
    pub location: u32,
    /// Number of `f32` components.
    pub components: i32,
    /// Byte offset inside [`Vertex`].
    pub offset: i32,
}

/// Byte distance between consecutive vertices.
pub const STRIDE: i32 = size_of::<Vertex>() as i32;

/// Attributes read from the vertex buffer.
pub const ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute {
        name: "position",
        location: 0,
        components: 3,
        offset: offset_of!(Vertex, position) as i32,
    },
    VertexAttribute {
        name: "color",
        location: 1,
        components: 4,
        offset: offset_of!(Vertex, color) as i32,
    },
];

/// Name of the fragment shader's color output.
pub const FRAGMENT_OUTPUT: &str = "fragment";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_match_the_vertex_struct() {
        assert_eq!(STRIDE, 48);
        assert_eq!(ATTRIBUTES[0].offset, 0);
        assert_eq!(ATTRIBUTES[1].offset, 24);
        for attr in ATTRIBUTES {
            assert!(attr.offset + attr.components * 4 <= STRIDE, "{} overruns", attr.name);
        }
    }
}
