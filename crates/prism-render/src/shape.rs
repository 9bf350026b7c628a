//! Drawable shapes

use prism_assets::{ModelAsset, Vertex};

/// A model ready to be uploaded: one vertex buffer and a triangle index list.
#[derive(Clone, Debug)]
pub struct Shape {
    model: ModelAsset,
}

impl Shape {
    pub fn new(model: ModelAsset) -> Self {
        Self { model }
    }

    /// Unit cube centred on the origin, each corner a different color.
    /// Used when no model could be imported.
    pub fn cube() -> Self {
        let mut model = ModelAsset::new("cube");
        for i in 0..8u32 {
            let bit = |b: u32| if i & (1 << b) != 0 { 0.5 } else { -0.5 };
            let position = [bit(0), bit(1), bit(2)];
            let mut vertex = Vertex::at(position);
            vertex.color = [position[0] + 0.5, position[1] + 0.5, position[2] + 0.5, 1.0];
            model.vertices.push(vertex);
        }
        // Two triangles per face, counter-clockwise seen from outside.
        model.indices = vec![
            0, 2, 3, 0, 3, 1, // -z
            4, 5, 7, 4, 7, 6, // +z
            0, 1, 5, 0, 5, 4, // -y
            2, 6, 7, 2, 7, 3, // +y
            0, 4, 6, 0, 6, 2, // -x
            1, 3, 7, 1, 7, 5, // +x
        ];
        Self { model }
    }

    pub fn model(&self) -> &ModelAsset {
        &self.model
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        self.model.vertex_bytes()
    }

    pub fn index_bytes(&self) -> &[u8] {
        self.model.index_bytes()
    }

    pub fn index_count(&self) -> usize {
        self.model.indices.len()
    }

    /// Whether there is anything to draw.
    pub fn is_drawable(&self) -> bool {
        !self.model.vertices.is_empty() && self.index_count() >= 3
    }
}

impl From<ModelAsset> for Shape {
    fn from(model: ModelAsset) -> Self {
        Self::new(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_is_closed_and_outward_facing() {
        let cube = Shape::cube();
        let model = cube.model();
        assert_eq!(model.vertices.len(), 8);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.is_drawable());

        for tri in model.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(model.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            assert!(normal.dot(centre) > 0.0, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn empty_models_are_not_drawable() {
        let shape = Shape::from(ModelAsset::new("empty"));
        assert!(!shape.is_drawable());
        assert!(shape.vertex_bytes().is_empty());
    }
}
