//! Fan triangulation of polygon meshes.
//!
//! Layers addressed per polygon corner or per polygon are rewritten so they
//! stay aligned with the new corner and polygon order. Meshes that already
//! consist of triangles are left untouched.

use tracing::{debug, warn};

use crate::layer::{LayerElement, MappingMode};
use crate::scene::{MeshNode, Scene};

/// Triangulate every mesh in the scene.
pub fn triangulate_scene(scene: &mut Scene) {
    for mesh in &mut scene.meshes {
        triangulate(mesh);
    }
}

/// Split every polygon of `mesh` into a triangle fan around its first
/// corner. Polygons with fewer than three corners are dropped.
///
/// Returns the number of triangles in the mesh afterwards.
pub fn triangulate(mesh: &mut MeshNode) -> usize {
    if mesh.polygons.iter().all(|p| p.len() == 3) {
        return mesh.polygons.len();
    }

    // New corner -> old visit, new polygon -> old polygon.
    let mut corner_map = Vec::new();
    let mut polygon_map = Vec::new();
    let mut triangles = Vec::new();
    let mut degenerate = 0;

    let mut first_visit = 0;
    for (polygon, corners) in mesh.polygons.iter().enumerate() {
        if corners.len() < 3 {
            degenerate += 1;
        } else {
            for k in 1..corners.len() - 1 {
                triangles.push(vec![corners[0], corners[k], corners[k + 1]]);
                corner_map.extend([first_visit, first_visit + k, first_visit + k + 1]);
                polygon_map.push(polygon);
            }
        }
        first_visit += corners.len();
    }

    if degenerate > 0 {
        warn!(
            "Mesh '{}': dropped {} polygons with fewer than 3 corners",
            mesh.name, degenerate
        );
    }
    debug!(
        "Mesh '{}': {} polygons -> {} triangles",
        mesh.name,
        mesh.polygons.len(),
        triangles.len()
    );

    mesh.polygons = triangles;
    for layer in &mut mesh.normals {
        remap_layer(layer, &corner_map, &polygon_map);
    }
    for (_, layer) in &mut mesh.uv_sets {
        remap_layer(layer, &corner_map, &polygon_map);
    }
    for layer in &mut mesh.colors {
        remap_layer(layer, &corner_map, &polygon_map);
    }

    mesh.polygons.len()
}

/// Reorder the addressable array of a corner- or polygon-mapped layer. The
/// result is cut short at the first position the old layer cannot address.
fn remap_layer<T: Copy>(layer: &mut LayerElement<T>, corner_map: &[usize], polygon_map: &[usize]) {
    let map = match layer.mapping {
        MappingMode::ByPolygonVertex => corner_map,
        MappingMode::ByPolygon => polygon_map,
        _ => return,
    };

    if layer.reference.is_indexed() {
        layer.index = gather(&layer.index, map);
    } else {
        layer.direct = gather(&layer.direct, map);
    }
}

fn gather<T: Copy>(values: &[T], map: &[usize]) -> Vec<T> {
    map.iter().map_while(|&old| values.get(old).copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ReferenceMode;

    fn quad_and_triangle() -> MeshNode {
        MeshNode {
            name: "test".into(),
            control_points: vec![[0.0; 3]; 5],
            polygons: vec![vec![0, 1, 2, 3], vec![1, 4, 2]],
            ..Default::default()
        }
    }

    #[test]
    fn fans_quads_into_two_triangles() {
        let mut mesh = quad_and_triangle();
        assert_eq!(triangulate(&mut mesh), 3);
        assert_eq!(mesh.polygons, vec![vec![0, 1, 2], vec![0, 2, 3], vec![1, 4, 2]]);
        assert_eq!(mesh.polygon_vertex_count(), 9);
    }

    #[test]
    fn triangles_are_left_alone() {
        let mut mesh = quad_and_triangle();
        triangulate(&mut mesh);
        let once = mesh.clone();
        triangulate(&mut mesh);
        assert_eq!(mesh, once);
    }

    #[test]
    fn polygon_vertex_layers_follow_corners() {
        let mut mesh = quad_and_triangle();
        let uvs: Vec<[f64; 2]> = (0..7).map(|i| [i as f64, 0.0]).collect();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::direct(MappingMode::ByPolygonVertex, uvs),
        ));
        mesh.uv_sets.push((
            "map2".into(),
            LayerElement::indexed(MappingMode::ByPolygonVertex, vec![[0.0, 0.0]], vec![0, 0, 0, 0, 0, 0, 0]),
        ));

        triangulate(&mut mesh);

        let direct: Vec<f64> = mesh.uv_sets[0].1.direct.iter().map(|uv| uv[0]).collect();
        assert_eq!(direct, vec![0.0, 1.0, 2.0, 0.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(mesh.uv_sets[1].1.index.len(), 9);
        assert_eq!(mesh.uv_sets[1].1.reference, ReferenceMode::IndexToDirect);
    }

    #[test]
    fn polygon_layers_follow_polygons() {
        let mut mesh = quad_and_triangle();
        mesh.colors.push(LayerElement::direct(
            MappingMode::ByPolygon,
            vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]],
        ));
        triangulate(&mut mesh);
        assert_eq!(
            mesh.colors[0].direct,
            vec![[1.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn short_layers_are_cut_at_the_first_gap() {
        let mut mesh = quad_and_triangle();
        let normals = vec![[0.0, 0.0, 1.0]; 3];
        mesh.normals.push(LayerElement::direct(MappingMode::ByPolygonVertex, normals));
        triangulate(&mut mesh);
        // The second triangle's last corner is old visit 3, which the layer lacks.
        assert_eq!(mesh.normals[0].direct.len(), 5);
    }

    #[test]
    fn control_point_layers_are_untouched() {
        let mut mesh = quad_and_triangle();
        let normals = vec![[0.0, 0.0, 1.0]; 5];
        mesh.normals.push(LayerElement::direct(MappingMode::ByControlPoint, normals.clone()));
        triangulate(&mut mesh);
        assert_eq!(mesh.normals[0].direct, normals);
    }

    #[test]
    fn degenerate_polygons_are_dropped() {
        let mut mesh = MeshNode {
            polygons: vec![vec![0, 1], vec![0, 1, 2, 3, 4]],
            control_points: vec![[0.0; 3]; 5],
            ..Default::default()
        };
        assert_eq!(triangulate(&mut mesh), 3);
        assert!(mesh.polygons.iter().all(|p| p.len() == 3 && p[0] == 0));
    }
}
