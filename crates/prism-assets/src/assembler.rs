//! Builds a [`ModelAsset`] from a triangulated [`MeshNode`].
//!
//! Each step reads one part of the mesh into the asset. Layers the importer
//! cannot read are recorded in the asset's [`ImportReport`](crate::ImportReport)
//! and leave the affected vertex fields at their defaults.

use tracing::debug;

use crate::error::AssetError;
use crate::layer::{AttributeKind, LayerElement, ReadStrategy};
use crate::model::{ImportWarning, ModelAsset, Uv, Vertex};
use crate::remap::ControlPointTracker;
use crate::scene::MeshNode;

/// What one UV set contributed to the asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvSetStats {
    pub name: String,
    /// Distinct control points that received a UV (per-control-point sets).
    pub unique_control_points: usize,
    /// UV points appended to `ModelAsset::uv_points` (per-corner sets).
    pub uv_points: usize,
}

/// One vertex per control point, white, with zero normal and UV.
pub fn load_vertices(mesh: &MeshNode, asset: &mut ModelAsset) {
    asset.vertices = mesh
        .control_points
        .iter()
        .map(|&[x, y, z]| Vertex::at([x as f32, y as f32, z as f32]))
        .collect();
}

/// Copy the triangulated corner stream into the index buffer.
pub fn load_indices(mesh: &MeshNode, asset: &mut ModelAsset) -> Result<(), AssetError> {
    let vertex_count = asset.vertices.len();
    let mut indices = Vec::with_capacity(mesh.polygon_vertex_count());
    for (index, control_point) in mesh.polygon_vertices().enumerate() {
        if control_point as usize >= vertex_count {
            return Err(AssetError::IndexOutOfRange {
                index,
                control_point,
                vertex_count,
            });
        }
        indices.push(control_point);
    }
    asset.indices = indices;
    Ok(())
}

pub fn load_normals(mesh: &MeshNode, asset: &mut ModelAsset) {
    for (layer_index, layer) in mesh.normals.iter().enumerate() {
        let strategy = match ReadStrategy::for_normals(layer.mapping, layer.reference) {
            Ok(strategy) => strategy,
            Err(unsupported) => {
                asset.report.push(unsupported);
                continue;
            }
        };

        let vertices = &mut asset.vertices;
        let result = write_control_points(layer, strategy, vertices.len(), |i, n| {
            vertices[i].normal = narrow(n);
        });
        match result {
            Ok(written) => debug!("Normal layer {}: {} vertices", layer_index, written),
            Err(fault) => asset
                .report
                .push(fault.into_warning(AttributeKind::Normal, layer_index.to_string())),
        }
    }
}

/// Read every named UV set. An unsupported mapping on any set stops UV
/// import for the whole mesh.
pub fn load_uvs(mesh: &MeshNode, asset: &mut ModelAsset) -> Vec<UvSetStats> {
    let mut stats = Vec::new();

    for name in mesh.uv_set_names() {
        let Some(layer) = mesh.uv_element(name) else {
            continue;
        };
        let strategy = match ReadStrategy::for_uvs(layer.mapping, layer.reference) {
            Ok(strategy) => strategy,
            Err(unsupported) => {
                asset.report.push(unsupported);
                asset.report.push(ImportWarning::UvImportAborted { set: name.to_string() });
                return stats;
            }
        };

        let mut set = UvSetStats {
            name: name.to_string(),
            unique_control_points: 0,
            uv_points: 0,
        };
        let fault = match strategy {
            ReadStrategy::PolygonVertexDirect | ReadStrategy::PolygonVertexIndexed => {
                read_corner_uvs(mesh, layer, asset, &mut set)
            }
            ReadStrategy::ControlPointDirect
            | ReadStrategy::ControlPointIndexed
            | ReadStrategy::Uniform => read_control_point_uvs(mesh, layer, strategy, asset, &mut set),
        };
        if let Some(fault) = fault {
            asset
                .report
                .push(fault.into_warning(AttributeKind::Uv, name.to_string()));
        }

        debug!(
            "UV set '{}' ({:?}): {} control points, {} corner points",
            set.name, layer.mapping, set.unique_control_points, set.uv_points
        );
        stats.push(set);
    }

    stats
}

/// Walk the corners and give each control point the UV of its first visit.
fn read_control_point_uvs(
    mesh: &MeshNode,
    layer: &LayerElement<[f64; 2]>,
    strategy: ReadStrategy,
    asset: &mut ModelAsset,
    set: &mut UvSetStats,
) -> Option<Fault> {
    let mut tracker = ControlPointTracker::new(asset.vertices.len());

    for (visit, control_point) in mesh.polygon_vertices().enumerate() {
        let control_point = control_point as usize;
        if tracker.is_seen(control_point) {
            continue;
        }
        let value = match strategy {
            ReadStrategy::Uniform => layer.direct.first().copied(),
            _ => layer.resolve(control_point),
        };
        let Some(uv) = value else {
            set.unique_control_points = tracker.unique_count();
            return Some(Fault::lookup(visit, control_point));
        };
        if tracker.first_visit(control_point) {
            asset.vertices[control_point].uv = narrow(uv);
        }
    }

    set.unique_control_points = tracker.unique_count();
    None
}

/// Append one UV point per corner, up to what the layer can address.
fn read_corner_uvs(
    mesh: &MeshNode,
    layer: &LayerElement<[f64; 2]>,
    asset: &mut ModelAsset,
    set: &mut UvSetStats,
) -> Option<Fault> {
    let count = layer.addressable_len().min(mesh.polygon_vertex_count());

    for visit in 0..count {
        let Some(uv) = layer.resolve(visit) else {
            return Some(Fault::lookup(visit, visit));
        };
        asset.uv_points.push(Uv { point: narrow(uv) });
        set.uv_points += 1;
    }

    None
}

pub fn load_vertex_colors(mesh: &MeshNode, asset: &mut ModelAsset) {
    for (layer_index, layer) in mesh.colors.iter().enumerate() {
        let strategy = match ReadStrategy::for_colors(layer.mapping, layer.reference) {
            Ok(strategy) => strategy,
            Err(unsupported) => {
                asset.report.push(unsupported);
                continue;
            }
        };

        let vertices = &mut asset.vertices;
        let result = write_control_points(layer, strategy, vertices.len(), |i, c| {
            vertices[i].color = narrow(c);
        });
        match result {
            Ok(0) => {}
            Ok(written) => {
                debug!("Color layer {}: {} vertices", layer_index, written);
                asset.mark_vertex_colors();
            }
            Err(fault) => asset
                .report
                .push(fault.into_warning(AttributeKind::Color, layer_index.to_string())),
        }
    }
}

/// A layer lookup that ran past the end of the layer's arrays.
#[derive(Debug)]
struct Fault {
    position: usize,
    reason: String,
}

impl Fault {
    fn lookup(position: usize, addressed: usize) -> Self {
        Self {
            position,
            reason: format!("no value for element {addressed}"),
        }
    }

    fn into_warning(self, attribute: AttributeKind, layer: String) -> ImportWarning {
        ImportWarning::MalformedLayer {
            attribute,
            layer,
            position: self.position,
            reason: self.reason,
        }
    }
}

/// Apply a control-point-addressed layer to the first `count` vertices.
/// Returns the number of vertices written.
fn write_control_points<T: Copy>(
    layer: &LayerElement<T>,
    strategy: ReadStrategy,
    count: usize,
    mut write: impl FnMut(usize, T),
) -> Result<usize, Fault> {
    match strategy {
        ReadStrategy::ControlPointDirect => {
            let written = layer.direct.len().min(count);
            for (i, &value) in layer.direct.iter().take(written).enumerate() {
                write(i, value);
            }
            Ok(written)
        }
        ReadStrategy::ControlPointIndexed => {
            let written = layer.index.len().min(count);
            for i in 0..written {
                let value = layer.resolve(i).ok_or_else(|| Fault::lookup(i, i))?;
                write(i, value);
            }
            Ok(written)
        }
        ReadStrategy::Uniform => {
            let value = *layer.direct.first().ok_or_else(|| Fault::lookup(0, 0))?;
            for i in 0..count {
                write(i, value);
            }
            Ok(count)
        }
        ReadStrategy::PolygonVertexDirect | ReadStrategy::PolygonVertexIndexed => Err(Fault {
            position: 0,
            reason: "layer is addressed per polygon corner".into(),
        }),
    }
}

fn narrow<const N: usize>(values: [f64; N]) -> [f32; N] {
    values.map(|v| v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{MappingMode, ReferenceMode};

    /// Two triangles sharing the edge 0-2.
    fn quad() -> MeshNode {
        MeshNode {
            name: "quad".into(),
            control_points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            polygons: vec![vec![0, 1, 2], vec![0, 2, 3]],
            ..Default::default()
        }
    }

    fn assembled(mesh: &MeshNode) -> ModelAsset {
        let mut asset = ModelAsset::new(&mesh.name);
        load_vertices(mesh, &mut asset);
        load_indices(mesh, &mut asset).unwrap();
        asset
    }

    #[test]
    fn one_vertex_per_control_point() {
        let mesh = quad();
        let asset = assembled(&mesh);
        assert_eq!(asset.vertices.len(), 4);
        assert_eq!(asset.vertices[2].position, [1.0, 1.0, 0.0]);
        assert!(asset.vertices.iter().all(|v| v.color == Vertex::WHITE));
        assert_eq!(asset.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(asset.indices.iter().all(|&i| (i as usize) < asset.vertices.len()));
    }

    #[test]
    fn out_of_range_index_fails() {
        let mut mesh = quad();
        mesh.polygons[1][2] = 9;
        let mut asset = ModelAsset::default();
        load_vertices(&mesh, &mut asset);
        match load_indices(&mesh, &mut asset) {
            Err(AssetError::IndexOutOfRange {
                index: 5,
                control_point: 9,
                vertex_count: 4,
            }) => {}
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn direct_control_point_normals_copy_a_prefix() {
        let mut mesh = quad();
        mesh.normals.push(LayerElement::direct(
            MappingMode::ByControlPoint,
            vec![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
        ));
        let mut asset = assembled(&mesh);
        load_normals(&mesh, &mut asset);

        assert_eq!(asset.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(asset.vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(asset.vertices[2].normal, [0.0; 3]);
        assert_eq!(asset.vertices[3].normal, [0.0; 3]);
        assert!(asset.report.is_clean());
    }

    #[test]
    fn other_normal_layers_are_reported_and_leave_zeros() {
        let mut mesh = quad();
        mesh.normals.push(LayerElement::direct(
            MappingMode::ByPolygonVertex,
            vec![[0.0, 0.0, 1.0]; 6],
        ));
        mesh.normals.push(LayerElement::indexed(
            MappingMode::ByControlPoint,
            vec![[0.0, 0.0, 1.0]],
            vec![0, 0, 0, 0],
        ));
        let mut asset = assembled(&mesh);
        load_normals(&mesh, &mut asset);

        assert!(asset.vertices.iter().all(|v| v.normal == [0.0; 3]));
        let cells: Vec<_> = asset
            .report
            .unsupported(AttributeKind::Normal)
            .map(|u| (u.mapping, u.reference))
            .collect();
        assert_eq!(
            cells,
            vec![
                (MappingMode::ByPolygonVertex, ReferenceMode::Direct),
                (MappingMode::ByControlPoint, ReferenceMode::IndexToDirect),
            ]
        );
    }

    #[test]
    fn control_point_uvs_are_stable_and_counted_once() {
        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::indexed(
                MappingMode::ByControlPoint,
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                vec![0, 1, 2, 3],
            ),
        ));
        let mut asset = assembled(&mesh);
        let stats = load_uvs(&mesh, &mut asset);

        // Six corners, four distinct control points.
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].unique_control_points, 4);
        assert_eq!(asset.vertices[0].uv, [0.0, 0.0]);
        assert_eq!(asset.vertices[2].uv, [1.0, 1.0]);
        assert_eq!(asset.vertices[3].uv, [0.0, 1.0]);
        assert!(asset.uv_points.is_empty());
    }

    #[test]
    fn direct_control_point_uvs_land_on_their_own_vertices() {
        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::direct(
                MappingMode::ByControlPoint,
                vec![[0.1, 0.0], [0.2, 0.0], [0.3, 0.0], [0.4, 0.0]],
            ),
        ));
        let mut asset = assembled(&mesh);
        let stats = load_uvs(&mesh, &mut asset);

        assert_eq!(stats[0].unique_control_points, 4);
        let us: Vec<f32> = asset.vertices.iter().map(|v| v.uv[0]).collect();
        assert_eq!(us, vec![0.1, 0.2, 0.3, 0.4]);
        assert!(asset.uv_points.is_empty());
        assert!(asset.report.is_clean());
    }

    #[test]
    fn short_direct_control_point_uvs_stop_at_the_gap() {
        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::direct(MappingMode::ByControlPoint, vec![[0.5, 0.5]; 3]),
        ));
        let mut asset = assembled(&mesh);
        let stats = load_uvs(&mesh, &mut asset);

        // Corner 5 is the first visit of control point 3, which has no value.
        assert_eq!(stats[0].unique_control_points, 3);
        assert_eq!(asset.vertices[2].uv, [0.5, 0.5]);
        assert_eq!(asset.vertices[3].uv, [0.0, 0.0]);
        assert_eq!(
            asset.report.warnings,
            vec![ImportWarning::MalformedLayer {
                attribute: AttributeKind::Uv,
                layer: "map1".into(),
                position: 5,
                reason: "no value for element 3".into(),
            }]
        );
    }

    #[test]
    fn corner_uvs_follow_visit_order() {
        let mut mesh = quad();
        let uvs: Vec<[f64; 2]> = (0..6).map(|i| [i as f64 / 10.0, 0.5]).collect();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::indexed(MappingMode::ByPolygonVertex, uvs, vec![5, 4, 3, 2, 1, 0]),
        ));
        let mut asset = assembled(&mesh);
        let stats = load_uvs(&mesh, &mut asset);

        assert_eq!(stats[0].uv_points, 6);
        let us: Vec<f32> = asset.uv_points.iter().map(|uv| uv.point[0]).collect();
        assert_eq!(us, vec![0.5, 0.4, 0.3, 0.2, 0.1, 0.0]);
        assert!(asset.vertices.iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn corner_uv_count_is_capped_by_the_index_array() {
        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::indexed(MappingMode::ByPolygonVertex, vec![[0.25, 0.75]], vec![0, 0, 0, 0]),
        ));
        let mut asset = assembled(&mesh);
        load_uvs(&mesh, &mut asset);
        assert_eq!(asset.uv_points.len(), 4);

        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::direct(MappingMode::ByPolygonVertex, vec![[0.0, 0.0]; 10]),
        ));
        let mut asset = assembled(&mesh);
        load_uvs(&mesh, &mut asset);
        assert_eq!(asset.uv_points.len(), 6);
    }

    #[test]
    fn unsupported_uv_mapping_aborts_every_set() {
        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::direct(MappingMode::ByPolygonVertex, vec![[0.0, 0.0]; 6]),
        ));
        mesh.uv_sets.push((
            "bad".into(),
            LayerElement::direct(MappingMode::ByPolygon, vec![[0.0, 0.0]; 2]),
        ));
        mesh.uv_sets.push((
            "never".into(),
            LayerElement::direct(MappingMode::ByPolygonVertex, vec![[0.0, 0.0]; 6]),
        ));
        let mut asset = assembled(&mesh);
        let stats = load_uvs(&mesh, &mut asset);

        assert_eq!(stats.len(), 1);
        assert_eq!(asset.uv_points.len(), 6);
        assert!(asset
            .report
            .warnings
            .contains(&ImportWarning::UvImportAborted { set: "bad".into() }));
    }

    #[test]
    fn broken_uv_index_is_reported() {
        let mut mesh = quad();
        mesh.uv_sets.push((
            "map1".into(),
            LayerElement::indexed(MappingMode::ByPolygonVertex, vec![[0.0, 0.0]], vec![0, 0, 7, 0, 0, 0]),
        ));
        let mut asset = assembled(&mesh);
        load_uvs(&mesh, &mut asset);

        assert_eq!(asset.uv_points.len(), 2);
        assert!(matches!(
            asset.report.warnings[0],
            ImportWarning::MalformedLayer {
                attribute: AttributeKind::Uv,
                position: 2,
                ..
            }
        ));
    }

    #[test]
    fn control_point_colors_are_written() {
        let mut mesh = quad();
        mesh.colors.push(LayerElement::indexed(
            MappingMode::ByControlPoint,
            vec![[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 0.5]],
            vec![0, 1, 1, 0],
        ));
        let mut asset = assembled(&mesh);
        load_vertex_colors(&mesh, &mut asset);

        assert!(asset.has_vertex_colors());
        assert_eq!(asset.vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(asset.vertices[1].color, [0.0, 0.0, 1.0, 0.5]);
        assert_eq!(asset.vertices[3].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn uniform_color_applies_everywhere() {
        let mut mesh = quad();
        mesh.colors.push(LayerElement::direct(MappingMode::AllSame, vec![[0.5, 0.5, 0.5, 1.0]]));
        let mut asset = assembled(&mesh);
        load_vertex_colors(&mesh, &mut asset);
        assert!(asset.vertices.iter().all(|v| v.color == [0.5, 0.5, 0.5, 1.0]));
    }

    #[test]
    fn per_polygon_colors_are_reported_not_folded() {
        let mut mesh = quad();
        mesh.colors.push(LayerElement::direct(
            MappingMode::ByPolygon,
            vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]],
        ));
        let mut asset = assembled(&mesh);
        load_vertex_colors(&mesh, &mut asset);

        assert!(!asset.has_vertex_colors());
        assert!(asset.vertices.iter().all(|v| v.color == Vertex::WHITE));
        assert_eq!(asset.report.unsupported(AttributeKind::Color).count(), 1);
    }
}
