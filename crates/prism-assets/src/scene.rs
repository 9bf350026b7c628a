//! Scene model read by the import pipeline.
//!
//! This mirrors the parts of an FBX scene the importer needs: meshes with
//! their attribute layers, and surface materials with the textures connected
//! to each property slot. [`Scene::from_document`] builds it from a parsed
//! [`Document`](crate::fbx::Document).

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::fbx::{Document, Node, Property};
use crate::layer::{LayerElement, MappingMode, ReferenceMode};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<MeshNode>,
    pub materials: Vec<SurfaceMaterial>,
}

/// A polygon mesh with its per-vertex attribute layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub control_points: Vec<[f64; 3]>,
    /// Control-point indices of each polygon, in winding order.
    pub polygons: Vec<Vec<u32>>,
    pub normals: Vec<LayerElement<[f64; 3]>>,
    /// UV layers keyed by UV-set name, in file order.
    pub uv_sets: Vec<(String, LayerElement<[f64; 2]>)>,
    pub colors: Vec<LayerElement<[f64; 4]>>,
}

impl MeshNode {
    pub fn control_point_count(&self) -> usize {
        self.control_points.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn polygon_size(&self, polygon: usize) -> usize {
        self.polygons.get(polygon).map_or(0, Vec::len)
    }

    /// Control point visited by corner `corner` of polygon `polygon`.
    pub fn polygon_vertex(&self, polygon: usize, corner: usize) -> Option<u32> {
        self.polygons.get(polygon)?.get(corner).copied()
    }

    /// Total number of polygon corners.
    pub fn polygon_vertex_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }

    /// Every corner's control point, polygon after polygon.
    pub fn polygon_vertices(&self) -> impl Iterator<Item = u32> + '_ {
        self.polygons.iter().flatten().copied()
    }

    /// Distinct UV-set names, in file order.
    pub fn uv_set_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.uv_sets {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// First UV layer with the given set name.
    pub fn uv_element(&self, name: &str) -> Option<&LayerElement<[f64; 2]>> {
        self.uv_sets
            .iter()
            .find(|(set, _)| set == name)
            .map(|(_, layer)| layer)
    }
}

/// A standard material property slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Diffuse,
    Ambient,
    Emissive,
    Specular,
    TransparentColor,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; 5] = [
        MaterialSlot::Diffuse,
        MaterialSlot::Ambient,
        MaterialSlot::Emissive,
        MaterialSlot::Specular,
        MaterialSlot::TransparentColor,
    ];

    /// FBX property name of the slot.
    pub fn property_name(self) -> &'static str {
        match self {
            MaterialSlot::Diffuse => "DiffuseColor",
            MaterialSlot::Ambient => "AmbientColor",
            MaterialSlot::Emissive => "EmissiveColor",
            MaterialSlot::Specular => "SpecularColor",
            MaterialSlot::TransparentColor => "TransparentColor",
        }
    }

    pub fn from_property_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.property_name() == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMaterial {
    pub name: String,
    /// Slots the material declares or has textures connected to.
    pub slots: HashMap<MaterialSlot, MaterialProperty>,
}

impl SurfaceMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: HashMap::new(),
        }
    }

    /// The slot's property, if the material has it.
    pub fn find_property(&self, slot: MaterialSlot) -> Option<&MaterialProperty> {
        self.slots.get(&slot)
    }

    pub fn property_mut(&mut self, slot: MaterialSlot) -> &mut MaterialProperty {
        self.slots.entry(slot).or_default()
    }
}

/// Textures connected to one material property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialProperty {
    pub layered: Vec<LayeredTexture>,
    pub files: Vec<FileTexture>,
}

/// A stack of file textures composited under one property slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredTexture {
    pub name: String,
    pub files: Vec<FileTexture>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileTexture {
    pub name: String,
    pub relative_path: String,
    pub uv_set: String,
}

impl FileTexture {
    pub const DEFAULT_UV_SET: &'static str = "default";

    pub fn new(relative_path: impl Into<String>, uv_set: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        Self {
            name: relative_path.clone(),
            relative_path,
            uv_set: uv_set.into(),
        }
    }
}

enum TextureObject {
    File(FileTexture),
    Layered(LayeredTexture),
}

impl Scene {
    /// Interpret the `Objects` and `Connections` sections of an FBX document.
    pub fn from_document(doc: &Document) -> Self {
        let mut scene = Scene::default();
        let Some(objects) = doc.find("Objects") else {
            warn!("FBX document has no Objects section");
            return scene;
        };

        let mut material_ids: HashMap<i64, usize> = HashMap::new();
        let mut textures: HashMap<i64, TextureObject> = HashMap::new();

        for object in &objects.children {
            let Some(id) = object.property(0).and_then(Property::as_i64) else {
                continue;
            };
            let name = object_name(object);
            match object.name.as_str() {
                "Geometry" if object_class(object) == Some("Mesh") => {
                    scene.meshes.push(read_mesh(object, name));
                }
                "Material" => {
                    material_ids.insert(id, scene.materials.len());
                    scene.materials.push(read_material(object, name));
                }
                "Texture" => {
                    textures.insert(id, TextureObject::File(read_file_texture(object, name)));
                }
                "LayeredTexture" => {
                    textures.insert(
                        id,
                        TextureObject::Layered(LayeredTexture {
                            name,
                            files: Vec::new(),
                        }),
                    );
                }
                _ => {}
            }
        }

        let connections: Vec<Connection> = doc
            .find("Connections")
            .map(|c| c.children_named("C").filter_map(Connection::read).collect())
            .unwrap_or_default();

        // File textures stacked into layered textures first, so that the
        // layered textures are complete when they are attached to materials.
        for conn in connections.iter().filter(|c| c.property.is_none()) {
            let file = match textures.get(&conn.child) {
                Some(TextureObject::File(file)) => file.clone(),
                _ => continue,
            };
            if let Some(TextureObject::Layered(layered)) = textures.get_mut(&conn.parent) {
                layered.files.push(file);
            }
        }

        for conn in &connections {
            let Some(property) = conn.property.as_deref() else {
                continue;
            };
            let (Some(&material), Some(slot)) = (
                material_ids.get(&conn.parent),
                MaterialSlot::from_property_name(property),
            ) else {
                continue;
            };
            let target = scene.materials[material].property_mut(slot);
            match textures.get(&conn.child) {
                Some(TextureObject::File(file)) => target.files.push(file.clone()),
                Some(TextureObject::Layered(layered)) => target.layered.push(layered.clone()),
                None => {}
            }
        }

        debug!(
            "Scene: {} meshes, {} materials, {} textures",
            scene.meshes.len(),
            scene.materials.len(),
            textures.len()
        );
        scene
    }
}

struct Connection {
    child: i64,
    parent: i64,
    /// Target property for object-to-property links.
    property: Option<String>,
}

impl Connection {
    fn read(node: &Node) -> Option<Self> {
        let kind = node.property(0)?.as_str()?;
        let child = node.property(1)?.as_i64()?;
        let parent = node.property(2)?.as_i64()?;
        let property = match kind {
            "OP" => Some(node.property(3)?.as_str()?.to_string()),
            _ => None,
        };
        Some(Self {
            child,
            parent,
            property,
        })
    }
}

/// Object name without its class: binary files store `name\0\x01Class`,
/// ASCII files `Class::name`.
fn object_name(node: &Node) -> String {
    let raw = node.property(1).and_then(Property::as_str).unwrap_or_default();
    if let Some((name, _)) = raw.split_once("\0\u{1}") {
        name.to_string()
    } else if let Some((_, name)) = raw.split_once("::") {
        name.to_string()
    } else {
        raw.to_string()
    }
}

fn object_class(node: &Node) -> Option<&str> {
    node.property(2).and_then(Property::as_str)
}

fn read_mesh(node: &Node, name: String) -> MeshNode {
    let control_points = f64_array(node, "Vertices")
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    // The last corner of each polygon is stored as a bitwise-negated index.
    let mut polygons = Vec::new();
    let mut current = Vec::new();
    for raw in i32_array(node, "PolygonVertexIndex") {
        if raw < 0 {
            current.push(!raw as u32);
            polygons.push(std::mem::take(&mut current));
        } else {
            current.push(raw as u32);
        }
    }
    if !current.is_empty() {
        warn!("Mesh '{}': last polygon is not terminated, keeping it", name);
        polygons.push(current);
    }

    let normals = node
        .children_named("LayerElementNormal")
        .map(|layer| read_layer(layer, "Normals", "NormalsIndex", |c| [c[0], c[1], c[2]], 3))
        .collect();

    let uv_sets = node
        .children_named("LayerElementUV")
        .map(|layer| {
            let set = layer.child_str("Name").unwrap_or_default().to_string();
            (set, read_layer(layer, "UV", "UVIndex", |c| [c[0], c[1]], 2))
        })
        .collect();

    let colors = node
        .children_named("LayerElementColor")
        .map(|layer| read_layer(layer, "Colors", "ColorIndex", |c| [c[0], c[1], c[2], c[3]], 4))
        .collect();

    MeshNode {
        name,
        control_points,
        polygons,
        normals,
        uv_sets,
        colors,
    }
}

fn read_layer<T: Copy>(
    layer: &Node,
    values: &str,
    index: &str,
    pack: impl Fn(&[f64]) -> T,
    width: usize,
) -> LayerElement<T> {
    LayerElement {
        mapping: MappingMode::from_fbx(layer.child_str("MappingInformationType").unwrap_or_default()),
        reference: ReferenceMode::from_fbx(
            layer.child_str("ReferenceInformationType").unwrap_or_default(),
        ),
        direct: f64_array(layer, values).chunks_exact(width).map(pack).collect(),
        index: i32_array(layer, index),
    }
}

fn read_material(node: &Node, name: String) -> SurfaceMaterial {
    let mut material = SurfaceMaterial::new(name);
    for slot in declared_properties(node).filter_map(MaterialSlot::from_property_name) {
        material.property_mut(slot);
    }
    material
}

fn read_file_texture(node: &Node, name: String) -> FileTexture {
    let relative_path = node
        .child_str("RelativeFilename")
        .filter(|p| !p.is_empty())
        .or_else(|| node.child_str("FileName"))
        .unwrap_or_default()
        .to_string();
    let uv_set = property70_string(node, "UVSet")
        .filter(|s| !s.is_empty())
        .unwrap_or(FileTexture::DEFAULT_UV_SET)
        .to_string();

    FileTexture {
        name,
        relative_path,
        uv_set,
    }
}

/// Names of the `P` entries under `Properties70`.
fn declared_properties<'a>(node: &'a Node) -> impl Iterator<Item = &'a str> + 'a {
    node.child("Properties70")
        .into_iter()
        .flat_map(|props| props.children_named("P"))
        .filter_map(|p| p.property(0).and_then(Property::as_str))
}

/// Value of a string-typed `Properties70` entry (`P: name, type, label, flags, value`).
fn property70_string<'a>(node: &'a Node, name: &str) -> Option<&'a str> {
    node.child("Properties70")?
        .children_named("P")
        .find(|p| p.property(0).and_then(Property::as_str) == Some(name))?
        .property(4)?
        .as_str()
}

fn f64_array(node: &Node, name: &str) -> Vec<f64> {
    node.child(name)
        .and_then(|c| c.property(0))
        .and_then(Property::to_f64_vec)
        .unwrap_or_default()
}

fn i32_array(node: &Node, name: &str) -> Vec<i32> {
    node.child(name)
        .and_then(|c| c.property(0))
        .and_then(Property::to_i32_vec)
        .unwrap_or_default()
}
