//! Per-vertex attribute layers and the strategy table that decides how each
//! (mapping mode, reference mode) pair is read.

use std::fmt;

/// How a layer's values correspond to mesh elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingMode {
    None,
    /// One value per control point.
    ByControlPoint,
    /// One value per polygon corner, in polygon-then-corner order.
    ByPolygonVertex,
    /// One value per polygon.
    ByPolygon,
    ByEdge,
    /// A single value for the whole mesh.
    AllSame,
}

impl MappingMode {
    pub const ALL: [MappingMode; 6] = [
        MappingMode::None,
        MappingMode::ByControlPoint,
        MappingMode::ByPolygonVertex,
        MappingMode::ByPolygon,
        MappingMode::ByEdge,
        MappingMode::AllSame,
    ];

    /// Parse an FBX `MappingInformationType` value.
    pub fn from_fbx(name: &str) -> Self {
        match name {
            "ByVertice" | "ByVertex" | "ByControlPoint" => MappingMode::ByControlPoint,
            "ByPolygonVertex" => MappingMode::ByPolygonVertex,
            "ByPolygon" => MappingMode::ByPolygon,
            "ByEdge" => MappingMode::ByEdge,
            "AllSame" => MappingMode::AllSame,
            _ => MappingMode::None,
        }
    }
}

/// Whether values are stored directly or indirected through an index array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceMode {
    Direct,
    Index,
    IndexToDirect,
}

impl ReferenceMode {
    pub const ALL: [ReferenceMode; 3] = [
        ReferenceMode::Direct,
        ReferenceMode::Index,
        ReferenceMode::IndexToDirect,
    ];

    /// Parse an FBX `ReferenceInformationType` value. Unknown values read as direct.
    pub fn from_fbx(name: &str) -> Self {
        match name {
            "Index" => ReferenceMode::Index,
            "IndexToDirect" => ReferenceMode::IndexToDirect,
            _ => ReferenceMode::Direct,
        }
    }

    pub fn is_indexed(self) -> bool {
        !matches!(self, ReferenceMode::Direct)
    }
}

/// One attribute layer of a mesh: a direct value array plus an optional
/// index array, interpreted according to the mapping and reference modes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerElement<T> {
    pub mapping: MappingMode,
    pub reference: ReferenceMode,
    pub direct: Vec<T>,
    pub index: Vec<i32>,
}

impl<T: Copy> LayerElement<T> {
    pub fn direct(mapping: MappingMode, direct: Vec<T>) -> Self {
        Self {
            mapping,
            reference: ReferenceMode::Direct,
            direct,
            index: Vec::new(),
        }
    }

    pub fn indexed(mapping: MappingMode, direct: Vec<T>, index: Vec<i32>) -> Self {
        Self {
            mapping,
            reference: ReferenceMode::IndexToDirect,
            direct,
            index,
        }
    }

    /// Resolve the value at `position` (a control-point, visit or polygon
    /// index, depending on the mapping). Indexed layers go through the index
    /// array first. `None` when either lookup is out of range.
    pub fn resolve(&self, position: usize) -> Option<T> {
        let slot = if self.reference.is_indexed() {
            usize::try_from(*self.index.get(position)?).ok()?
        } else {
            position
        };
        self.direct.get(slot).copied()
    }

    /// Number of positions this layer can address: the index array length
    /// for indexed layers, the direct array length otherwise.
    pub fn addressable_len(&self) -> usize {
        if self.reference.is_indexed() {
            self.index.len()
        } else {
            self.direct.len()
        }
    }
}

/// Which attribute a layer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Normal,
    Uv,
    Color,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeKind::Normal => "normal",
            AttributeKind::Uv => "uv",
            AttributeKind::Color => "color",
        })
    }
}

/// A (mapping, reference) pair that has no read strategy for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{attribute} layer mapped {mapping:?} with {reference:?} reference is not supported")]
pub struct Unsupported {
    pub attribute: AttributeKind,
    pub mapping: MappingMode,
    pub reference: ReferenceMode,
}

/// How the values of a supported layer are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Position `i` of the direct array belongs to control point `i`.
    ControlPointDirect,
    /// Control point `i` reads `direct[index[i]]`.
    ControlPointIndexed,
    /// Visit `v` reads `direct[v]`.
    PolygonVertexDirect,
    /// Visit `v` reads `direct[index[v]]`.
    PolygonVertexIndexed,
    /// `direct[0]` applies to every control point.
    Uniform,
}

impl ReadStrategy {
    /// Normals: only per-control-point direct layers are read.
    pub fn for_normals(mapping: MappingMode, reference: ReferenceMode) -> Result<Self, Unsupported> {
        use MappingMode as M;
        use ReferenceMode as R;

        match (mapping, reference) {
            (M::ByControlPoint, R::Direct) => Ok(ReadStrategy::ControlPointDirect),
            (M::ByControlPoint, R::Index | R::IndexToDirect)
            | (M::ByPolygonVertex, R::Direct | R::Index | R::IndexToDirect)
            | (M::ByPolygon, R::Direct | R::Index | R::IndexToDirect)
            | (M::ByEdge, R::Direct | R::Index | R::IndexToDirect)
            | (M::AllSame, R::Direct | R::Index | R::IndexToDirect)
            | (M::None, R::Direct | R::Index | R::IndexToDirect) => {
                Err(unsupported(AttributeKind::Normal, mapping, reference))
            }
        }
    }

    /// UVs: per-control-point and per-polygon-vertex, either reference mode.
    pub fn for_uvs(mapping: MappingMode, reference: ReferenceMode) -> Result<Self, Unsupported> {
        use MappingMode as M;
        use ReferenceMode as R;

        match (mapping, reference) {
            (M::ByControlPoint, R::Direct) => Ok(ReadStrategy::ControlPointDirect),
            (M::ByControlPoint, R::Index | R::IndexToDirect) => Ok(ReadStrategy::ControlPointIndexed),
            (M::ByPolygonVertex, R::Direct) => Ok(ReadStrategy::PolygonVertexDirect),
            (M::ByPolygonVertex, R::Index | R::IndexToDirect) => Ok(ReadStrategy::PolygonVertexIndexed),
            (M::ByPolygon, R::Direct | R::Index | R::IndexToDirect)
            | (M::ByEdge, R::Direct | R::Index | R::IndexToDirect)
            | (M::AllSame, R::Direct | R::Index | R::IndexToDirect)
            | (M::None, R::Direct | R::Index | R::IndexToDirect) => {
                Err(unsupported(AttributeKind::Uv, mapping, reference))
            }
        }
    }

    /// Colors: only cells that map losslessly onto control points.
    pub fn for_colors(mapping: MappingMode, reference: ReferenceMode) -> Result<Self, Unsupported> {
        use MappingMode as M;
        use ReferenceMode as R;

        match (mapping, reference) {
            (M::ByControlPoint, R::Direct) => Ok(ReadStrategy::ControlPointDirect),
            (M::ByControlPoint, R::Index | R::IndexToDirect) => Ok(ReadStrategy::ControlPointIndexed),
            (M::AllSame, R::Direct) => Ok(ReadStrategy::Uniform),
            (M::AllSame, R::Index | R::IndexToDirect)
            | (M::ByPolygonVertex, R::Direct | R::Index | R::IndexToDirect)
            | (M::ByPolygon, R::Direct | R::Index | R::IndexToDirect)
            | (M::ByEdge, R::Direct | R::Index | R::IndexToDirect)
            | (M::None, R::Direct | R::Index | R::IndexToDirect) => {
                Err(unsupported(AttributeKind::Color, mapping, reference))
            }
        }
    }

    pub fn for_attribute(
        attribute: AttributeKind,
        mapping: MappingMode,
        reference: ReferenceMode,
    ) -> Result<Self, Unsupported> {
        match attribute {
            AttributeKind::Normal => Self::for_normals(mapping, reference),
            AttributeKind::Uv => Self::for_uvs(mapping, reference),
            AttributeKind::Color => Self::for_colors(mapping, reference),
        }
    }
}

fn unsupported(attribute: AttributeKind, mapping: MappingMode, reference: ReferenceMode) -> Unsupported {
    Unsupported {
        attribute,
        mapping,
        reference,
    }
}
