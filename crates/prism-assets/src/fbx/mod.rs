//! FBX document reader.
//!
//! Both the binary and the ASCII encodings are decoded into the same generic
//! node tree. Interpreting that tree as meshes and materials happens in
//! [`crate::scene`].

mod ascii;
mod binary;

/// Deepest node nesting either reader accepts.
const MAX_DEPTH: usize = 256;

/// Errors produced while decoding an FBX byte stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    #[error("invalid node record at offset {offset}: {reason}")]
    InvalidRecord { offset: usize, reason: String },

    #[error("unknown property type code {code:#04x} at offset {offset}")]
    UnknownPropertyType { code: u8, offset: usize },

    #[error("failed to inflate compressed array at offset {offset}: {reason}")]
    Inflate { offset: usize, reason: String },

    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("file is neither binary FBX nor UTF-8 text")]
    NotText,
}

/// A decoded FBX file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// FBX version number (e.g. 7400). ASCII files report the value of
    /// `FBXHeaderExtension/FBXVersion` when present, otherwise 0.
    pub version: u32,
    pub nodes: Vec<Node>,
}

impl Document {
    /// Decode an FBX file, picking the binary or ASCII reader by magic header.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        if binary::is_binary(data) {
            binary::parse(data)
        } else {
            let text = std::str::from_utf8(data).map_err(|_| ParseError::NotText)?;
            ascii::parse(text)
        }
    }

    /// First top-level node with the given name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// One node record: a name, an ordered property list and nested children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in file order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn property(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// String value of the first property of the named child.
    pub fn child_str(&self, name: &str) -> Option<&str> {
        self.child(name)?.property(0)?.as_str()
    }
}

/// A typed node property.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Raw(Vec<u8>),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
}

impl Property {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value of a scalar property. Floats are accepted when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Property::Bool(b) => Some(b as i64),
            Property::I16(v) => Some(v as i64),
            Property::I32(v) => Some(v as i64),
            Property::I64(v) => Some(v),
            Property::F32(v) if v.fract() == 0.0 => Some(v as i64),
            Property::F64(v) if v.fract() == 0.0 => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Property::I16(v) => Some(v as f64),
            Property::I32(v) => Some(v as f64),
            Property::I64(v) => Some(v as f64),
            Property::F32(v) => Some(v as f64),
            Property::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Any numeric array widened to `f64`.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Property::I32Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Property::I64Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Property::F32Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Property::F64Array(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Any integer array narrowed to `i32`. Values outside the `i32` range
    /// make the whole conversion fail.
    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        match self {
            Property::I32Array(v) => Some(v.clone()),
            Property::I64Array(v) => v.iter().map(|&x| i32::try_from(x).ok()).collect(),
            _ => None,
        }
    }
}
