//! Binary FBX reader (versions 7.x).
//!
//! Layout: 21-byte magic, two reserved bytes, a little-endian `u32` version,
//! then a list of node records terminated by a null record. Record header
//! fields are `u32` before version 7500 and `u64` from 7500 on.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::debug;

use super::{Document, Node, ParseError, Property, MAX_DEPTH};

const MAGIC: &[u8] = b"Kaydara FBX Binary  \0";

/// Magic plus the two reserved bytes that precede the version.
const HEADER_LEN: usize = 23;

pub(super) fn is_binary(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

pub(super) fn parse(data: &[u8]) -> Result<Document, ParseError> {
    let mut reader = Reader {
        data,
        pos: HEADER_LEN,
    };
    let version = reader.u32()?;
    let wide = version >= 7500;

    let mut nodes = Vec::new();
    while reader.pos < data.len() {
        match reader.record(wide, 0)? {
            Some(node) => nodes.push(node),
            None => break,
        }
    }

    debug!("Parsed binary FBX v{}: {} top-level nodes", version, nodes.len());
    Ok(Document { version, nodes })
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ParseError::UnexpectedEof(self.pos))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, ParseError> {
        Ok(u32::from_le_bytes(self.bytes()?))
    }

    fn u64(&mut self) -> Result<u64, ParseError> {
        Ok(u64::from_le_bytes(self.bytes()?))
    }

    /// Record header field, sized by file version.
    fn offset(&mut self, wide: bool) -> Result<usize, ParseError> {
        let at = self.pos;
        let value = if wide { self.u64()? } else { self.u32()? as u64 };
        usize::try_from(value).map_err(|_| ParseError::InvalidRecord {
            offset: at,
            reason: format!("offset {value} does not fit in memory"),
        })
    }

    /// Read one node record. `None` means a null (terminating) record.
    fn record(&mut self, wide: bool, depth: usize) -> Result<Option<Node>, ParseError> {
        let start = self.pos;
        if depth > MAX_DEPTH {
            return Err(ParseError::InvalidRecord {
                offset: start,
                reason: format!("nodes nested deeper than {MAX_DEPTH}"),
            });
        }
        let end_offset = self.offset(wide)?;
        let property_count = self.offset(wide)?;
        let property_len = self.offset(wide)?;
        let name_len = self.u8()? as usize;

        if end_offset == 0 {
            return Ok(None);
        }
        if end_offset > self.data.len() {
            return Err(ParseError::InvalidRecord {
                offset: start,
                reason: format!("end offset {end_offset} past end of file"),
            });
        }

        let name = String::from_utf8_lossy(self.take(name_len)?).into_owned();

        let properties_start = self.pos;
        // Cap the preallocation; the count comes straight from the file.
        let mut properties = Vec::with_capacity(property_count.min(64));
        for _ in 0..property_count {
            properties.push(self.property()?);
        }
        if self.pos - properties_start != property_len {
            return Err(ParseError::InvalidRecord {
                offset: start,
                reason: format!(
                    "node '{name}' declares {property_len} property bytes, read {}",
                    self.pos - properties_start
                ),
            });
        }
        if self.pos > end_offset {
            return Err(ParseError::InvalidRecord {
                offset: start,
                reason: format!("node '{name}' overruns its end offset"),
            });
        }

        let mut children = Vec::new();
        while self.pos < end_offset {
            match self.record(wide, depth + 1)? {
                Some(child) => children.push(child),
                None => break,
            }
        }
        self.pos = end_offset;

        Ok(Some(Node {
            name,
            properties,
            children,
        }))
    }

    fn property(&mut self) -> Result<Property, ParseError> {
        let offset = self.pos;
        let code = self.u8()?;
        let property = match code {
            b'C' => Property::Bool(self.u8()? != 0),
            b'Y' => Property::I16(i16::from_le_bytes(self.bytes()?)),
            b'I' => Property::I32(i32::from_le_bytes(self.bytes()?)),
            b'L' => Property::I64(i64::from_le_bytes(self.bytes()?)),
            b'F' => Property::F32(f32::from_le_bytes(self.bytes()?)),
            b'D' => Property::F64(f64::from_le_bytes(self.bytes()?)),
            b'S' => {
                let len = self.u32()? as usize;
                Property::String(String::from_utf8_lossy(self.take(len)?).into_owned())
            }
            b'R' => {
                let len = self.u32()? as usize;
                Property::Raw(self.take(len)?.to_vec())
            }
            b'b' => Property::BoolArray(self.array(1, |b| b[0] != 0)?),
            b'i' => Property::I32Array(self.array(4, |b| i32::from_le_bytes(le4(b)))?),
            b'l' => Property::I64Array(self.array(8, |b| i64::from_le_bytes(le8(b)))?),
            b'f' => Property::F32Array(self.array(4, |b| f32::from_le_bytes(le4(b)))?),
            b'd' => Property::F64Array(self.array(8, |b| f64::from_le_bytes(le8(b)))?),
            code => return Err(ParseError::UnknownPropertyType { code, offset }),
        };
        Ok(property)
    }

    /// Array property body: count, encoding (0 raw, 1 zlib), byte length, data.
    fn array<T>(&mut self, width: usize, decode: impl Fn(&[u8]) -> T) -> Result<Vec<T>, ParseError> {
        let offset = self.pos;
        let count = self.u32()? as usize;
        let encoding = self.u32()?;
        let byte_len = self.u32()? as usize;
        let raw = self.take(byte_len)?;

        let expected = count.checked_mul(width).ok_or_else(|| ParseError::InvalidRecord {
            offset,
            reason: format!("array of {count} elements is too large"),
        })?;

        let bytes: Cow<'_, [u8]> = match encoding {
            0 => Cow::Borrowed(raw),
            1 => {
                // The count comes straight from the file; size by what is there.
                let mut inflated = Vec::with_capacity(expected.min(byte_len.saturating_mul(4)));
                ZlibDecoder::new(raw)
                    .take(expected as u64)
                    .read_to_end(&mut inflated)
                    .map_err(|e| ParseError::Inflate {
                        offset,
                        reason: e.to_string(),
                    })?;
                Cow::Owned(inflated)
            }
            other => {
                return Err(ParseError::InvalidRecord {
                    offset,
                    reason: format!("unknown array encoding {other}"),
                })
            }
        };

        if bytes.len() < expected {
            return Err(ParseError::InvalidRecord {
                offset,
                reason: format!("array holds {} bytes, expected {expected}", bytes.len()),
            });
        }

        Ok(bytes[..expected].chunks_exact(width).map(decode).collect())
    }
}

fn le4(b: &[u8]) -> [u8; 4] {
    [b[0], b[1], b[2], b[3]]
}

fn le8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn header(version: u32) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        out.extend([0x1a, 0x00]);
        out.extend(version.to_le_bytes());
        out
    }

    /// Append a 32-bit node record with absolute offsets patched in.
    fn node(out: &mut Vec<u8>, name: &str, props: &[Vec<u8>], children: impl FnOnce(&mut Vec<u8>)) {
        let header_at = out.len();
        out.extend([0u8; 12]);
        out.push(name.len() as u8);
        out.extend(name.as_bytes());
        let props_at = out.len();
        for p in props {
            out.extend(p);
        }
        let props_len = out.len() - props_at;
        let children_at = out.len();
        children(out);
        if out.len() > children_at {
            out.extend([0u8; 13]);
        }
        let end = out.len() as u32;
        out[header_at..header_at + 4].copy_from_slice(&end.to_le_bytes());
        out[header_at + 4..header_at + 8].copy_from_slice(&(props.len() as u32).to_le_bytes());
        out[header_at + 8..header_at + 12].copy_from_slice(&(props_len as u32).to_le_bytes());
    }

    fn string(s: &str) -> Vec<u8> {
        let mut out = vec![b'S'];
        out.extend((s.len() as u32).to_le_bytes());
        out.extend(s.as_bytes());
        out
    }

    fn i64_prop(v: i64) -> Vec<u8> {
        let mut out = vec![b'L'];
        out.extend(v.to_le_bytes());
        out
    }

    fn f64_array(values: &[f64]) -> Vec<u8> {
        let mut out = vec![b'd'];
        out.extend((values.len() as u32).to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.extend(((values.len() * 8) as u32).to_le_bytes());
        for v in values {
            out.extend(v.to_le_bytes());
        }
        out
    }

    fn compressed_i32_array(values: &[i32]) -> Vec<u8> {
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let packed = encoder.finish().unwrap();

        let mut out = vec![b'i'];
        out.extend((values.len() as u32).to_le_bytes());
        out.extend(1u32.to_le_bytes());
        out.extend((packed.len() as u32).to_le_bytes());
        out.extend(packed);
        out
    }

    fn sample_file() -> Vec<u8> {
        let mut out = header(7400);
        node(&mut out, "Objects", &[], |out| {
            node(
                out,
                "Geometry",
                &[i64_prop(42), string("Tri\0\x01Geometry"), string("Mesh")],
                |out| {
                    node(out, "Vertices", &[f64_array(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])], |_| {});
                    node(out, "PolygonVertexIndex", &[compressed_i32_array(&[0, 1, -3])], |_| {});
                },
            );
        });
        out.extend([0u8; 13]);
        out
    }

    #[test]
    fn detects_magic() {
        assert!(is_binary(&sample_file()));
        assert!(!is_binary(b"; FBX 7.4.0 project file"));
    }

    #[test]
    fn parses_nested_records_and_arrays() {
        let doc = parse(&sample_file()).unwrap();
        assert_eq!(doc.version, 7400);

        let objects = doc.find("Objects").unwrap();
        let geometry = objects.child("Geometry").unwrap();
        assert_eq!(geometry.property(0), Some(&Property::I64(42)));
        assert_eq!(geometry.property(2).and_then(Property::as_str), Some("Mesh"));

        let vertices = geometry.child("Vertices").unwrap().property(0).unwrap();
        assert_eq!(vertices.to_f64_vec().unwrap().len(), 9);

        let polygons = geometry.child("PolygonVertexIndex").unwrap().property(0).unwrap();
        assert_eq!(polygons, &Property::I32Array(vec![0, 1, -3]));
    }

    #[test]
    fn truncated_file_is_an_error() {
        let file = sample_file();
        for cut in [HEADER_LEN + 2, 40, file.len() / 2] {
            assert!(parse(&file[..cut]).is_err(), "cut at {cut} should fail");
        }
    }

    #[test]
    fn oversized_compressed_array_is_an_error() {
        let mut prop = vec![b'd'];
        prop.extend(u32::MAX.to_le_bytes());
        prop.extend(1u32.to_le_bytes());
        prop.extend(0u32.to_le_bytes());

        let mut out = header(7400);
        node(&mut out, "Huge", &[prop], |_| {});
        out.extend([0u8; 13]);
        assert!(parse(&out).is_err());
    }

    #[test]
    fn nesting_depth_is_bounded() {
        fn nest(out: &mut Vec<u8>, levels: usize) {
            if levels > 0 {
                node(out, "A", &[], |out| nest(out, levels - 1));
            }
        }

        let mut out = header(7400);
        nest(&mut out, MAX_DEPTH + 2);
        out.extend([0u8; 13]);
        match parse(&out) {
            Err(ParseError::InvalidRecord { reason, .. }) => assert!(reason.contains("nested"), "{reason}"),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }

        let mut out = header(7400);
        nest(&mut out, MAX_DEPTH);
        out.extend([0u8; 13]);
        assert!(parse(&out).is_ok());
    }

    #[test]
    fn unknown_property_type_is_reported() {
        let mut out = header(7400);
        node(&mut out, "Bad", &[vec![b'Z', 0, 0, 0, 0]], |_| {});
        out.extend([0u8; 13]);
        match parse(&out) {
            Err(ParseError::UnknownPropertyType { code: b'Z', .. }) => {}
            other => panic!("expected UnknownPropertyType, got {other:?}"),
        }
    }
}
