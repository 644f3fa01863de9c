//! Shared wire-image builders for the integration tests.
#![allow(dead_code)]

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

pub fn put_varint(out: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

pub fn put_str(out: &mut Vec<u8>, s: &str) {
    put_varint(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Entry type record for a [`PackBuilder`].
pub struct TypeRecord {
    pub type_class: &'static str,
    pub type_name: &'static str,
    pub version: u32,
}

/// Builds a pack file image: header, entry records, entries table, types
/// table, footer.
pub struct PackBuilder {
    container_type: &'static str,
    container_version: i32,
    types: Vec<TypeRecord>,
    /// (type index, payload)
    entries: Vec<(u32, Vec<u8>)>,
}

impl PackBuilder {
    pub fn new(container_type: &'static str) -> Self {
        Self {
            container_type,
            container_version: 1,
            types: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_class: &'static str, type_name: &'static str, version: u32) -> Self {
        self.types.push(TypeRecord { type_class, type_name, version });
        self
    }

    pub fn with_entry(mut self, type_index: u32, payload: Vec<u8>) -> Self {
        self.entries.push((type_index, payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        put_str(&mut out, self.container_type);
        out.extend_from_slice(&self.container_version.to_le_bytes());

        let mut entry_offsets = Vec::new();
        for (type_index, payload) in &self.entries {
            entry_offsets.push(out.len() as u32);
            out.extend_from_slice(&type_index.to_le_bytes());
            out.extend_from_slice(payload);
        }

        let entries_offset = out.len() as u32;
        put_varint(&mut out, entry_offsets.len() as u64);
        for off in &entry_offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }

        let types_offset = out.len() as u32;
        put_varint(&mut out, self.types.len() as u64);
        for ty in &self.types {
            put_str(&mut out, ty.type_class);
            put_str(&mut out, ty.type_name);
            put_varint(&mut out, u64::from(ty.version));
        }

        out.extend_from_slice(&entries_offset.to_le_bytes());
        out.extend_from_slice(&types_offset.to_le_bytes());
        out
    }
}

/// A fragment entry payload: visible flag, ids, translation transform,
/// raw bbox, owning dbId.
pub fn fragment_entry(
    material_id: u64,
    geometry_id: u64,
    translation: [f64; 3],
    bbox: [f32; 6],
    db_id: u64,
) -> Vec<u8> {
    let mut e = Vec::new();
    e.push(0x01);
    put_varint(&mut e, material_id);
    put_varint(&mut e, geometry_id);
    e.push(0); // transform tag 0: translation
    for v in translation {
        e.extend_from_slice(&v.to_le_bytes());
    }
    for v in bbox {
        e.extend_from_slice(&v.to_le_bytes());
    }
    put_varint(&mut e, db_id);
    e
}

/// A geometry metadata entry payload.
pub fn geometry_entry(pack_name: &str, primitive_count: u16, entity_id: u64) -> Vec<u8> {
    let mut e = Vec::new();
    e.push(1); // fragment type
    e.extend_from_slice(&[0u8; 24]); // discarded object-space bbox
    e.extend_from_slice(&primitive_count.to_le_bytes());
    put_str(&mut e, pack_name);
    put_varint(&mut e, entity_id);
    e
}

/// An OpenCTM RAW entry payload holding one triangle, no normals or UVs.
pub fn octm_triangle_entry() -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"OCTM");
    b.extend_from_slice(&5i32.to_le_bytes());
    b.extend_from_slice(b"RAW\0");

    for count in [3i32, 1, 0, 0, 0, 0] {
        // vertices, triangles, uv maps, attrs, flags, comment length
        b.extend_from_slice(&count.to_le_bytes());
    }

    b.extend_from_slice(b"INDX");
    for idx in [0u32, 1, 2] {
        b.extend_from_slice(&idx.to_le_bytes());
    }
    b.extend_from_slice(b"VERT");
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        b.extend_from_slice(&v.to_le_bytes());
    }
    b
}
