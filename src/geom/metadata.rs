//! Geometry metadata decoding.
//!
//! `GeometryMetadata.pf` maps each geometry id to the mesh pack entry that
//! holds its payload: the pack id comes from a numeric string with a
//! literal ".pf" suffix, the entity id indexes into that pack's entries.

use std::path::Path;

use crate::pack::PackFile;
use crate::util::{Error, Result};

/// One per-geometry index record from `GeometryMetadata.pf`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeometryMetadata {
    /// Fragment type discriminator.
    pub fragment_type: u8,
    /// Primitive count of the referenced payload.
    pub primitive_count: u16,
    /// Numeric id of the owning mesh pack (`<pack_id>.pf`).
    pub pack_id: u32,
    /// Entry index inside the mesh pack.
    pub entity_id: u64,
}

/// Decode all geometry records from a raw `GeometryMetadata.pf` buffer.
///
/// Only entries with a type version >= 3 are decoded; earlier versions use
/// an incompatible layout and are silently skipped. Each qualifying entry
/// carries a 24-byte object-space bounding box that is intentionally
/// discarded.
pub fn parse_geometry_metadata(buffer: &[u8]) -> Result<Vec<GeometryMetadata>> {
    let pack = PackFile::parse(buffer)?;
    let mut geometries = Vec::with_capacity(pack.num_entries());

    for i in 0..pack.num_entries() {
        let Some((entry_type, mut cur)) = pack.seek_entry(i)? else {
            continue;
        };
        if entry_type.version < 3 {
            continue;
        }

        let fragment_type = cur.read_u8()?;
        cur.skip(24); // object-space bbox
        let primitive_count = cur.read_u16()?;
        let pack_name = cur.read_varint_string()?;
        let pack_id = pack_name
            .strip_suffix(".pf")
            .unwrap_or(&pack_name)
            .parse::<u32>()
            .map_err(|_| Error::NonNumericPackId(pack_name.clone()))?;
        let entity_id = cur.read_varint()?;

        geometries.push(GeometryMetadata {
            fragment_type,
            primitive_count,
            pack_id,
            entity_id,
        });
    }

    Ok(geometries)
}

/// Decode geometry metadata from a `GeometryMetadata.pf` on disk.
pub fn parse_geometry_metadata_from_file(path: impl AsRef<Path>) -> Result<Vec<GeometryMetadata>> {
    let buffer = std::fs::read(path)?;
    parse_geometry_metadata(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_varint(out: &mut Vec<u8>, mut v: u64) {
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

    fn put_str(out: &mut Vec<u8>, s: &str) {
        put_varint(out, s.len() as u64);
        out.extend_from_slice(s.as_bytes());
    }

    fn geometry_entry(pack_name: &str, entity_id: u64) -> Vec<u8> {
        let mut e = Vec::new();
        e.push(2); // fragment type
        e.extend_from_slice(&[0u8; 24]); // object-space bbox, discarded
        e.extend_from_slice(&9u16.to_le_bytes()); // primitive count
        put_str(&mut e, pack_name);
        put_varint(&mut e, entity_id);
        e
    }

    fn metadata_pack(entry_versions: &[u32], entries: &[Vec<u8>]) -> Vec<u8> {
        assert_eq!(entry_versions.len(), entries.len());
        let mut out = Vec::new();
        put_str(&mut out, "Autodesk.CloudPlatform.GeometryMetadataList");
        out.extend_from_slice(&1i32.to_le_bytes());

        let mut offsets = Vec::new();
        for (i, e) in entries.iter().enumerate() {
            offsets.push(out.len() as u32);
            out.extend_from_slice(&(i as u32).to_le_bytes());
            out.extend_from_slice(e);
        }
        let entries_offset = out.len() as u32;
        put_varint(&mut out, offsets.len() as u64);
        for off in &offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        let types_offset = out.len() as u32;
        put_varint(&mut out, entry_versions.len() as u64);
        for v in entry_versions {
            put_str(&mut out, "Autodesk.CloudPlatform.DesignDescription");
            put_str(&mut out, "Autodesk.CloudPlatform.GeometryMetadata");
            put_varint(&mut out, u64::from(*v));
        }
        out.extend_from_slice(&entries_offset.to_le_bytes());
        out.extend_from_slice(&types_offset.to_le_bytes());
        out
    }

    #[test]
    fn test_parse_record() {
        let buf = metadata_pack(&[3], &[geometry_entry("12.pf", 4)]);
        let geos = parse_geometry_metadata(&buf).unwrap();
        assert_eq!(
            geos,
            vec![GeometryMetadata {
                fragment_type: 2,
                primitive_count: 9,
                pack_id: 12,
                entity_id: 4,
            }]
        );
    }

    #[test]
    fn test_old_versions_skipped() {
        let buf = metadata_pack(
            &[2, 3],
            &[geometry_entry("0.pf", 1), geometry_entry("1.pf", 2)],
        );
        let geos = parse_geometry_metadata(&buf).unwrap();
        assert_eq!(geos.len(), 1);
        assert_eq!(geos[0].pack_id, 1);
    }

    #[test]
    fn test_non_numeric_pack_id() {
        let buf = metadata_pack(&[3], &[geometry_entry("abc.pf", 1)]);
        assert!(matches!(
            parse_geometry_metadata(&buf),
            Err(Error::NonNumericPackId(name)) if name == "abc.pf"
        ));
    }
}
