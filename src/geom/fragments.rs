//! Fragment list decoding.
//!
//! A fragment pairs one geometry+material with a placement transform and
//! the property-database element that owns it. Fragment order is
//! significant: the entry index is the implicit fragment index other parts
//! of the derivative refer to.

use std::path::Path;

use crate::pack::{GeomRead, PackFile, Transform};
use crate::util::{Error, Result};

/// One placement record from `FragmentList.pack`.
#[derive(Clone, Debug)]
pub struct Fragment {
    /// Bit 0 of the entry flags.
    pub visible: bool,
    /// Index into the material graph's group order.
    pub material_id: u64,
    /// Index into the geometry metadata table.
    pub geometry_id: u64,
    /// Placement transform; `None` when the entry carried an unrecognized
    /// transform tag.
    pub transform: Option<Transform>,
    /// Absolute world-space bounds, min xyz then max xyz.
    pub bbox: [f32; 6],
    /// Owning element in the property database.
    pub db_id: u64,
}

/// Decode all fragments from a raw `FragmentList.pack` buffer.
///
/// Every entry must carry a type of version > 4; older layouts are a hard
/// format error. When the type version is > 3 the bounding box is encoded
/// relative to the fragment's local origin and each axis is offset by the
/// transform's translation component before storage.
pub fn parse_fragments(buffer: &[u8]) -> Result<Vec<Fragment>> {
    let pack = PackFile::parse(buffer)?;
    let mut fragments = Vec::with_capacity(pack.num_entries());

    for i in 0..pack.num_entries() {
        let (entry_type, mut cur) = pack.seek_entry(i)?.ok_or_else(|| {
            Error::invalid(format!("fragment entry {i} has no resolvable type"))
        })?;
        if entry_type.version <= 4 {
            return Err(Error::UnsupportedVersion {
                context: "fragment entry",
                found: i64::from(entry_type.version),
            });
        }

        let flags = cur.read_u8()?;
        let visible = flags & 0x01 != 0;
        let material_id = cur.read_varint()?;
        let geometry_id = cur.read_varint()?;
        let transform = cur.read_transform()?;

        let mut bbox_offset = [0f32; 3];
        if entry_type.version > 3 {
            if let Some(t) = transform.as_ref().map(Transform::translation) {
                bbox_offset = [t.x as f32, t.y as f32, t.z as f32];
            }
        }
        let mut bbox = [0f32; 6];
        for (j, v) in bbox.iter_mut().enumerate() {
            *v = cur.read_f32()? + bbox_offset[j % 3];
        }

        let db_id = cur.read_varint()?;

        fragments.push(Fragment {
            visible,
            material_id,
            geometry_id,
            transform,
            bbox,
            db_id,
        });
    }

    Ok(fragments)
}

/// Decode fragments from a `FragmentList.pack` on disk.
pub fn parse_fragments_from_file(path: impl AsRef<Path>) -> Result<Vec<Fragment>> {
    let buffer = std::fs::read(path)?;
    parse_fragments(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wire-image helpers shared with the integration tests live in
    // tests/common; these cover just what the unit tests need.
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

    fn fragment_entry(translation: [f64; 3], bbox: [f32; 6], db_id: u64) -> Vec<u8> {
        let mut e = Vec::new();
        e.push(0x01); // flags: visible
        put_varint(&mut e, 3); // material id
        put_varint(&mut e, 7); // geometry id
        e.push(0); // transform tag: translation
        for v in translation {
            e.extend_from_slice(&v.to_le_bytes());
        }
        for v in bbox {
            e.extend_from_slice(&v.to_le_bytes());
        }
        put_varint(&mut e, db_id);
        e
    }

    fn fragment_pack(entry_version: u32, entries: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        put_str(&mut out, "Autodesk.CloudPlatform.FragmentList");
        out.extend_from_slice(&1i32.to_le_bytes());

        let mut offsets = Vec::new();
        for e in entries {
            offsets.push(out.len() as u32);
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(e);
        }
        let entries_offset = out.len() as u32;
        put_varint(&mut out, offsets.len() as u64);
        for off in &offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        let types_offset = out.len() as u32;
        put_varint(&mut out, 1);
        put_str(&mut out, "Autodesk.CloudPlatform.DesignDescription");
        put_str(&mut out, "Autodesk.CloudPlatform.FragmentList");
        put_varint(&mut out, u64::from(entry_version));
        out.extend_from_slice(&entries_offset.to_le_bytes());
        out.extend_from_slice(&types_offset.to_le_bytes());
        out
    }

    #[test]
    fn test_end_to_end_fragment() {
        let entry = fragment_entry([1.0, 2.0, 3.0], [0.0, 0.0, 0.0, 2.0, 2.0, 2.0], 42);
        let buf = fragment_pack(5, &[entry]);

        let frags = parse_fragments(&buf).unwrap();
        assert_eq!(frags.len(), 1);
        let f = &frags[0];
        assert!(f.visible);
        assert_eq!(f.material_id, 3);
        assert_eq!(f.geometry_id, 7);
        assert_eq!(f.db_id, 42);
        assert_eq!(f.bbox, [1.0, 2.0, 3.0, 3.0, 4.0, 5.0]);
        assert!(matches!(f.transform, Some(Transform::Translation { .. })));
    }

    #[test]
    fn test_bbox_correction_follows_translation() {
        let entry = fragment_entry([10.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 1);
        let buf = fragment_pack(5, &[entry]);
        let frags = parse_fragments(&buf).unwrap();
        assert_eq!(frags[0].bbox, [10.0, 0.0, 0.0, 11.0, 1.0, 1.0]);
    }

    #[test]
    fn test_old_entry_version_rejected() {
        let entry = fragment_entry([0.0, 0.0, 0.0], [0.0; 6], 1);
        let buf = fragment_pack(4, &[entry]);
        assert!(matches!(
            parse_fragments(&buf),
            Err(Error::UnsupportedVersion { context: "fragment entry", found: 4 })
        ));
    }

    #[test]
    fn test_entry_order_preserved() {
        let entries = vec![
            fragment_entry([0.0, 0.0, 0.0], [0.0; 6], 10),
            fragment_entry([0.0, 0.0, 0.0], [0.0; 6], 20),
            fragment_entry([0.0, 0.0, 0.0], [0.0; 6], 30),
        ];
        let buf = fragment_pack(5, &entries);
        let frags = parse_fragments(&buf).unwrap();
        let ids: Vec<u64> = frags.iter().map(|f| f.db_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
