//! Pack file container parsing.

use tracing::warn;

use crate::util::{decompress_if_gzip, ByteCursor, Error, Result};
use super::{PackType, FOOTER_SIZE};

/// A parsed pack file: typed, versioned, multi-entry binary blob with a
/// trailing offset table.
///
/// Layout, in order of logical access (not file order):
/// - header at offset 0: varint-length type name string, i32 version
/// - footer at `len - 8`: u32 entries-table offset, u32 types-table offset
/// - entries table: varint count, then count u32 absolute entry offsets
/// - types table: varint count, then count (class, type, version) records
///
/// Gzip-compressed buffers are decompressed transparently before any
/// structural parse.
pub struct PackFile {
    data: Vec<u8>,
    type_name: String,
    version: i32,
    payload_offset: usize,
    entries: Vec<u32>,
    types: Vec<PackType>,
}

impl PackFile {
    /// Parse a pack file from a raw (possibly gzip-compressed) buffer.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let data = decompress_if_gzip(buffer)?.into_owned();

        let mut cur = ByteCursor::new(&data);
        let type_name = cur.read_varint_string()?;
        let version = cur.read_i32()?;
        let payload_offset = cur.offset();

        if data.len() < FOOTER_SIZE {
            return Err(Error::UnexpectedEof(data.len()));
        }
        cur.seek(data.len() - FOOTER_SIZE);
        let entries_offset = cur.read_u32()? as usize;
        let types_offset = cur.read_u32()? as usize;

        cur.seek(entries_offset);
        let entries_count = cur.read_varint()? as usize;
        let mut entries = Vec::with_capacity(entries_count);
        for _ in 0..entries_count {
            entries.push(cur.read_u32()?);
        }

        cur.seek(types_offset);
        let types_count = cur.read_varint()? as usize;
        let mut types = Vec::with_capacity(types_count);
        for _ in 0..types_count {
            let type_class = cur.read_varint_string()?;
            let type_name = cur.read_varint_string()?;
            let version = cur.read_varint()? as u32;
            types.push(PackType { type_class, type_name, version });
        }

        Ok(Self { data, type_name, version, payload_offset, entries, types })
    }

    /// The container's own type name, e.g.
    /// "Autodesk.CloudPlatform.FragmentList".
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The container format version.
    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Number of entry records.
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// The parsed type table.
    #[inline]
    pub fn types(&self) -> &[PackType] {
        &self.types
    }

    /// A cursor positioned just past the header, at the first byte of
    /// payload data.
    pub fn payload_cursor(&self) -> ByteCursor<'_> {
        let mut cur = ByteCursor::new(&self.data);
        cur.seek(self.payload_offset);
        cur
    }

    /// Seek to entry `i`: resolve its type and return a cursor positioned
    /// at the first payload byte after the entry's leading type index.
    ///
    /// An out-of-range entry index or type index is "no entry", not an
    /// error; callers treat `None` as skip.
    pub fn seek_entry(&self, i: usize) -> Result<Option<(&PackType, ByteCursor<'_>)>> {
        let Some(&offset) = self.entries.get(i) else {
            return Ok(None);
        };
        let mut cur = ByteCursor::new(&self.data);
        cur.seek(offset as usize);
        let type_index = cur.read_u32()? as usize;
        match self.types.get(type_index) {
            Some(ty) => Ok(Some((ty, cur))),
            None => {
                warn!(entry = i, type_index, "pack entry references type out of range");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for PackFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackFile")
            .field("type_name", &self.type_name)
            .field("version", &self.version)
            .field("entries", &self.entries.len())
            .field("types", &self.types.len())
            .finish()
    }
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

    /// Build a minimal pack file with the given entry payloads, all under
    /// a single type record.
    fn build_pack(type_name: &str, entry_type: &PackType, payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        put_str(&mut out, type_name);
        out.extend_from_slice(&1i32.to_le_bytes());

        let mut entry_offsets = Vec::new();
        for payload in payloads {
            entry_offsets.push(out.len() as u32);
            out.extend_from_slice(&0u32.to_le_bytes()); // type index
            out.extend_from_slice(payload);
        }

        let entries_offset = out.len() as u32;
        put_varint(&mut out, entry_offsets.len() as u64);
        for off in &entry_offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }

        let types_offset = out.len() as u32;
        put_varint(&mut out, 1);
        put_str(&mut out, &entry_type.type_class);
        put_str(&mut out, &entry_type.type_name);
        put_varint(&mut out, u64::from(entry_type.version));

        out.extend_from_slice(&entries_offset.to_le_bytes());
        out.extend_from_slice(&types_offset.to_le_bytes());
        out
    }

    fn sample_type() -> PackType {
        PackType {
            type_class: "Autodesk.CloudPlatform.DesignDescription".to_string(),
            type_name: "Autodesk.CloudPlatform.Sample".to_string(),
            version: 5,
        }
    }

    #[test]
    fn test_parse_header_and_tables() {
        let buf = build_pack("Autodesk.CloudPlatform.FragmentList", &sample_type(), &[b"ab", b"cdef"]);
        let pack = PackFile::parse(&buf).unwrap();

        assert_eq!(pack.type_name(), "Autodesk.CloudPlatform.FragmentList");
        assert_eq!(pack.version(), 1);
        assert_eq!(pack.num_entries(), 2);
        assert_eq!(pack.types().len(), 1);
        assert_eq!(pack.types()[0].version, 5);
    }

    #[test]
    fn test_seek_entry_payload() {
        let buf = build_pack("T", &sample_type(), &[b"xy"]);
        let pack = PackFile::parse(&buf).unwrap();

        let (ty, mut cur) = pack.seek_entry(0).unwrap().unwrap();
        assert_eq!(ty.type_name, "Autodesk.CloudPlatform.Sample");
        assert_eq!(cur.read_u8().unwrap(), b'x');
        assert_eq!(cur.read_u8().unwrap(), b'y');
    }

    #[test]
    fn test_seek_entry_out_of_range() {
        let buf = build_pack("T", &sample_type(), &[b"xy"]);
        let pack = PackFile::parse(&buf).unwrap();
        assert!(pack.seek_entry(7).unwrap().is_none());
    }

    #[test]
    fn test_gzip_transparent() {
        let buf = build_pack("T", &sample_type(), &[b"xy"]);
        let gz = {
            use flate2::write::GzEncoder;
            use flate2::Compression;
            use std::io::Write;
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(&buf).unwrap();
            enc.finish().unwrap()
        };
        let pack = PackFile::parse(&gz).unwrap();
        assert_eq!(pack.num_entries(), 1);
    }

    #[test]
    fn test_truncated_footer() {
        assert!(PackFile::parse(&[0x00, 0x01, 0x02]).is_err());
    }
}
