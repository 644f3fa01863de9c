//! Mesh pack decoding.
//!
//! Numeric `<n>.pf` packs hold the actual render payloads. Triangle meshes
//! use an embedded OpenCTM sub-format (only the "RAW" method occurs in
//! derivatives); line and point sets use small fixed layouts of their own.

use std::path::Path;

use glam::Vec3;
use tracing::warn;

use crate::pack::PackFile;
use crate::util::{ByteCursor, Error, Result};

/// Entry type carrying an OpenCTM triangle mesh.
pub const MESH_TYPE_OPENCTM: &str = "Autodesk.CloudPlatform.OpenCTM";
/// Entry type carrying a line set.
pub const MESH_TYPE_LINES: &str = "Autodesk.CloudPlatform.Lines";
/// Entry type carrying a point set.
pub const MESH_TYPE_POINTS: &str = "Autodesk.CloudPlatform.Points";

/// The only OpenCTM container version that occurs in SVF derivatives.
const OPENCTM_VERSION: i32 = 5;

/// One UV channel of a triangle mesh. V is already flipped to the SVF
/// convention (`v' = 1 - v`).
#[derive(Clone, Debug, PartialEq)]
pub struct UvMap {
    pub name: String,
    pub file: String,
    /// Interleaved u, v pairs, one per vertex.
    pub uvs: Vec<f32>,
}

/// Decoded OpenCTM RAW triangle mesh.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    pub vertex_count: u32,
    pub triangle_count: u32,
    pub uv_count: u32,
    pub attr_count: u32,
    pub flags: u32,
    pub comment: String,
    /// `triangle_count * 3` vertex indices.
    pub indices: Vec<u32>,
    /// `vertex_count * 3` interleaved positions.
    pub vertices: Vec<f32>,
    /// Unit-length normals, present when bit 0 of `flags` is set.
    pub normals: Option<Vec<f32>>,
    /// RGBA per-vertex colors from a "Color" attribute.
    pub colors: Option<Vec<f32>>,
    pub uv_maps: Vec<UvMap>,
    /// Per-axis position minimum, tracked while reading.
    pub min: Vec3,
    /// Per-axis position maximum, tracked while reading.
    pub max: Vec3,
}

/// Decoded line set.
#[derive(Clone, Debug)]
pub struct LineSet {
    pub vertex_count: u16,
    /// Number of line segments (`index_count / 2`).
    pub line_count: u16,
    /// `vertex_count * 3` interleaved positions.
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
    /// RGB per-vertex colors.
    pub colors: Option<Vec<f32>>,
    pub line_width: f32,
}

/// Decoded point set.
#[derive(Clone, Debug)]
pub struct PointSet {
    pub vertex_count: u16,
    /// `vertex_count * 3` interleaved positions.
    pub vertices: Vec<f32>,
    /// RGB per-vertex colors.
    pub colors: Option<Vec<f32>>,
    pub point_size: f32,
}

/// One decoded mesh pack entry.
#[derive(Clone, Debug)]
pub enum Mesh {
    Triangles(TriangleMesh),
    Lines(LineSet),
    Points(PointSet),
}

/// All payloads of one mesh pack.
///
/// Entry indices are referenced by [`crate::geom::GeometryMetadata`], so an
/// OpenCTM entry whose compression method is unsupported keeps a `None`
/// placeholder rather than shifting later entries.
#[derive(Debug, Default)]
pub struct MeshPack {
    pub entries: Vec<Option<Mesh>>,
    /// Entries that decoded to nothing: unsupported OpenCTM methods plus
    /// entry types that are neither OpenCTM, Lines nor Points.
    pub skipped_entries: usize,
}

fn expect_tag(cur: &mut ByteCursor<'_>, tag: &str) -> Result<()> {
    let found = cur.read_string(4)?;
    if found != tag {
        return Err(Error::bad_magic(tag, found));
    }
    Ok(())
}

fn checked_count(v: i32, what: &str) -> Result<usize> {
    usize::try_from(v).map_err(|_| Error::invalid(format!("negative {what} count: {v}")))
}

/// Decode every entry of a raw `<n>.pf` mesh pack buffer.
pub fn parse_mesh_pack(buffer: &[u8]) -> Result<MeshPack> {
    let pack = PackFile::parse(buffer)?;
    let mut out = MeshPack::default();

    for i in 0..pack.num_entries() {
        let (entry_type, mut cur) = pack.seek_entry(i)?.ok_or_else(|| {
            Error::invalid(format!("mesh entry {i} has no resolvable type"))
        })?;
        if entry_type.version < 1 {
            return Err(Error::UnsupportedVersion {
                context: "mesh entry",
                found: i64::from(entry_type.version),
            });
        }

        match entry_type.type_name.as_str() {
            MESH_TYPE_OPENCTM => {
                let mesh = parse_mesh_octm(&mut cur)?;
                if mesh.is_none() {
                    out.skipped_entries += 1;
                }
                out.entries.push(mesh.map(Mesh::Triangles));
            }
            MESH_TYPE_LINES => {
                if entry_type.version < 2 {
                    return Err(Error::UnsupportedVersion {
                        context: "lines entry",
                        found: i64::from(entry_type.version),
                    });
                }
                out.entries.push(Some(Mesh::Lines(parse_lines(&mut cur, entry_type.version)?)));
            }
            MESH_TYPE_POINTS => {
                if entry_type.version < 2 {
                    return Err(Error::UnsupportedVersion {
                        context: "points entry",
                        found: i64::from(entry_type.version),
                    });
                }
                out.entries.push(Some(Mesh::Points(parse_points(&mut cur)?)));
            }
            other => {
                warn!(entry = i, type_name = other, "unknown mesh entry type, skipping");
                out.skipped_entries += 1;
            }
        }
    }

    Ok(out)
}

/// Decode a mesh pack from a `<n>.pf` on disk.
pub fn parse_mesh_pack_from_file(path: impl AsRef<Path>) -> Result<MeshPack> {
    let buffer = std::fs::read(path)?;
    parse_mesh_pack(&buffer)
}

/// Parse the OpenCTM wrapper: magic, container version, method tag.
/// Methods other than "RAW" are skipped with a diagnostic, never
/// fabricated.
fn parse_mesh_octm(cur: &mut ByteCursor<'_>) -> Result<Option<TriangleMesh>> {
    expect_tag(cur, "OCTM")?;

    let version = cur.read_i32()?;
    if version != OPENCTM_VERSION {
        return Err(Error::UnsupportedVersion { context: "OpenCTM container", found: i64::from(version) });
    }

    let method = cur.read_string(3)?;
    cur.read_u8()?; // trailing NUL of the method fourCC

    if method != "RAW" {
        warn!(%method, "unsupported OpenCTM method, skipping entry");
        return Ok(None);
    }
    parse_mesh_raw(cur).map(Some)
}

fn parse_mesh_raw(cur: &mut ByteCursor<'_>) -> Result<TriangleMesh> {
    let vertex_count = checked_count(cur.read_i32()?, "vertex")?;
    let triangle_count = checked_count(cur.read_i32()?, "triangle")?;
    let uv_count = checked_count(cur.read_i32()?, "uv map")?;
    let attr_count = checked_count(cur.read_i32()?, "attribute")?;
    let flags = cur.read_i32()? as u32;
    let comment_len = checked_count(cur.read_i32()?, "comment byte")?;
    let comment = cur.read_string(comment_len)?;

    expect_tag(cur, "INDX")?;
    let indices = cur.read_u32_vec(triangle_count * 3)?;

    expect_tag(cur, "VERT")?;
    let vertices = cur.read_f32_vec(vertex_count * 3)?;
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for p in vertices.chunks_exact(3) {
        let v = Vec3::new(p[0], p[1], p[2]);
        min = min.min(v);
        max = max.max(v);
    }

    let normals = if flags & 1 != 0 {
        expect_tag(cur, "NORM")?;
        let mut normals = cur.read_f32_vec(vertex_count * 3)?;
        for n in normals.chunks_exact_mut(3) {
            let dot = n[0] * n[0] + n[1] * n[1] + n[2] * n[2];
            if dot != 1.0 && dot > 0.0 {
                let len = dot.sqrt();
                n[0] /= len;
                n[1] /= len;
                n[2] /= len;
            }
        }
        Some(normals)
    } else {
        None
    };

    let mut uv_maps = Vec::with_capacity(uv_count);
    for _ in 0..uv_count {
        expect_tag(cur, "TEXC")?;
        let name_len = checked_count(cur.read_i32()?, "uv name byte")?;
        let name = cur.read_string(name_len)?;
        let file_len = checked_count(cur.read_i32()?, "uv file byte")?;
        let file = cur.read_string(file_len)?;
        let mut uvs = cur.read_f32_vec(vertex_count * 2)?;
        for v in uvs.iter_mut().skip(1).step_by(2) {
            *v = 1.0 - *v;
        }
        uv_maps.push(UvMap { name, file, uvs });
    }

    let mut colors = None;
    if attr_count > 0 {
        expect_tag(cur, "ATTR")?;
        for _ in 0..attr_count {
            let name_len = checked_count(cur.read_i32()?, "attribute name byte")?;
            let attr_name = cur.read_string(name_len)?;
            if attr_name == "Color" {
                colors = Some(cur.read_f32_vec(vertex_count * 4)?);
            } else {
                warn!(%attr_name, "unknown per-vertex attribute, skipping");
                cur.skip(vertex_count * 4);
            }
        }
    }

    Ok(TriangleMesh {
        vertex_count: vertex_count as u32,
        triangle_count: triangle_count as u32,
        uv_count: uv_count as u32,
        attr_count: attr_count as u32,
        flags,
        comment,
        indices,
        vertices,
        normals,
        colors,
        uv_maps,
        min,
        max,
    })
}

fn parse_lines(cur: &mut ByteCursor<'_>, entry_version: u32) -> Result<LineSet> {
    let vertex_count = cur.read_u16()?;
    let index_count = cur.read_u16()?;
    let _bounds_count = cur.read_u16()?; // polyline bounds are not parsed
    let line_width = if entry_version > 2 { cur.read_f32()? } else { 1.0 };
    let has_colors = cur.read_u8()? != 0;

    let vertices = cur.read_f32_vec(usize::from(vertex_count) * 3)?;
    let indices = cur.read_u16_vec(usize::from(index_count))?;
    let colors = if has_colors {
        Some(cur.read_f32_vec(usize::from(vertex_count) * 3)?)
    } else {
        None
    };

    Ok(LineSet {
        vertex_count,
        line_count: index_count / 2,
        vertices,
        indices,
        colors,
        line_width,
    })
}

fn parse_points(cur: &mut ByteCursor<'_>) -> Result<PointSet> {
    let vertex_count = cur.read_u16()?;
    let _index_count = cur.read_u16()?; // present on the wire, points carry no index buffer
    let point_size = cur.read_f32()?;
    let has_colors = cur.read_u8()? != 0;

    let vertices = cur.read_f32_vec(usize::from(vertex_count) * 3)?;
    let colors = if has_colors {
        Some(cur.read_f32_vec(usize::from(vertex_count) * 3)?)
    } else {
        None
    };

    Ok(PointSet { vertex_count, vertices, colors, point_size })
}
