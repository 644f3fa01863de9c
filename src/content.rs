//! Whole-derivative decode convenience.
//!
//! Given every downloaded resource of one viewable, keyed by local path,
//! [`SvfContent::decode`] runs all component decoders and gathers the
//! results. Mesh packs are independent buffers and decode in parallel;
//! each individual decoder stays single-threaded over its own buffer.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::geom::{parse_fragments, parse_geometry_metadata, parse_mesh_pack, Fragment, GeometryMetadata, MeshPack};
use crate::material::{parse_materials, MaterialDecode};
use crate::propdb::PropDb;
use crate::resource::ResourceKind;
use crate::util::Result;

/// Everything decodable from one viewable's resources.
#[derive(Debug, Default)]
pub struct SvfContent {
    pub fragments: Vec<Fragment>,
    pub geometries: Vec<GeometryMetadata>,
    /// Mesh packs keyed by their numeric pack id.
    pub mesh_packs: BTreeMap<u32, MeshPack>,
    pub materials: Option<MaterialDecode>,
    pub properties: Option<PropDb>,
}

impl SvfContent {
    /// Decode every recognized resource. Resources classified as
    /// [`ResourceKind::Other`] are ignored; the property database is only
    /// decoded when at least one `objects_*.json.gz` is present (and then
    /// all five must be).
    pub fn decode(resources: &BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let mut content = Self::default();

        let mut mesh_buffers: Vec<(u32, &Vec<u8>)> = Vec::new();
        let mut db_files: BTreeMap<String, Vec<u8>> = BTreeMap::new();

        for (local_path, buffer) in resources {
            match ResourceKind::classify(local_path) {
                ResourceKind::FragmentList => {
                    content.fragments = parse_fragments(buffer)?;
                }
                ResourceKind::GeometryMetadata => {
                    content.geometries = parse_geometry_metadata(buffer)?;
                }
                ResourceKind::MeshPack(pack_id) => {
                    mesh_buffers.push((pack_id, buffer));
                }
                ResourceKind::MaterialGraph => {
                    content.materials = Some(parse_materials(buffer)?);
                }
                ResourceKind::PropertyDb => {
                    let file_name = local_path.rsplit('/').next().unwrap_or(local_path);
                    db_files.insert(file_name.to_string(), buffer.clone());
                }
                ResourceKind::Other => {}
            }
        }

        content.mesh_packs = mesh_buffers
            .into_par_iter()
            .map(|(pack_id, buffer)| Ok((pack_id, parse_mesh_pack(buffer)?)))
            .collect::<Result<_>>()?;

        if !db_files.is_empty() {
            content.properties = Some(PropDb::from_buffers(&db_files)?);
        }

        Ok(content)
    }
}
