//! Resource descriptors and local-path classification.
//!
//! The network layer (out of scope here) downloads derivative resources
//! and keys them by local path. Decoders pick their inputs by suffix, the
//! same way the Model Derivative manifests name them.

use crate::propdb::REQUIRED_DB_FILES;

/// Descriptor of one downloaded derivative resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    /// Viewable guid the resource belongs to.
    pub guid: String,
    /// MIME type as reported by the manifest.
    pub mime: String,
    /// Derivative URN of the resource.
    pub urn: String,
    /// Local path, relative to the viewable root.
    pub local_path: String,
}

/// What a resource decodes as, judged by its local path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// `FragmentList.pack`
    FragmentList,
    /// `GeometryMetadata.pf`
    GeometryMetadata,
    /// Numeric `<n>.pf` mesh pack.
    MeshPack(u32),
    /// `Materials.json.gz`
    MaterialGraph,
    /// One of the five `objects_*.json.gz` files.
    PropertyDb,
    /// Anything else (images, manifests, ...).
    Other,
}

impl ResourceKind {
    /// Classify a local path by its file-name suffix.
    pub fn classify(local_path: &str) -> Self {
        let file_name = local_path.rsplit('/').next().unwrap_or(local_path);

        if local_path.ends_with("FragmentList.pack") {
            return Self::FragmentList;
        }
        if local_path.ends_with("GeometryMetadata.pf") {
            return Self::GeometryMetadata;
        }
        if let Some(stem) = file_name.strip_suffix(".pf") {
            if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(pack_id) = stem.parse() {
                    return Self::MeshPack(pack_id);
                }
            }
        }
        if local_path.ends_with("Materials.json.gz") {
            return Self::MaterialGraph;
        }
        if REQUIRED_DB_FILES.contains(&file_name) {
            return Self::PropertyDb;
        }
        Self::Other
    }
}
