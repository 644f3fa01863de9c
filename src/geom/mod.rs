//! Decoders for the geometry-bearing pack files.
//!
//! - [`fragments`] - placement records from `FragmentList.pack`
//! - [`metadata`] - per-geometry index records from `GeometryMetadata.pf`
//! - [`mesh`] - triangle/line/point payloads from numeric `<n>.pf` packs

mod fragments;
mod mesh;
mod metadata;

pub use fragments::*;
pub use mesh::*;
pub use metadata::*;
