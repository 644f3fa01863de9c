//! The generic SVF "pack file" container.
//!
//! Fragment lists, geometry metadata and mesh packs all share one
//! self-describing binary layout: a typed, versioned header, a sequence of
//! entry records, and a trailing footer pointing at an entry-offset table
//! and a type table. [`PackFile`] parses the container; the per-entry
//! payloads are decoded by the [`crate::geom`] modules.

mod format;
mod geom_read;
mod reader;

pub use format::*;
pub use geom_read::*;
pub use reader::*;
