//! Property database reader.
//!
//! The derivative's element properties ship as five parallel gzip-JSON
//! arrays (`objects_*.json.gz`) forming a directed graph over integer node
//! ids. [`reader`] loads the arrays and answers per-node queries; [`walk`]
//! reconstructs the hierarchical element graph, collapsing taxonomy nodes
//! and merging instance properties.

mod reader;
mod walk;

pub use reader::*;
pub use walk::*;
