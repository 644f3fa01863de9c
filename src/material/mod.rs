//! Protein material graph decoding.
//!
//! `Materials.json.gz` is a gzip JSON graph of named material groups, each
//! an indirection table of "user assets". [`schema`] models the raw JSON;
//! [`decode`] flattens the groups into renderable Phong records.

mod decode;
mod schema;

pub use decode::*;
pub use schema::*;
