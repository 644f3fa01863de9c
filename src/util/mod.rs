//! Utility types and functions for SVF decoding.
//!
//! This module contains the fundamental pieces used throughout the library:
//! - [`ByteCursor`] - Bounds-checked little-endian reader
//! - [`Error`] / [`Result`] - Error handling
//! - [`decompress_if_gzip`] - Transparent gzip decompression

mod cursor;
mod decompress;
mod error;

pub use cursor::*;
pub use decompress::*;
pub use error::*;
