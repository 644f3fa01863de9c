//! Pack file format types and constants.

use glam::{DMat3, DVec3, Quat};

/// Size of the footer at the end of every pack file: two u32 offsets
/// (entries table, types table).
pub const FOOTER_SIZE: usize = 8;

/// Entry type record from the pack file's type table.
///
/// The version gates structural variants of the entry payload, e.g. the
/// fragment bounding-box offset correction only applies when the owning
/// type's version is greater than 3.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackType {
    /// Type class, e.g. "Autodesk.CloudPlatform.DesignDescription".
    pub type_class: String,
    /// Concrete type, e.g. "Autodesk.CloudPlatform.OpenCTM".
    pub type_name: String,
    /// Structural version of the entry payload.
    pub version: u32,
}

/// Placement transform, discriminated on the wire by a leading tag byte.
///
/// Tag 0 is a pure translation, tag 1 adds a rotation, tag 2 a uniform
/// scale, tag 3 a full 3x3 matrix. Translations and matrices are stored as
/// f64, rotations and scales as f32.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    /// Tag 0: translation only.
    Translation { t: DVec3 },
    /// Tag 1: rotation followed by translation.
    RotateTranslate { q: Quat, t: DVec3 },
    /// Tag 2: uniform scale, rotation, translation.
    ScaleRotateTranslate { s: f32, q: Quat, t: DVec3 },
    /// Tag 3: arbitrary 3x3 matrix followed by translation.
    MatrixTranslate { m: DMat3, t: DVec3 },
}

impl Transform {
    /// The translation component every variant carries.
    pub fn translation(&self) -> DVec3 {
        match self {
            Self::Translation { t }
            | Self::RotateTranslate { t, .. }
            | Self::ScaleRotateTranslate { t, .. }
            | Self::MatrixTranslate { t, .. } => *t,
        }
    }
}
