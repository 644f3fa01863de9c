//! Shared geometric reads over a [`ByteCursor`].
//!
//! Fragment records and any future transform-bearing entry decode their
//! placement data through this trait rather than duplicating the layout.

use glam::{DMat3, DVec3, Quat};

use crate::util::{ByteCursor, Result};
use super::Transform;

/// Extension trait adding the pack file's geometric primitives to
/// [`ByteCursor`].
pub trait GeomRead {
    /// Read three f64 components (24 bytes, no varint).
    fn read_vec3(&mut self) -> Result<DVec3>;

    /// Read an f32 quaternion in x, y, z, w order.
    fn read_quaternion(&mut self) -> Result<Quat>;

    /// Read nine f64 matrix components, column-major.
    fn read_matrix3x3(&mut self) -> Result<DMat3>;

    /// Read a tagged transform. An unrecognized tag byte yields `None`
    /// after consuming only the tag; callers must handle it.
    fn read_transform(&mut self) -> Result<Option<Transform>>;
}

impl GeomRead for ByteCursor<'_> {
    fn read_vec3(&mut self) -> Result<DVec3> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        let z = self.read_f64()?;
        Ok(DVec3::new(x, y, z))
    }

    fn read_quaternion(&mut self) -> Result<Quat> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        let w = self.read_f32()?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    fn read_matrix3x3(&mut self) -> Result<DMat3> {
        let mut m = [0f64; 9];
        for v in &mut m {
            *v = self.read_f64()?;
        }
        Ok(DMat3::from_cols_array(&m))
    }

    fn read_transform(&mut self) -> Result<Option<Transform>> {
        let tag = self.read_u8()?;
        let transform = match tag {
            0 => Transform::Translation { t: self.read_vec3()? },
            1 => {
                let q = self.read_quaternion()?;
                let t = self.read_vec3()?;
                Transform::RotateTranslate { q, t }
            }
            2 => {
                let s = self.read_f32()?;
                let q = self.read_quaternion()?;
                let t = self.read_vec3()?;
                Transform::ScaleRotateTranslate { s, q, t }
            }
            3 => {
                let m = self.read_matrix3x3()?;
                let t = self.read_vec3()?;
                Transform::MatrixTranslate { m, t }
            }
            _ => return Ok(None),
        };
        Ok(Some(transform))
    }
}
