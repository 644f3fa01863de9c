//! Serde model of the Protein material JSON.
//!
//! Only the fields the decoder consumes are typed; everything else is
//! ignored by serde. Missing maps deserialize to `None` rather than
//! erroring, since real derivatives omit whole property classes freely.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level shape of `Materials.json.gz`.
///
/// Group order is preserved (`serde_json::Map` with `preserve_order`):
/// fragment `materialId` values index into it.
#[derive(Debug, Deserialize)]
pub struct MaterialGraphFile {
    pub materials: serde_json::Map<String, serde_json::Value>,
}

/// One named material group: an indirection table of user assets over a
/// keyed material map.
#[derive(Debug, Deserialize)]
pub struct MaterialGroup {
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub userassets: Vec<String>,
    #[serde(default)]
    pub materials: HashMap<String, RawMaterial>,
}

/// One raw material record inside a group.
#[derive(Debug, Deserialize)]
pub struct RawMaterial {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default, rename = "proteinType")]
    pub protein_type: Option<String>,
    /// Shading definition; only "SimplePhong" is structurally resolved.
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub properties: MaterialProperties,
    /// Texture slots, keyed by the property they feed.
    #[serde(default)]
    pub textures: Option<HashMap<String, TextureConnection>>,
}

/// Property classes of a raw material.
#[derive(Debug, Default, Deserialize)]
pub struct MaterialProperties {
    #[serde(default)]
    pub integers: Option<HashMap<String, i64>>,
    #[serde(default)]
    pub booleans: Option<HashMap<String, bool>>,
    #[serde(default)]
    pub strings: Option<HashMap<String, ValueList<String>>>,
    #[serde(default)]
    pub uris: Option<HashMap<String, ValueList<String>>>,
    #[serde(default)]
    pub scalars: Option<HashMap<String, ScalarProperty>>,
    #[serde(default)]
    pub colors: Option<HashMap<String, ColorProperty>>,
    #[serde(default)]
    pub choicelists: Option<serde_json::Value>,
    #[serde(default)]
    pub uuids: Option<serde_json::Value>,
    #[serde(default)]
    pub references: Option<serde_json::Value>,
}

/// Generic `{ "values": [...] }` wrapper.
#[derive(Debug, Deserialize)]
pub struct ValueList<T> {
    #[serde(default)]
    pub values: Vec<T>,
}

/// Scalar property with optional units.
#[derive(Debug, Deserialize)]
pub struct ScalarProperty {
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Color property.
#[derive(Debug, Deserialize)]
pub struct ColorProperty {
    #[serde(default)]
    pub values: Vec<RgbaColor>,
}

/// One RGBA color value.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RgbaColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Texture slot: connection keys into the owning group's material map.
#[derive(Debug, Deserialize)]
pub struct TextureConnection {
    #[serde(default)]
    pub connections: Vec<String>,
}
