//! SimplePhong material flattening.

use std::path::Path;

use glam::Vec4;
use tracing::warn;

use crate::util::{decompress_if_gzip, Result};
use super::{MaterialGraphFile, MaterialGroup, RawMaterial};

/// UV tiling factors of a resolved texture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UvScale {
    pub u: f64,
    pub v: f64,
}

/// A resolved texture reference.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureMap {
    pub uri: String,
    pub scale: UvScale,
}

/// Texture slots of a flattened material.
#[derive(Clone, Debug, Default)]
pub struct MaterialMaps {
    pub diffuse: Option<TextureMap>,
    pub specular: Option<TextureMap>,
    pub alpha: Option<TextureMap>,
    pub bump: Option<TextureMap>,
    pub normal: Option<TextureMap>,
}

/// Flattened SimplePhong material.
#[derive(Clone, Debug)]
pub struct PhongMaterial {
    /// Group key in `Materials.json.gz`.
    pub name: String,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub ambient: Vec4,
    pub emissive: Vec4,
    pub glossiness: f32,
    pub reflectivity: f32,
    pub opacity: f32,
    pub metal: bool,
    pub maps: MaterialMaps,
}

/// Result of a material graph decode: flattened materials in group order,
/// plus the groups that were skipped as unsupported.
#[derive(Debug, Default)]
pub struct MaterialDecode {
    pub materials: Vec<PhongMaterial>,
    /// One entry per skipped group: "<group key>: <reason>".
    pub unsupported: Vec<String>,
}

/// Decode a (possibly gzip) `Materials.json.gz` buffer.
///
/// Groups whose resolved user asset is not a SimplePhong definition (or
/// whose indirection cannot be resolved at all) are recorded in
/// `unsupported` and excluded from the result, never coerced.
pub fn parse_materials(buffer: &[u8]) -> Result<MaterialDecode> {
    let data = decompress_if_gzip(buffer)?;
    let mut out = MaterialDecode::default();
    if data.is_empty() {
        return Ok(out);
    }

    let file: MaterialGraphFile = serde_json::from_slice(&data)?;
    for (key, group_value) in file.materials {
        let group: MaterialGroup = match serde_json::from_value(group_value) {
            Ok(g) => g,
            Err(err) => {
                warn!(group = %key, %err, "malformed material group, skipping");
                out.unsupported.push(format!("{key}: malformed group"));
                continue;
            }
        };

        let Some(root) = group.userassets.first().and_then(|k| group.materials.get(k)) else {
            warn!(group = %key, "material group has no resolvable user asset");
            out.unsupported.push(format!("{key}: unresolvable user asset"));
            continue;
        };

        match root.definition.as_deref() {
            Some("SimplePhong") => out.materials.push(parse_simple_phong(&key, root, &group)),
            definition => {
                let definition = definition.unwrap_or("<none>");
                warn!(group = %key, definition, "unsupported material definition, skipping");
                out.unsupported.push(format!("{key}: {definition}"));
            }
        }
    }

    Ok(out)
}

/// Decode materials from a `Materials.json.gz` on disk.
pub fn parse_materials_from_file(path: impl AsRef<Path>) -> Result<MaterialDecode> {
    let buffer = std::fs::read(path)?;
    parse_materials(&buffer)
}

fn parse_simple_phong(name: &str, material: &RawMaterial, group: &MaterialGroup) -> PhongMaterial {
    let black = Vec4::new(0.0, 0.0, 0.0, 1.0);
    let diffuse = color_property(material, "generic_diffuse", black);
    let specular = color_property(material, "generic_specular", black);
    let ambient = color_property(material, "generic_ambient", black);
    let emissive = color_property(material, "generic_emissive", black);

    let glossiness = scalar_property(material, "generic_glossiness", 30.0) as f32;
    let reflectivity = scalar_property(material, "generic_reflectivity_at_0deg", 0.0) as f32;
    let opacity = 1.0 - scalar_property(material, "generic_transparency", 0.0) as f32;
    let metal = boolean_property(material, "generic_is_metal", false);

    let mut maps = MaterialMaps::default();
    if material.textures.is_some() {
        maps.diffuse = texture_property(material, group, "generic_diffuse");
        maps.specular = texture_property(material, group, "generic_specular");
        maps.alpha = texture_property(material, group, "generic_alpha");
        if let Some(bump) = texture_property(material, group, "generic_bump") {
            if boolean_property(material, "generic_bump_is_normal", false) {
                maps.normal = Some(bump);
            } else {
                maps.bump = Some(bump);
            }
        }
    }

    PhongMaterial {
        name: name.to_string(),
        diffuse,
        specular,
        ambient,
        emissive,
        glossiness,
        reflectivity,
        opacity,
        metal,
        maps,
    }
}

fn boolean_property(material: &RawMaterial, prop: &str, default: bool) -> bool {
    material
        .properties
        .booleans
        .as_ref()
        .and_then(|m| m.get(prop).copied())
        .unwrap_or(default)
}

fn scalar_property(material: &RawMaterial, prop: &str, default: f64) -> f64 {
    material
        .properties
        .scalars
        .as_ref()
        .and_then(|m| m.get(prop))
        .and_then(|s| s.values.first().copied())
        .unwrap_or(default)
}

fn color_property(material: &RawMaterial, prop: &str, default: Vec4) -> Vec4 {
    material
        .properties
        .colors
        .as_ref()
        .and_then(|m| m.get(prop))
        .and_then(|c| c.values.first())
        .map(|c| Vec4::new(c.r, c.g, c.b, c.a))
        .unwrap_or(default)
}

/// Resolve a texture slot through the group's indirection table: the
/// slot's first connection names another material in the same group whose
/// "unifiedbitmap_Bitmap" URI is the actual image reference.
fn texture_property(material: &RawMaterial, group: &MaterialGroup, prop: &str) -> Option<TextureMap> {
    let connection = material
        .textures
        .as_ref()?
        .get(prop)?
        .connections
        .first()?;
    let texture = group.materials.get(connection)?;
    let uri = texture
        .properties
        .uris
        .as_ref()?
        .get("unifiedbitmap_Bitmap")?
        .values
        .first()?
        .clone();

    let mut scale = UvScale::default();
    if let Some(scalars) = texture.properties.scalars.as_ref() {
        if let (Some(u), Some(v)) = (scalars.get("texture_UScale"), scalars.get("texture_VScale")) {
            scale.u = u.values.first().copied().unwrap_or(0.0);
            scale.v = v.values.first().copied().unwrap_or(0.0);
        }
    }

    Some(TextureMap { uri, scale })
}
