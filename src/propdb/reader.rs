//! The five-array property database and its per-node queries.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::util::{decompress_if_gzip, Error, Result};

/// External-id array file name.
pub const DB_IDS: &str = "objects_ids.json.gz";
/// Attribute-value offset array file name.
pub const DB_OFFSETS: &str = "objects_offs.json.gz";
/// Flat attribute/value pair array file name.
pub const DB_AVS: &str = "objects_avs.json.gz";
/// Attribute definition array file name.
pub const DB_ATTRS: &str = "objects_attrs.json.gz";
/// Raw value array file name.
pub const DB_VALS: &str = "objects_vals.json.gz";

/// The five files a property database decode requires.
pub const REQUIRED_DB_FILES: [&str; 5] = [DB_IDS, DB_OFFSETS, DB_AVS, DB_ATTRS, DB_VALS];

/// The document root node.
pub const ROOT_DB_ID: u32 = 1;

/// Internal graph-edge sentinel categories.
pub const CATEGORY_CHILD: &str = "__child__";
pub const CATEGORY_PARENT: &str = "__parent__";
pub const CATEGORY_INSTANCE_OF: &str = "__instanceof__";
pub const CATEGORY_INTERNAL_REF: &str = "__internalref__";

/// Attribute definition, resolved positionally from one `attrs` record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeDef {
    pub name: String,
    pub category: String,
    pub data_type: i64,
    pub data_type_context: String,
    pub description: String,
    pub display_name: String,
    pub flags: i64,
    pub display_precision: i64,
    pub forge_parameter_id: String,
}

impl AttributeDef {
    /// Resolve a raw `attrs` record. Records that are not arrays of at
    /// least name + category are rejected.
    pub fn from_record(record: &Value) -> Option<Self> {
        let fields = record.as_array()?;
        if fields.len() < 2 {
            return None;
        }
        Some(Self {
            name: field_string(fields, 0),
            category: field_string(fields, 1),
            data_type: field_i64(fields, 2),
            data_type_context: field_string(fields, 3),
            description: field_string(fields, 4),
            display_name: field_string(fields, 5),
            flags: field_i64(fields, 6),
            display_precision: field_i64(fields, 7),
            forge_parameter_id: field_string(fields, 8),
        })
    }
}

fn field_string(fields: &[Value], i: usize) -> String {
    match fields.get(i) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn field_i64(fields: &[Value], i: usize) -> i64 {
    fields.get(i).and_then(Value::as_i64).unwrap_or(0)
}

/// One property of one node, carrying the owning node's ids.
#[derive(Clone, Debug)]
pub struct Property {
    pub db_id: u32,
    pub external_id: String,
    pub attr: AttributeDef,
    pub value: Value,
}

impl Property {
    /// Coerce the value to an integer node id (numbers and numeric
    /// strings both occur on the wire).
    pub fn value_as_db_id(&self) -> Option<u32> {
        value_as_db_id(&self.value)
    }
}

pub(crate) fn value_as_db_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Categories of the form `__xxx__` mark internal graph edges, not
/// user-visible properties.
pub(crate) fn is_internal_category(category: &str) -> bool {
    category.len() > 4
        && category.starts_with("__")
        && category.ends_with("__")
        && category.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// The decoded property database.
pub struct PropDb {
    ids: Vec<Value>,
    offsets: Vec<u64>,
    avs: Vec<u64>,
    attrs: Vec<Value>,
    vals: Vec<Value>,
}

impl PropDb {
    /// Build from already-parsed arrays. Used directly by tests and by
    /// callers that decode the JSON themselves.
    pub fn new(
        ids: Vec<Value>,
        offsets: Vec<u64>,
        avs: Vec<u64>,
        attrs: Vec<Value>,
        vals: Vec<Value>,
    ) -> Self {
        Self { ids, offsets, avs, attrs, vals }
    }

    /// Build from raw downloaded buffers keyed by logical file name.
    ///
    /// All five `objects_*.json.gz` files must be present; the error names
    /// every absent one. Buffers may be gzip-compressed or plain JSON.
    pub fn from_buffers(files: &BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_DB_FILES
            .iter()
            .filter(|name| !files.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingResources(missing));
        }

        let parse = |name: &str| -> Result<Vec<Value>> {
            let data = decompress_if_gzip(&files[name])?;
            let value: Value = serde_json::from_slice(&data)?;
            value
                .as_array()
                .cloned()
                .ok_or_else(|| Error::invalid(format!("{name} is not a JSON array")))
        };
        let parse_u64 = |name: &str| -> Result<Vec<u64>> {
            parse(name)?
                .iter()
                .map(|v| {
                    v.as_u64()
                        .ok_or_else(|| Error::invalid(format!("{name} holds a non-integer offset")))
                })
                .collect()
        };

        Ok(Self::new(
            parse(DB_IDS)?,
            parse_u64(DB_OFFSETS)?,
            parse_u64(DB_AVS)?,
            parse(DB_ATTRS)?,
            parse(DB_VALS)?,
        ))
    }

    /// Build from the five files in a directory on disk.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = BTreeMap::new();
        for name in REQUIRED_DB_FILES {
            let path = dir.join(name);
            if path.is_file() {
                files.insert(name.to_string(), std::fs::read(path)?);
            }
        }
        Self::from_buffers(&files)
    }

    /// Number of nodes, including the unused dbId 0 sentinel.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.offsets.len()
    }

    /// External (persistent) id of a node.
    pub fn external_id(&self, db_id: u32) -> String {
        self.ids
            .get(db_id as usize)
            .map(value_to_string)
            .unwrap_or_default()
    }

    /// Reverse lookup of [`Self::external_id`].
    pub fn db_id_of(&self, external_id: &str) -> Option<u32> {
        self.ids
            .iter()
            .position(|v| matches!(v, Value::String(s) if s == external_id))
            .map(|i| i as u32)
    }

    /// Enumerate all properties of a node.
    ///
    /// Valid only for `0 < db_id < num_nodes`; anything out of range
    /// yields an empty list rather than an error. The node's pair slice
    /// runs from `2 * offsets[db_id]` to `2 * offsets[db_id + 1]` (end of
    /// array for the last node).
    pub fn enumerate_properties(&self, db_id: u32) -> Vec<Property> {
        let id = db_id as usize;
        if id == 0 || id >= self.offsets.len() {
            return Vec::new();
        }

        let av_start = 2 * self.offsets[id] as usize;
        let av_end = if id == self.offsets.len() - 1 {
            self.avs.len()
        } else {
            2 * self.offsets[id + 1] as usize
        };

        let end = av_end.min(self.avs.len());
        let start = av_start.min(end);

        let external_id = self.external_id(db_id);
        let mut properties = Vec::new();
        for pair in self.avs[start..end].chunks_exact(2) {
            let attr_offset = pair[0] as usize;
            let val_offset = pair[1] as usize;

            let Some(attr) = self.attrs.get(attr_offset).and_then(AttributeDef::from_record) else {
                warn!(db_id, attr_offset, "unresolvable attribute record, skipping pair");
                continue;
            };
            let Some(value) = self.vals.get(val_offset) else {
                warn!(db_id, val_offset, "value offset out of range, skipping pair");
                continue;
            };

            properties.push(Property {
                db_id,
                external_id: external_id.clone(),
                attr,
                value: value.clone(),
            });
        }
        properties
    }

    /// All properties of a node, excluding internal `__xxx__` categories.
    pub fn get_properties(&self, db_id: u32) -> BTreeMap<String, Value> {
        self.enumerate_properties(db_id)
            .into_iter()
            .filter(|p| !p.attr.category.is_empty() && !is_internal_category(&p.attr.category))
            .map(|p| (p.attr.name, p.value))
            .collect()
    }

    /// All properties of a node, including internal categories.
    pub fn get_all_properties(&self, db_id: u32) -> BTreeMap<String, Value> {
        self.enumerate_properties(db_id)
            .into_iter()
            .map(|p| (p.attr.name, p.value))
            .collect()
    }

    /// Non-internal properties grouped by their category.
    pub fn properties_grouped_by_category(&self, db_id: u32) -> BTreeMap<String, Vec<(String, Value)>> {
        let mut groups: BTreeMap<String, Vec<(String, Value)>> = BTreeMap::new();
        for p in self.enumerate_properties(db_id) {
            if p.attr.category.is_empty() || is_internal_category(&p.attr.category) {
                continue;
            }
            groups.entry(p.attr.category.clone()).or_default().push((p.attr.name, p.value));
        }
        groups
    }

    fn edge_targets(&self, db_id: u32, category: &str) -> Vec<u32> {
        self.enumerate_properties(db_id)
            .iter()
            .filter(|p| p.attr.category == category)
            .filter_map(Property::value_as_db_id)
            .collect()
    }

    /// Child nodes (`__child__` edges).
    pub fn children(&self, db_id: u32) -> Vec<u32> {
        self.edge_targets(db_id, CATEGORY_CHILD)
    }

    /// Parent nodes (`__parent__` edges).
    pub fn parents(&self, db_id: u32) -> Vec<u32> {
        self.edge_targets(db_id, CATEGORY_PARENT)
    }

    /// Type nodes this node instantiates (`__instanceof__` edges).
    pub fn instances_of(&self, db_id: u32) -> Vec<u32> {
        self.edge_targets(db_id, CATEGORY_INSTANCE_OF)
    }

    /// Internal reference targets (`__internalref__` edges).
    pub fn internal_refs(&self, db_id: u32) -> Vec<u32> {
        self.edge_targets(db_id, CATEGORY_INTERNAL_REF)
    }

    /// All properties of the document root (dbId 1).
    pub fn document_info(&self) -> BTreeMap<String, Value> {
        self.get_all_properties(ROOT_DB_ID)
    }

    /// Scan the whole database for distinct values of the given attribute
    /// names.
    pub fn property_values_by_names(&self, names: &[&str]) -> BTreeMap<String, Vec<Value>> {
        self.scan_values(|attr| names.contains(&attr.name.as_str()), |attr| attr.name.clone())
    }

    /// Scan the whole database for distinct values of the given attribute
    /// display names.
    pub fn property_values_by_display_names(&self, display_names: &[&str]) -> BTreeMap<String, Vec<Value>> {
        self.scan_values(
            |attr| display_names.contains(&attr.display_name.as_str()),
            |attr| attr.display_name.clone(),
        )
    }

    fn scan_values(
        &self,
        select: impl Fn(&AttributeDef) -> bool,
        key: impl Fn(&AttributeDef) -> String,
    ) -> BTreeMap<String, Vec<Value>> {
        let mut result: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for db_id in 1..self.num_nodes() as u32 {
            for p in self.enumerate_properties(db_id) {
                if !select(&p.attr) {
                    continue;
                }
                let values = result.entry(key(&p.attr)).or_default();
                if !values.contains(&p.value) {
                    values.push(p.value);
                }
            }
        }
        result
    }

    /// Sorted distinct attribute names across the whole database.
    pub fn all_property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .attrs
            .iter()
            .filter_map(AttributeDef::from_record)
            .map(|attr| attr.name)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl std::fmt::Debug for PropDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropDb")
            .field("nodes", &self.offsets.len())
            .field("avs", &self.avs.len())
            .field("attrs", &self.attrs.len())
            .field("vals", &self.vals.len())
            .finish()
    }
}
