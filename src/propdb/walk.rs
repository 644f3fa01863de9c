//! Taxonomy-aware graph reconstruction.
//!
//! Rooted walks over the property graph come in two modes. The grouping
//! collectors gather one named attribute (`_RC`, `_RFN`, `_RFT`) at every
//! non-empty occurrence and recurse only where it is absent. The row walks
//! never emit taxonomy nodes themselves: a node carrying `_RC`/`_RFN`/
//! `_RFT` collapses into its children, everything else emits a flattened
//! row (instance properties merged from its type node) and still descends.
//!
//! The underlying relation is expected to be acyclic. The walk keeps its
//! DFS path anyway and fails with [`Error::CycleDetected`] on a back-edge
//! instead of recursing forever on a malformed database.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::util::{Error, Result};
use super::reader::{is_internal_category, value_to_string, PropDb, CATEGORY_INTERNAL_REF, ROOT_DB_ID};

/// Attribute marking a category taxonomy node.
pub const ATTR_CATEGORY: &str = "_RC";
/// Attribute marking a family taxonomy node.
pub const ATTR_FAMILY: &str = "_RFN";
/// Attribute marking a family-type taxonomy node.
pub const ATTR_FAMILY_TYPE: &str = "_RFT";

/// Property names that are graph plumbing, never row data.
const ROW_IGNORED_NAMES: [&str; 4] = ["parent", "instanceof_objid", "child", "viewable_in"];

/// One flattened element row.
#[derive(Clone, Debug, Default)]
pub struct PropertyRow {
    pub db_id: u32,
    pub external_id: String,
    pub values: BTreeMap<String, Value>,
}

/// Options for the row walks.
#[derive(Clone, Debug, Default)]
pub struct WalkOptions {
    /// Emit nodes referenced as "Sub Family" instead of collapsing them
    /// into their children.
    pub include_sub_families: bool,
    /// Restrict row values to these parameter names.
    pub params: Option<Vec<String>>,
}

impl PropDb {
    /// All category taxonomy nodes: dbId → category name.
    pub fn all_categories(&self) -> Result<BTreeMap<u32, String>> {
        self.collect_named_attribute(ATTR_CATEGORY)
    }

    /// All family taxonomy nodes: dbId → family name.
    pub fn all_families(&self) -> Result<BTreeMap<u32, String>> {
        self.collect_named_attribute(ATTR_FAMILY)
    }

    /// All family-type taxonomy nodes: dbId → family type name.
    pub fn all_family_types(&self) -> Result<BTreeMap<u32, String>> {
        self.collect_named_attribute(ATTR_FAMILY_TYPE)
    }

    /// Every element row in the model, walking out of each category node.
    pub fn all_data(&self, options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        let categories = self.all_categories()?;
        let roots: Vec<u32> = categories.keys().copied().collect();
        self.collect_rows(&roots, options)
    }

    /// Element rows under one category name. A "Revit" prefix on the name
    /// is tolerated and stripped.
    pub fn data_by_category(&self, category: &str, options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        let category = category.strip_prefix("Revit").map(str::trim).unwrap_or(category);
        let categories = self.all_categories()?;
        let roots: Vec<u32> = categories
            .iter()
            .filter(|(_, name)| name.as_str() == category)
            .map(|(id, _)| *id)
            .collect();
        self.collect_rows(&roots, options)
    }

    /// Element rows under several category names.
    pub fn data_by_categories(&self, categories: &[&str], options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        let mut rows = Vec::new();
        for category in categories {
            rows.extend(self.data_by_category(category, options)?);
        }
        Ok(rows)
    }

    /// Element rows under one family name.
    pub fn data_by_family(&self, family: &str, options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        let families = self.all_families()?;
        let roots: Vec<u32> = families
            .iter()
            .filter(|(_, name)| name.as_str() == family)
            .map(|(id, _)| *id)
            .collect();
        self.collect_rows(&roots, options)
    }

    /// Element rows under one family type name.
    pub fn data_by_family_type(&self, family_type: &str, options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        let types = self.all_family_types()?;
        let roots: Vec<u32> = types
            .iter()
            .filter(|(_, name)| name.as_str() == family_type)
            .map(|(id, _)| *id)
            .collect();
        self.collect_rows(&roots, options)
    }

    /// Element rows rooted at the node with the given external id.
    pub fn data_by_external_id(&self, external_id: &str, options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        match self.db_id_of(external_id) {
            Some(db_id) => self.collect_rows(&[db_id], options),
            None => Ok(Vec::new()),
        }
    }

    /// Run the row walk from an explicit set of roots.
    pub fn collect_rows(&self, roots: &[u32], options: &WalkOptions) -> Result<Vec<PropertyRow>> {
        let mut rows = Vec::new();
        let mut path = HashSet::new();
        for &id in roots {
            self.walk_rows(id, options, &mut path, &mut rows)?;
        }
        Ok(rows)
    }

    /// Collect `attr_name` values over the tree under the document root:
    /// children carrying a non-empty value are recorded, children without
    /// the attribute are descended into.
    fn collect_named_attribute(&self, attr_name: &str) -> Result<BTreeMap<u32, String>> {
        let mut out = BTreeMap::new();
        let mut path = HashSet::new();
        self.walk_named_attribute(ROOT_DB_ID, attr_name, &mut path, &mut out)?;
        Ok(out)
    }

    fn walk_named_attribute(
        &self,
        db_id: u32,
        attr_name: &str,
        path: &mut HashSet<u32>,
        out: &mut BTreeMap<u32, String>,
    ) -> Result<()> {
        if !path.insert(db_id) {
            return Err(Error::CycleDetected(db_id));
        }
        for child in self.children(db_id) {
            let value = self
                .enumerate_properties(child)
                .into_iter()
                .find(|p| p.attr.name == attr_name)
                .map(|p| value_to_string(&p.value));
            match value {
                None => self.walk_named_attribute(child, attr_name, path, out)?,
                Some(v) if v.is_empty() => {}
                Some(v) => {
                    out.insert(child, v.trim().to_string());
                }
            }
        }
        path.remove(&db_id);
        Ok(())
    }

    fn walk_rows(
        &self,
        db_id: u32,
        options: &WalkOptions,
        path: &mut HashSet<u32>,
        rows: &mut Vec<PropertyRow>,
    ) -> Result<()> {
        if !path.insert(db_id) {
            return Err(Error::CycleDetected(db_id));
        }
        let result = self.walk_rows_inner(db_id, options, path, rows);
        path.remove(&db_id);
        result
    }

    fn walk_rows_inner(
        &self,
        db_id: u32,
        options: &WalkOptions,
        path: &mut HashSet<u32>,
        rows: &mut Vec<PropertyRow>,
    ) -> Result<()> {
        let props = self.enumerate_properties(db_id);

        // Taxonomy nodes group, they are not elements: descend without
        // emitting a row.
        let is_taxonomy = props
            .iter()
            .any(|p| matches!(p.attr.name.as_str(), ATTR_CATEGORY | ATTR_FAMILY | ATTR_FAMILY_TYPE));
        if is_taxonomy {
            for child in self.children(db_id) {
                self.walk_rows(child, options, path, rows)?;
            }
            return Ok(());
        }

        let mut sub_family = false;
        let mut values = BTreeMap::new();
        for p in &props {
            if p.attr.category == CATEGORY_INTERNAL_REF && p.attr.name == "Sub Family" {
                sub_family = true;
            }
            // The element name rides on the internal __name__ category but
            // is row data, emitted under "Name".
            if p.attr.name == "name" {
                values.insert("Name".to_string(), p.value.clone());
                continue;
            }
            if is_internal_category(&p.attr.category) {
                continue;
            }
            if ROW_IGNORED_NAMES.contains(&p.attr.name.as_str()) {
                continue;
            }
            values.insert(p.attr.name.clone(), p.value.clone());
        }

        // A sub-family node is transparent unless asked for: recurse into
        // its children in place of emitting it.
        if sub_family && !options.include_sub_families {
            for child in self.children(db_id) {
                self.walk_rows(child, options, path, rows)?;
            }
            return Ok(());
        }

        // Instance-of: the type node's properties fill in the row, type
        // values winning over the instance's own.
        for instance in self.instances_of(db_id) {
            for (name, value) in self.get_properties(instance) {
                values.insert(name, value);
            }
        }

        if let Some(params) = options.params.as_deref() {
            values.retain(|name, _| params.iter().any(|p| p == name));
        }

        rows.push(PropertyRow {
            db_id,
            external_id: self.external_id(db_id),
            values,
        });

        for child in self.children(db_id) {
            self.walk_rows(child, options, path, rows)?;
        }
        Ok(())
    }
}
