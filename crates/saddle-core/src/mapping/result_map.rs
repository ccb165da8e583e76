use super::{Discriminator, ResultMapping};
use crate::{bail, Result};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Declarative descriptor of how a result row maps to an object.
///
/// Built once via [`ResultMap::builder`]; after `build` all derived
/// collections are frozen. The single permitted post-construction mutation is
/// [`force_nested_result_maps`], needed when nesting reaches a map indirectly
/// through a discriminator branch.
///
/// [`force_nested_result_maps`]: ResultMap::force_nested_result_maps
#[derive(Debug)]
pub struct ResultMap {
    id: String,
    type_name: String,
    mappings: Vec<ResultMapping>,
    id_mappings: Vec<ResultMapping>,
    constructor_mappings: Vec<ResultMapping>,
    property_mappings: Vec<ResultMapping>,
    mapped_columns: HashSet<String>,
    discriminator: Option<Discriminator>,
    has_nested_result_maps: AtomicBool,
    has_nested_queries: bool,
    auto_mapping: Option<bool>,
}

impl ResultMap {
    pub fn builder(id: impl Into<String>, type_name: impl Into<String>) -> Builder {
        Builder {
            id: id.into(),
            type_name: type_name.into(),
            mappings: vec![],
            discriminator: None,
            auto_mapping: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn mappings(&self) -> &[ResultMapping] {
        &self.mappings
    }

    /// Mappings participating in object identity: the ID-flagged subset, or
    /// every mapping when none were flagged.
    pub fn id_mappings(&self) -> &[ResultMapping] {
        &self.id_mappings
    }

    pub fn constructor_mappings(&self) -> &[ResultMapping] {
        &self.constructor_mappings
    }

    pub fn property_mappings(&self) -> &[ResultMapping] {
        &self.property_mappings
    }

    /// Uppercase-normalized set of every column this map touches, directly or
    /// through composites.
    pub fn mapped_columns(&self) -> &HashSet<String> {
        &self.mapped_columns
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn has_nested_result_maps(&self) -> bool {
        self.has_nested_result_maps.load(Ordering::Relaxed)
    }

    pub fn has_nested_queries(&self) -> bool {
        self.has_nested_queries
    }

    pub fn auto_mapping(&self) -> Option<bool> {
        self.auto_mapping
    }

    /// Marks this map as having nested result maps even though none of its
    /// direct mappings declare one. The sole permitted mutation after build;
    /// used when a discriminator case introduces nesting.
    pub fn force_nested_result_maps(&self) {
        self.has_nested_result_maps.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct Builder {
    id: String,
    type_name: String,
    mappings: Vec<ResultMapping>,
    discriminator: Option<Discriminator>,
    auto_mapping: Option<bool>,
}

impl Builder {
    pub fn mapping(mut self, mapping: ResultMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn mappings(mut self, mappings: impl IntoIterator<Item = ResultMapping>) -> Self {
        self.mappings.extend(mappings);
        self
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn auto_mapping(mut self, auto_mapping: bool) -> Self {
        self.auto_mapping = Some(auto_mapping);
        self
    }

    pub fn build(self) -> Result<ResultMap> {
        if self.id.is_empty() {
            bail!("result maps must have an id");
        }

        let mut has_nested_queries = false;
        let mut has_nested_result_maps = false;
        let mut mapped_columns = HashSet::new();
        let mut id_mappings = vec![];
        let mut constructor_mappings = vec![];
        let mut property_mappings = vec![];

        for mapping in &self.mappings {
            has_nested_queries |= mapping.nested_query().is_some();
            // A mapping materialized from a separate result set is not
            // "nested": its rows arrive independently of the outer row.
            has_nested_result_maps |=
                mapping.nested_result_map().is_some() && mapping.result_set().is_none();

            if let Some(column) = mapping.column() {
                mapped_columns.insert(column.to_ascii_uppercase());
            } else if mapping.is_composite() {
                for composite in mapping.composites() {
                    if let Some(column) = composite.column() {
                        mapped_columns.insert(column.to_ascii_uppercase());
                    }
                }
            }

            if mapping.is_constructor() {
                constructor_mappings.push(mapping.clone());
            } else {
                property_mappings.push(mapping.clone());
            }

            if mapping.is_id() {
                id_mappings.push(mapping.clone());
            }
        }

        // No declared ID means every mapped column participates in identity.
        if id_mappings.is_empty() {
            id_mappings = self.mappings.clone();
        }

        Ok(ResultMap {
            id: self.id,
            type_name: self.type_name,
            mappings: self.mappings,
            id_mappings,
            constructor_mappings,
            property_mappings,
            mapped_columns,
            discriminator: self.discriminator,
            has_nested_result_maps: AtomicBool::new(has_nested_result_maps),
            has_nested_queries,
            auto_mapping: self.auto_mapping,
        })
    }
}
