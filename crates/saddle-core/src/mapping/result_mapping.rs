/// Marker flags a mapping can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFlag {
    /// The mapping participates in object identity (primary-key column).
    Id,
    /// The mapping feeds a constructor argument rather than a property.
    Constructor,
}

/// One column-to-property rule inside a [`ResultMap`].
///
/// A mapping names either a single column, a composite of sub-columns (for
/// multi-column joins feeding a nested query), or no column at all (pure
/// nested mapping). It may reference a nested result map (association or
/// collection materialized from the same row), a nested query (an eager
/// sub-select keyed by the column value), or a separate result-set name.
///
/// [`ResultMap`]: super::ResultMap
#[derive(Debug, Clone)]
pub struct ResultMapping {
    property: String,
    column: Option<String>,
    composites: Vec<ResultMapping>,
    nested_result_map: Option<String>,
    nested_query: Option<String>,
    result_set: Option<String>,
    many: bool,
    flags: Vec<ResultFlag>,
}

impl ResultMapping {
    pub fn builder(property: impl Into<String>) -> Builder {
        Builder {
            mapping: ResultMapping {
                property: property.into(),
                column: None,
                composites: vec![],
                nested_result_map: None,
                nested_query: None,
                result_set: None,
                many: false,
                flags: vec![],
            },
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn composites(&self) -> &[ResultMapping] {
        &self.composites
    }

    pub fn is_composite(&self) -> bool {
        !self.composites.is_empty()
    }

    pub fn nested_result_map(&self) -> Option<&str> {
        self.nested_result_map.as_deref()
    }

    pub fn nested_query(&self) -> Option<&str> {
        self.nested_query.as_deref()
    }

    pub fn result_set(&self) -> Option<&str> {
        self.result_set.as_deref()
    }

    /// Whether the mapping materializes a collection rather than a single
    /// association. Declarative: there is no property type to reflect on.
    pub fn is_many(&self) -> bool {
        self.many
    }

    pub fn flags(&self) -> &[ResultFlag] {
        &self.flags
    }

    pub fn is_id(&self) -> bool {
        self.flags.contains(&ResultFlag::Id)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(&ResultFlag::Constructor)
    }
}

#[derive(Debug)]
pub struct Builder {
    mapping: ResultMapping,
}

impl Builder {
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.mapping.column = Some(column.into());
        self
    }

    /// Adds a composite sub-mapping (multi-column join key).
    pub fn composite(mut self, mapping: ResultMapping) -> Self {
        self.mapping.composites.push(mapping);
        self
    }

    pub fn nested_result_map(mut self, id: impl Into<String>) -> Self {
        self.mapping.nested_result_map = Some(id.into());
        self
    }

    pub fn nested_query(mut self, id: impl Into<String>) -> Self {
        self.mapping.nested_query = Some(id.into());
        self
    }

    pub fn result_set(mut self, name: impl Into<String>) -> Self {
        self.mapping.result_set = Some(name.into());
        self
    }

    pub fn many(mut self) -> Self {
        self.mapping.many = true;
        self
    }

    pub fn flag(mut self, flag: ResultFlag) -> Self {
        if !self.mapping.flags.contains(&flag) {
            self.mapping.flags.push(flag);
        }
        self
    }

    pub fn build(self) -> ResultMapping {
        self.mapping
    }
}
