use crate::stmt::Value;

use indexmap::IndexMap;

/// Per-row polymorphic dispatch: a column value selects an alternate result
/// map at mapping time. Cases are matched against the column value's key
/// rendering, so `I64(1)` matches the case `"1"`.
#[derive(Debug, Clone)]
pub struct Discriminator {
    column: String,
    cases: IndexMap<String, String>,
}

impl Discriminator {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            cases: IndexMap::new(),
        }
    }

    /// Adds a case mapping a column value to a result map id.
    pub fn case(mut self, value: impl Into<String>, result_map: impl Into<String>) -> Self {
        self.cases.insert(value.into(), result_map.into());
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn cases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cases.iter().map(|(v, id)| (v.as_str(), id.as_str()))
    }

    /// The result map id selected by the given column value, if any case
    /// matches.
    pub fn result_map_for(&self, value: &Value) -> Option<&str> {
        self.cases.get(&value.key_string()).map(String::as_str)
    }
}
