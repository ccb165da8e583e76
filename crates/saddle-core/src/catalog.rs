use crate::mapping::{MappedStatement, ResultMap};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// The statement catalogue: every mapped statement and result map known to
/// the engine, keyed by fully-qualified id (`namespace.name`).
///
/// Mutable while configuration is assembled, then frozen behind an `Arc` and
/// shared read-only across sessions.
#[derive(Debug, Default)]
pub struct Catalog {
    statements: IndexMap<String, Arc<MappedStatement>>,
    result_maps: IndexMap<String, Arc<ResultMap>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_statement(&mut self, statement: MappedStatement) -> Result<()> {
        let id = statement.id().to_string();
        if self.statements.contains_key(&id) {
            return Err(Error::binding(format!(
                "statement {id} is already known to the catalog"
            )));
        }
        self.statements.insert(id, Arc::new(statement));
        Ok(())
    }

    pub fn statement(&self, id: &str) -> Result<Arc<MappedStatement>> {
        self.statements
            .get(id)
            .cloned()
            .ok_or_else(|| Error::unknown_statement(id))
    }

    pub fn has_statement(&self, id: &str) -> bool {
        self.statements.contains_key(id)
    }

    /// Removes a statement, preserving the catalogue's insertion order.
    /// Used to roll back a failed mapper registration.
    pub fn remove_statement(&mut self, id: &str) -> Option<Arc<MappedStatement>> {
        self.statements.shift_remove(id)
    }

    pub fn statements(&self) -> impl Iterator<Item = &Arc<MappedStatement>> {
        self.statements.values()
    }

    pub fn add_result_map(&mut self, result_map: ResultMap) -> Result<()> {
        let id = result_map.id().to_string();
        if self.result_maps.contains_key(&id) {
            return Err(Error::binding(format!(
                "result map {id} is already known to the catalog"
            )));
        }
        self.result_maps.insert(id, Arc::new(result_map));
        Ok(())
    }

    pub fn result_map(&self, id: &str) -> Result<Arc<ResultMap>> {
        self.result_maps
            .get(id)
            .cloned()
            .ok_or_else(|| crate::err!("unknown result map: {id}"))
    }

    pub fn has_result_map(&self, id: &str) -> bool {
        self.result_maps.contains_key(id)
    }

    pub fn remove_result_map(&mut self, id: &str) -> Option<Arc<ResultMap>> {
        self.result_maps.shift_remove(id)
    }

    pub fn result_maps(&self) -> impl Iterator<Item = &Arc<ResultMap>> {
        self.result_maps.values()
    }
}
