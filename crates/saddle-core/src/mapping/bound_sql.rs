use crate::stmt::Value;

/// A statement resolved to its executable form: rendered SQL text plus the
/// parameter values bound to its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSql {
    sql: String,
    params: Vec<Value>,
}

impl BoundSql {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}
