use saddle_core::mapping::{BoundSql, RowBounds};
use saddle_core::stmt::Value;

/// Identity of one cacheable query invocation.
///
/// Two invocations are cache-equivalent iff every component is equal and the
/// bound parameter values appear in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    statement_id: String,
    offset: usize,
    limit: usize,
    sql: String,
    params: Vec<Value>,
    environment: String,
}

impl CacheKey {
    pub fn new(
        statement_id: &str,
        bounds: RowBounds,
        bound: &BoundSql,
        environment: &str,
    ) -> Self {
        Self {
            statement_id: statement_id.to_string(),
            offset: bounds.offset,
            limit: bounds.limit,
            sql: bound.sql().to_string(),
            params: bound.params().to_vec(),
            environment: environment.to_string(),
        }
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }
}
