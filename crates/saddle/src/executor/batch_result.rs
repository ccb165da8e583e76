use saddle_core::stmt::Value;

/// Outcome of one flushed batch group: a run of consecutive writes through
/// the same statement with the same rendered SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    statement_id: String,
    sql: String,
    param_sets: Vec<Vec<Value>>,
    update_counts: Vec<u64>,
}

impl BatchResult {
    pub(crate) fn new(
        statement_id: String,
        sql: String,
        param_sets: Vec<Vec<Value>>,
        update_counts: Vec<u64>,
    ) -> Self {
        Self {
            statement_id,
            sql,
            param_sets,
            update_counts,
        }
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_sets(&self) -> &[Vec<Value>] {
        &self.param_sets
    }

    pub fn update_counts(&self) -> &[u64] {
        &self.update_counts
    }
}
