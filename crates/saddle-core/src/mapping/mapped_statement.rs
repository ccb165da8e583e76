use super::BoundSql;
use crate::stmt::{self, Value};
use crate::Result;

use std::time::Duration;

/// What a statement does, which decides how its driver response is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn is_select(&self) -> bool {
        matches!(self, Self::Select)
    }
}

/// Per-statement execution hints passed through to the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementHints {
    pub fetch_size: Option<u32>,
    pub timeout: Option<Duration>,
}

/// Immutable metadata for one mapped database operation.
///
/// The SQL text is already in executable form: `?` placeholders plus the
/// ordered list of parameter property names to bind. Created once during
/// configuration, `Arc`-shared, looked up by id on every call.
#[derive(Debug)]
pub struct MappedStatement {
    id: String,
    kind: StatementKind,
    sql: String,
    param_names: Vec<String>,
    result_map: Option<String>,
    hints: StatementHints,
}

impl MappedStatement {
    pub fn builder(id: impl Into<String>, kind: StatementKind) -> Builder {
        Builder {
            statement: MappedStatement {
                id: id.into(),
                kind,
                sql: String::new(),
                param_names: vec![],
                result_map: None,
                hints: StatementHints::default(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn result_map(&self) -> Option<&str> {
        self.result_map.as_deref()
    }

    pub fn hints(&self) -> &StatementHints {
        &self.hints
    }

    /// Resolves the statement's parameter names against a parameter object,
    /// producing the SQL and bound values ready for the driver.
    pub fn bind(&self, param: &Value) -> Result<BoundSql> {
        let params = self
            .param_names
            .iter()
            .map(|name| stmt::resolve(param, name))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoundSql::new(self.sql.clone(), params))
    }
}

#[derive(Debug)]
pub struct Builder {
    statement: MappedStatement,
}

impl Builder {
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.statement.sql = sql.into();
        self
    }

    /// Declares the parameter property bound to the next `?` placeholder.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.statement.param_names.push(name.into());
        self
    }

    pub fn result_map(mut self, id: impl Into<String>) -> Self {
        self.statement.result_map = Some(id.into());
        self
    }

    pub fn fetch_size(mut self, fetch_size: u32) -> Self {
        self.statement.hints.fetch_size = Some(fetch_size);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.statement.hints.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> MappedStatement {
        self.statement
    }
}
