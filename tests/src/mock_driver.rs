use super::exec_log::{DriverOp, ExecLog};

use saddle_core::async_trait;
use saddle_core::driver::{Connection, Driver, Response, StatementId};
use saddle_core::mapping::StatementHints;
use saddle_core::stmt::{RowSet, Value};
use saddle_core::{err, Result};

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockResponse {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Count(u64),
    Fail(String),
}

/// An in-memory driver with canned responses keyed by SQL text, logging every
/// operation that crosses the execution boundary.
///
/// Responses must be registered explicitly; executing unregistered SQL is an
/// error so tests cannot silently query the wrong statement.
#[derive(Debug, Default)]
pub struct MockDriver {
    responses: HashMap<String, MockResponse>,
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a row-returning response for a SQL text.
    pub fn rows(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.responses.insert(
            sql.to_string(),
            MockResponse::Rows {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        );
        self
    }

    /// Registers an affected-row count response for a SQL text.
    pub fn count(mut self, sql: &str, count: u64) -> Self {
        self.responses
            .insert(sql.to_string(), MockResponse::Count(count));
        self
    }

    /// Registers a failure for a SQL text.
    pub fn fail(mut self, sql: &str, message: &str) -> Self {
        self.responses
            .insert(sql.to_string(), MockResponse::Fail(message.to_string()));
        self
    }

    /// The operation log shared with every connection this driver opens.
    pub fn log(&self) -> ExecLog {
        ExecLog::new(self.ops.clone())
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed("mock:")
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(MockConnection {
            responses: self.responses.clone(),
            ops: self.ops.clone(),
            statements: HashMap::new(),
            next_statement_id: 0,
        }))
    }
}

struct MockConnection {
    responses: HashMap<String, MockResponse>,
    ops: Arc<Mutex<Vec<DriverOp>>>,
    statements: HashMap<StatementId, String>,
    next_statement_id: u64,
}

impl MockConnection {
    fn push(&self, op: DriverOp) {
        self.ops.lock().unwrap().push(op);
    }

    fn sql_for(&self, statement: StatementId) -> Result<String> {
        self.statements
            .get(&statement)
            .cloned()
            .ok_or_else(|| err!("unknown statement handle {statement:?}"))
    }

    fn response_for(&self, sql: &str) -> Result<MockResponse> {
        self.responses
            .get(sql)
            .cloned()
            .ok_or_else(|| err!("no mock response registered for sql: {sql}"))
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn prepare(&mut self, sql: &str) -> Result<StatementId> {
        self.push(DriverOp::Prepare(sql.to_string()));
        self.next_statement_id += 1;
        let id = StatementId(self.next_statement_id);
        self.statements.insert(id, sql.to_string());
        Ok(id)
    }

    async fn exec(
        &mut self,
        statement: StatementId,
        _params: &[Value],
        _hints: &StatementHints,
    ) -> Result<Response> {
        let sql = self.sql_for(statement)?;
        self.push(DriverOp::Exec(sql.clone()));
        match self.response_for(&sql)? {
            MockResponse::Rows { columns, rows } => {
                let mut set = RowSet::new(columns);
                for row in rows {
                    set.push(row);
                }
                Ok(Response::row_set(set))
            }
            MockResponse::Count(count) => Ok(Response::count(count)),
            MockResponse::Fail(message) => Err(err!("{message}")),
        }
    }

    async fn exec_batch(
        &mut self,
        statement: StatementId,
        param_sets: &[Vec<Value>],
    ) -> Result<Vec<u64>> {
        let sql = self.sql_for(statement)?;
        self.push(DriverOp::ExecBatch {
            sql: sql.clone(),
            sets: param_sets.len(),
        });
        match self.response_for(&sql)? {
            MockResponse::Count(count) => Ok(vec![count; param_sets.len()]),
            MockResponse::Rows { .. } => Err(err!("batched statement returned rows; sql: {sql}")),
            MockResponse::Fail(message) => Err(err!("{message}")),
        }
    }

    async fn close_statement(&mut self, statement: StatementId) {
        self.push(DriverOp::CloseStatement);
        self.statements.remove(&statement);
    }

    async fn begin(&mut self) -> Result<()> {
        self.push(DriverOp::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.push(DriverOp::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.push(DriverOp::Rollback);
        Ok(())
    }
}
