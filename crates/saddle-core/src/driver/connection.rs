use super::Response;
use crate::async_trait;
use crate::mapping::StatementHints;
use crate::stmt::Value;
use crate::Result;

/// Opaque handle to a prepared statement, assigned by the connection.
///
/// Handles are only meaningful to the connection that issued them. Every
/// handle acquired on a call path must be released on that same path (or
/// deliberately retained, as the reuse executor does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementId(pub u64);

/// A session-scoped database connection.
///
/// All operations block the calling task; there is no concurrent use of one
/// connection. Transaction control is explicit: `begin`/`commit`/`rollback`
/// are only issued by the owning [`Transaction`].
///
/// [`Transaction`]: super::Transaction
#[async_trait]
pub trait Connection: Send + 'static {
    /// Prepares a statement, returning a handle for later execution.
    async fn prepare(&mut self, sql: &str) -> Result<StatementId>;

    /// Executes a prepared statement, returning rows for queries and an
    /// affected-row count for writes.
    async fn exec(
        &mut self,
        statement: StatementId,
        params: &[Value],
        hints: &StatementHints,
    ) -> Result<Response>;

    /// Executes a prepared write statement once per parameter set, returning
    /// the affected-row count for each set in order.
    async fn exec_batch(
        &mut self,
        statement: StatementId,
        param_sets: &[Vec<Value>],
    ) -> Result<Vec<u64>>;

    /// Releases a prepared statement handle. Best-effort: failures are the
    /// driver's to log, not the caller's to handle.
    async fn close_statement(&mut self, statement: StatementId);

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}
