use super::Connection;
use crate::Result;

/// Owns a session's connection and its transaction boundary.
///
/// When not auto-committing, `BEGIN` is issued lazily on first connection
/// use; `commit`/`rollback` only reach the connection while a transaction is
/// open. `close` is best-effort: it rolls back an open transaction and
/// suppresses nothing itself — callers on an error path decide what to
/// swallow.
pub struct Transaction {
    conn: Box<dyn Connection>,
    auto_commit: bool,
    in_transaction: bool,
}

impl Transaction {
    pub fn new(conn: Box<dyn Connection>, auto_commit: bool) -> Self {
        Self {
            conn,
            auto_commit,
            in_transaction: false,
        }
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// The driver connection, opening a transaction first when one is needed
    /// and not yet active.
    pub async fn connection(&mut self) -> Result<&mut dyn Connection> {
        if !self.auto_commit && !self.in_transaction {
            tracing::debug!("opening transaction");
            self.conn.begin().await?;
            self.in_transaction = true;
        }
        Ok(&mut *self.conn)
    }

    pub async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.conn.commit().await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.conn.rollback().await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    /// Releases the transaction, rolling back any open work. Dropping the
    /// connection afterwards closes it.
    pub async fn close(&mut self) -> Result<()> {
        self.rollback().await
    }
}

impl core::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transaction")
            .field("auto_commit", &self.auto_commit)
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}
