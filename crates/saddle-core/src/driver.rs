mod connection;
pub use connection::{Connection, StatementId};

mod response;
pub use response::{Response, ResponseRows};

mod transaction;
pub use transaction::Transaction;

use crate::async_trait;

use std::{borrow::Cow, fmt::Debug};

/// A database driver: a factory for connections.
///
/// Drivers are shared read-only across sessions; each session gets its own
/// [`Connection`].
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Human-readable connection URL, for diagnostics.
    fn url(&self) -> Cow<'_, str>;

    /// Opens a new database connection.
    async fn connect(&self) -> crate::Result<Box<dyn Connection>>;
}
