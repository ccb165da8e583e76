mod value;
pub(crate) use value::Value;

use rusqlite::Connection as RusqliteConnection;
use saddle_core::{
    async_trait,
    driver::{Driver, Response, StatementId},
    mapping::StatementHints,
    stmt::RowSet,
    Error, Result,
};
use std::{
    borrow::Cow,
    collections::HashMap,
    path::{Path, PathBuf},
};
use url::Url;

/// SQLite driver over `rusqlite` (bundled).
#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver)?;

        if url.scheme() != "sqlite" {
            return Err(saddle_core::err!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            ));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    async fn connect(&self) -> Result<Box<dyn saddle_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
    /// Prepared SQL keyed by handle; actual statement reuse is delegated to
    /// rusqlite's prepared-statement cache.
    statements: HashMap<StatementId, String>,
    next_statement_id: u64,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory().map_err(Error::driver)?;
        Ok(Self::wrap(connection))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver)?;
        Ok(Self::wrap(connection))
    }

    fn wrap(connection: RusqliteConnection) -> Self {
        Self {
            connection,
            statements: HashMap::new(),
            next_statement_id: 0,
        }
    }

    fn sql_for(&self, statement: StatementId) -> Result<String> {
        self.statements
            .get(&statement)
            .cloned()
            .ok_or_else(|| saddle_core::err!("unknown statement handle {statement:?}"))
    }

    fn apply_hints(&self, hints: &StatementHints) -> Result<()> {
        if let Some(timeout) = hints.timeout {
            self.connection.busy_timeout(timeout).map_err(Error::driver)?;
        }
        Ok(())
    }
}

#[async_trait]
impl saddle_core::Connection for Connection {
    async fn prepare(&mut self, sql: &str) -> Result<StatementId> {
        // Validate the SQL now and warm rusqlite's cache.
        self.connection.prepare_cached(sql).map_err(Error::driver)?;

        self.next_statement_id += 1;
        let id = StatementId(self.next_statement_id);
        self.statements.insert(id, sql.to_string());
        tracing::debug!(handle = id.0, sql, "prepared statement");
        Ok(id)
    }

    async fn exec(
        &mut self,
        statement: StatementId,
        params: &[saddle_core::stmt::Value],
        hints: &StatementHints,
    ) -> Result<Response> {
        let sql = self.sql_for(statement)?;
        self.apply_hints(hints)?;

        let mut stmt = self.connection.prepare_cached(&sql).map_err(Error::driver)?;
        let params: Vec<Value> = params.iter().cloned().map(Value::from).collect();

        if stmt.column_count() == 0 {
            let count = stmt
                .execute(rusqlite::params_from_iter(params.iter()))
                .map_err(Error::driver)?;
            return Ok(Response::count(count as u64));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();
        let mut set = RowSet::new(columns);

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver)?;
        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut tuple = Vec::with_capacity(width);
            for index in 0..width {
                let value = row.get_ref(index).map_err(Error::driver)?;
                tuple.push(Value::from_sql(value).into_inner());
            }
            set.push(tuple);
        }

        Ok(Response::row_set(set))
    }

    async fn exec_batch(
        &mut self,
        statement: StatementId,
        param_sets: &[Vec<saddle_core::stmt::Value>],
    ) -> Result<Vec<u64>> {
        let sql = self.sql_for(statement)?;
        let mut stmt = self.connection.prepare_cached(&sql).map_err(Error::driver)?;

        let mut counts = Vec::with_capacity(param_sets.len());
        for params in param_sets {
            let params: Vec<Value> = params.iter().cloned().map(Value::from).collect();
            let count = stmt
                .execute(rusqlite::params_from_iter(params.iter()))
                .map_err(Error::driver)?;
            counts.push(count as u64);
        }
        Ok(counts)
    }

    async fn close_statement(&mut self, statement: StatementId) {
        self.statements.remove(&statement);
    }

    async fn begin(&mut self) -> Result<()> {
        self.connection.execute("BEGIN", []).map_err(Error::driver)?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.connection
            .execute("COMMIT", [])
            .map_err(Error::driver)?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.connection
            .execute("ROLLBACK", [])
            .map_err(Error::driver)?;
        Ok(())
    }
}
