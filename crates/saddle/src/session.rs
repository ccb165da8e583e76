mod factory;
pub use factory::{Builder, SessionFactory, SessionOptions, Settings};
pub(crate) use factory::Shared;

use crate::binding::MapperProxy;
use crate::executor::{BatchResult, Executor};
use crate::result::{DuplicateKeyPolicy, MapResultCollector, ResultContext, ResultHandler};

use saddle_core::driver::Connection;
use saddle_core::mapping::RowBounds;
use saddle_core::stmt::{Value, ValueRecord};
use saddle_core::{err, Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// The caller-facing API for one unit of work: select/update statements by
/// id, transaction boundaries, and mapper proxies.
///
/// Not thread-safe. Create one session per unit of work from a
/// [`SessionFactory`] and close it before reuse.
pub struct Session {
    shared: Arc<Shared>,
    executor: Executor,
    auto_commit: bool,
    dirty: bool,
}

impl Session {
    pub(crate) fn new(shared: Arc<Shared>, executor: Executor, auto_commit: bool) -> Self {
        Self {
            shared,
            executor,
            auto_commit,
            dirty: false,
        }
    }

    /// Runs a query expected to yield at most one row: `None` for zero rows,
    /// the value for exactly one, and a too-many-results error naming the
    /// actual count otherwise.
    pub async fn select_one(
        &mut self,
        statement: &str,
        param: impl Into<Value>,
    ) -> Result<Option<Value>> {
        let mut list = self.select_list(statement, param).await?;
        match list.len() {
            0 => Ok(None),
            1 => Ok(list.pop()),
            n => Err(Error::too_many_results(n)),
        }
    }

    pub async fn select_list(
        &mut self,
        statement: &str,
        param: impl Into<Value>,
    ) -> Result<Vec<Value>> {
        self.select_list_bounds(statement, param, RowBounds::DEFAULT)
            .await
    }

    pub async fn select_list_bounds(
        &mut self,
        statement: &str,
        param: impl Into<Value>,
        bounds: RowBounds,
    ) -> Result<Vec<Value>> {
        let param = wrap_collection(param.into());
        self.query(statement, &param, bounds, None)
            .await
            .map_err(|e| e.context(err!("error querying database; statement={statement}")))
    }

    /// Runs a query and keys each row object by the named result property.
    /// Duplicate keys follow [`DuplicateKeyPolicy::Overwrite`].
    pub async fn select_map(
        &mut self,
        statement: &str,
        param: impl Into<Value>,
        key_property: &str,
    ) -> Result<IndexMap<Value, Value>> {
        self.select_map_with(
            statement,
            param,
            key_property,
            RowBounds::DEFAULT,
            DuplicateKeyPolicy::Overwrite,
        )
        .await
    }

    /// [`select_map`] with explicit row bounds and duplicate-key policy.
    ///
    /// The list result is re-consumed through a keyed collector, one row at a
    /// time, exactly like a caller-supplied handler would see it.
    ///
    /// [`select_map`]: Session::select_map
    pub async fn select_map_with(
        &mut self,
        statement: &str,
        param: impl Into<Value>,
        key_property: &str,
        bounds: RowBounds,
        policy: DuplicateKeyPolicy,
    ) -> Result<IndexMap<Value, Value>> {
        let list = self.select_list_bounds(statement, param, bounds).await?;
        let mut collector = MapResultCollector::new(key_property, policy);
        let mut context = ResultContext::new();
        for object in list {
            context.next(object);
            collector.handle(&context);
        }
        collector.finish()
    }

    /// Streaming select: the handler is invoked once per mapped row and
    /// nothing is returned or cached.
    pub async fn select(
        &mut self,
        statement: &str,
        param: impl Into<Value>,
        bounds: RowBounds,
        handler: &mut dyn ResultHandler,
    ) -> Result<()> {
        let param = wrap_collection(param.into());
        self.query(statement, &param, bounds, Some(handler))
            .await
            .map(|_| ())
            .map_err(|e| e.context(err!("error querying database; statement={statement}")))
    }

    /// Runs a write statement, returning the affected-row count.
    pub async fn update(&mut self, statement: &str, param: impl Into<Value>) -> Result<u64> {
        self.dirty = true;
        let param = wrap_collection(param.into());
        self.update_inner(statement, &param)
            .await
            .map_err(|e| e.context(err!("error updating database; statement={statement}")))
    }

    /// Alias for [`update`]: inserts funnel into the same write path.
    ///
    /// [`update`]: Session::update
    pub async fn insert(&mut self, statement: &str, param: impl Into<Value>) -> Result<u64> {
        self.update(statement, param).await
    }

    /// Alias for [`update`]: deletes funnel into the same write path.
    ///
    /// [`update`]: Session::update
    pub async fn delete(&mut self, statement: &str, param: impl Into<Value>) -> Result<u64> {
        self.update(statement, param).await
    }

    /// Commits when the session is dirty and not auto-committing; always
    /// clears the local cache and the dirty flag on success.
    pub async fn commit(&mut self) -> Result<()> {
        self.commit_required(false).await
    }

    /// Commits unconditionally, whatever the dirty state.
    pub async fn commit_force(&mut self) -> Result<()> {
        self.commit_required(true).await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.rollback_required(false).await
    }

    pub async fn rollback_force(&mut self) -> Result<()> {
        self.rollback_required(true).await
    }

    /// Executes pending batched statements, one result per distinct statement
    /// in submission order. Empty for non-batching sessions.
    pub async fn flush_statements(&mut self) -> Result<Vec<BatchResult>> {
        self.executor
            .flush_statements(false)
            .await
            .map_err(|e| e.context(err!("error flushing statements")))
    }

    /// Closes the session, rolling back unless the pending work was already
    /// committed. Terminal.
    pub async fn close(&mut self) -> Result<()> {
        let required = self.commit_or_rollback_required(false);
        let res = self.executor.close(required).await;
        self.dirty = false;
        res
    }

    pub fn clear_cache(&mut self) {
        self.executor.clear_local_cache();
    }

    /// The underlying driver connection.
    pub async fn connection(&mut self) -> Result<&mut dyn Connection> {
        self.executor
            .transaction()
            .connection()
            .await
            .map_err(|e| e.context(err!("error getting a connection")))
    }

    /// A proxy for a registered mapper interface, bound to this session.
    pub fn mapper(&mut self, interface: &str) -> Result<MapperProxy<'_>> {
        let registry = self.shared.registry.clone();
        registry.mapper(interface, self)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of live local cache entries; useful when observing cache scope.
    pub fn cached_results(&self) -> usize {
        self.executor.local_cache_len()
    }

    async fn query(
        &mut self,
        statement: &str,
        param: &Value,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Vec<Value>> {
        let ms = self.shared.catalog.statement(statement)?;
        self.executor.query(&ms, param, bounds, handler).await
    }

    async fn update_inner(&mut self, statement: &str, param: &Value) -> Result<u64> {
        let ms = self.shared.catalog.statement(statement)?;
        self.executor.update(&ms, param).await
    }

    async fn commit_required(&mut self, force: bool) -> Result<()> {
        let required = self.commit_or_rollback_required(force);
        self.executor
            .commit(required)
            .await
            .map_err(|e| e.context(err!("error committing transaction")))?;
        self.dirty = false;
        Ok(())
    }

    async fn rollback_required(&mut self, force: bool) -> Result<()> {
        let required = self.commit_or_rollback_required(force);
        self.executor
            .rollback(required)
            .await
            .map_err(|e| e.context(err!("error rolling back transaction")))?;
        self.dirty = false;
        Ok(())
    }

    fn commit_or_rollback_required(&self, force: bool) -> bool {
        (!self.auto_commit && self.dirty) || force
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("executor", &self.executor)
            .field("auto_commit", &self.auto_commit)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Wraps a bare sequence parameter so statement templates can reference it
/// under conventional names: a list under `"collection"` and `"list"`, a
/// fixed-size array under `"array"`. Everything else passes through.
fn wrap_collection(param: Value) -> Value {
    match param {
        Value::List(list) => {
            let mut record = ValueRecord::new();
            record.insert("collection", Value::List(list.clone()));
            record.insert("list", Value::List(list));
            Value::Record(record)
        }
        Value::Array(items) => {
            let mut record = ValueRecord::new();
            record.insert("array", Value::Array(items));
            Value::Record(record)
        }
        other => other,
    }
}
