mod batch_result;
pub use batch_result::BatchResult;

mod cache_key;
pub use cache_key::CacheKey;

mod local_cache;
pub use local_cache::{LocalCache, LocalCacheScope};

use crate::result::{map_result_set, ResultHandler};

use saddle_core::catalog::Catalog;
use saddle_core::driver::{StatementId, Transaction};
use saddle_core::mapping::{BoundSql, MappedStatement, RowBounds};
use saddle_core::stmt::{RowSet, Value};
use saddle_core::{err, Error, Result};

use async_recursion::async_recursion;
use std::collections::HashMap;
use std::sync::Arc;

/// The statement-reuse policy an executor runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorKind {
    /// A fresh statement handle per call, released immediately after.
    #[default]
    Simple,
    /// Handles cached for the session, keyed by rendered SQL text.
    Reuse,
    /// Writes accumulate and execute as batches on flush.
    Batch,
}

#[derive(Debug)]
enum Policy {
    Simple,
    Reuse {
        handles: HashMap<String, StatementId>,
    },
    Batch {
        pending: Vec<BatchGroup>,
    },
}

#[derive(Debug)]
struct BatchGroup {
    statement_id: String,
    sql: String,
    handle: StatementId,
    param_sets: Vec<Vec<Value>>,
}

/// Runs statements for one session: owns the connection (through its
/// [`Transaction`]), the local result cache, and the statement-reuse policy.
///
/// Not thread-safe; one executor per session, one session per unit of work.
/// Closing is terminal.
pub struct Executor {
    catalog: Arc<Catalog>,
    tx: Transaction,
    cache: LocalCache,
    cache_scope: LocalCacheScope,
    environment: String,
    policy: Policy,
    query_depth: usize,
    closed: bool,
}

impl Executor {
    pub fn new(
        catalog: Arc<Catalog>,
        tx: Transaction,
        kind: ExecutorKind,
        cache_scope: LocalCacheScope,
        environment: String,
    ) -> Self {
        let policy = match kind {
            ExecutorKind::Simple => Policy::Simple,
            ExecutorKind::Reuse => Policy::Reuse {
                handles: HashMap::new(),
            },
            ExecutorKind::Batch => Policy::Batch { pending: vec![] },
        };
        Self {
            catalog,
            tx,
            cache: LocalCache::default(),
            cache_scope,
            environment,
            policy,
            query_depth: 0,
            closed: false,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn transaction(&mut self) -> &mut Transaction {
        &mut self.tx
    }

    /// Runs a query through the local cache.
    ///
    /// With no handler, a cache hit returns the previously materialized list
    /// without touching the connection. With a handler, the cache is bypassed
    /// in both directions and mapped objects stream to the handler; the
    /// returned list is empty.
    #[async_recursion]
    pub async fn query(
        &mut self,
        ms: &MappedStatement,
        param: &Value,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Vec<Value>> {
        if self.closed {
            return Err(Error::executor_closed());
        }

        // Batched writes must land before any read can observe them.
        if matches!(self.policy, Policy::Batch { .. }) {
            self.flush_statements(false).await?;
        }

        let bound = ms.bind(param)?;

        let list = match handler {
            Some(handler) => {
                self.query_depth += 1;
                let res = self
                    .query_from_database(ms, &bound, bounds, Some(handler))
                    .await;
                self.query_depth -= 1;
                res?
            }
            None => {
                let key = CacheKey::new(ms.id(), bounds, &bound, &self.environment);
                match self.cache.get(&key) {
                    Some(hit) => {
                        tracing::debug!(statement = ms.id(), "local cache hit");
                        hit.clone()
                    }
                    None => {
                        tracing::debug!(statement = ms.id(), "local cache miss");
                        self.query_depth += 1;
                        let res = self.query_from_database(ms, &bound, bounds, None).await;
                        self.query_depth -= 1;
                        let list = res?;
                        self.cache.put(key, list.clone());
                        list
                    }
                }
            }
        };

        if self.query_depth == 0 && self.cache_scope == LocalCacheScope::Statement {
            self.cache.clear();
        }

        Ok(list)
    }

    /// Runs a write statement. Any write may affect rows backing cached
    /// reads, so the local cache is invalidated wholesale first.
    pub async fn update(&mut self, ms: &MappedStatement, param: &Value) -> Result<u64> {
        if self.closed {
            return Err(Error::executor_closed());
        }
        self.cache.clear();
        let bound = ms.bind(param)?;
        self.do_update(ms, &bound).await
    }

    /// Executes pending batched writes, one [`BatchResult`] per group in
    /// submission order. A no-op empty list for non-batching policies; the
    /// reuse policy additionally releases its cached statement handles.
    /// `is_rollback` discards pending work instead of executing it.
    pub async fn flush_statements(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>> {
        if self.closed {
            return Err(Error::executor_closed());
        }
        match &mut self.policy {
            Policy::Simple => Ok(vec![]),
            Policy::Reuse { handles } => {
                if handles.is_empty() {
                    return Ok(vec![]);
                }
                let conn = self.tx.connection().await?;
                for (_, handle) in handles.drain() {
                    conn.close_statement(handle).await;
                }
                Ok(vec![])
            }
            Policy::Batch { pending } => {
                if pending.is_empty() {
                    return Ok(vec![]);
                }
                let groups = std::mem::take(pending);
                let conn = self.tx.connection().await?;

                if is_rollback {
                    tracing::debug!(groups = groups.len(), "discarding pending batches");
                    for group in &groups {
                        conn.close_statement(group.handle).await;
                    }
                    return Ok(vec![]);
                }

                let mut results = vec![];
                let mut first_err: Option<Error> = None;
                for group in groups {
                    // Remaining handles are still released once a group fails.
                    if first_err.is_some() {
                        conn.close_statement(group.handle).await;
                        continue;
                    }
                    let res = conn.exec_batch(group.handle, &group.param_sets).await;
                    conn.close_statement(group.handle).await;
                    match res {
                        Ok(update_counts) => results.push(BatchResult::new(
                            group.statement_id,
                            group.sql,
                            group.param_sets,
                            update_counts,
                        )),
                        Err(e) => {
                            first_err = Some(e.context(err!(
                                "error flushing batched statement; statement={}",
                                group.statement_id
                            )));
                        }
                    }
                }
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(results),
                }
            }
        }
    }

    /// Clears the dirty work owned by this executor and, when `required`,
    /// commits the underlying transaction.
    pub async fn commit(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Err(Error::executor_closed());
        }
        self.cache.clear();
        self.flush_statements(false).await?;
        if required {
            self.tx.commit().await?;
        }
        Ok(())
    }

    /// Discards pending work and, when `required`, rolls back the underlying
    /// transaction. A no-op on a closed executor.
    pub async fn rollback(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.cache.clear();
        let flush_res = self.flush_statements(true).await;
        let tx_res = if required {
            self.tx.rollback().await
        } else {
            Ok(())
        };
        flush_res?;
        tx_res
    }

    /// Releases the transaction and connection. Terminal: all further
    /// operations fail. A failure while closing the transaction itself is
    /// suppressed in favor of any rollback error already in flight.
    pub async fn close(&mut self, force_rollback: bool) -> Result<()> {
        let res = self.rollback(force_rollback).await;
        if let Err(close_err) = self.tx.close().await {
            tracing::warn!(error = %close_err, "error closing transaction (suppressed)");
        }
        self.closed = true;
        res
    }

    pub fn clear_local_cache(&mut self) {
        if !self.closed {
            self.cache.clear();
        }
    }

    /// Number of live cache entries; used by tests observing cache scope.
    pub fn local_cache_len(&self) -> usize {
        self.cache.len()
    }

    async fn query_from_database(
        &mut self,
        ms: &MappedStatement,
        bound: &BoundSql,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Vec<Value>> {
        let rows = self.do_query(ms, bound).await?;
        map_result_set(self, ms, rows, bounds, handler).await
    }

    async fn do_query(&mut self, ms: &MappedStatement, bound: &BoundSql) -> Result<RowSet> {
        let hints = *ms.hints();
        match &mut self.policy {
            Policy::Reuse { handles } => {
                let conn = self.tx.connection().await?;
                let handle = match handles.get(bound.sql()) {
                    Some(handle) => *handle,
                    None => {
                        let handle = conn.prepare(bound.sql()).await?;
                        handles.insert(bound.sql().to_string(), handle);
                        handle
                    }
                };
                let response = conn.exec(handle, bound.params(), &hints).await?;
                response.rows.into_rows()
            }
            // Batch queries were flushed above and run like simple ones.
            Policy::Simple | Policy::Batch { .. } => {
                let conn = self.tx.connection().await?;
                let handle = conn.prepare(bound.sql()).await?;
                let res = conn.exec(handle, bound.params(), &hints).await;
                conn.close_statement(handle).await;
                res?.rows.into_rows()
            }
        }
    }

    async fn do_update(&mut self, ms: &MappedStatement, bound: &BoundSql) -> Result<u64> {
        let hints = *ms.hints();
        match &mut self.policy {
            Policy::Simple => {
                let conn = self.tx.connection().await?;
                let handle = conn.prepare(bound.sql()).await?;
                let res = conn.exec(handle, bound.params(), &hints).await;
                conn.close_statement(handle).await;
                res?.rows.into_count()
            }
            Policy::Reuse { handles } => {
                let conn = self.tx.connection().await?;
                let handle = match handles.get(bound.sql()) {
                    Some(handle) => *handle,
                    None => {
                        let handle = conn.prepare(bound.sql()).await?;
                        handles.insert(bound.sql().to_string(), handle);
                        handle
                    }
                };
                let response = conn.exec(handle, bound.params(), &hints).await?;
                response.rows.into_count()
            }
            Policy::Batch { pending } => {
                let conn = self.tx.connection().await?;
                let start_new = match pending.last() {
                    Some(group) => group.statement_id != ms.id() || group.sql != bound.sql(),
                    None => true,
                };
                if start_new {
                    let handle = conn.prepare(bound.sql()).await?;
                    pending.push(BatchGroup {
                        statement_id: ms.id().to_string(),
                        sql: bound.sql().to_string(),
                        handle,
                        param_sets: vec![],
                    });
                }
                if let Some(group) = pending.last_mut() {
                    group.param_sets.push(bound.params().to_vec());
                }
                // Counts are reported by flush_statements.
                Ok(0)
            }
        }
    }
}

impl core::fmt::Debug for Executor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Executor")
            .field("tx", &self.tx)
            .field("cache_scope", &self.cache_scope)
            .field("cached_results", &self.cache.len())
            .field("closed", &self.closed)
            .finish()
    }
}
