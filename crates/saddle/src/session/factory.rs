use super::Session;
use crate::binding::{MapperDef, MapperRegistry};
use crate::executor::{Executor, ExecutorKind, LocalCacheScope};

use saddle_core::catalog::Catalog;
use saddle_core::driver::{Driver, Transaction};
use saddle_core::mapping::{MappedStatement, ResultMap};
use saddle_core::{err, Error, Result};

use std::sync::Arc;

/// Session-wide defaults, fixed at factory build time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub executor_kind: ExecutorKind,
    pub cache_scope: LocalCacheScope,
    pub auto_commit: bool,
    /// Environment identifier, part of every cache key so results from
    /// different databases never alias.
    pub environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executor_kind: ExecutorKind::default(),
            cache_scope: LocalCacheScope::default(),
            auto_commit: false,
            environment: "default".to_string(),
        }
    }
}

/// Per-session overrides of the factory defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub executor_kind: Option<ExecutorKind>,
    pub auto_commit: Option<bool>,
}

/// Shared state between the factory and every session it opens.
pub(crate) struct Shared {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) registry: Arc<MapperRegistry>,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) settings: Settings,
}

/// Opens sessions: holds the frozen catalogue, the mapper registry, the
/// driver, and the defaults. Cheap to clone and safe to share across
/// threads; the sessions it opens are not.
#[derive(Clone)]
pub struct SessionFactory {
    shared: Arc<Shared>,
}

impl SessionFactory {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Opens a session with the factory defaults.
    pub async fn session(&self) -> Result<Session> {
        self.session_with(SessionOptions::default()).await
    }

    /// Opens a session, overriding executor kind and/or auto-commit.
    pub async fn session_with(&self, options: SessionOptions) -> Result<Session> {
        let conn = self
            .shared
            .driver
            .connect()
            .await
            .map_err(|e| e.context(err!("error opening session")))?;

        let settings = &self.shared.settings;
        let auto_commit = options.auto_commit.unwrap_or(settings.auto_commit);
        let executor = Executor::new(
            self.shared.catalog.clone(),
            Transaction::new(conn, auto_commit),
            options.executor_kind.unwrap_or(settings.executor_kind),
            settings.cache_scope,
            settings.environment.clone(),
        );

        Ok(Session::new(self.shared.clone(), executor, auto_commit))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.shared.catalog
    }

    pub fn registry(&self) -> &Arc<MapperRegistry> {
        &self.shared.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }
}

impl core::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("driver", &self.shared.driver)
            .field("settings", &self.shared.settings)
            .finish()
    }
}

/// Collects configuration, then freezes it into a [`SessionFactory`].
///
/// Statements, result maps, and mapper defs are applied in order at
/// [`build`]; the first failure aborts the build, so a factory never exists
/// with a partially registered mapper.
///
/// [`build`]: Builder::build
#[derive(Default)]
pub struct Builder {
    statements: Vec<MappedStatement>,
    result_maps: Vec<ResultMap>,
    mappers: Vec<MapperDef>,
    driver: Option<Arc<dyn Driver>>,
    settings: Settings,
}

impl Builder {
    pub fn statement(mut self, statement: MappedStatement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn result_map(mut self, result_map: ResultMap) -> Self {
        self.result_maps.push(result_map);
        self
    }

    pub fn mapper(mut self, def: MapperDef) -> Self {
        self.mappers.push(def);
        self
    }

    pub fn driver(mut self, driver: impl Driver) -> Self {
        self.driver = Some(Arc::new(driver));
        self
    }

    pub fn executor_kind(mut self, kind: ExecutorKind) -> Self {
        self.settings.executor_kind = kind;
        self
    }

    pub fn cache_scope(mut self, scope: LocalCacheScope) -> Self {
        self.settings.cache_scope = scope;
        self
    }

    pub fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.settings.auto_commit = auto_commit;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.settings.environment = environment.into();
        self
    }

    pub fn build(self) -> Result<SessionFactory> {
        let driver = self
            .driver
            .ok_or_else(|| Error::binding("a driver is required to build a session factory"))?;

        let mut catalog = Catalog::new();
        for result_map in self.result_maps {
            catalog.add_result_map(result_map)?;
        }
        for statement in self.statements {
            catalog.add_statement(statement)?;
        }

        let mut registry = MapperRegistry::new();
        for def in self.mappers {
            registry.add_mapper(&mut catalog, def)?;
        }

        Ok(SessionFactory {
            shared: Arc::new(Shared {
                catalog: Arc::new(catalog),
                registry: Arc::new(registry),
                driver,
                settings: self.settings,
            }),
        })
    }
}
