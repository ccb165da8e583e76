use super::{MapperDef, MapperProxy, MethodDef};
use crate::session::Session;

use saddle_core::catalog::Catalog;
use saddle_core::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of mapper interfaces, keyed by interface name.
///
/// Populated while configuration is assembled; read-only once the session
/// factory is built.
#[derive(Debug, Default)]
pub struct MapperRegistry {
    known: IndexMap<String, Arc<MapperProxyFactory>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an interface, installing its statements and result maps into
    /// the catalogue and validating that every declared method resolves to
    /// the statement `interface.method`.
    ///
    /// Registration is atomic: any failure removes the interface and whatever
    /// it installed before the error propagates.
    pub fn add_mapper(&mut self, catalog: &mut Catalog, def: MapperDef) -> Result<()> {
        if self.known.contains_key(def.interface()) {
            return Err(Error::binding(format!(
                "type {} is already known to the registry",
                def.interface()
            )));
        }

        let (interface, methods, statements, result_maps) = def.into_parts();

        // The factory is registered before parsing so statements referencing
        // the interface resolve while it is installed.
        self.known.insert(
            interface.clone(),
            Arc::new(MapperProxyFactory::new(interface.clone(), methods)),
        );

        let mut installed_statements = vec![];
        let mut installed_maps = vec![];
        let result = Self::parse(
            catalog,
            &self.known[&interface],
            result_maps,
            statements,
            &mut installed_maps,
            &mut installed_statements,
        );

        if result.is_err() {
            self.known.shift_remove(&interface);
            for id in installed_statements {
                catalog.remove_statement(&id);
            }
            for id in installed_maps {
                catalog.remove_result_map(&id);
            }
        }
        result
    }

    fn parse(
        catalog: &mut Catalog,
        factory: &MapperProxyFactory,
        result_maps: Vec<saddle_core::mapping::ResultMap>,
        statements: Vec<saddle_core::mapping::MappedStatement>,
        installed_maps: &mut Vec<String>,
        installed_statements: &mut Vec<String>,
    ) -> Result<()> {
        for result_map in result_maps {
            let id = result_map.id().to_string();
            catalog.add_result_map(result_map)?;
            installed_maps.push(id);
        }
        for statement in statements {
            let id = statement.id().to_string();
            catalog.add_statement(statement)?;
            installed_statements.push(id);
        }
        for method in factory.methods() {
            let id = format!("{}.{}", factory.interface(), method.name());
            if !catalog.has_statement(&id) {
                return Err(Error::binding(format!(
                    "method {} of mapper {} does not resolve to a known statement ({id})",
                    method.name(),
                    factory.interface()
                )));
            }
        }
        Ok(())
    }

    pub fn has_mapper(&self, interface: &str) -> bool {
        self.known.contains_key(interface)
    }

    /// Creates a proxy for a registered interface, bound to the given
    /// session. The proxy mutably borrows the session, so it cannot be shared
    /// across sessions or outlive one.
    pub fn mapper<'a>(&self, interface: &str, session: &'a mut Session) -> Result<MapperProxy<'a>> {
        let factory = self.known.get(interface).ok_or_else(|| {
            Error::binding(format!("type {interface} is not known to the registry"))
        })?;
        Ok(MapperProxy::new(session, factory.clone()))
    }

    /// Registered interface names, in registration order.
    pub fn mappers(&self) -> impl Iterator<Item = &str> {
        self.known.keys().map(String::as_str)
    }
}

/// One registered interface: its method dispatch table, from which bound
/// proxies are minted, one per session.
#[derive(Debug)]
pub struct MapperProxyFactory {
    interface: String,
    methods: IndexMap<String, MethodDef>,
}

impl MapperProxyFactory {
    pub(crate) fn new(interface: String, methods: Vec<MethodDef>) -> Self {
        let methods = methods
            .into_iter()
            .map(|method| (method.name().to_string(), method))
            .collect();
        Self { interface, methods }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.values()
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name)
    }
}
