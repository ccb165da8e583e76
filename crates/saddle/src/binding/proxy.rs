use super::registry::MapperProxyFactory;
use super::MethodKind;
use crate::session::Session;

use saddle_core::stmt::{Value, ValueRecord};
use saddle_core::{Error, Result};

use std::sync::Arc;

/// A mapper interface bound to one session.
///
/// Every call is translated to the statement id `interface.method` and
/// dispatched through the session, with the arguments packed into a
/// parameter object. The proxy mutably borrows its session for its whole
/// life, so it cannot leak across sessions.
pub struct MapperProxy<'a> {
    session: &'a mut Session,
    factory: Arc<MapperProxyFactory>,
}

impl std::fmt::Debug for MapperProxy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperProxy")
            .field("interface", &self.factory.interface())
            .finish()
    }
}

impl<'a> MapperProxy<'a> {
    pub(crate) fn new(session: &'a mut Session, factory: Arc<MapperProxyFactory>) -> Self {
        Self { session, factory }
    }

    pub fn interface(&self) -> &str {
        self.factory.interface()
    }

    /// Invokes a declared method with the given arguments.
    ///
    /// Result shape follows the method kind: select-one yields the value or
    /// `Null`, select-list a `List`, select-map a `Record` keyed by the
    /// configured property, and writes the affected-row count.
    pub async fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value> {
        let factory = self.factory.clone();
        let def = factory.method(method).ok_or_else(|| {
            Error::binding(format!(
                "method {method} is not declared on mapper {}",
                factory.interface()
            ))
        })?;

        let statement = format!("{}.{}", factory.interface(), method);
        let param = pack_args(def.param_names(), args);

        match def.kind() {
            MethodKind::SelectOne => Ok(self
                .session
                .select_one(&statement, param)
                .await?
                .unwrap_or(Value::Null)),
            MethodKind::SelectList => Ok(Value::List(
                self.session.select_list(&statement, param).await?,
            )),
            MethodKind::SelectMap { key } => {
                let map = self.session.select_map(&statement, param, key).await?;
                Ok(Value::Record(
                    map.into_iter()
                        .map(|(k, v)| (k.key_string(), v))
                        .collect::<ValueRecord>(),
                ))
            }
            MethodKind::Insert | MethodKind::Update | MethodKind::Delete => {
                Ok(Value::U64(self.session.update(&statement, param).await?))
            }
        }
    }
}

/// Packs method arguments into the statement's parameter object.
///
/// No arguments bind null; a single argument with at most one declared name
/// passes through directly; otherwise each argument binds under its declared
/// name (or `arg{i}`) plus the positional alias `param{i+1}`.
fn pack_args(param_names: &[String], args: Vec<Value>) -> Value {
    if args.is_empty() {
        return Value::Null;
    }
    if args.len() == 1 && param_names.len() <= 1 {
        let mut args = args;
        return args.pop().unwrap_or(Value::Null);
    }

    let mut record = ValueRecord::new();
    for (i, arg) in args.into_iter().enumerate() {
        let name = match param_names.get(i) {
            Some(name) => name.clone(),
            None => format!("arg{i}"),
        };
        record.insert(name, arg.clone());
        record.insert(format!("param{}", i + 1), arg);
    }
    Value::Record(record)
}
