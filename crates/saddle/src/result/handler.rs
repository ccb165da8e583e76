use saddle_core::stmt::Value;
use saddle_core::{Error, Result};

use indexmap::IndexMap;

/// The row currently being delivered to a [`ResultHandler`], plus a running
/// count.
#[derive(Debug, Default)]
pub struct ResultContext {
    object: Value,
    count: usize,
}

impl ResultContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next(&mut self, object: Value) {
        self.object = object;
        self.count += 1;
    }

    pub fn object(&self) -> &Value {
        &self.object
    }

    pub fn result_count(&self) -> usize {
        self.count
    }
}

/// Caller-supplied row sink for the streaming select variant. Invoked once
/// per mapped row; nothing is returned to the caller and nothing is cached.
pub trait ResultHandler: Send {
    fn handle(&mut self, context: &ResultContext);
}

/// Collects mapped rows into a list. The default sink when the caller does
/// not supply one.
#[derive(Debug, Default)]
pub struct ListResultHandler {
    list: Vec<Value>,
}

impl ListResultHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_list(self) -> Vec<Value> {
        self.list
    }
}

impl ResultHandler for ListResultHandler {
    fn handle(&mut self, context: &ResultContext) {
        self.list.push(context.object().clone());
    }
}

/// What a keyed collector does when two rows produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    /// Last row wins, silently.
    #[default]
    Overwrite,
    /// A duplicate key is an error naming the key.
    Strict,
}

/// Re-consumes a result list into a map keyed by a named property of each
/// row object. Rows without the property (or non-record rows) key as null.
#[derive(Debug)]
pub struct MapResultCollector {
    key_property: String,
    policy: DuplicateKeyPolicy,
    entries: IndexMap<Value, Value>,
    error: Option<Error>,
}

impl MapResultCollector {
    pub fn new(key_property: impl Into<String>, policy: DuplicateKeyPolicy) -> Self {
        Self {
            key_property: key_property.into(),
            policy,
            entries: IndexMap::new(),
            error: None,
        }
    }

    pub fn finish(self) -> Result<IndexMap<Value, Value>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.entries),
        }
    }
}

impl ResultHandler for MapResultCollector {
    fn handle(&mut self, context: &ResultContext) {
        if self.error.is_some() {
            return;
        }
        let object = context.object();
        let key = match object.as_record() {
            Some(record) => record.get(&self.key_property).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        };
        if self.policy == DuplicateKeyPolicy::Strict && self.entries.contains_key(&key) {
            self.error = Some(Error::binding(format!(
                "duplicate key '{}' for map property '{}'",
                key.key_string(),
                self.key_property
            )));
            return;
        }
        self.entries.insert(key, object.clone());
    }
}
