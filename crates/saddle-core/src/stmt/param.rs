use super::Value;
use crate::{err, Error, Result};

/// Resolves a parameter property path against a parameter object.
///
/// A record parameter is traversed strictly: looking up a key it does not
/// contain is a binding error enumerating the keys that are available.
/// A non-record parameter binds itself to any requested name, which is how a
/// bare scalar can back a statement with one placeholder.
pub fn resolve(param: &Value, path: &str) -> Result<Value> {
    if !param.is_record() {
        return Ok(param.clone());
    }

    let mut current = param;
    let mut resolved = String::new();

    for segment in path.split('.') {
        let record = match current {
            Value::Record(record) => record,
            _ => {
                return Err(err!(
                    "cannot access property '{segment}' of non-record value bound to '{resolved}'"
                ))
            }
        };
        current = record
            .get(segment)
            .ok_or_else(|| missing_key(segment, record.keys()))?;
        if resolved.is_empty() {
            resolved = segment.to_string();
        } else {
            resolved = format!("{resolved}.{segment}");
        }
    }

    Ok(current.clone())
}

fn missing_key<'a>(key: &str, available: impl Iterator<Item = &'a str>) -> Error {
    let keys: Vec<_> = available.collect();
    Error::binding(format!(
        "parameter '{}' not found; available parameters are [{}]",
        key,
        keys.join(", ")
    ))
}
