use super::{ResultContext, ResultHandler};
use crate::executor::Executor;

use saddle_core::catalog::Catalog;
use saddle_core::mapping::{MappedStatement, ResultMap, ResultMapping, RowBounds};
use saddle_core::stmt::{Row, RowSet, Value, ValueRecord};
use saddle_core::{err, Error, Result};

use async_recursion::async_recursion;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Projects raw driver rows into result objects through the statement's
/// result map, honoring row bounds, discriminators, nested result maps,
/// nested queries, and auto-mapping.
///
/// With a handler, each object is delivered through it and the returned list
/// is empty; otherwise the objects are returned.
pub(crate) async fn map_result_set(
    executor: &mut Executor,
    ms: &MappedStatement,
    rows: RowSet,
    bounds: RowBounds,
    handler: Option<&mut dyn ResultHandler>,
) -> Result<Vec<Value>> {
    let catalog = executor.catalog().clone();

    let objects = match ms.result_map() {
        // No descriptor: every column maps to a property of the same name.
        None => window(&rows, bounds)
            .map(|row| Value::Record(auto_map_row(row)))
            .collect(),
        Some(id) => {
            let map = catalog.result_map(id)?;
            if map.has_nested_result_maps() {
                map_grouped_rows(executor, &catalog, &map, &rows, bounds).await?
            } else {
                let mut objects = vec![];
                for row in window(&rows, bounds) {
                    let map = resolve_discriminator(&catalog, &map, row)?;
                    let object = build_row_object(executor, &catalog, &map, row).await?;
                    objects.push(Value::Record(object));
                }
                objects
            }
        }
    };

    match handler {
        Some(handler) => {
            let mut context = ResultContext::new();
            for object in objects {
                context.next(object);
                handler.handle(&context);
            }
            Ok(vec![])
        }
        None => Ok(objects),
    }
}

fn window(rows: &RowSet, bounds: RowBounds) -> impl Iterator<Item = Row<'_>> {
    rows.iter().skip(bounds.offset).take(bounds.limit)
}

fn auto_map_row(row: Row<'_>) -> ValueRecord {
    row.columns()
        .iter()
        .zip(row.values())
        .map(|(column, value)| (column.clone(), value.clone()))
        .collect()
}

/// Maps a result set whose descriptor declares nested result maps: rows
/// sharing the outer identity key merge into one object, and each collection
/// property accumulates its per-row children, deduplicated by the child
/// map's identity key, in first-occurrence order.
async fn map_grouped_rows(
    executor: &mut Executor,
    catalog: &Arc<Catalog>,
    root: &Arc<ResultMap>,
    rows: &RowSet,
    bounds: RowBounds,
) -> Result<Vec<Value>> {
    let mut objects: IndexMap<Vec<Value>, ValueRecord> = IndexMap::new();
    let mut seen: HashMap<(Vec<Value>, String), HashSet<Vec<Value>>> = HashMap::new();

    for row in window(rows, bounds) {
        let map = resolve_discriminator(catalog, root, row)?;
        let key = row_key(&map, row);

        if !objects.contains_key(&key) {
            let object = build_row_object(executor, catalog, &map, row).await?;
            for mapping in nested_collection_mappings(&map) {
                if let Some(child_key) = child_row_key(catalog, mapping, row)? {
                    seen.entry((key.clone(), mapping.property().to_string()))
                        .or_default()
                        .insert(child_key);
                }
            }
            objects.insert(key, object);
            continue;
        }

        for mapping in nested_collection_mappings(&map) {
            let Some(child_key) = child_row_key(catalog, mapping, row)? else {
                continue;
            };
            let fresh = seen
                .entry((key.clone(), mapping.property().to_string()))
                .or_default()
                .insert(child_key);
            if !fresh {
                continue;
            }
            let Some(map_id) = mapping.nested_result_map() else {
                continue;
            };
            let child_map = catalog.result_map(map_id)?;
            let child_map = resolve_discriminator(catalog, &child_map, row)?;
            let child = build_row_object(executor, catalog, &child_map, row).await?;
            if let Some(parent) = objects.get_mut(&key) {
                if let Some(Value::List(items)) = parent.get_mut(mapping.property()) {
                    items.push(Value::Record(child));
                }
            }
        }
    }

    Ok(objects.into_values().map(Value::Record).collect())
}

/// Builds one result object from one row.
#[async_recursion]
async fn build_row_object<'r: 'async_recursion>(
    executor: &mut Executor,
    catalog: &Arc<Catalog>,
    map: &Arc<ResultMap>,
    row: Row<'r>,
) -> Result<ValueRecord> {
    let mut object = ValueRecord::new();

    // Constructor arguments materialize first, then plain properties.
    for mapping in map
        .constructor_mappings()
        .iter()
        .chain(map.property_mappings())
    {
        apply_mapping(executor, catalog, mapping, row, &mut object).await?;
    }

    let auto = map.auto_mapping().unwrap_or(map.mappings().is_empty());
    if auto {
        for (column, value) in row.columns().iter().zip(row.values()) {
            if !map.mapped_columns().contains(&column.to_ascii_uppercase())
                && !object.contains_key(column)
            {
                object.insert(column.clone(), value.clone());
            }
        }
    }

    Ok(object)
}

async fn apply_mapping<'r>(
    executor: &mut Executor,
    catalog: &Arc<Catalog>,
    mapping: &ResultMapping,
    row: Row<'r>,
    object: &mut ValueRecord,
) -> Result<()> {
    let property = mapping.property();

    if mapping.result_set().is_some() {
        return Err(Error::unsupported_feature(format!(
            "multi-result-set mapping for property '{property}' cannot be materialized"
        )));
    }

    if let Some(query_id) = mapping.nested_query() {
        let param = nested_query_param(mapping, row);
        if param.is_null() {
            // No key in this row, no sub-select.
            return Ok(());
        }
        let sub = catalog.statement(query_id)?;
        let mut results = executor.query(&sub, &param, RowBounds::DEFAULT, None).await?;
        if mapping.is_many() {
            object.insert(property, Value::List(results));
        } else {
            match results.len() {
                0 => {}
                1 => {
                    if let Some(value) = results.pop() {
                        object.insert(property, value);
                    }
                }
                n => {
                    return Err(Error::too_many_results(n).context(err!(
                        "error running nested query for property '{property}'; statement={query_id}"
                    )))
                }
            }
        }
        return Ok(());
    }

    if let Some(map_id) = mapping.nested_result_map() {
        let child_map = catalog.result_map(map_id)?;
        let child_map = resolve_discriminator(catalog, &child_map, row)?;
        let child_key = row_key(&child_map, row);
        if child_key.iter().any(|v| !v.is_null()) {
            let child = build_row_object(executor, catalog, &child_map, row).await?;
            if mapping.is_many() {
                object.insert(property, Value::List(vec![Value::Record(child)]));
            } else {
                object.insert(property, Value::Record(child));
            }
        } else if mapping.is_many() {
            // Outer join with no child row: the collection is present but empty.
            object.insert(property, Value::List(vec![]));
        }
        return Ok(());
    }

    if let Some(column) = mapping.column() {
        if let Some(value) = row.get(column) {
            object.insert(property, value.clone());
        }
    }

    Ok(())
}

/// Resolves a map through its discriminator chain for one row, guarding
/// against case cycles.
fn resolve_discriminator(
    catalog: &Arc<Catalog>,
    map: &Arc<ResultMap>,
    row: Row<'_>,
) -> Result<Arc<ResultMap>> {
    let mut current = map.clone();
    let mut visited = HashSet::from([current.id().to_string()]);

    loop {
        let next_id = current.discriminator().and_then(|discriminator| {
            let value = row.get(discriminator.column())?;
            discriminator.result_map_for(value).map(str::to_string)
        });
        match next_id {
            Some(id) if visited.insert(id.clone()) => {
                current = catalog.result_map(&id)?;
            }
            _ => return Ok(current),
        }
    }
}

/// The identity of one row under a map: the values of its id mappings'
/// columns, falling back to the whole row when the map has no columned
/// identity.
fn row_key(map: &ResultMap, row: Row<'_>) -> Vec<Value> {
    let mut key = vec![];
    for mapping in map.id_mappings() {
        if let Some(column) = mapping.column() {
            key.push(row.get(column).cloned().unwrap_or(Value::Null));
        } else if mapping.is_composite() {
            for composite in mapping.composites() {
                if let Some(column) = composite.column() {
                    key.push(row.get(column).cloned().unwrap_or(Value::Null));
                }
            }
        }
    }
    if key.is_empty() {
        key = row.values().to_vec();
    }
    key
}

fn nested_collection_mappings(map: &ResultMap) -> impl Iterator<Item = &ResultMapping> {
    map.mappings().iter().filter(|mapping| {
        mapping.is_many()
            && mapping.nested_result_map().is_some()
            && mapping.result_set().is_none()
    })
}

/// The child identity key contributed by one row, or `None` when the row
/// carries no child (an outer join miss).
fn child_row_key(
    catalog: &Arc<Catalog>,
    mapping: &ResultMapping,
    row: Row<'_>,
) -> Result<Option<Vec<Value>>> {
    let Some(map_id) = mapping.nested_result_map() else {
        return Ok(None);
    };
    let child_map = catalog.result_map(map_id)?;
    let child_map = resolve_discriminator(catalog, &child_map, row)?;
    let key = row_key(&child_map, row);
    if key.iter().any(|value| !value.is_null()) {
        Ok(Some(key))
    } else {
        Ok(None)
    }
}

/// The parameter for a nested query: the mapped column's value, or a record
/// assembled from the composite sub-columns.
fn nested_query_param(mapping: &ResultMapping, row: Row<'_>) -> Value {
    if mapping.is_composite() {
        let mut record = ValueRecord::new();
        let mut any = false;
        for composite in mapping.composites() {
            if let Some(column) = composite.column() {
                let value = row.get(column).cloned().unwrap_or(Value::Null);
                any |= !value.is_null();
                record.insert(composite.property(), value);
            }
        }
        if any {
            Value::Record(record)
        } else {
            Value::Null
        }
    } else if let Some(column) = mapping.column() {
        row.get(column).cloned().unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}
