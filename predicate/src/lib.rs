//! The predicate tree and its evaluator (spec §4.5).
//!
//! Source re-architecting note (spec Design Notes): "model as a recursive
//! sum type `Composite(op, children) | Atom(field, value)`; evaluate by
//! structural recursion. Guard against unbounded nesting with an explicit
//! depth limit." The depth limit is resolved here as [`MAX_PREDICATE_DEPTH`].
#![warn(missing_docs, missing_debug_implementations)]

mod error;

pub use error::Error;

use data_types::{LogicalType, Value};
use futures::future::{BoxFuture, FutureExt};
use index_catalog::Catalog;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::collections::HashSet;

/// The maximum nesting depth a predicate tree may have before evaluation
/// fails with `MalformedPredicate` (Open Question #6: resolved as a fixed
/// constant rather than left unbounded).
pub const MAX_PREDICATE_DEPTH: usize = 64;

/// A predicate tree: either a composite boolean combinator over child
/// predicates, or a leaf atom probing one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    /// `{ condition: "and"|"or", rules: [Predicate, ...] }`. `condition` is
    /// compared case-insensitively at evaluation time, not at parse time.
    Composite {
        /// The raw condition tag, as received.
        condition: String,
        /// Child predicates; must be non-empty.
        rules: Vec<Predicate>,
    },
    /// `{ field: string, value: <any JSON> }`.
    Atom {
        /// The catalog field (column) this atom probes.
        field: String,
        /// The raw probe value, coerced against each matching filter's
        /// domain at evaluation time.
        value: serde_json::Value,
    },
}

/// Evaluate `predicate` against `store`, returning the set of surviving
/// shard names (spec §4.5).
pub fn eval<'a>(
    predicate: &'a Predicate,
    catalog: &'a Catalog,
    store: &'a str,
) -> BoxFuture<'a, Result<HashSet<String>, Error>> {
    eval_at_depth(predicate, catalog, store, 0)
}

fn eval_at_depth<'a>(
    predicate: &'a Predicate,
    catalog: &'a Catalog,
    store: &'a str,
    depth: usize,
) -> BoxFuture<'a, Result<HashSet<String>, Error>> {
    async move {
        ensure!(
            depth <= MAX_PREDICATE_DEPTH,
            error::TooDeepSnafu {
                limit: MAX_PREDICATE_DEPTH
            }
        );

        match predicate {
            Predicate::Atom { field, value } => eval_atom(field, value, catalog, store).await,
            Predicate::Composite { condition, rules } => {
                ensure!(!rules.is_empty(), error::EmptyCompositeSnafu);

                let mut child_sets = Vec::with_capacity(rules.len());
                for rule in rules {
                    child_sets.push(eval_at_depth(rule, catalog, store, depth + 1).await?);
                }

                match condition.to_ascii_lowercase().as_str() {
                    "and" => Ok(child_sets
                        .into_iter()
                        .reduce(|a, b| a.intersection(&b).cloned().collect())
                        .unwrap_or_default()),
                    "or" => Ok(child_sets
                        .into_iter()
                        .reduce(|a, b| a.union(&b).cloned().collect())
                        .unwrap_or_default()),
                    other => error::UnknownConditionSnafu {
                        condition: other.to_string(),
                    }
                    .fail(),
                }
            }
        }
    }
    .boxed()
}

async fn eval_atom(
    field: &str,
    raw: &serde_json::Value,
    catalog: &Catalog,
    store: &str,
) -> Result<HashSet<String>, Error> {
    let keys = catalog.find_shards(store, field);
    let mut shards = HashSet::with_capacity(keys.len());

    for key in keys {
        let filter = catalog
            .materialize(&key)
            .await
            .context(error::CatalogSnafu { key: key.clone() })?;
        let probe = coerce(raw, filter.expected_type())
            .context(error::CoercionSnafu { field: field.to_string() })?;
        if filter
            .test(&probe)
            .context(error::ProbeSnafu { key: key.clone() })?
        {
            // key is [store, shard, column]; the shard segment survives.
            shards.insert(key[1].clone());
        }
    }

    Ok(shards)
}

/// Coerce a raw JSON probe value to a [`Value`], using the filter's known
/// domain type when available and falling back to shape-based inference
/// (a lenient variant accepts more than one representation, e.g.
/// `fuzzy_string` matches both `String` and `Categorical`).
fn coerce(raw: &serde_json::Value, expected: Option<LogicalType>) -> Result<Value, data_types::CoercionError> {
    match expected {
        Some(t) => Value::from_json(raw, t),
        None => match raw {
            serde_json::Value::Bool(_) => Value::from_json(raw, LogicalType::Boolean),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => {
                Value::from_json(raw, LogicalType::Integer)
            }
            serde_json::Value::Number(_) => Value::from_json(raw, LogicalType::Floating),
            serde_json::Value::Array(_) => Value::from_json(raw, LogicalType::Point),
            _ => Value::from_json(raw, LogicalType::String),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use data_types::ColumnChunk;
    use filter_types::{BuildParams, Registry as FilterRegistry};
    use index_store::IndexStore;
    use metric::Registry as MetricRegistry;

    async fn catalog_with(values: Vec<(&str, &str, Vec<&str>)>) -> Catalog {
        let dir = std::env::temp_dir().join(format!(
            "predicate_test_{:?}",
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let store = IndexStore::local_filesystem(&dir).unwrap();

        for (shard, column, members) in values {
            let chunk: ColumnChunk = members
                .into_iter()
                .map(|m| Some(Value::Categorical(m.to_string())))
                .collect();
            let filter = FilterRegistry::new()
                .build("set", Box::new(std::iter::once(chunk)), &BuildParams::default())
                .unwrap();
            store
                .write(
                    &IndexStore::blob_path("s", shard, column),
                    Bytes::from(filter.serialize().unwrap()),
                )
                .await
                .unwrap();
        }

        Catalog::build(store, "s", &MetricRegistry::new()).await.unwrap()
    }

    fn atom(field: &str, value: &str) -> Predicate {
        Predicate::Atom {
            field: field.to_string(),
            value: serde_json::json!(value),
        }
    }

    #[tokio::test]
    async fn exact_set_match() {
        let catalog = catalog_with(vec![
            ("a", "status", vec!["active"]),
            ("b", "status", vec!["inactive"]),
        ])
        .await;

        let result = eval(&atom("status", "inactive"), &catalog, "s").await.unwrap();
        assert_eq!(result, HashSet::from(["b".to_string()]));
    }

    #[tokio::test]
    async fn and_is_intersection() {
        let catalog = catalog_with(vec![
            ("a", "status", vec!["inactive"]),
            ("a", "type", vec!["savings"]),
            ("b", "status", vec!["inactive"]),
            ("b", "type", vec!["checking"]),
            ("c", "status", vec!["active"]),
            ("c", "type", vec!["savings"]),
        ])
        .await;

        let predicate = Predicate::Composite {
            condition: "AND".to_string(),
            rules: vec![atom("status", "inactive"), atom("type", "savings")],
        };
        let result = eval(&predicate, &catalog, "s").await.unwrap();
        assert_eq!(result, HashSet::from(["a".to_string()]));
    }

    #[tokio::test]
    async fn or_is_union() {
        let catalog = catalog_with(vec![
            ("a", "status", vec!["inactive"]),
            ("a", "type", vec!["savings"]),
            ("b", "status", vec!["inactive"]),
            ("b", "type", vec!["checking"]),
            ("c", "status", vec!["active"]),
            ("c", "type", vec!["savings"]),
        ])
        .await;

        let predicate = Predicate::Composite {
            condition: "or".to_string(),
            rules: vec![atom("status", "active"), atom("type", "checking")],
        };
        let result = eval(&predicate, &catalog, "s").await.unwrap();
        assert_eq!(result, HashSet::from(["b".to_string(), "c".to_string()]));
    }

    #[tokio::test]
    async fn unknown_field_yields_empty_set() {
        let catalog = catalog_with(vec![("a", "status", vec!["inactive"])]).await;
        let result = eval(&atom("nonexistent", "x"), &catalog, "s").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn empty_composite_fails() {
        let catalog = catalog_with(vec![]).await;
        let predicate = Predicate::Composite {
            condition: "and".to_string(),
            rules: vec![],
        };
        let err = eval(&predicate, &catalog, "s").await.unwrap_err();
        assert!(matches!(err, Error::EmptyComposite));
    }

    #[tokio::test]
    async fn unknown_condition_fails() {
        let catalog = catalog_with(vec![]).await;
        let predicate = Predicate::Composite {
            condition: "xor".to_string(),
            rules: vec![atom("status", "x")],
        };
        let err = eval(&predicate, &catalog, "s").await.unwrap_err();
        assert!(matches!(err, Error::UnknownCondition { .. }));
    }
}
