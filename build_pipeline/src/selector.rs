//! The strategy selector (spec §4.4.1): given the full chunk stream for one
//! column, pick a filter variant from its cardinality and dominant logical
//! type.
//!
//! `original_source/core/metadata.py::FilterSelector.select_filter_strategy`
//! checks `unique_count < bloom_threshold` before `unique_count <
//! set_threshold`; since `SET_THRESHOLD < BLOOM_THRESHOLD` the `set` branch
//! on cardinality alone is unreachable there. That ordering is preserved
//! here rather than "fixed", since the dtype-based `set` rules below still
//! apply once a column actually exceeds `BLOOM_THRESHOLD`.

use crate::error::{self, Error};
use data_types::{ColumnChunkStream, LogicalType};
use std::collections::HashSet;

/// Default cardinality below which a column gets a `bloom` filter (spec §6
/// configuration table).
pub const BLOOM_THRESHOLD: usize = 10_000;

/// Default cardinality below which a column gets a `set` filter.
pub const SET_THRESHOLD: usize = 1_000;

/// Choose a filter strategy tag for one column by consuming its full chunk
/// stream once. `path` and `column` are used only to label errors.
pub fn select_strategy(
    chunks: ColumnChunkStream,
    bloom_threshold: usize,
    set_threshold: usize,
    path: &str,
    column: &str,
) -> Result<&'static str, Error> {
    let mut unique = HashSet::new();
    let mut dominant_type = None;

    for chunk in chunks {
        for value in chunk.into_iter().flatten() {
            if dominant_type.is_none() {
                dominant_type = Some(value.logical_type());
            }
            unique.insert(value);
        }
    }

    let unique_count = unique.len();
    let dtype = dominant_type.ok_or_else(|| {
        error::EmptyColumnSnafu {
            path: path.to_string(),
            column: column.to_string(),
        }
        .build()
    })?;

    if unique_count < bloom_threshold {
        return Ok("bloom");
    }
    if unique_count < set_threshold {
        return Ok("set");
    }

    match dtype {
        LogicalType::Integer | LogicalType::Floating | LogicalType::Timestamp => Ok("range"),
        LogicalType::Date => Ok("date"),
        LogicalType::Boolean => Ok("set"),
        LogicalType::Categorical => {
            if unique_count <= set_threshold {
                Ok("set")
            } else {
                Ok("bloom")
            }
        }
        LogicalType::String => Ok("bloom"),
        LogicalType::Interval | LogicalType::Point => error::UnsupportedColumnTypeSnafu {
            path: path.to_string(),
            column: column.to_string(),
            dtype,
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_types::{ColumnChunk, Value};

    fn stream(values: Vec<Value>) -> ColumnChunkStream {
        let chunk: ColumnChunk = values.into_iter().map(Some).collect();
        Box::new(std::iter::once(chunk))
    }

    #[test]
    fn low_cardinality_picks_bloom() {
        let values = (0..50).map(Value::Integer).collect();
        let strategy = select_strategy(stream(values), 100, 10, "f", "c").unwrap();
        assert_eq!(strategy, "bloom");
    }

    #[test]
    fn high_cardinality_integers_pick_range() {
        let values: Vec<Value> = (0..50).map(Value::Integer).collect();
        // bloom_threshold and set_threshold both below the sample's
        // cardinality so the dtype rules are reached.
        let strategy = select_strategy(stream(values), 10, 5, "f", "c").unwrap();
        assert_eq!(strategy, "range");
    }

    #[test]
    fn booleans_pick_set_once_past_the_thresholds() {
        let values = vec![Value::Boolean(true), Value::Boolean(false)];
        let strategy = select_strategy(stream(values), 1, 1, "f", "c").unwrap();
        assert_eq!(strategy, "set");
    }

    #[test]
    fn empty_column_fails() {
        let err = select_strategy(stream(vec![]), 10, 5, "f", "c").unwrap_err();
        assert!(matches!(err, Error::EmptyColumn { .. }));
    }

    #[test]
    fn points_are_unsupported_past_the_thresholds() {
        use ordered_float::OrderedFloat;
        let values = vec![
            Value::Point(vec![OrderedFloat(0.0), OrderedFloat(0.0)]),
            Value::Point(vec![OrderedFloat(1.0), OrderedFloat(1.0)]),
        ];
        let err = select_strategy(stream(values), 1, 1, "f", "c").unwrap_err();
        assert!(matches!(err, Error::UnsupportedColumnType { .. }));
    }
}
