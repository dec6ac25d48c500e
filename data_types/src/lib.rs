//! Shared value and logical-type definitions used across shardex: the
//! filter taxonomy, the tabular readers, and the predicate evaluator all
//! exchange [`Value`]s rather than their own ad-hoc representations.
#![warn(missing_docs, missing_debug_implementations)]

use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::cmp::Ordering;

/// A single column value, after coercion to its nominal logical type.
///
/// Values are never `null` themselves; absent values are represented at the
/// chunk level as `None` and are dropped before indexing (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// A bounded integer.
    Integer(i64),
    /// A floating point number.
    Float(OrderedFloat<f64>),
    /// A boolean.
    Boolean(bool),
    /// A categorical (low-cardinality, dictionary-like) value.
    Categorical(String),
    /// A free-form string.
    String(String),
    /// A calendar date (no time-of-day component).
    Date(NaiveDate),
    /// A timestamp.
    Timestamp(NaiveDateTime),
    /// A closed interval `[lo, hi]` over a numeric domain.
    Interval {
        /// Lower bound, inclusive.
        lo: OrderedFloat<f64>,
        /// Upper bound, inclusive.
        hi: OrderedFloat<f64>,
    },
    /// A point in a low-dimensional numeric space.
    Point(Vec<OrderedFloat<f64>>),
}

/// The nominal logical type of a column, used by the strategy selector and
/// by probe-value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    /// See [`Value::Integer`].
    Integer,
    /// See [`Value::Float`].
    Floating,
    /// See [`Value::Boolean`].
    Boolean,
    /// See [`Value::Categorical`].
    Categorical,
    /// See [`Value::String`].
    String,
    /// See [`Value::Date`].
    Date,
    /// See [`Value::Timestamp`].
    Timestamp,
    /// See [`Value::Interval`].
    Interval,
    /// See [`Value::Point`].
    Point,
}

impl Value {
    /// The logical type this value belongs to.
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Value::Integer(_) => LogicalType::Integer,
            Value::Float(_) => LogicalType::Floating,
            Value::Boolean(_) => LogicalType::Boolean,
            Value::Categorical(_) => LogicalType::Categorical,
            Value::String(_) => LogicalType::String,
            Value::Date(_) => LogicalType::Date,
            Value::Timestamp(_) => LogicalType::Timestamp,
            Value::Interval { .. } => LogicalType::Interval,
            Value::Point(_) => LogicalType::Point,
        }
    }

    /// Attempt to compare this value with another under the domain's
    /// natural total order (spec §4.1: "lexicographic for strings, numeric
    /// for numbers, calendar for dates"). Returns `None` if the two values
    /// are not comparable (different logical types, or `Point`/`Categorical`
    /// values which have no natural order).
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Categorical(a), Value::Categorical(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// A batch of (possibly-null) values for one column, as produced by a
/// tabular reader. Mirrors the chunked `pandas` reads of
/// `original_source/core/metadata.py`.
pub type ColumnChunk = Vec<Option<Value>>;

/// A lazy, finite, single-pass stream of [`ColumnChunk`]s for one column
/// (spec §3 "Column chunk"). Filter construction consumes one of these.
pub type ColumnChunkStream = Box<dyn Iterator<Item = ColumnChunk> + Send>;

/// Errors coercing an externally supplied value (JSON from a query, or a
/// raw tabular cell) into a typed [`Value`].
#[derive(Debug, Snafu)]
pub enum CoercionError {
    /// The supplied value has no representation as the requested logical
    /// type.
    #[snafu(display("cannot coerce {input} to logical type {expected:?}"))]
    Unrepresentable {
        /// Debug rendering of the offending input.
        input: String,
        /// The logical type coercion was attempted against.
        expected: LogicalType,
    },
}

impl Value {
    /// Coerce a `serde_json::Value` (as received from a predicate atom) to
    /// the given logical type. Used by the predicate evaluator and by
    /// filter probes so there is exactly one coercion path.
    pub fn from_json(
        raw: &serde_json::Value,
        expected: LogicalType,
    ) -> Result<Value, CoercionError> {
        let fail = || UnrepresentableSnafu {
            input: raw.to_string(),
            expected,
        }
        .build();

        match expected {
            LogicalType::Integer => raw.as_i64().map(Value::Integer).ok_or_else(fail),
            LogicalType::Floating => raw
                .as_f64()
                .map(|f| Value::Float(OrderedFloat(f)))
                .ok_or_else(fail),
            LogicalType::Boolean => raw.as_bool().map(Value::Boolean).ok_or_else(fail),
            LogicalType::Categorical => raw
                .as_str()
                .map(|s| Value::Categorical(s.to_string()))
                .ok_or_else(fail),
            LogicalType::String => raw
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(fail),
            LogicalType::Date => raw
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map(Value::Date)
                .ok_or_else(fail),
            LogicalType::Timestamp => raw
                .as_str()
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
                .map(Value::Timestamp)
                .ok_or_else(fail),
            LogicalType::Interval => raw
                .as_f64()
                .map(|f| Value::Interval {
                    lo: OrderedFloat(f),
                    hi: OrderedFloat(f),
                })
                .ok_or_else(fail),
            LogicalType::Point => raw
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_f64())
                        .map(OrderedFloat)
                        .collect()
                })
                .map(Value::Point)
                .ok_or_else(fail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_type_round_trips() {
        assert_eq!(
            Value::Integer(3).logical_type(),
            LogicalType::Integer
        );
        assert_eq!(
            Value::String("x".into()).logical_type(),
            LogicalType::String
        );
    }

    #[test]
    fn compare_same_type() {
        let a = Value::Integer(1);
        let b = Value::Integer(2);
        assert_eq!(a.partial_compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn compare_mismatched_types_is_none() {
        let a = Value::Integer(1);
        let b = Value::String("1".into());
        assert_eq!(a.partial_compare(&b), None);
    }

    #[test]
    fn coerce_json_integer() {
        let raw = serde_json::json!(42);
        let v = Value::from_json(&raw, LogicalType::Integer).unwrap();
        assert_eq!(v, Value::Integer(42));
    }

    #[test]
    fn coerce_json_failure() {
        let raw = serde_json::json!("not a number");
        let err = Value::from_json(&raw, LogicalType::Integer).unwrap_err();
        assert!(matches!(err, CoercionError::Unrepresentable { .. }));
    }
}
