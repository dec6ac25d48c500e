//! `range`: `(min, max)` over a totally ordered domain (spec §3).

use crate::error::{CodecSnafu, EmptyInputSnafu, Error, TypeMismatchSnafu};
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

const VARIANT: &str = "range";

/// A min/max range filter. `test(v)` is `min <= v <= max`, exactly (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeFilter {
    min: Value,
    max: Value,
}

impl RangeFilter {
    /// Single-pass construction: track the running min/max across all
    /// non-null values in the stream.
    pub fn build_from_stream(chunks: ColumnChunkStream) -> Result<Self, Error> {
        let mut min: Option<Value> = None;
        let mut max: Option<Value> = None;

        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                fold_bounds(&mut min, &mut max, value);
            }
        }

        let min = min.context(EmptyInputSnafu { variant: VARIANT })?;
        let max = max.context(EmptyInputSnafu { variant: VARIANT })?;
        Ok(Self { min, max })
    }

    /// Fold additional data into an already-built filter.
    pub fn update(&mut self, chunk: ColumnChunk) {
        let mut min = Some(self.min.clone());
        let mut max = Some(self.max.clone());
        for value in chunk.into_iter().flatten() {
            fold_bounds(&mut min, &mut max, value);
        }
        self.min = min.expect("min seeded from existing filter");
        self.max = max.expect("max seeded from existing filter");
    }

    /// `min <= value <= max`.
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        let expected = self.min.logical_type();
        let actual = value.logical_type();
        if expected != actual {
            return TypeMismatchSnafu {
                variant: VARIANT,
                expected,
                actual,
            }
            .fail();
        }
        Ok(self.min.partial_compare(value) != Some(std::cmp::Ordering::Greater)
            && self.max.partial_compare(value) != Some(std::cmp::Ordering::Less))
    }
}

fn fold_bounds(min: &mut Option<Value>, max: &mut Option<Value>, value: Value) {
    match min {
        Some(current) if current.partial_compare(&value) == Some(std::cmp::Ordering::Greater) => {
            *min = Some(value.clone());
        }
        None => *min = Some(value.clone()),
        _ => {}
    }
    match max {
        Some(current) if current.partial_compare(&value) == Some(std::cmp::Ordering::Less) => {
            *max = Some(value.clone());
        }
        None => *max = Some(value),
        _ => {}
    }
}

pub(crate) fn serialize(filter: &RangeFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(filter).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<RangeFilter, Error> {
    bincode::deserialize(bytes).context(CodecSnafu)
}

/// The `LogicalType` expected by this already-built filter.
impl RangeFilter {
    pub(crate) fn logical_type(&self) -> LogicalType {
        self.min.logical_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(values: Vec<i64>) -> ColumnChunkStream {
        let chunk: ColumnChunk = values.into_iter().map(|v| Some(Value::Integer(v))).collect();
        Box::new(std::iter::once(chunk))
    }

    #[test]
    fn range_exactness() {
        let filter = RangeFilter::build_from_stream(stream(vec![0, 50, 100])).unwrap();
        assert!(filter.test(&Value::Integer(50)).unwrap());
        assert!(!filter.test(&Value::Integer(150)).unwrap());
        assert!(filter.test(&Value::Integer(0)).unwrap());
        assert!(filter.test(&Value::Integer(100)).unwrap());
    }

    #[test]
    fn empty_input_fails() {
        let err = RangeFilter::build_from_stream(Box::new(std::iter::empty())).unwrap_err();
        assert!(matches!(err, Error::EmptyInput { .. }));
    }

    #[test]
    fn type_mismatch_fails() {
        let filter = RangeFilter::build_from_stream(stream(vec![1, 2])).unwrap();
        let err = filter.test(&Value::String("x".to_string())).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
