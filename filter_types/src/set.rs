//! `set`: finite set of allowed values (spec §3). Exact membership.

use crate::error::{CodecSnafu, Error, TypeMismatchSnafu};
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::HashSet;

const VARIANT: &str = "set";

/// An exact-membership filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFilter {
    allowed_values: HashSet<Value>,
    logical_type: Option<LogicalType>,
}

impl SetFilter {
    /// Single-pass construction: collect all unique non-null values.
    /// Empty input is permitted (spec §4.1 exception for `set`): the
    /// resulting filter rejects every probe.
    pub fn build_from_stream(chunks: ColumnChunkStream) -> Result<Self, Error> {
        let mut allowed_values = HashSet::new();
        let mut logical_type = None;

        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                if logical_type.is_none() {
                    logical_type = Some(value.logical_type());
                }
                allowed_values.insert(value);
            }
        }

        Ok(Self {
            allowed_values,
            logical_type,
        })
    }

    /// Fold additional data into an already-built filter.
    pub fn update(&mut self, chunk: ColumnChunk) {
        for value in chunk.into_iter().flatten() {
            if self.logical_type.is_none() {
                self.logical_type = Some(value.logical_type());
            }
            self.allowed_values.insert(value);
        }
    }

    /// `v ∈ S`, exactly.
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        if let Some(expected) = self.logical_type {
            let actual = value.logical_type();
            if expected != actual {
                return TypeMismatchSnafu {
                    variant: VARIANT,
                    expected,
                    actual,
                }
                .fail();
            }
        }
        Ok(self.allowed_values.contains(value))
    }

    pub(crate) fn values(&self) -> &HashSet<Value> {
        &self.allowed_values
    }

    pub(crate) fn logical_type(&self) -> Option<LogicalType> {
        self.logical_type
    }
}

pub(crate) fn serialize(filter: &SetFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(filter).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<SetFilter, Error> {
    bincode::deserialize(bytes).context(CodecSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(values: Vec<&str>) -> ColumnChunkStream {
        let chunk: ColumnChunk = values
            .into_iter()
            .map(|s| Some(Value::Categorical(s.to_string())))
            .collect();
        Box::new(std::iter::once(chunk))
    }

    #[test]
    fn set_exactness() {
        let filter = SetFilter::build_from_stream(stream(vec!["active", "pending"])).unwrap();
        assert!(filter.test(&Value::Categorical("active".to_string())).unwrap());
        assert!(!filter
            .test(&Value::Categorical("inactive".to_string()))
            .unwrap());
    }

    #[test]
    fn empty_input_rejects_every_probe() {
        let filter = SetFilter::build_from_stream(Box::new(std::iter::empty())).unwrap();
        assert!(!filter.test(&Value::Categorical("anything".to_string())).unwrap());
    }
}
