//! `fuzzy_string`: finite set + similarity threshold `τ` (spec §3).
//! `test(v)` holds if some member `s` of the set has `jaro(v, s) >= τ`.

use crate::error::{CodecSnafu, Error, TypeMismatchSnafu};
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::HashSet;

const VARIANT: &str = "fuzzy_string";

/// A fuzzy string membership filter (spec Design Note #3: `threshold` is a
/// required construction parameter; `original_source/core/filters.py`'s
/// `FuzzyStringFilter` never actually set it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyStringFilter {
    allowed_values: HashSet<String>,
    threshold: f64,
}

impl FuzzyStringFilter {
    /// Single-pass construction over a representative sample of unique
    /// strings.
    pub fn build_from_stream(chunks: ColumnChunkStream, threshold: f64) -> Result<Self, Error> {
        let mut allowed_values = HashSet::new();
        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                match value {
                    Value::String(s) | Value::Categorical(s) => {
                        allowed_values.insert(s);
                    }
                    other => {
                        return TypeMismatchSnafu {
                            variant: VARIANT,
                            expected: LogicalType::String,
                            actual: other.logical_type(),
                        }
                        .fail();
                    }
                }
            }
        }
        Ok(Self {
            allowed_values,
            threshold,
        })
    }

    /// Fold additional data into an already-built filter.
    pub fn update(&mut self, chunk: ColumnChunk) -> Result<(), Error> {
        for value in chunk.into_iter().flatten() {
            match value {
                Value::String(s) | Value::Categorical(s) => {
                    self.allowed_values.insert(s);
                }
                other => {
                    return TypeMismatchSnafu {
                        variant: VARIANT,
                        expected: LogicalType::String,
                        actual: other.logical_type(),
                    }
                    .fail();
                }
            }
        }
        Ok(())
    }

    /// `exists s in set with jaro(v, s) >= threshold`.
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        let target = match value {
            Value::String(s) | Value::Categorical(s) => s,
            other => {
                return TypeMismatchSnafu {
                    variant: VARIANT,
                    expected: LogicalType::String,
                    actual: other.logical_type(),
                }
                .fail();
            }
        };

        Ok(self
            .allowed_values
            .iter()
            .any(|candidate| strsim::jaro(target, candidate) >= self.threshold))
    }
}

pub(crate) fn serialize(filter: &FuzzyStringFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(filter).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<FuzzyStringFilter, Error> {
    bincode::deserialize(bytes).context(CodecSnafu)
}
