//! `bitvector`: dense bit array of length `N` (spec §3).
//! `test(v) == bits[v] == 1` for integer `v ∈ [0, N)`.

use crate::error::{CodecSnafu, EmptyInputSnafu, Error, TypeMismatchSnafu};
use bitvec::prelude::*;
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};

const VARIANT: &str = "bitvector";

/// A dense bit-vector membership filter over non-negative integer indices.
#[derive(Debug, Clone)]
pub struct BitVectorFilter {
    bits: BitVec<u8, Lsb0>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct State {
    bits: Vec<bool>,
}

impl BitVectorFilter {
    /// Single-pass construction: the length is the highest observed index
    /// plus one, every observed index is set.
    pub fn build_from_stream(chunks: ColumnChunkStream) -> Result<Self, Error> {
        let mut indices = Vec::new();
        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                indices.push(as_index(&value)?);
            }
        }
        ensure!(!indices.is_empty(), EmptyInputSnafu { variant: VARIANT });

        let len = indices.iter().max().copied().unwrap_or(0) + 1;
        let mut bits = bitvec![u8, Lsb0; 0; len];
        for idx in indices {
            bits.set(idx, true);
        }
        Ok(Self { bits })
    }

    /// Fold additional indices into an already-built filter, growing the
    /// bit array if a larger index arrives.
    pub fn update(&mut self, chunk: ColumnChunk) -> Result<(), Error> {
        for value in chunk.into_iter().flatten() {
            let idx = as_index(&value)?;
            if idx >= self.bits.len() {
                self.bits.resize(idx + 1, false);
            }
            self.bits.set(idx, true);
        }
        Ok(())
    }

    /// `bits[v] == 1`.
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        let idx = as_index(value)?;
        Ok(idx < self.bits.len() && self.bits[idx])
    }

    pub(crate) fn to_state(&self) -> State {
        State {
            bits: self.bits.iter().by_vals().collect(),
        }
    }

    pub(crate) fn from_state(state: State) -> Self {
        Self {
            bits: state.bits.into_iter().collect(),
        }
    }

    pub(crate) fn logical_type(&self) -> LogicalType {
        LogicalType::Integer
    }
}

fn as_index(value: &Value) -> Result<usize, Error> {
    match value {
        Value::Integer(v) if *v >= 0 => Ok(*v as usize),
        other => TypeMismatchSnafu {
            variant: VARIANT,
            expected: LogicalType::Integer,
            actual: other.logical_type(),
        }
        .fail(),
    }
}

pub(crate) fn serialize(filter: &BitVectorFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(&filter.to_state()).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<BitVectorFilter, Error> {
    let state: State = bincode::deserialize(bytes).context(CodecSnafu)?;
    Ok(BitVectorFilter::from_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(indices: Vec<i64>) -> ColumnChunkStream {
        let chunk: ColumnChunk = indices.into_iter().map(|v| Some(Value::Integer(v))).collect();
        Box::new(std::iter::once(chunk))
    }

    #[test]
    fn set_bits_are_present() {
        let filter = BitVectorFilter::build_from_stream(stream(vec![1, 3, 5])).unwrap();
        assert!(filter.test(&Value::Integer(3)).unwrap());
        assert!(!filter.test(&Value::Integer(2)).unwrap());
    }

    #[test]
    fn out_of_range_index_is_false() {
        let filter = BitVectorFilter::build_from_stream(stream(vec![1])).unwrap();
        assert!(!filter.test(&Value::Integer(100)).unwrap());
    }
}
