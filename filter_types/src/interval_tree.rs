//! `intervaltree`: collection of `[lo, hi)` intervals; point stabbing
//! (spec §3).

use crate::error::{CodecSnafu, EmptyInputSnafu, Error, TypeMismatchSnafu};
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use intervaltree::IntervalTree as RawIntervalTree;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};

const VARIANT: &str = "intervaltree";

/// A point-stabbing filter over `[lo, hi)` intervals.
#[derive(Debug)]
pub struct IntervalTreeFilter {
    tree: RawIntervalTree<i64, ()>,
    intervals: Vec<(i64, i64)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct State {
    intervals: Vec<(i64, i64)>,
}

impl IntervalTreeFilter {
    /// Single-pass construction from a stream of `Interval` values.
    pub fn build_from_stream(chunks: ColumnChunkStream) -> Result<Self, Error> {
        let mut intervals = Vec::new();
        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                intervals.push(as_interval(&value)?);
            }
        }
        ensure!(!intervals.is_empty(), EmptyInputSnafu { variant: VARIANT });
        Ok(Self::from_intervals(intervals))
    }

    fn from_intervals(intervals: Vec<(i64, i64)>) -> Self {
        let tree = intervals
            .iter()
            .map(|&(lo, hi)| (lo..hi, ()))
            .collect::<RawIntervalTree<i64, ()>>();
        Self { tree, intervals }
    }

    /// Fold additional intervals into an already-built filter.
    pub fn update(&mut self, chunk: ColumnChunk) -> Result<(), Error> {
        for value in chunk.into_iter().flatten() {
            self.intervals.push(as_interval(&value)?);
        }
        *self = Self::from_intervals(std::mem::take(&mut self.intervals));
        Ok(())
    }

    /// `any interval contains v` (point stabbing).
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        let point = match value {
            Value::Integer(v) => *v,
            other => {
                return TypeMismatchSnafu {
                    variant: VARIANT,
                    expected: LogicalType::Integer,
                    actual: other.logical_type(),
                }
                .fail()
            }
        };
        Ok(self.tree.query_point(point).next().is_some())
    }

    pub(crate) fn to_state(&self) -> State {
        State {
            intervals: self.intervals.clone(),
        }
    }

    pub(crate) fn from_state(state: State) -> Self {
        Self::from_intervals(state.intervals)
    }

    pub(crate) fn logical_type(&self) -> LogicalType {
        LogicalType::Integer
    }
}

fn as_interval(value: &Value) -> Result<(i64, i64), Error> {
    match value {
        Value::Interval { lo, hi } => Ok((lo.0 as i64, hi.0 as i64)),
        other => TypeMismatchSnafu {
            variant: VARIANT,
            expected: LogicalType::Interval,
            actual: other.logical_type(),
        }
        .fail(),
    }
}

pub(crate) fn serialize(filter: &IntervalTreeFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(&filter.to_state()).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<IntervalTreeFilter, Error> {
    let state: State = bincode::deserialize(bytes).context(CodecSnafu)?;
    Ok(IntervalTreeFilter::from_state(state))
}
