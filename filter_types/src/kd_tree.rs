//! `kdtree`: k-dimensional point set + radius `r` (spec §3).
//! `test(v)` holds if some indexed point lies within `r` of `v`.

use crate::error::{CodecSnafu, EmptyInputSnafu, Error, KdTreeSnafu, MissingParamSnafu, TypeMismatchSnafu};
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use kdtree::distance::squared_euclidean;
use kdtree::KdTree as RawKdTree;
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};

const VARIANT: &str = "kdtree";

/// A nearest-neighbor-within-radius filter.
///
/// Spec Design Note / Open Question #2: `radius` is a required construction
/// parameter. `original_source/core/filters.py::KDTreeFilter.create` hard
/// coded `radius = 0`, which made `test` never match; that is treated as a
/// defect, not a default.
#[derive(Debug)]
pub struct KdTreeFilter {
    tree: RawKdTree<f64, (), Vec<f64>>,
    points: Vec<Vec<f64>>,
    radius: f64,
    dimensions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct State {
    points: Vec<Vec<f64>>,
    radius: f64,
    dimensions: usize,
}

impl KdTreeFilter {
    /// Build from a stream of `Point` values.
    pub fn build_from_stream(
        chunks: ColumnChunkStream,
        radius: Option<f64>,
        dimensions: usize,
    ) -> Result<Self, Error> {
        let radius = radius.context(MissingParamSnafu {
            variant: VARIANT,
            name: "radius",
        })?;

        let mut points = Vec::new();
        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                points.push(as_point(&value, dimensions)?);
            }
        }
        ensure!(!points.is_empty(), EmptyInputSnafu { variant: VARIANT });

        Self::from_points(points, radius, dimensions)
    }

    fn from_points(points: Vec<Vec<f64>>, radius: f64, dimensions: usize) -> Result<Self, Error> {
        let mut tree = RawKdTree::new(dimensions);
        for point in &points {
            tree.add(point.clone(), ()).map_err(|e| {
                KdTreeSnafu {
                    message: format!("{e:?}"),
                }
                .build()
            })?;
        }
        Ok(Self {
            tree,
            points,
            radius,
            dimensions,
        })
    }

    /// Fold additional points into an already-built filter.
    pub fn update(&mut self, chunk: ColumnChunk) -> Result<(), Error> {
        for value in chunk.into_iter().flatten() {
            self.points.push(as_point(&value, self.dimensions)?);
        }
        let rebuilt = Self::from_points(self.points.clone(), self.radius, self.dimensions)?;
        *self = rebuilt;
        Ok(())
    }

    /// `exists a point within distance r of v`.
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        let point = as_point(value, self.dimensions)?;
        let nearest = self
            .tree
            .nearest(&point, 1, &squared_euclidean)
            .map_err(|e| {
                KdTreeSnafu {
                    message: format!("{e:?}"),
                }
                .build()
            })?;
        Ok(nearest
            .first()
            .map(|(dist_sq, _)| dist_sq.sqrt() <= self.radius)
            .unwrap_or(false))
    }

    pub(crate) fn to_state(&self) -> State {
        State {
            points: self.points.clone(),
            radius: self.radius,
            dimensions: self.dimensions,
        }
    }

    pub(crate) fn from_state(state: State) -> Result<Self, Error> {
        Self::from_points(state.points, state.radius, state.dimensions)
    }

    pub(crate) fn logical_type(&self) -> LogicalType {
        LogicalType::Point
    }
}

fn as_point(value: &Value, dimensions: usize) -> Result<Vec<f64>, Error> {
    match value {
        Value::Point(coords) if coords.len() == dimensions => {
            Ok(coords.iter().map(|c| c.0).collect())
        }
        other => TypeMismatchSnafu {
            variant: VARIANT,
            expected: LogicalType::Point,
            actual: other.logical_type(),
        }
        .fail(),
    }
}

pub(crate) fn serialize(filter: &KdTreeFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(&filter.to_state()).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<KdTreeFilter, Error> {
    let state: State = bincode::deserialize(bytes).context(CodecSnafu)?;
    KdTreeFilter::from_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;

    fn stream(points: Vec<[f64; 2]>) -> ColumnChunkStream {
        let chunk: ColumnChunk = points
            .into_iter()
            .map(|p| Some(Value::Point(p.iter().map(|c| OrderedFloat(*c)).collect())))
            .collect();
        Box::new(std::iter::once(chunk))
    }

    #[test]
    fn point_within_radius_matches() {
        let filter =
            KdTreeFilter::build_from_stream(stream(vec![[0.0, 0.0]]), Some(1.5), 2).unwrap();
        assert!(filter
            .test(&Value::Point(vec![OrderedFloat(1.0), OrderedFloat(1.0)]))
            .unwrap());
    }

    #[test]
    fn point_outside_radius_fails() {
        let filter =
            KdTreeFilter::build_from_stream(stream(vec![[0.0, 0.0]]), Some(0.5), 2).unwrap();
        assert!(!filter
            .test(&Value::Point(vec![OrderedFloat(10.0), OrderedFloat(10.0)]))
            .unwrap());
    }

    #[test]
    fn missing_radius_fails() {
        let err = KdTreeFilter::build_from_stream(stream(vec![[0.0, 0.0]]), None, 2).unwrap_err();
        assert!(matches!(err, Error::MissingParam { .. }));
    }
}
