//! Per-variant construction parameters, supplied either by the strategy
//! selector's defaults or by a build-time config override
//! (`original_source/core/metadata.py`'s `filter_params["params"]`).

use serde::{Deserialize, Serialize};

/// Construction parameters for [`crate::Filter::build_from_stream`].
///
/// Every field is optional because only some variants consume it; the
/// variant that needs a parameter and does not find it fails with
/// [`crate::Error::MissingParam`] (spec Design Notes #2, #3) rather than
/// silently defaulting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildParams {
    /// Target false-positive rate for `bloom` filters. Defaults to `0.1`,
    /// matching `original_source/core/filters.py::BloomFilter.create`.
    pub error_rate: Option<f64>,
    /// `strftime`-style date format for `date` filters. Defaults to
    /// `"%Y-%m-%d"`, matching `DateFilter.create`.
    pub date_format: Option<String>,
    /// Minimum Jaro similarity for `fuzzy_string` filters. Required; no
    /// default (spec Design Note #3).
    pub threshold: Option<f64>,
    /// Match radius for `kdtree` filters. Required; no default (spec
    /// Design Note #2).
    pub radius: Option<f64>,
    /// Number of dimensions for `kdtree` filters. Defaults to `2`.
    pub dimensions: Option<usize>,
}

impl BuildParams {
    /// The target false-positive rate, or the `bloom` default.
    pub fn error_rate_or_default(&self) -> f64 {
        self.error_rate.unwrap_or(0.1)
    }

    /// The date format, or the `date` default.
    pub fn date_format_or_default(&self) -> String {
        self.date_format.clone().unwrap_or_else(|| "%Y-%m-%d".to_string())
    }

    /// The k-d tree dimensionality, or the default of 2.
    pub fn dimensions_or_default(&self) -> usize {
        self.dimensions.unwrap_or(2)
    }
}
