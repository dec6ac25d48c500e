//! An explicit registry mapping filter tags to constructors.
//!
//! Spec Design Notes: "A registry maps the string tag to a constructor; this
//! replaces reflective subclass enumeration with an explicit table" and
//! "Module-global filter registry. Replace with an explicit registry object
//! constructed at startup and injected into the build pipeline and
//! evaluator." `original_source/core/utils.py::get_filter_classes` did the
//! reflective enumeration this registry replaces.

use crate::error::{MissingParamSnafu, UnknownTagSnafu};
use crate::params::BuildParams;
use crate::{Error, Filter};
use data_types::ColumnChunkStream;
use snafu::OptionExt;
use std::collections::HashMap;

type Constructor = fn(ColumnChunkStream, &BuildParams) -> Result<Filter, Error>;

/// All filter tags, paired with the constructor used to build them from a
/// column-chunk stream.
#[derive(Clone)]
pub struct Registry {
    constructors: HashMap<&'static str, Constructor>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut constructors: HashMap<&'static str, Constructor> = HashMap::new();
        constructors.insert("bloom", build_bloom);
        constructors.insert("range", build_range);
        constructors.insert("set", build_set);
        constructors.insert("fuzzy_string", build_fuzzy_string);
        constructors.insert("date", build_date);
        constructors.insert("intervaltree", build_interval_tree);
        constructors.insert("kdtree", build_kdtree);
        constructors.insert("bitvector", build_bitvector);
        Self { constructors }
    }
}

impl Registry {
    /// Create a registry with the built-in filter taxonomy registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `tag` names a known filter variant.
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Build a filter of the variant named by `tag` from a column stream.
    pub fn build(
        &self,
        tag: &str,
        chunks: ColumnChunkStream,
        params: &BuildParams,
    ) -> Result<Filter, Error> {
        let ctor = self
            .constructors
            .get(tag)
            .context(UnknownTagSnafu { tag: tag.to_string() })?;
        ctor(chunks, params)
    }

    /// All registered tags, for diagnostics and CLI help text.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.constructors.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

fn build_bloom(chunks: ColumnChunkStream, params: &BuildParams) -> Result<Filter, Error> {
    crate::bloom::BloomFilter::build_from_stream(chunks, params.error_rate_or_default())
        .map(Filter::Bloom)
}

fn build_range(chunks: ColumnChunkStream, _params: &BuildParams) -> Result<Filter, Error> {
    crate::range::RangeFilter::build_from_stream(chunks).map(Filter::Range)
}

fn build_set(chunks: ColumnChunkStream, _params: &BuildParams) -> Result<Filter, Error> {
    crate::set::SetFilter::build_from_stream(chunks).map(Filter::Set)
}

fn build_fuzzy_string(chunks: ColumnChunkStream, params: &BuildParams) -> Result<Filter, Error> {
    let threshold = params.threshold.context(MissingParamSnafu {
        variant: "fuzzy_string",
        name: "threshold",
    })?;
    crate::fuzzy_string::FuzzyStringFilter::build_from_stream(chunks, threshold)
        .map(Filter::FuzzyString)
}

fn build_date(chunks: ColumnChunkStream, params: &BuildParams) -> Result<Filter, Error> {
    crate::date::DateFilter::build_from_stream(chunks, params.date_format_or_default())
        .map(Filter::Date)
}

fn build_interval_tree(chunks: ColumnChunkStream, _params: &BuildParams) -> Result<Filter, Error> {
    crate::interval_tree::IntervalTreeFilter::build_from_stream(chunks).map(Filter::IntervalTree)
}

fn build_kdtree(chunks: ColumnChunkStream, params: &BuildParams) -> Result<Filter, Error> {
    crate::kd_tree::KdTreeFilter::build_from_stream(
        chunks,
        params.radius,
        params.dimensions_or_default(),
    )
    .map(Filter::KdTree)
}

fn build_bitvector(chunks: ColumnChunkStream, _params: &BuildParams) -> Result<Filter, Error> {
    crate::bitvector::BitVectorFilter::build_from_stream(chunks).map(Filter::BitVector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_types::{ColumnChunk, Value};

    #[test]
    fn unknown_tag_fails() {
        let registry = Registry::new();
        let chunks: ColumnChunkStream = Box::new(std::iter::empty());
        let err = registry
            .build("not-a-real-tag", chunks, &BuildParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTag { .. }));
    }

    #[test]
    fn builds_a_set_filter() {
        let registry = Registry::new();
        let chunk: ColumnChunk = vec![Some(Value::Categorical("a".to_string()))];
        let chunks: ColumnChunkStream = Box::new(std::iter::once(chunk));
        let filter = registry.build("set", chunks, &BuildParams::default()).unwrap();
        assert!(matches!(filter, Filter::Set(_)));
    }

    #[test]
    fn fuzzy_string_without_threshold_fails() {
        let registry = Registry::new();
        let chunks: ColumnChunkStream = Box::new(std::iter::empty());
        let err = registry
            .build("fuzzy_string", chunks, &BuildParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingParam { .. }));
    }

    #[test]
    fn all_eight_variants_are_registered() {
        let registry = Registry::new();
        assert_eq!(registry.tags().len(), 8);
    }
}
