use snafu::Snafu;

/// Errors evaluating a predicate against a catalog.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("composite predicate has zero rules"))]
    EmptyComposite,

    #[snafu(display("unknown predicate condition {condition:?}"))]
    UnknownCondition { condition: String },

    #[snafu(display("predicate nesting exceeds MAX_PREDICATE_DEPTH ({limit})"))]
    TooDeep { limit: usize },

    #[snafu(display("failed to materialize filter for {key:?}: {source}"))]
    Catalog {
        key: Vec<String>,
        source: index_catalog::Error,
    },

    #[snafu(display("failed to coerce probe value for field {field}: {source}"))]
    Coercion {
        field: String,
        source: data_types::CoercionError,
    },

    #[snafu(display("filter probe failed for {key:?}: {source}"))]
    Probe {
        key: Vec<String>,
        source: filter_types::Error,
    },
}
