use snafu::Snafu;

/// Errors from walking a data directory and populating an index store.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{path}: failed to read build configuration: {source}"))]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("{path}: failed to parse build configuration: {source}"))]
    ParseConfig {
        path: String,
        source: serde_json::Error,
    },

    #[snafu(display("{path}: opening file: {source}"))]
    Open { path: String, source: tabular::Error },

    #[snafu(display("column {column} in {path}: configured strategy {strategy:?} is not a known filter variant"))]
    UnknownStrategy {
        path: String,
        column: String,
        strategy: String,
    },

    #[snafu(display("column {column} in {path}: no non-null values, cannot select a strategy"))]
    EmptyColumn { path: String, column: String },

    #[snafu(display("column {column} in {path}: no automatic strategy covers logical type {dtype:?}"))]
    UnsupportedColumnType {
        path: String,
        column: String,
        dtype: data_types::LogicalType,
    },

    #[snafu(display("sampling column {column} in {path}: {source}"))]
    Sample {
        path: String,
        column: String,
        source: tabular::Error,
    },

    #[snafu(display("reading column {column} in {path}: {source}"))]
    Read {
        path: String,
        column: String,
        source: tabular::Error,
    },

    #[snafu(display("building {strategy} filter for column {column} in {path}: {source}"))]
    Build {
        path: String,
        column: String,
        strategy: String,
        source: filter_types::Error,
    },

    #[snafu(display("serializing filter for column {column} in {path}: {source}"))]
    Serialize {
        path: String,
        column: String,
        source: filter_types::Error,
    },

    #[snafu(display("writing blob for column {column} in {path}: {source}"))]
    WriteBlob {
        path: String,
        column: String,
        source: index_store::Error,
    },

    #[snafu(display("serializing manifest for store {store}: {source}"))]
    SerializeManifest {
        store: String,
        source: serde_json::Error,
    },

    #[snafu(display("writing manifest for store {store}: {source}"))]
    WriteManifest {
        store: String,
        source: index_store::Error,
    },
}
