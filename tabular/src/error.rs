use snafu::Snafu;

/// Errors opening or reading a tabular file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{path}: unsupported file extension"))]
    UnsupportedExtension { path: String },

    #[snafu(display("{path}: no column named {column}"))]
    UnknownColumn { path: String, column: String },

    #[snafu(display("{path}: failed to open: {source}"))]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("{path}: csv error: {source}"))]
    Csv { path: String, source: csv::Error },

    #[snafu(display("{path}: parquet error: {source}"))]
    Parquet {
        path: String,
        source: parquet::errors::ParquetError,
    },
}
