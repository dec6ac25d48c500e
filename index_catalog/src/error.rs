use snafu::Snafu;

/// Errors from the index catalog.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{path:?} is not an indexed key"))]
    NotIndexed { path: Vec<String> },

    #[snafu(display("failed to load filter at {relative_path}: {source}"))]
    FilterLoadFailed {
        relative_path: String,
        source: index_store::Error,
    },

    #[snafu(display("failed to decode filter blob at {relative_path}: {source}"))]
    Corrupt {
        relative_path: String,
        source: filter_types::Error,
    },

    #[snafu(display("backing store unavailable while enumerating {prefix}: {source}"))]
    BackendUnavailable {
        prefix: String,
        source: index_store::Error,
    },
}
