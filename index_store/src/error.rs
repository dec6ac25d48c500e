use snafu::Snafu;

/// Errors from the storage-backend abstraction.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to read {path}: {source}"))]
    Read {
        path: String,
        source: object_store::Error,
    },

    #[snafu(display("failed to write {path}: {source}"))]
    Write {
        path: String,
        source: object_store::Error,
    },

    #[snafu(display("failed to enumerate under {prefix}: {source}"))]
    Enumerate {
        prefix: String,
        source: object_store::Error,
    },

    #[snafu(display("failed to initialize local filesystem store at {root}: {source}"))]
    InitLocal {
        root: String,
        source: object_store::Error,
    },
}
