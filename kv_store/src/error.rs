use snafu::Snafu;

/// Errors from the key/value side-store.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// No live entry for `key` (missing, or present but past its TTL —
    /// `original_source/core/ttl_dict.py::TTLDictionary.__getitem__`/
    /// `__delitem__` raise `KeyError` for both cases alike).
    #[snafu(display("no entry found for key {key}"))]
    NotFound { key: String },
}
