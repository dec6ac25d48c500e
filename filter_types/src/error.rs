//! Error taxonomy for the filter taxonomy (spec §7).

use data_types::LogicalType;
use snafu::Snafu;

/// Errors raised while building, updating, probing or (de)serializing a
/// [`crate::Filter`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// `test` was called with a value of the wrong logical type for the
    /// filter's domain.
    #[snafu(display(
        "type mismatch probing a {variant} filter: expected {expected:?}, got {actual:?}"
    ))]
    TypeMismatch {
        /// The filter variant being probed.
        variant: &'static str,
        /// The logical type the filter was built over.
        expected: LogicalType,
        /// The logical type of the probe value.
        actual: LogicalType,
    },

    /// `build_from_stream` saw no non-null values and the variant cannot
    /// represent an empty set/range.
    #[snafu(display("{variant} filter saw no usable values to build from"))]
    EmptyInput {
        /// The filter variant being built.
        variant: &'static str,
    },

    /// A required construction parameter was not supplied.
    #[snafu(display("{variant} filter requires parameter `{name}`"))]
    MissingParam {
        /// The filter variant being built.
        variant: &'static str,
        /// The name of the missing parameter.
        name: &'static str,
    },

    /// The strategy selector (or a config override) named a tag the
    /// registry does not recognize.
    #[snafu(display("unknown filter tag `{tag}`"))]
    UnknownTag {
        /// The unrecognized tag.
        tag: String,
    },

    /// A serialized blob's `(tag, version)` header did not match what the
    /// reader expected, or the body was otherwise corrupt.
    #[snafu(display("corrupt filter blob: {message}"))]
    Corrupt {
        /// Human-readable description of the corruption.
        message: String,
    },

    /// The `bincode` codec failed to encode or decode a filter's body.
    #[snafu(display("filter codec error: {source}"))]
    Codec {
        /// The underlying codec error.
        source: bincode::Error,
    },

    /// A KD-tree build or query failed inside the `kdtree` crate.
    #[snafu(display("kd-tree error: {message}"))]
    KdTree {
        /// Human-readable description.
        message: String,
    },
}
