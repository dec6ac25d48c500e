use snafu::Snafu;

/// Errors framing, parsing, or dispatching a request (spec §7
/// `ProtocolError`).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("timed out waiting for a complete message"))]
    Timeout,

    #[snafu(display("connection closed before a complete message arrived"))]
    ConnectionClosed,

    #[snafu(display("malformed XML envelope: {source}"))]
    Xml { source: quick_xml::Error },

    #[snafu(display("message envelope has no root element"))]
    NoRootElement,

    #[snafu(display("message envelope is missing the required `format` attribute"))]
    MissingFormat,

    #[snafu(display("unrecognized `format` attribute value {value:?}"))]
    UnknownFormat { value: String },

    #[snafu(display("payload is not valid base64: {source}"))]
    Base64 { source: base64::DecodeError },

    #[snafu(display("payload is not valid utf-8: {source}"))]
    Utf8 { source: std::string::FromUtf8Error },

    #[snafu(display("payload is not valid JSON: {source}"))]
    Json { source: serde_json::Error },

    #[snafu(display("no handler registered for message tag {tag:?}"))]
    UnknownTag { tag: String },
}
