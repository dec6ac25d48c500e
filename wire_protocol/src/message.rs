//! The XML envelope: one root element, a `format` attribute, and a text
//! payload decoded according to it (spec §6 "Wire protocol").
//!
//! Grounded on `original_source/core/utils.py`'s `TCPMessage`/`parse_message`:
//! the payload is decoded to its target representation at parse time, not
//! lazily, so a handler never has to care what `format` the request arrived
//! in.

use crate::error::{self, Error};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use snafu::{OptionExt, ResultExt};

/// How a message's payload text was encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Payload is used as-is.
    Text,
    /// Payload is a JSON document.
    Json,
    /// Payload is base64-encoded UTF-8 text.
    Base64,
}

impl Format {
    fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "base64" => Ok(Format::Base64),
            other => error::UnknownFormatSnafu {
                value: other.to_string(),
            }
            .fail(),
        }
    }
}

/// A request or response payload, already decoded per its [`Format`].
#[derive(Debug, Clone)]
pub enum Payload {
    /// Raw text, verbatim.
    Text(String),
    /// A parsed JSON document.
    Json(serde_json::Value),
    /// Decoded base64 text.
    Base64(String),
}

/// A parsed request envelope: `<tag format="...">payload</tag>`.
#[derive(Debug, Clone)]
pub struct Message {
    /// The outer element name, used for both handler dispatch and framing
    /// the response.
    pub tag: String,
    /// The format the payload arrived in.
    pub format: Format,
    /// The decoded payload.
    pub payload: Payload,
}

/// Parse one complete `<tag format="...">...</tag>` envelope.
pub fn parse_message(xml: &str) -> Result<Message, Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut tag = None;
    let mut format_attr = None;
    let mut raw_payload = String::new();

    loop {
        match reader.read_event(&mut buf).context(error::XmlSnafu)? {
            Event::Start(ref start) => {
                let (t, f) = tag_and_format(start);
                tag = Some(t);
                format_attr = f;
            }
            Event::Empty(ref start) => {
                let (t, f) = tag_and_format(start);
                tag = Some(t);
                format_attr = f;
                break;
            }
            Event::Text(text) => {
                raw_payload = text.unescape_and_decode(&reader).context(error::XmlSnafu)?;
            }
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let tag = tag.context(error::NoRootElementSnafu)?;
    let format = Format::parse(format_attr.context(error::MissingFormatSnafu)?.as_str())?;
    let payload = decode_payload(format, raw_payload)?;

    Ok(Message { tag, format, payload })
}

fn tag_and_format(start: &BytesStart) -> (String, Option<String>) {
    let tag = String::from_utf8_lossy(start.name()).into_owned();
    let format = start
        .attributes()
        .flatten()
        .find(|attr| attr.key == b"format")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
    (tag, format)
}

fn decode_payload(format: Format, raw: String) -> Result<Payload, Error> {
    match format {
        Format::Text => Ok(Payload::Text(raw)),
        Format::Json => {
            serde_json::from_str(&raw).context(error::JsonSnafu).map(Payload::Json)
        }
        Format::Base64 => {
            let bytes = base64::decode(raw.trim()).context(error::Base64Snafu)?;
            String::from_utf8(bytes).context(error::Utf8Snafu).map(Payload::Base64)
        }
    }
}

/// Build a response envelope `<tag>escaped payload</tag>` (spec §6
/// "Payload text is XML-escaped").
pub fn encode_response(tag: &str, payload: &str) -> String {
    let escaped = quick_xml::escape::escape(payload.as_bytes());
    format!("<{tag}>{}</{tag}>", String::from_utf8_lossy(&escaped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_json_envelope() {
        let message = parse_message(r#"<query format="json">{"a":1}</query>"#).unwrap();
        assert_eq!(message.tag, "query");
        assert!(matches!(message.format, Format::Json));
        assert!(matches!(message.payload, Payload::Json(_)));
    }

    #[test]
    fn parses_a_text_envelope() {
        let message = parse_message(r#"<message format="text">hello</message>"#).unwrap();
        match message.payload {
            Payload::Text(text) => assert_eq!(text, "hello"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn parses_a_base64_envelope() {
        let encoded = base64::encode("hi");
        let xml = format!(r#"<message format="base64">{encoded}</message>"#);
        let message = parse_message(&xml).unwrap();
        match message.payload {
            Payload::Base64(text) => assert_eq!(text, "hi"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn missing_format_attribute_fails() {
        let err = parse_message("<query>{}</query>").unwrap_err();
        assert!(matches!(err, Error::MissingFormat));
    }

    #[test]
    fn unknown_format_fails() {
        let err = parse_message(r#"<query format="pickle">x</query>"#).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat { .. }));
    }

    #[test]
    fn response_payload_is_escaped() {
        let xml = encode_response("query", "a & <b>");
        assert_eq!(xml, "<query>a &amp; &lt;b&gt;</query>");
    }
}
