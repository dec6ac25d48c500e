//! Tag-delimited XML request framing and handler dispatch.
//!
//! `shardexd`'s clients speak a small line-oriented XML protocol: each
//! request is a single `<tag format="...">payload</tag>` element, and each
//! response mirrors it back as `<tag>payload</tag>`. This crate owns the
//! three concerns that sit between a raw byte stream and a handled request:
//! framing ([`read_framed_message`]), envelope parsing ([`parse_message`]),
//! and tag-based dispatch ([`Dispatcher`]).
//!
//! Grounded throughout on `original_source/core/server.py` and
//! `original_source/core/client.py`, the TCP server and client the protocol
//! was distilled from.

mod dispatcher;
mod error;
mod framing;
mod message;

pub use dispatcher::{Dispatcher, Handler};
pub use error::Error;
pub use framing::read_framed_message;
pub use message::{encode_response, parse_message, Format, Message, Payload};
