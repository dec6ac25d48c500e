//! Length-indeterminate framing: read until the buffer ends with the
//! closing tag of a registered message kind (spec §6 "Wire protocol").
//!
//! Grounded on `original_source/core/server.py::TCPServer.handle_echo`'s read
//! loop: small timed reads accumulated into a buffer, checked after every
//! read against every registered tag's closing delimiter.

use crate::error::{self, Error};
use snafu::ensure;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read from `reader` until the accumulated buffer ends with `</tag>` for
/// some `tag` in `registered_tags`, or `read_timeout` elapses on a single
/// read. Returns the complete buffer, including the envelope.
pub async fn read_framed_message<R>(
    reader: &mut R,
    registered_tags: &[&str],
    read_timeout: Duration,
) -> Result<String, Error>
where
    R: AsyncRead + Unpin,
{
    ensure!(!registered_tags.is_empty(), error::NoRootElementSnafu);

    let mut buffer = String::new();
    let mut chunk = [0u8; 256];

    loop {
        let read = tokio::time::timeout(read_timeout, reader.read(&mut chunk))
            .await
            .map_err(|_| error::TimeoutSnafu.build())?
            .map_err(|_| error::ConnectionClosedSnafu.build())?;

        if read == 0 {
            return error::ConnectionClosedSnafu.fail();
        }

        buffer.push_str(&String::from_utf8_lossy(&chunk[..read]));

        if registered_tags
            .iter()
            .any(|tag| buffer.ends_with(&format!("</{tag}>")))
        {
            return Ok(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_until_the_closing_tag() {
        let mut source = Cursor::new(b"<query format=\"text\">hi</query>".to_vec());
        let message = read_framed_message(&mut source, &["query"], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(message, "<query format=\"text\">hi</query>");
    }

    #[tokio::test]
    async fn an_unregistered_closing_tag_does_not_stop_the_read() {
        let mut source = Cursor::new(b"<other>x</other><query format=\"text\">hi</query>".to_vec());
        let message = read_framed_message(&mut source, &["query"], Duration::from_secs(1))
            .await
            .unwrap();
        assert!(message.ends_with("</query>"));
    }

    #[tokio::test]
    async fn connection_closed_before_a_tag_completes_fails() {
        let mut source = Cursor::new(b"<query format=\"text\">hi".to_vec());
        let err = read_framed_message(&mut source, &["query"], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }
}
