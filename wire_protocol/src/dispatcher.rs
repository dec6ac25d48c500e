//! Handler registration and dispatch by message tag.
//!
//! Grounded on `original_source/core/server.py`'s `TCPServer.message_handler`
//! decorator (registers a coroutine per message class) and
//! `TCPServer.handle_echo`'s `self.handlers[message.cls](message)` dispatch,
//! whose result is wrapped back into `<tag>...</tag>` before it goes out on
//! the wire.

use crate::error::{self, Error};
use crate::message::{encode_response, Message};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered handler: takes the parsed request, returns the response
/// payload text (already formatted, not yet escaped or tagged).
pub type Handler = Arc<dyn Fn(Message) -> BoxFuture<'static, Result<String, Error>> + Send + Sync>;

/// Maps message tags to the handler that answers them.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for `tag`. A later call for the same tag replaces
    /// the earlier one.
    pub fn register(&mut self, tag: impl Into<String>, handler: Handler) {
        self.handlers.insert(tag.into(), handler);
    }

    /// Look up the handler for `message.tag`, run it, and wrap the result in
    /// a response envelope. Fails if no handler is registered for the tag.
    pub async fn dispatch(&self, message: Message) -> Result<String, Error> {
        let tag = message.tag.clone();
        let handler = self
            .handlers
            .get(&tag)
            .cloned()
            .ok_or_else(|| error::UnknownTagSnafu { tag: tag.clone() }.build())?;

        let response = handler(message).await?;
        Ok(encode_response(&tag, &response))
    }

    /// The tags this dispatcher can currently answer, for use as the
    /// `registered_tags` argument to [`crate::read_framed_message`].
    pub fn registered_tags(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}
