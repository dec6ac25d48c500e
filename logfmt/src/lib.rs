//! A [`tracing_subscriber::Layer`] that writes events in `logfmt` format:
//! whitespace separated `key=value` pairs, one line per event.
//!
//! ```text
//! level=info msg="materialized filter" store=acme shard=part-001 column=status.bloom
//! ```

use observability_deps::tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use std::fmt::Write as _;
use std::io::Write as _;
use tracing_subscriber::{layer::Context, Layer};

/// A [`Layer`] that writes `logfmt`-formatted lines to stderr.
#[derive(Debug, Default)]
pub struct LogFmtLayer {
    with_target: bool,
}

impl LogFmtLayer {
    /// Create a new layer with default settings (target included).
    pub fn new() -> Self {
        Self { with_target: true }
    }

    /// Control whether the tracing `target` is included as a field.
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}

impl<S> Layer<S> for LogFmtLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = String::new();
        let level = level_str(event.metadata().level());
        write!(line, "level={level}").ok();

        if self.with_target {
            write!(line, " target={}", event.metadata().target()).ok();
        }

        let mut visitor = LogFmtVisitor::new(&mut line);
        event.record(&mut visitor);

        writeln!(std::io::stderr(), "{line}").ok();
    }
}

fn level_str(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

struct LogFmtVisitor<'a> {
    line: &'a mut String,
}

impl<'a> LogFmtVisitor<'a> {
    fn new(line: &'a mut String) -> Self {
        Self { line }
    }

    fn write_kv(&mut self, field: &Field, value: impl std::fmt::Display) {
        let name = field.name();
        if name == "message" {
            write!(self.line, " msg={}", quote_if_needed(&value.to_string())).ok();
        } else {
            write!(self.line, " {name}={}", quote_if_needed(&value.to_string())).ok();
        }
    }
}

impl<'a> Visit for LogFmtVisitor<'a> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.write_kv(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.write_kv(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.write_kv(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.write_kv(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.write_kv(field, value);
    }
}

/// Quote a value if it contains whitespace or an `=`, escaping embedded quotes.
fn quote_if_needed(value: &str) -> String {
    if value.contains(' ') || value.contains('=') || value.contains('"') {
        format!("{:?}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_values_with_spaces() {
        assert_eq!(quote_if_needed("no_spaces"), "no_spaces");
        assert_eq!(quote_if_needed("has spaces"), "\"has spaces\"");
    }

    #[test]
    fn level_strings_are_lowercase() {
        assert_eq!(level_str(&Level::INFO), "info");
        assert_eq!(level_str(&Level::ERROR), "error");
    }
}
