//! Logging sink interface.
//!
//! The codegen never owns a transport; it reports through a [`LogSink`].
//! [`TracingSink`] is the default, forwarding to the `tracing` macros with
//! structured fields.

use crate::diagnostic::Position;

/// One report sent to the sink.
#[derive(Debug, Clone, Copy)]
pub struct LogEvent<'a> {
    pub filename: &'a str,
    pub frame: Option<&'a str>,
    pub start: Option<Position>,
    pub message: &'a str,
}

/// Where warnings and recovered errors go. Fatal errors are returned, not
/// logged.
pub trait LogSink {
    fn warn(&self, event: LogEvent<'_>);
    fn error(&self, event: LogEvent<'_>);
    fn parse_error(&self, event: LogEvent<'_>);
}

/// Default sink backed by `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn warn(&self, event: LogEvent<'_>) {
        tracing::warn!(
            filename = event.filename,
            line = event.start.map(|p| p.line),
            column = event.start.map(|p| p.column),
            "{}",
            event.message
        );
    }

    fn error(&self, event: LogEvent<'_>) {
        tracing::error!(
            filename = event.filename,
            line = event.start.map(|p| p.line),
            column = event.start.map(|p| p.column),
            "{}",
            event.message
        );
    }

    fn parse_error(&self, event: LogEvent<'_>) {
        tracing::error!(
            filename = event.filename,
            line = event.start.map(|p| p.line),
            column = event.start.map(|p| p.column),
            frame = event.frame,
            "{}",
            event.message
        );
    }
}
