//! `tracing` setup that feeds the editor's log buffer.

use std::io;

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::EitherWriter;

use crate::log_buffer::{LogHandle, LogWriter, global_log};

/// Where formatted events go.
///
/// A sink bound to a buffer always writes there. The default sink looks the
/// global buffer up per event, so a buffer installed after tracing starts
/// still receives output; until then events go to stderr.
#[derive(Clone, Debug, Default)]
pub struct LogSink {
    bound: Option<LogHandle>,
}

impl LogSink {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn bound_to(handle: LogHandle) -> Self {
        Self {
            bound: Some(handle),
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = EitherWriter<LogWriter, io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        match self.bound.clone().or_else(global_log) {
            Some(handle) => EitherWriter::A(handle.writer()),
            None => EitherWriter::B(io::stderr()),
        }
    }
}

/// Compact, uncoloured formatter writing to `sink`.
pub fn subscriber(level: Level, sink: LogSink) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .with_writer(sink)
        .with_target(false)
        .with_ansi(false)
        .finish()
}

/// Installs the global subscriber at `DEBUG`. Later calls are no-ops.
pub fn init_default() {
    init_with_level(Level::DEBUG);
}

/// Returns false when a global subscriber was already set.
pub fn init_with_level(level: Level) -> bool {
    tracing::subscriber::set_global_default(subscriber(level, LogSink::global())).is_ok()
}
