use std::io;

use slog::{self, Drain, Record, Serializer, KV};
use slog_mozlog_json::MozLogJson;

use crate::settings::Settings;

#[derive(Clone, Debug)]
pub struct MozLogger {
    pub log: slog::Logger,
}

impl MozLogger {
    pub fn new_json(msg_type: &str) -> Self {
        let json_drain = MozLogJson::new(io::stdout())
            .logger_name(format!(
                "{}-{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .msg_type(msg_type.to_string())
            .build()
            .fuse();
        let drain = slog_async::Async::new(json_drain).build().fuse();
        Self {
            log: slog::Logger::root(drain, slog::o!()).new(slog::o!()),
        }
    }

    pub fn new_human() -> Self {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::CompactFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();

        Self {
            log: slog::Logger::root(drain, slog::o!()).new(slog::o!()),
        }
    }

    /// Pick the drain the settings ask for.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.human_logs {
            Self::new_human()
        } else {
            Self::new_json("diag-reporter:log")
        }
    }
}

/// Fields of the one record written for every handled request.
pub struct RequestLogFields {
    pub method: String,
    pub url: String,
    pub client: String,
    pub agent: Option<String>,
}

impl KV for RequestLogFields {
    fn serialize(&self, _: &Record, serializer: &mut dyn Serializer) -> slog::Result {
        if let Some(ref agent) = self.agent {
            serializer.emit_str("agent", agent)?;
        }
        serializer.emit_str("client", &self.client)?;
        serializer.emit_str("url", &self.url)?;
        serializer.emit_str("method", &self.method)
    }
}

impl Default for MozLogger {
    fn default() -> Self {
        Self {
            log: slog::Logger::root(slog::Discard, slog::o!()).new(slog::o!()),
        }
    }
}
