//! Debug trace of identifier generation.
//!
//! Every generation call made with debug logging enabled appends a
//! [`DebugLogEntry`] to its session. The log always reflects what was
//! actually returned, including disambiguated values. It never expires; it
//! is cleared explicitly.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ContextPath;

/// One generation call, as recorded in the debug log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLogEntry {
    /// When the identifier was generated
    pub timestamp: DateTime<Utc>,
    /// Context path at generation time
    pub path: ContextPath,
    /// Summary of the identity inputs
    pub identity: String,
    /// Identifier before disambiguation
    pub raw: String,
    /// Identifier actually returned
    pub value: String,
    /// Whether a disambiguator was appended
    pub collision: bool,
}

impl DebugLogEntry {
    /// Create an entry stamped with the current time
    #[must_use]
    pub fn new(
        path: ContextPath,
        identity: impl Into<String>,
        raw: impl Into<String>,
        value: impl Into<String>,
        collision: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            path,
            identity: identity.into(),
            raw: raw.into(),
            value: value.into(),
            collision,
        }
    }

    /// Single-line human-readable form
    #[must_use]
    pub fn render(&self) -> String {
        let path = if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.to_string()
        };
        let mut line = format!(
            "[{}] {} | {} -> {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            path,
            self.identity,
            self.value
        );
        if self.collision {
            let _ = write!(line, " (collision on {})", self.raw);
        }
        line
    }
}

/// Render a whole log, one entry per line
#[must_use]
pub fn render_log(entries: &[DebugLogEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.render());
        out.push('\n');
    }
    out
}

/// Developer-facing destination for the debug log
pub trait DebugSink {
    /// Emit the entries
    fn print_log(&self, entries: &[DebugLogEntry]);

    /// Text emitted so far
    fn get_log(&self) -> String;
}

/// Sink that forwards entries to `tracing` at debug level
#[derive(Debug, Default)]
pub struct TracingSink {
    printed: Mutex<String>,
}

impl TracingSink {
    /// Create a sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DebugSink for TracingSink {
    fn print_log(&self, entries: &[DebugLogEntry]) {
        for entry in entries {
            debug!(
                target: "idweave::debug",
                path = %entry.path,
                identity = %entry.identity,
                value = %entry.value,
                collision = entry.collision,
                "generated identifier"
            );
        }
        self.printed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(&render_log(entries));
    }

    fn get_log(&self) -> String {
        self.printed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Sink that only accumulates rendered text
#[derive(Debug, Default)]
pub struct MemorySink {
    text: Mutex<String>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard accumulated text
    pub fn clear(&self) {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DebugSink for MemorySink {
    fn print_log(&self, entries: &[DebugLogEntry]) {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(&render_log(entries));
    }

    fn get_log(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
