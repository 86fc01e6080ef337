//! Generation sessions: collision state and the debug log.
//!
//! A session owns everything the generator remembers between calls: the set
//! of identifiers already handed out, one disambiguation counter per raw
//! candidate, the `element-<n>` fallback counter and the debug log.
//!
//! Nothing here resets itself. Callers running independent test cases
//! against the same session must call [`GenerationSession::reset`] between
//! them, or later runs will see `-2` suffixes produced by earlier ones.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::context::ContextPath;
use crate::debug::{render_log, DebugLogEntry, DebugSink};
use crate::generator::{compose_candidate, BaseLabel, GeneratedIdentifier, IdentityDescriptor};
use crate::result::IdweaveResult;

#[derive(Debug, Default)]
struct SessionState {
    seen: HashSet<String>,
    counters: HashMap<String, u32>,
    fallback_counter: u64,
    log: Vec<DebugLogEntry>,
    generated: u64,
    collisions: u64,
}

impl SessionState {
    /// Record `raw`, disambiguating it if already handed out
    fn claim(&mut self, raw: &str) -> (String, Option<String>) {
        if self.seen.insert(raw.to_string()) {
            return (raw.to_string(), None);
        }
        self.collisions += 1;
        let counter = self.counters.entry(raw.to_string()).or_insert(1);
        loop {
            *counter += 1;
            let suffix = counter.to_string();
            let candidate = format!("{raw}-{suffix}");
            if self.seen.insert(candidate.clone()) {
                return (candidate, Some(suffix));
            }
        }
    }
}

/// Collision-detection and debug-log state shared by generation calls
pub struct GenerationSession {
    id: Uuid,
    state: Mutex<SessionState>,
}

impl fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("GenerationSession")
            .field("id", &self.id)
            .field("seen", &state.seen.len())
            .field("log_entries", &state.log.len())
            .finish()
    }
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationSession {
    /// A fresh, empty session
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Unique id of this session
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate an identifier for `identity` at `path` under `config`
    #[must_use]
    pub fn generate(
        &self,
        identity: &IdentityDescriptor,
        path: &ContextPath,
        config: &GenerationConfig,
    ) -> GeneratedIdentifier {
        if !config.enabled {
            trace!("identifier generation disabled");
            return GeneratedIdentifier::empty();
        }

        let namespace = config.resolved_namespace();
        let base = BaseLabel::select(identity, config);

        let mut state = self.lock();
        let raw = compose_candidate(&base, identity, path, config, &namespace, || {
            state.fallback_counter += 1;
            state.fallback_counter
        });

        let (value, disambiguator) = if config.collision_detection_enabled {
            state.claim(&raw)
        } else {
            (raw.clone(), None)
        };
        if let Some(suffix) = &disambiguator {
            debug!(raw = %raw, suffix = %suffix, "disambiguated colliding identifier");
        }
        state.generated += 1;

        if config.debug_logging_enabled {
            state.log.push(DebugLogEntry::new(
                path.clone(),
                identity.summary(),
                raw.clone(),
                value.clone(),
                disambiguator.is_some(),
            ));
        }

        GeneratedIdentifier {
            value,
            raw,
            disambiguator,
        }
    }

    /// Snapshot of the debug log
    #[must_use]
    pub fn debug_log(&self) -> Vec<DebugLogEntry> {
        self.lock().log.clone()
    }

    /// Debug log rendered one entry per line
    #[must_use]
    pub fn debug_log_text(&self) -> String {
        render_log(&self.lock().log)
    }

    /// Debug log as a JSON array
    pub fn debug_log_json(&self) -> IdweaveResult<String> {
        Ok(serde_json::to_string_pretty(&self.lock().log)?)
    }

    /// Hand the debug log to a sink
    pub fn print_debug_log(&self, sink: &dyn DebugSink) {
        let entries = self.debug_log();
        sink.print_log(&entries);
    }

    /// Drop all debug log entries
    pub fn clear_debug_log(&self) {
        let mut state = self.lock();
        let dropped = state.log.len();
        state.log.clear();
        debug!(session = %self.id, dropped, "cleared debug log");
    }

    /// Forget every identifier, counter and log entry
    pub fn reset(&self) {
        *self.lock() = SessionState::default();
        debug!(session = %self.id, "reset generation session");
    }

    /// Generation calls that produced an identifier
    #[must_use]
    pub fn generated_count(&self) -> u64 {
        self.lock().generated
    }

    /// Calls that needed a disambiguator
    #[must_use]
    pub fn collision_count(&self) -> u64 {
        self.lock().collisions
    }

    /// Identifiers recorded by collision detection
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Whether collision detection has handed out `value`
    #[must_use]
    pub fn has_seen(&self, value: &str) -> bool {
        self.lock().seen.contains(value)
    }
}

/// The process-wide default session
#[must_use]
pub fn global() -> Arc<GenerationSession> {
    static GLOBAL: OnceLock<Arc<GenerationSession>> = OnceLock::new();
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(GenerationSession::new())))
}
