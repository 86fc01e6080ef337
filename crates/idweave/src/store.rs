//! Configuration store: process-wide policy plus scoped overrides.
//!
//! [`get`] returns, in order of preference:
//!
//! 1. the most recently entered override that belongs to the calling unit of
//!    work: a synchronous one from [`with_scoped_override`] or, with the
//!    `tokio` feature, a task-local one from `with_scoped_override_async`,
//! 2. the process-wide configuration.
//!
//! A synchronous override is pushed on a per-thread stack and tagged with the
//! tokio task that entered it, so tasks polled on the same thread inside the
//! body do not see it. Overrides are immutable snapshots. They are popped on every exit path of
//! the body, including unwinding and, for futures, being dropped early.
//! Concurrent units of work never see each other's overrides.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::config::{ConfigUpdate, GenerationConfig, GenerationMode};
use crate::namespace;

fn process_wide() -> &'static RwLock<GenerationConfig> {
    static CONFIG: OnceLock<RwLock<GenerationConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| RwLock::new(GenerationConfig::default()))
}

/// Order in which overrides were entered, across threads and tasks
static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

fn next_scope() -> u64 {
    NEXT_SCOPE.fetch_add(1, Ordering::Relaxed)
}

#[cfg(feature = "tokio")]
type TaskKey = Option<tokio::task::Id>;

#[cfg(not(feature = "tokio"))]
type TaskKey = ();

#[cfg(feature = "tokio")]
fn current_task() -> TaskKey {
    tokio::task::try_id()
}

#[cfg(not(feature = "tokio"))]
fn current_task() -> TaskKey {}

struct SyncFrame {
    seq: u64,
    task: TaskKey,
    config: GenerationConfig,
}

thread_local! {
    static SCOPED: RefCell<Vec<SyncFrame>> = const { RefCell::new(Vec::new()) };
}

#[cfg(feature = "tokio")]
tokio::task_local! {
    static TASK_SCOPED: (u64, GenerationConfig);
}

/// The active configuration for the calling unit of work
#[must_use]
pub fn get() -> GenerationConfig {
    let sync = sync_scoped();
    let task = task_scoped();
    match (sync, task) {
        (Some((sync_seq, sync)), Some((task_seq, task))) => {
            if sync_seq > task_seq {
                sync
            } else {
                task
            }
        }
        (Some((_, config)), None) | (None, Some((_, config))) => config,
        (None, None) => global(),
    }
}

/// Innermost synchronous override entered by the calling task
fn sync_scoped() -> Option<(u64, GenerationConfig)> {
    let task = current_task();
    SCOPED.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find(|frame| frame.task == task)
            .map(|frame| (frame.seq, frame.config.clone()))
    })
}

#[cfg(feature = "tokio")]
fn task_scoped() -> Option<(u64, GenerationConfig)> {
    TASK_SCOPED.try_with(Clone::clone).ok()
}

#[cfg(not(feature = "tokio"))]
fn task_scoped() -> Option<(u64, GenerationConfig)> {
    None
}

/// The process-wide configuration, ignoring any override
#[must_use]
pub fn global() -> GenerationConfig {
    process_wide()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Whether a scoped override is active for the caller
#[must_use]
pub fn has_scoped_override() -> bool {
    sync_scoped().is_some() || task_scoped().is_some()
}

/// Merge `update` into the process-wide configuration
pub fn set(update: &ConfigUpdate) {
    if update.is_empty() {
        return;
    }
    let mut config = process_wide()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    config.apply(update);
    debug!(?update, "updated process-wide generation config");
}

/// Restore the process-wide defaults and forget the detected namespace
pub fn reset() {
    *process_wide()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = GenerationConfig::default();
    namespace::reset_cache();
    debug!("reset process-wide generation config");
}

/// Turn generation on
pub fn enable() {
    set(&ConfigUpdate::new().enabled(true));
}

/// Turn generation off
pub fn disable() {
    set(&ConfigUpdate::new().enabled(false));
}

/// Set the generation mode
pub fn set_mode(mode: GenerationMode) {
    set(&ConfigUpdate::new().mode(mode));
}

/// Set an explicit namespace; a blank value restores auto-detection
pub fn set_namespace(namespace: impl Into<String>) {
    set(&ConfigUpdate::new().namespace(namespace));
}

/// Drop the explicit namespace and re-run auto-detection on next read
pub fn reset_namespace() {
    set(&ConfigUpdate::new().namespace(""));
    namespace::reset_cache();
}

/// Toggle debug logging
pub fn set_debug_logging(enabled: bool) {
    set(&ConfigUpdate::new().debug_logging(enabled));
}

/// Toggle collision detection
pub fn set_collision_detection(enabled: bool) {
    set(&ConfigUpdate::new().collision_detection(enabled));
}

/// Toggle element-type base labels
pub fn set_include_component_names(include: bool) {
    set(&ConfigUpdate::new().include_component_names(include));
}

/// Toggle element-type enrichment
pub fn set_include_element_types(include: bool) {
    set(&ConfigUpdate::new().include_element_types(include));
}

struct ScopeGuard {
    depth: usize,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPED.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.truncate(self.depth);
        });
        trace!(depth = self.depth, "popped scoped generation config");
    }
}

/// Run `body` with `config` shadowing the process-wide configuration.
///
/// Overrides nest; the innermost one wins. The override belongs to the
/// calling task only and is removed when the body returns or unwinds.
pub fn with_scoped_override<R>(config: GenerationConfig, body: impl FnOnce() -> R) -> R {
    let frame = SyncFrame {
        seq: next_scope(),
        task: current_task(),
        config,
    };
    let depth = SCOPED.with(|stack| {
        let mut stack = stack.borrow_mut();
        let depth = stack.len();
        stack.push(frame);
        depth
    });
    trace!(depth, "pushed scoped generation config");
    let _guard = ScopeGuard { depth };
    body()
}

/// Run `future` with `config` shadowing the process-wide configuration.
///
/// The override follows the future across `.await` points and worker
/// threads, and is invisible to every other task.
#[cfg(feature = "tokio")]
pub async fn with_scoped_override_async<F>(config: GenerationConfig, future: F) -> F::Output
where
    F: std::future::Future,
{
    TASK_SCOPED.scope((next_scope(), config), future).await
}
