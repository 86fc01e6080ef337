//! Namespace auto-detection.
//!
//! When no namespace has been configured explicitly, the root prefix of every
//! identifier is resolved once per process through a fixed chain:
//!
//! 1. explicit value (handled by [`GenerationConfig`](crate::GenerationConfig))
//! 2. the host application's self-reported name
//! 3. [`HARNESS_NAMESPACE`] when running inside idweave's own test harness
//! 4. [`FALLBACK_NAMESPACE`]
//!
//! The result is cached until [`reset_cache`] or a new provider is installed.
//! The chain never fails and always ends in a non-empty string.

use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::config::parse_bool_lenient;

/// Namespace used when nothing else can be detected
pub const FALLBACK_NAMESPACE: &str = "app";

/// Reserved namespace for idweave's own test harness
pub const HARNESS_NAMESPACE: &str = "IdweaveTests";

/// Environment variable that marks the framework harness
pub const HARNESS_ENV: &str = "IDWEAVE_HARNESS";

/// Source of the embedding application's identity
pub trait HostIdentityProvider: Send + Sync {
    /// The application's self-reported name, if any
    fn application_name(&self) -> Option<String>;

    /// Whether the process is idweave's own test harness
    fn is_framework_harness(&self) -> bool {
        false
    }
}

/// Identity derived from the running executable.
///
/// Cargo test binaries (`target/<profile>/deps/<name>-<hash>`) report no
/// application name. They count as the framework harness when cargo runs
/// them for the `idweave` package, or when [`HARNESS_ENV`] is truthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessHostIdentity;

impl ProcessHostIdentity {
    fn executable() -> Option<std::path::PathBuf> {
        std::env::current_exe().ok()
    }
}

impl HostIdentityProvider for ProcessHostIdentity {
    fn application_name(&self) -> Option<String> {
        let exe = Self::executable()?;
        if is_test_binary(&exe) {
            return None;
        }
        exe.file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::trim)
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
    }

    fn is_framework_harness(&self) -> bool {
        if std::env::var(HARNESS_ENV)
            .ok()
            .as_deref()
            .and_then(parse_bool_lenient)
            .unwrap_or(false)
        {
            return true;
        }
        let under_cargo_for_idweave = std::env::var("CARGO_PKG_NAME")
            .map(|name| name == "idweave")
            .unwrap_or(false);
        under_cargo_for_idweave && Self::executable().is_some_and(|exe| is_test_binary(&exe))
    }
}

/// Fixed identity, for hosts that know their name and for tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticHostIdentity {
    name: Option<String>,
    harness: bool,
}

impl StaticHostIdentity {
    /// Identity reporting `name`
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            harness: false,
        }
    }

    /// Identity reporting nothing
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Mark as the framework harness
    #[must_use]
    pub const fn harness(mut self) -> Self {
        self.harness = true;
        self
    }
}

impl HostIdentityProvider for StaticHostIdentity {
    fn application_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn is_framework_harness(&self) -> bool {
        self.harness
    }
}

/// Run the resolution chain without touching the cache
#[must_use]
pub fn resolve_with(explicit: Option<&str>, host: &dyn HostIdentityProvider) -> String {
    if let Some(explicit) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return explicit.to_string();
    }
    if let Some(name) = host
        .application_name()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
    {
        return name;
    }
    if host.is_framework_harness() {
        return HARNESS_NAMESPACE.to_string();
    }
    FALLBACK_NAMESPACE.to_string()
}

struct Resolver {
    provider: Option<Arc<dyn HostIdentityProvider>>,
    cached: Option<String>,
    /// Bumped whenever the provider or cache is reset
    epoch: u64,
}

fn resolver() -> &'static RwLock<Resolver> {
    static RESOLVER: OnceLock<RwLock<Resolver>> = OnceLock::new();
    RESOLVER.get_or_init(|| {
        RwLock::new(Resolver {
            provider: None,
            cached: None,
            epoch: 0,
        })
    })
}

/// The auto-detected namespace, resolved on first use and cached.
///
/// The provider is consulted with no lock held. When two callers race, the
/// first value stored wins; a value computed against a provider that was
/// replaced in the meantime is returned but not cached.
#[must_use]
pub fn resolve_namespace() -> String {
    let (provider, epoch) = {
        let guard = resolver().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = &guard.cached {
            return cached.clone();
        }
        (guard.provider.clone(), guard.epoch)
    };

    let resolved = match &provider {
        Some(provider) => resolve_with(None, provider.as_ref()),
        None => resolve_with(None, &ProcessHostIdentity),
    };

    let mut guard = resolver().write().unwrap_or_else(PoisonError::into_inner);
    if guard.epoch != epoch {
        return resolved;
    }
    if let Some(cached) = &guard.cached {
        return cached.clone();
    }
    debug!(namespace = %resolved, "resolved identifier namespace");
    guard.cached = Some(resolved.clone());
    resolved
}

/// Install a host identity provider and drop the cached namespace
pub fn set_host_identity_provider(provider: Arc<dyn HostIdentityProvider>) {
    let mut guard = resolver().write().unwrap_or_else(PoisonError::into_inner);
    guard.provider = Some(provider);
    guard.cached = None;
    guard.epoch += 1;
}

/// Forget the cached namespace so the next read resolves again
pub fn reset_cache() {
    let mut guard = resolver().write().unwrap_or_else(PoisonError::into_inner);
    guard.cached = None;
    guard.epoch += 1;
}

fn is_test_binary(exe: &Path) -> bool {
    let in_deps = exe
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|dir| dir == "deps");
    let hashed = exe
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('-'))
        .is_some_and(|(_, hash)| hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()));
    in_deps && hashed
}
