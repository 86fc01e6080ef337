//! Idweave: stable UI-test identifiers and accessibility labels
//!
//! Idweave attaches a deterministic, hierarchical identifier and an
//! accessibility label to every component of a declarative UI tree, so UI
//! tests can locate elements without hand-assigned ids.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        IDWEAVE Pipeline                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐  │
//! │  │ Config   │   │ Context  │   │ Generator │   │ Label    │  │
//! │  │ Store    │──►│ Resolver │──►│ + Session │──►│ Resolver │  │
//! │  └──────────┘   └──────────┘   └───────────┘   └──────────┘  │
//! │        │                                             │        │
//! │        └──────────────► Decorator ◄──────────────────┘        │
//! │                  basic ──► conformance ──► full               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use idweave::prelude::*;
//!
//! let config = GenerationConfig::new().with_namespace("App");
//! let session = GenerationSession::new();
//! let identity = IdentityDescriptor::new()
//!     .with_name("SaveButton")
//!     .with_element_type("Button");
//!
//! let id = session.generate(&identity, &ContextPath::screen("main"), &config);
//! assert_eq!(id.value, "App.main.SaveButton");
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Generation policy and its serialized update form
pub mod config;
/// Context paths and tree-scoped segment stacks
pub mod context;
/// Debug log entries and sinks
pub mod debug;
/// Decoration layer
pub mod decorate;
/// Identifier generation
pub mod generator;
/// Accessibility labels and localization
pub mod label;
/// Optional subscriber setup
pub mod logging;
/// Namespace auto-detection
pub mod namespace;
mod result;
/// Collision state and debug log ownership
pub mod session;
/// Process-wide config with scoped overrides
pub mod store;
/// Renderer-agnostic component trees
pub mod tree;

pub use config::{ConfigUpdate, GenerationConfig, GenerationMode};
pub use context::{current_path, push_named, with_path, with_screen, ContextPath};
pub use debug::{DebugLogEntry, DebugSink, MemorySink, TracingSink};
pub use decorate::{
    ConformanceCollaborator, DecorateExt, Decorated, DecorationOptions, DecorationState,
    Describable, Decorator, NoConformance,
};
pub use generator::{
    sanitize_text_token, GeneratedIdentifier, IdentifierGenerator, IdentityDescriptor,
};
pub use label::{CatalogLocalization, LabelResolver, Locale, LocalizationProvider};
pub use namespace::{
    HostIdentityProvider, ProcessHostIdentity, StaticHostIdentity, FALLBACK_NAMESPACE,
    HARNESS_NAMESPACE,
};
pub use result::{IdweaveError, IdweaveResult};
pub use session::GenerationSession;
pub use tree::{ComponentNode, DecoratedNode};

#[cfg(feature = "derive")]
pub use idweave_derive::Describable;

/// Common imports
pub mod prelude {
    pub use super::config::{ConfigUpdate, GenerationConfig, GenerationMode};
    pub use super::context::{current_path, push_named, with_screen, ContextPath};
    pub use super::debug::{DebugLogEntry, DebugSink, MemorySink, TracingSink};
    pub use super::decorate::{
        ConformanceCollaborator, DecorateExt, Decorated, DecorationOptions, DecorationState,
        Describable, Decorator, NoConformance,
    };
    pub use super::generator::{GeneratedIdentifier, IdentifierGenerator, IdentityDescriptor};
    pub use super::label::{CatalogLocalization, LabelResolver, Locale, LocalizationProvider};
    pub use super::result::{IdweaveError, IdweaveResult};
    pub use super::session::GenerationSession;
    pub use super::store;
    pub use super::tree::{ComponentNode, DecoratedNode};

    #[cfg(feature = "derive")]
    pub use idweave_derive::Describable;
}
