//! Identifier generator.
//!
//! Turns a component's semantic identity, its context path and the active
//! policy into a dot-joined identifier such as `App.main.list.ItemCard`.
//!
//! # Algorithm
//!
//! 1. Disabled config: empty identifier.
//! 2. Base label: explicit name, else the element type (when component names
//!    are included), else a sanitized bounded token of the text content,
//!    else `element-<n>` from a session counter.
//! 3. Raw candidate: namespace, path segments and base label joined by `.`;
//!    minimal mode drops the path. Semantic mode may append `-<type>`.
//! 4. Collision detection: repeated raw candidates get `-2`, `-3`, ...
//! 5. Debug logging: the call is appended to the session log.
//!
//! Steps 4 and 5 live in [`GenerationSession`]; this module holds the pure
//! parts. Generation never fails.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{GenerationConfig, GenerationMode};
use crate::context::ContextPath;
use crate::session::{self, GenerationSession};

/// Maximum length of a token derived from text content
pub const MAX_TEXT_TOKEN_LEN: usize = 32;

/// Hex digits of the digest appended to truncated text tokens
pub const TEXT_DIGEST_LEN: usize = 8;

/// Base label used when nothing else yields a usable token
pub const FALLBACK_TOKEN: &str = "element";

/// Identity signals of one component, built per decoration call
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityDescriptor {
    /// Developer-supplied name
    pub explicit_name: Option<String>,
    /// Element kind such as `Button` or `Text`
    pub element_type: Option<String>,
    /// Accessibility label override
    pub explicit_label: Option<String>,
    /// Visible text of the component
    pub inferred_text_content: Option<String>,
}

impl IdentityDescriptor {
    /// An empty descriptor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.explicit_name = Some(name.into());
        self
    }

    /// Set the element type
    #[must_use]
    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    /// Set the label override
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.explicit_label = Some(label.into());
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.inferred_text_content = Some(text.into());
        self
    }

    /// Compact description used in debug logs
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if let Some(name) = &self.explicit_name {
            parts.push(format!("name={name}"));
        }
        if let Some(element_type) = &self.element_type {
            parts.push(format!("type={element_type}"));
        }
        if let Some(label) = &self.explicit_label {
            parts.push(format!("label={label:?}"));
        }
        if let Some(text) = &self.inferred_text_content {
            parts.push(format!("text={text:?}"));
        }
        if parts.is_empty() {
            "<anonymous>".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Result of one generation call
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratedIdentifier {
    /// Final identifier
    pub value: String,
    /// Candidate before disambiguation
    pub raw: String,
    /// Suffix appended after a collision
    pub disambiguator: Option<String>,
}

impl GeneratedIdentifier {
    /// The empty identifier returned when generation is disabled
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether nothing was generated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Whether a disambiguator was appended
    #[must_use]
    pub fn was_disambiguated(&self) -> bool {
        self.disambiguator.is_some()
    }

    /// The identifier string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for GeneratedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Where the base label came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BaseLabel {
    Explicit(String),
    ElementType(String),
    Text(String),
    Fallback,
}

impl BaseLabel {
    pub(crate) fn select(identity: &IdentityDescriptor, config: &GenerationConfig) -> Self {
        if let Some(name) = non_blank(identity.explicit_name.as_deref()) {
            return Self::Explicit(name.to_string());
        }
        if config.include_component_names {
            if let Some(element_type) = non_blank(identity.element_type.as_deref()) {
                return Self::ElementType(element_type.to_string());
            }
        }
        identity
            .inferred_text_content
            .as_deref()
            .map(sanitize_text_token)
            .filter(|token| !token.is_empty())
            .map_or(Self::Fallback, Self::Text)
    }
}

/// Lowercase, dash-separated, bounded token for text content.
///
/// Non-alphanumeric runs collapse to a single `-`; leading and trailing
/// dashes are dropped. Tokens longer than [`MAX_TEXT_TOKEN_LEN`] are cut
/// and suffixed with a short SHA-256 digest of the full token, so long copy
/// stays distinguishable without growing the identifier. May return an
/// empty string.
#[must_use]
pub fn sanitize_text_token(text: &str) -> String {
    let mut token = String::with_capacity(text.len().min(MAX_TEXT_TOKEN_LEN * 2));
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !token.is_empty() {
                token.push('-');
            }
            pending_dash = false;
            token.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if token.len() <= MAX_TEXT_TOKEN_LEN {
        return token;
    }

    let digest = Sha256::digest(token.as_bytes());
    let hex: String = digest
        .iter()
        .take(TEXT_DIGEST_LEN / 2)
        .map(|byte| format!("{byte:02x}"))
        .collect();
    let keep = MAX_TEXT_TOKEN_LEN - TEXT_DIGEST_LEN - 1;
    let head = token[..keep].trim_end_matches('-');
    format!("{head}-{hex}")
}

/// Build the raw candidate for a selected base label.
///
/// `fallback` supplies the counter value used for [`BaseLabel::Fallback`].
pub(crate) fn compose_candidate(
    base: &BaseLabel,
    identity: &IdentityDescriptor,
    path: &ContextPath,
    config: &GenerationConfig,
    namespace: &str,
    fallback: impl FnOnce() -> u64,
) -> String {
    let mut leaf = match base {
        BaseLabel::Explicit(label) | BaseLabel::ElementType(label) | BaseLabel::Text(label) => {
            label.clone()
        }
        BaseLabel::Fallback => format!("{FALLBACK_TOKEN}-{}", fallback()),
    };

    if config.mode == GenerationMode::Semantic
        && config.include_element_types
        && !matches!(base, BaseLabel::ElementType(_))
    {
        if let Some(suffix) = identity
            .element_type
            .as_deref()
            .map(sanitize_text_token)
            .filter(|suffix| !suffix.is_empty())
        {
            leaf.push('-');
            leaf.push_str(&suffix);
        }
    }

    let mut parts: Vec<&str> = Vec::with_capacity(path.len() + 2);
    parts.push(namespace);
    if config.mode.includes_context() {
        parts.extend(path.segments().iter().map(String::as_str));
    }
    parts.push(&leaf);
    parts.retain(|part| !part.is_empty());
    parts.join(".")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Front end over a [`GenerationSession`]
#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    session: Arc<GenerationSession>,
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::new(session::global())
    }
}

impl IdentifierGenerator {
    /// Generator bound to `session`
    #[must_use]
    pub fn new(session: Arc<GenerationSession>) -> Self {
        Self { session }
    }

    /// Generator bound to a fresh, private session
    #[must_use]
    pub fn isolated() -> Self {
        Self::new(Arc::new(GenerationSession::new()))
    }

    /// The backing session
    #[must_use]
    pub fn session(&self) -> &Arc<GenerationSession> {
        &self.session
    }

    /// Generate an identifier; see the module docs for the algorithm
    #[must_use]
    pub fn generate(
        &self,
        identity: &IdentityDescriptor,
        path: &ContextPath,
        config: &GenerationConfig,
    ) -> GeneratedIdentifier {
        self.session.generate(identity, path, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerationConfig {
        GenerationConfig::new().with_namespace("App")
    }

    fn compose(identity: &IdentityDescriptor, path: &[&str], config: &GenerationConfig) -> String {
        let base = BaseLabel::select(identity, config);
        compose_candidate(
            &base,
            identity,
            &ContextPath::from_segments(path),
            config,
            &config.resolved_namespace(),
            || 1,
        )
    }

    mod sanitize_tests {
        use super::*;

        #[test]
        fn test_hello_world() {
            assert_eq!(sanitize_text_token("Hello, World! 123"), "hello-world-123");
        }

        #[test]
        fn test_collapses_and_trims_separators() {
            assert_eq!(sanitize_text_token("  --Save   & Exit--  "), "save-exit");
        }

        #[test]
        fn test_non_ascii_only_is_empty() {
            assert_eq!(sanitize_text_token("¡¿…?!"), "");
        }

        #[test]
        fn test_long_text_is_bounded_and_stable() {
            let text = "This is a very long paragraph of marketing copy that keeps going";
            let token = sanitize_text_token(text);
            assert!(token.len() <= MAX_TEXT_TOKEN_LEN);
            assert_eq!(token, sanitize_text_token(text));
            assert!(token.starts_with("this-is-a-very-long"));
        }

        #[test]
        fn test_long_texts_with_same_prefix_differ() {
            let a = sanitize_text_token("Terms and conditions apply to every purchase made online");
            let b = sanitize_text_token("Terms and conditions apply to every purchase made in store");
            assert_ne!(a, b);
        }

        #[test]
        fn test_exact_bound_is_not_hashed() {
            let text = "a".repeat(MAX_TEXT_TOKEN_LEN);
            assert_eq!(sanitize_text_token(&text), text);
        }
    }

    mod base_label_tests {
        use super::*;

        #[test]
        fn test_explicit_name_first() {
            let identity = IdentityDescriptor::new()
                .with_name("SaveButton")
                .with_element_type("Button")
                .with_text("Save");
            assert_eq!(
                BaseLabel::select(&identity, &config()),
                BaseLabel::Explicit("SaveButton".into())
            );
        }

        #[test]
        fn test_element_type_when_component_names_included() {
            let identity = IdentityDescriptor::new().with_element_type("Toggle").with_text("Wifi");
            assert_eq!(
                BaseLabel::select(&identity, &config()),
                BaseLabel::ElementType("Toggle".into())
            );
        }

        #[test]
        fn test_text_when_component_names_excluded() {
            let identity = IdentityDescriptor::new().with_element_type("Toggle").with_text("Wifi");
            let config = config().with_component_names(false);
            assert_eq!(
                BaseLabel::select(&identity, &config),
                BaseLabel::Text("wifi".into())
            );
        }

        #[test]
        fn test_blank_name_is_ignored() {
            let identity = IdentityDescriptor::new().with_name("  ").with_text("Go");
            let config = config().with_component_names(false);
            assert_eq!(BaseLabel::select(&identity, &config), BaseLabel::Text("go".into()));
        }

        #[test]
        fn test_fallback_when_nothing_usable() {
            let identity = IdentityDescriptor::new().with_text("!!!");
            assert_eq!(BaseLabel::select(&identity, &config()), BaseLabel::Fallback);
        }
    }

    mod compose_tests {
        use super::*;

        #[test]
        fn test_automatic_mode_joins_path() {
            let identity = IdentityDescriptor::new()
                .with_name("SaveButton")
                .with_element_type("Button");
            assert_eq!(compose(&identity, &["main"], &config()), "App.main.SaveButton");
        }

        #[test]
        fn test_root_level_component() {
            let identity = IdentityDescriptor::new().with_name("Logo");
            assert_eq!(compose(&identity, &[], &config()), "App.Logo");
        }

        #[test]
        fn test_minimal_mode_drops_path() {
            let identity = IdentityDescriptor::new().with_name("Logo");
            let config = config().with_mode(GenerationMode::Minimal);
            assert_eq!(compose(&identity, &["main", "header"], &config), "App.Logo");
        }

        #[test]
        fn test_semantic_mode_appends_element_type() {
            let identity = IdentityDescriptor::new()
                .with_name("ItemCard")
                .with_element_type("Button");
            let config = GenerationConfig::new()
                .with_namespace("MyApp")
                .with_mode(GenerationMode::Semantic);
            assert_eq!(
                compose(&identity, &["main", "list"], &config),
                "MyApp.main.list.ItemCard-button"
            );
        }

        #[test]
        fn test_semantic_mode_without_element_types() {
            let identity = IdentityDescriptor::new()
                .with_name("ItemCard")
                .with_element_type("Button");
            let config = config()
                .with_mode(GenerationMode::Semantic)
                .with_element_types(false);
            assert_eq!(compose(&identity, &[], &config), "App.ItemCard");
        }

        #[test]
        fn test_semantic_mode_does_not_repeat_type_label() {
            let identity = IdentityDescriptor::new().with_element_type("Button");
            let config = config().with_mode(GenerationMode::Semantic);
            assert_eq!(compose(&identity, &[], &config), "App.Button");
        }

        #[test]
        fn test_fallback_uses_counter() {
            let identity = IdentityDescriptor::new();
            assert_eq!(compose(&identity, &["main"], &config()), "App.main.element-1");
        }

        #[test]
        fn test_text_token_in_candidate() {
            let identity = IdentityDescriptor::new().with_text("Hello, World! 123");
            let config = config().with_component_names(false);
            assert_eq!(compose(&identity, &[], &config), "App.hello-world-123");
        }
    }

    mod descriptor_tests {
        use super::*;

        #[test]
        fn test_summary_lists_present_fields() {
            let identity = IdentityDescriptor::new().with_name("Save").with_text("Save now");
            assert_eq!(identity.summary(), "name=Save text=\"Save now\"");
        }

        #[test]
        fn test_summary_anonymous() {
            assert_eq!(IdentityDescriptor::new().summary(), "<anonymous>");
        }

        #[test]
        fn test_empty_identifier() {
            let id = GeneratedIdentifier::empty();
            assert!(id.is_empty());
            assert!(!id.was_disambiguated());
            assert_eq!(id.to_string(), "");
        }
    }
}
