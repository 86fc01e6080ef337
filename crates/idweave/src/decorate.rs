//! Decoration layer: attaching identifiers and labels to components.
//!
//! A decoration call moves one component through
//! `Undecorated -> BasicDecorated -> FullyDecorated`:
//!
//! - [`Decorator::basic`] resolves context, config, identifier and label and
//!   attaches them. The component itself is not touched.
//! - [`Decorator::full`] runs `basic` and hands the result to a
//!   [`ConformanceCollaborator`]. Identifier and label are never computed a
//!   second time, and a collaborator cannot replace them.
//!
//! Components opt into inference by implementing [`Describable`]; with the
//! `derive` feature it can be derived.
//!
//! # Example
//!
//! ```
//! use idweave::prelude::*;
//!
//! struct SaveButton;
//!
//! impl Describable for SaveButton {
//!     fn element_type(&self) -> Option<String> {
//!         Some("Button".into())
//!     }
//!     fn text_content(&self) -> Option<String> {
//!         Some("Save".into())
//!     }
//! }
//!
//! let decorator = Decorator::new()
//!     .with_session(std::sync::Arc::new(GenerationSession::new()))
//!     .with_config(GenerationConfig::new().with_namespace("App"));
//! let decorated = push_named("main", || {
//!     decorator.basic(SaveButton, &DecorationOptions::new().name("SaveButton"))
//! });
//! assert_eq!(decorated.identifier(), Some("App.main.SaveButton"));
//! assert_eq!(decorated.label(), Some("Save"));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::GenerationConfig;
use crate::context::{self, ContextPath};
use crate::generator::{GeneratedIdentifier, IdentityDescriptor};
use crate::label::LabelResolver;
use crate::session::{self, GenerationSession};
use crate::store;

/// Identity signals a component exposes for inference.
///
/// Every method has a default, so a component implements only what it
/// knows about itself.
pub trait Describable {
    /// Developer-supplied name
    fn explicit_name(&self) -> Option<String> {
        None
    }

    /// Element kind such as `Button`
    fn element_type(&self) -> Option<String> {
        None
    }

    /// Visible text
    fn text_content(&self) -> Option<String> {
        None
    }

    /// Accessibility label override
    fn accessibility_label(&self) -> Option<String> {
        None
    }

    /// Whether this component opts out of decoration
    fn skips_decoration(&self) -> bool {
        false
    }

    /// Identifier assigned by hand, bypassing generation
    fn manual_identifier(&self) -> Option<String> {
        None
    }

    /// Collect the signals into a descriptor
    fn describe(&self) -> IdentityDescriptor {
        IdentityDescriptor {
            explicit_name: self.explicit_name(),
            element_type: self.element_type(),
            explicit_label: self.accessibility_label(),
            inferred_text_content: self.text_content(),
        }
    }
}

impl<T: Describable + ?Sized> Describable for &T {
    fn explicit_name(&self) -> Option<String> {
        (**self).explicit_name()
    }

    fn element_type(&self) -> Option<String> {
        (**self).element_type()
    }

    fn text_content(&self) -> Option<String> {
        (**self).text_content()
    }

    fn accessibility_label(&self) -> Option<String> {
        (**self).accessibility_label()
    }

    fn skips_decoration(&self) -> bool {
        (**self).skips_decoration()
    }

    fn manual_identifier(&self) -> Option<String> {
        (**self).manual_identifier()
    }
}

impl Describable for str {
    fn element_type(&self) -> Option<String> {
        Some("Text".to_string())
    }

    fn text_content(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Describable for String {
    fn element_type(&self) -> Option<String> {
        self.as_str().element_type()
    }

    fn text_content(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Conversion used by `#[derive(Describable)]` for annotated fields
#[doc(hidden)]
pub trait DescribeField {
    /// The field as an optional signal
    fn describe_field(&self) -> Option<String>;
}

impl DescribeField for str {
    fn describe_field(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl DescribeField for String {
    fn describe_field(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl<T: DescribeField + ?Sized> DescribeField for &T {
    fn describe_field(&self) -> Option<String> {
        (**self).describe_field()
    }
}

impl<T: DescribeField> DescribeField for Option<T> {
    fn describe_field(&self) -> Option<String> {
        self.as_ref().and_then(DescribeField::describe_field)
    }
}

/// Explicit parameters of one decoration call.
///
/// Each value set here takes precedence over what the component reports
/// through [`Describable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationOptions {
    /// Explicit name
    pub name: Option<String>,
    /// Element type
    pub element_type: Option<String>,
    /// Text standing in for the component's visible text
    pub label: Option<String>,
    /// Accessibility label override
    pub accessibility_label: Option<String>,
    /// Manually assigned identifier
    pub manual_identifier: Option<String>,
    /// Skip decoration for this call
    pub skip: bool,
}

impl DecorationOptions {
    /// No explicit parameters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the element type
    #[must_use]
    pub fn element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    /// Set the text used for inference
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the accessibility label override
    #[must_use]
    pub fn accessibility_label(mut self, label: impl Into<String>) -> Self {
        self.accessibility_label = Some(label.into());
        self
    }

    /// Assign the identifier by hand
    #[must_use]
    pub fn manual_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.manual_identifier = Some(identifier.into());
        self
    }

    /// Opt out of decoration
    #[must_use]
    pub const fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Merge these options over the component's own signals.
    ///
    /// Blank option values count as absent and leave the component's own
    /// signal in place.
    #[must_use]
    pub fn identity_for<C: Describable + ?Sized>(&self, component: &C) -> IdentityDescriptor {
        let own = component.describe();
        IdentityDescriptor {
            explicit_name: present(self.name.as_ref()).or(own.explicit_name),
            element_type: present(self.element_type.as_ref()).or(own.element_type),
            explicit_label: present(self.accessibility_label.as_ref()).or(own.explicit_label),
            inferred_text_content: present(self.label.as_ref()).or(own.inferred_text_content),
        }
    }

    fn manual_for<C: Describable + ?Sized>(&self, component: &C) -> Option<String> {
        present(self.manual_identifier.as_ref())
            .or_else(|| component.manual_identifier())
            .filter(|id| !id.trim().is_empty())
    }
}

fn present(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Where a decoration call ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorationState {
    /// Nothing attached (opt-out)
    #[default]
    Undecorated,
    /// Identifier and label attached
    BasicDecorated,
    /// Basic decoration plus conformance
    FullyDecorated,
}

/// A component together with what decoration attached to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorated<C> {
    inner: C,
    identifier: Option<String>,
    label: Option<String>,
    state: DecorationState,
    generated: Option<GeneratedIdentifier>,
    manual: bool,
    adjustments: Vec<String>,
}

impl<C> Decorated<C> {
    fn undecorated(inner: C) -> Self {
        Self {
            inner,
            identifier: None,
            label: None,
            state: DecorationState::Undecorated,
            generated: None,
            manual: false,
            adjustments: Vec::new(),
        }
    }

    /// Attached identifier
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Attached accessibility label
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// State reached by the decoration call
    #[must_use]
    pub const fn state(&self) -> DecorationState {
        self.state
    }

    /// Generator output, absent for opt-out and manual identifiers
    #[must_use]
    pub const fn generated(&self) -> Option<&GeneratedIdentifier> {
        self.generated.as_ref()
    }

    /// Whether the identifier was assigned by hand
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        self.manual
    }

    /// Structural adjustments recorded by conformance
    #[must_use]
    pub fn adjustments(&self) -> &[String] {
        &self.adjustments
    }

    /// Note a structural adjustment
    pub fn record_adjustment(&mut self, adjustment: impl Into<String>) {
        self.adjustments.push(adjustment.into());
    }

    /// The wrapped component
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Mutable access to the wrapped component
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwrap the component, dropping the decoration
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Transform the component, keeping identifier and label
    pub fn map<D>(self, f: impl FnOnce(C) -> D) -> Decorated<D> {
        Decorated {
            inner: f(self.inner),
            identifier: self.identifier,
            label: self.label,
            state: self.state,
            generated: self.generated,
            manual: self.manual,
            adjustments: self.adjustments,
        }
    }
}

/// Applies platform conformance to a basic-decorated component
pub trait ConformanceCollaborator<C> {
    /// Adjust `component`; `element_type_hint` is the resolved element type
    fn apply_conformance(
        &self,
        component: Decorated<C>,
        element_type_hint: Option<&str>,
    ) -> Decorated<C>;
}

impl<C, F> ConformanceCollaborator<C> for F
where
    F: Fn(Decorated<C>, Option<&str>) -> Decorated<C>,
{
    fn apply_conformance(
        &self,
        component: Decorated<C>,
        element_type_hint: Option<&str>,
    ) -> Decorated<C> {
        self(component, element_type_hint)
    }
}

/// Collaborator that leaves components unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConformance;

impl<C> ConformanceCollaborator<C> for NoConformance {
    fn apply_conformance(&self, component: Decorated<C>, _hint: Option<&str>) -> Decorated<C> {
        component
    }
}

/// Entry point for basic and full decoration.
///
/// Reads config from the store unless one is pinned with
/// [`with_config`](Self::with_config).
#[derive(Debug, Clone)]
pub struct Decorator {
    session: Arc<GenerationSession>,
    labels: LabelResolver,
    config: Option<GenerationConfig>,
}

impl Default for Decorator {
    fn default() -> Self {
        Self {
            session: session::global(),
            labels: LabelResolver::default(),
            config: None,
        }
    }
}

impl Decorator {
    /// Decorator over the global session and store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `session` for collision state and the debug log
    #[must_use]
    pub fn with_session(mut self, session: Arc<GenerationSession>) -> Self {
        self.session = session;
        self
    }

    /// Use `labels` for label resolution
    #[must_use]
    pub fn with_label_resolver(mut self, labels: LabelResolver) -> Self {
        self.labels = labels;
        self
    }

    /// Pin the config instead of reading the store
    #[must_use]
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The backing session
    #[must_use]
    pub fn session(&self) -> &Arc<GenerationSession> {
        &self.session
    }

    /// Config in effect for the calling unit of work
    #[must_use]
    pub fn active_config(&self) -> GenerationConfig {
        self.config.clone().unwrap_or_else(store::get)
    }

    /// Attach identifier and label at the ambient context path
    pub fn basic<C: Describable>(&self, component: C, options: &DecorationOptions) -> Decorated<C> {
        self.basic_at(component, options, &context::current_path())
    }

    /// Attach identifier and label at an explicit context path
    pub fn basic_at<C: Describable>(
        &self,
        component: C,
        options: &DecorationOptions,
        path: &ContextPath,
    ) -> Decorated<C> {
        if options.skip || component.skips_decoration() {
            trace!(path = %path, "decoration skipped");
            return Decorated::undecorated(component);
        }

        let identity = options.identity_for(&component);
        let label = self.labels.resolve(&identity);

        let (identifier, generated, manual) = match options.manual_for(&component) {
            Some(manual) => {
                trace!(identifier = %manual, "manual identifier");
                (Some(manual), None, true)
            }
            None => {
                let config = self.active_config();
                let generated = self.session.generate(&identity, path, &config);
                let identifier = (!generated.is_empty()).then(|| generated.value.clone());
                (identifier, Some(generated), false)
            }
        };

        Decorated {
            inner: component,
            identifier,
            label,
            state: DecorationState::BasicDecorated,
            generated,
            manual,
            adjustments: Vec::new(),
        }
    }

    /// Basic decoration followed by conformance
    pub fn full<C, K>(&self, component: C, options: &DecorationOptions, conformance: &K) -> Decorated<C>
    where
        C: Describable,
        K: ConformanceCollaborator<C> + ?Sized,
    {
        self.full_at(component, options, conformance, &context::current_path())
    }

    /// Full decoration at an explicit context path
    pub fn full_at<C, K>(
        &self,
        component: C,
        options: &DecorationOptions,
        conformance: &K,
        path: &ContextPath,
    ) -> Decorated<C>
    where
        C: Describable,
        K: ConformanceCollaborator<C> + ?Sized,
    {
        let basic = self.basic_at(component, options, path);
        if basic.state == DecorationState::Undecorated {
            return basic;
        }

        let hint = options
            .element_type
            .clone()
            .or_else(|| basic.inner.element_type());
        let identifier = basic.identifier.clone();
        let label = basic.label.clone();
        let generated = basic.generated.clone();
        let manual = basic.manual;

        let adjusted = conformance.apply_conformance(basic, hint.as_deref());
        Decorated {
            inner: adjusted.inner,
            identifier,
            label,
            state: DecorationState::FullyDecorated,
            generated,
            manual,
            adjustments: adjusted.adjustments,
        }
    }
}

/// Method-call form of decoration over the default [`Decorator`]
pub trait DecorateExt: Describable + Sized {
    /// Basic decoration with no explicit parameters
    fn decorate(self) -> Decorated<Self> {
        Decorator::new().basic(self, &DecorationOptions::new())
    }

    /// Basic decoration with explicit parameters
    fn decorate_with(self, options: &DecorationOptions) -> Decorated<Self> {
        Decorator::new().basic(self, options)
    }

    /// Full decoration with explicit parameters
    fn decorate_full<K>(self, options: &DecorationOptions, conformance: &K) -> Decorated<Self>
    where
        K: ConformanceCollaborator<Self> + ?Sized,
    {
        Decorator::new().full(self, options, conformance)
    }
}

impl<T: Describable + Sized> DecorateExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMode;
    use crate::context::push_named;
    use crate::label::CatalogLocalization;
    use crate::tree::ComponentNode;

    #[derive(Debug, Clone, PartialEq)]
    struct Button {
        title: String,
        min_height: u32,
    }

    impl Button {
        fn new(title: &str) -> Self {
            Self {
                title: title.to_string(),
                min_height: 20,
            }
        }
    }

    impl Describable for Button {
        fn element_type(&self) -> Option<String> {
            Some("Button".into())
        }

        fn text_content(&self) -> Option<String> {
            Some(self.title.clone())
        }
    }

    struct Card;

    impl Describable for Card {
        fn explicit_name(&self) -> Option<String> {
            Some("Real".into())
        }

        fn element_type(&self) -> Option<String> {
            Some("Button".into())
        }

        fn text_content(&self) -> Option<String> {
            Some("Buy now".into())
        }

        fn manual_identifier(&self) -> Option<String> {
            Some("shop.buy".into())
        }
    }

    struct Hidden;

    impl Describable for Hidden {
        fn skips_decoration(&self) -> bool {
            true
        }
    }

    fn decorator() -> Decorator {
        Decorator::new()
            .with_session(Arc::new(GenerationSession::new()))
            .with_config(GenerationConfig::new().with_namespace("App"))
    }

    fn touch_target(mut decorated: Decorated<Button>, hint: Option<&str>) -> Decorated<Button> {
        if hint == Some("Button") {
            decorated.inner_mut().min_height = 44;
            decorated.record_adjustment("min-height 44");
        }
        decorated
    }

    mod basic_tests {
        use super::*;

        #[test]
        fn test_attaches_identifier_and_label() {
            let decorated = push_named("main", || {
                decorator().basic(Button::new("Save"), &DecorationOptions::new().name("SaveButton"))
            });
            assert_eq!(decorated.identifier(), Some("App.main.SaveButton"));
            assert_eq!(decorated.label(), Some("Save"));
            assert_eq!(decorated.state(), DecorationState::BasicDecorated);
            assert_eq!(decorated.inner(), &Button::new("Save"));
        }

        #[test]
        fn test_explicit_options_override_inference() {
            let options = DecorationOptions::new()
                .element_type("Link")
                .label("Open")
                .accessibility_label("Open the file");
            let decorated = decorator()
                .with_config(
                    GenerationConfig::new()
                        .with_namespace("App")
                        .with_component_names(false),
                )
                .basic(Button::new("Save"), &options);
            assert_eq!(decorated.identifier(), Some("App.open"));
            assert_eq!(decorated.label(), Some("Open the file"));
        }

        #[test]
        fn test_opt_out_attaches_nothing() {
            let session = Arc::new(GenerationSession::new());
            let decorator = decorator().with_session(Arc::clone(&session));
            let decorated = decorator.basic(Hidden, &DecorationOptions::new().name("Secret"));
            assert_eq!(decorated.state(), DecorationState::Undecorated);
            assert_eq!(decorated.identifier(), None);
            assert_eq!(decorated.label(), None);
            assert_eq!(session.generated_count(), 0);
        }

        #[test]
        fn test_skip_option_wins_over_manual_identifier() {
            let options = DecorationOptions::new().manual_identifier("fixed").skip();
            let decorated = decorator().basic(Button::new("Save"), &options);
            assert_eq!(decorated.identifier(), None);
        }

        #[test]
        fn test_manual_identifier_bypasses_generator() {
            let session = Arc::new(GenerationSession::new());
            let decorator = decorator().with_session(Arc::clone(&session));
            let options = DecorationOptions::new().manual_identifier("checkout.pay");
            let decorated = decorator.basic(Button::new("Pay"), &options);
            assert_eq!(decorated.identifier(), Some("checkout.pay"));
            assert!(decorated.is_manual());
            assert!(decorated.generated().is_none());
            assert_eq!(session.generated_count(), 0);
        }

        #[test]
        fn test_blank_manual_identifier_is_ignored() {
            let options = DecorationOptions::new().manual_identifier("  ");
            let decorated = decorator().basic(Button::new("Pay"), &options);
            assert!(!decorated.is_manual());
            assert_eq!(decorated.identifier(), Some("App.Button"));
        }

        #[test]
        fn test_blank_options_keep_component_signals() {
            let options = DecorationOptions::new()
                .name("  ")
                .label("")
                .accessibility_label(" ")
                .element_type("");
            let identity = options.identity_for(&Card);
            assert_eq!(identity.explicit_name.as_deref(), Some("Real"));
            assert_eq!(identity.element_type.as_deref(), Some("Button"));
            assert_eq!(identity.inferred_text_content.as_deref(), Some("Buy now"));
            assert_eq!(identity.explicit_label, None);
        }

        #[test]
        fn test_blank_manual_option_keeps_component_identifier() {
            let options = DecorationOptions::new().manual_identifier(" ").name("  ").label("");
            let decorated = decorator().basic(Card, &options);
            assert_eq!(decorated.identifier(), Some("shop.buy"));
            assert_eq!(decorated.label(), Some("Buy now"));
            assert!(decorated.is_manual());
        }

        #[test]
        fn test_blank_name_option_keeps_generated_name() {
            let card = ComponentNode::new("Button").named("Real").text("Buy now");
            let options = DecorationOptions::new().name("  ").label("");
            let decorated = decorator().basic(card, &options);
            assert_eq!(decorated.identifier(), Some("App.Real"));
            assert_eq!(decorated.label(), Some("Buy now"));
        }

        #[test]
        fn test_disabled_keeps_label_without_identifier() {
            let decorated = decorator()
                .with_config(GenerationConfig::disabled())
                .basic(Button::new("Save"), &DecorationOptions::new());
            assert_eq!(decorated.identifier(), None);
            assert_eq!(decorated.label(), Some("Save"));
            assert_eq!(decorated.state(), DecorationState::BasicDecorated);
        }

        #[test]
        fn test_localized_label() {
            let catalog = CatalogLocalization::new().with_entry("es", "Save", "Guardar");
            let decorated = decorator()
                .with_label_resolver(
                    LabelResolver::new()
                        .with_provider(Arc::new(catalog))
                        .with_locale("es"),
                )
                .basic(Button::new("Save"), &DecorationOptions::new());
            assert_eq!(decorated.label(), Some("Guardar"));
        }

        #[test]
        fn test_reads_scoped_override_without_pinned_config() {
            let decorator = Decorator::new().with_session(Arc::new(GenerationSession::new()));
            let config = GenerationConfig::new()
                .with_namespace("Scoped")
                .with_mode(GenerationMode::Minimal);
            let decorated = store::with_scoped_override(config, || {
                push_named("deep", || decorator.basic("Hello", &DecorationOptions::new()))
            });
            assert_eq!(decorated.identifier(), Some("Scoped.Text"));
        }

        #[test]
        fn test_plain_text_components() {
            let decorated = decorator().basic(String::from("Welcome"), &DecorationOptions::new());
            assert_eq!(decorated.identifier(), Some("App.Text"));
            assert_eq!(decorated.label(), Some("Welcome"));
        }

        #[test]
        fn test_map_keeps_decoration() {
            let decorated = decorator()
                .basic(Button::new("Go"), &DecorationOptions::new())
                .map(|button| button.title);
            assert_eq!(decorated.inner(), "Go");
            assert_eq!(decorated.identifier(), Some("App.Button"));
        }
    }

    mod full_tests {
        use super::*;

        #[test]
        fn test_full_matches_basic_and_adds_conformance() {
            let options = DecorationOptions::new().name("SaveButton");
            let basic = decorator().basic(Button::new("Save"), &options);
            let full = decorator().full(Button::new("Save"), &options, &touch_target);
            assert_eq!(full.identifier(), basic.identifier());
            assert_eq!(full.label(), basic.label());
            assert_eq!(full.state(), DecorationState::FullyDecorated);
            assert_eq!(full.inner().min_height, 44);
            assert_eq!(full.adjustments(), ["min-height 44"]);
        }

        #[test]
        fn test_full_generates_once() {
            let session = Arc::new(GenerationSession::new());
            let decorator = decorator().with_session(Arc::clone(&session));
            let _ = decorator.full(Button::new("Save"), &DecorationOptions::new(), &NoConformance);
            assert_eq!(session.generated_count(), 1);
        }

        #[test]
        fn test_conformance_cannot_replace_identifier() {
            let rogue = |decorated: Decorated<Button>, _hint: Option<&str>| {
                decorated.map(|mut button| {
                    button.title = "changed".into();
                    button
                })
            };
            let full = decorator().full(Button::new("Save"), &DecorationOptions::new(), &rogue);
            assert_eq!(full.identifier(), Some("App.Button"));
            assert_eq!(full.label(), Some("Save"));
            assert_eq!(full.inner().title, "changed");
        }

        #[test]
        fn test_full_respects_opt_out() {
            let calls = std::cell::Cell::new(0);
            let counting = |decorated: Decorated<Hidden>, _hint: Option<&str>| {
                calls.set(calls.get() + 1);
                decorated
            };
            let full = decorator().full(Hidden, &DecorationOptions::new(), &counting);
            assert_eq!(full.state(), DecorationState::Undecorated);
            assert_eq!(calls.get(), 0);
        }

        #[test]
        fn test_hint_prefers_explicit_element_type() {
            let options = DecorationOptions::new().element_type("Link");
            let full = decorator().full(Button::new("Save"), &options, &touch_target);
            assert_eq!(full.inner().min_height, 20);
            assert!(full.adjustments().is_empty());
        }
    }
}
