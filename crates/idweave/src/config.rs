//! Generation policy: the configuration value, its modes, and partial updates.
//!
//! [`GenerationConfig`] is a plain value. The process-wide instance and the
//! scoped overrides that shadow it live in [`crate::store`].
//!
//! Updates are lenient. A [`ConfigUpdate`] carries only the fields a caller
//! wants to change, and malformed input is clamped instead of rejected:
//! unknown mode names become [`GenerationMode::Automatic`], unrecognised
//! boolean spellings leave the field untouched.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::namespace;
use crate::result::{IdweaveError, IdweaveResult};

/// Environment variable prefix read by [`ConfigUpdate::from_env`]
pub const ENV_PREFIX: &str = "IDWEAVE_";

/// Verbosity / strategy of the identifier generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Namespace, context path and base label
    #[default]
    Automatic,
    /// Like automatic, plus an element-type suffix when enabled
    Semantic,
    /// Namespace and base label only
    Minimal,
}

impl GenerationMode {
    /// Parse a mode name, clamping anything unknown to `Automatic`
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "semantic" => Self::Semantic,
            "minimal" => Self::Minimal,
            _ => Self::Automatic,
        }
    }

    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Semantic => "semantic",
            Self::Minimal => "minimal",
        }
    }

    /// Whether the context path participates in identifiers
    #[must_use]
    pub const fn includes_context(&self) -> bool {
        !matches!(self, Self::Minimal)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier generation policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Master switch; when false no identifiers are generated
    pub enabled: bool,
    /// Generator strategy
    pub mode: GenerationMode,
    /// Explicit namespace; `None` means auto-detect
    pub namespace: Option<String>,
    /// Use the element type as base label when no explicit name exists
    pub include_component_names: bool,
    /// Allow element-type enrichment in semantic mode
    pub include_element_types: bool,
    /// Disambiguate repeated identifiers within a session
    pub collision_detection_enabled: bool,
    /// Append a debug log entry for every generation call
    pub debug_logging_enabled: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: GenerationMode::Automatic,
            namespace: None,
            include_component_names: true,
            include_element_types: true,
            collision_detection_enabled: false,
            debug_logging_enabled: false,
        }
    }
}

impl GenerationConfig {
    /// Create a config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A config with generation switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set an explicit namespace
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the generation mode
    #[must_use]
    pub const fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Toggle the master switch
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Toggle element-type base labels
    #[must_use]
    pub const fn with_component_names(mut self, include: bool) -> Self {
        self.include_component_names = include;
        self
    }

    /// Toggle element-type enrichment
    #[must_use]
    pub const fn with_element_types(mut self, include: bool) -> Self {
        self.include_element_types = include;
        self
    }

    /// Toggle collision detection
    #[must_use]
    pub const fn with_collision_detection(mut self, enabled: bool) -> Self {
        self.collision_detection_enabled = enabled;
        self
    }

    /// Toggle debug logging
    #[must_use]
    pub const fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging_enabled = enabled;
        self
    }

    /// The namespace identifiers are rooted at.
    ///
    /// An explicit, non-blank namespace wins; otherwise the process-wide
    /// auto-detected namespace is used. Never returns an empty string.
    #[must_use]
    pub fn resolved_namespace(&self) -> String {
        match self.namespace.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => namespace::resolve_namespace(),
        }
    }

    /// Merge a partial update field by field
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(namespace) = &update.namespace {
            let trimmed = namespace.trim();
            self.namespace = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(include) = update.include_component_names {
            self.include_component_names = include;
        }
        if let Some(include) = update.include_element_types {
            self.include_element_types = include;
        }
        if let Some(enabled) = update.collision_detection_enabled {
            self.collision_detection_enabled = enabled;
        }
        if let Some(enabled) = update.debug_logging_enabled {
            self.debug_logging_enabled = enabled;
        }
    }

    /// Return a copy with `update` merged in
    #[must_use]
    pub fn merged(mut self, update: &ConfigUpdate) -> Self {
        self.apply(update);
        self
    }
}

/// A partial configuration change.
///
/// Every field is optional; `None` leaves the target untouched. A blank
/// namespace clears the explicit namespace so auto-detection applies again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    /// Master switch
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: Option<bool>,
    /// Generator strategy
    #[serde(deserialize_with = "lenient_mode")]
    pub mode: Option<GenerationMode>,
    /// Explicit namespace
    pub namespace: Option<String>,
    /// Element-type base labels
    #[serde(deserialize_with = "lenient_bool")]
    pub include_component_names: Option<bool>,
    /// Element-type enrichment
    #[serde(deserialize_with = "lenient_bool")]
    pub include_element_types: Option<bool>,
    /// Collision detection
    #[serde(deserialize_with = "lenient_bool")]
    pub collision_detection_enabled: Option<bool>,
    /// Debug logging
    #[serde(deserialize_with = "lenient_bool")]
    pub debug_logging_enabled: Option<bool>,
}

impl ConfigUpdate {
    /// An empty update
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the master switch
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the mode
    #[must_use]
    pub const fn mode(mut self, mode: GenerationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the namespace
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set element-type base labels
    #[must_use]
    pub const fn include_component_names(mut self, include: bool) -> Self {
        self.include_component_names = Some(include);
        self
    }

    /// Set element-type enrichment
    #[must_use]
    pub const fn include_element_types(mut self, include: bool) -> Self {
        self.include_element_types = Some(include);
        self
    }

    /// Set collision detection
    #[must_use]
    pub const fn collision_detection(mut self, enabled: bool) -> Self {
        self.collision_detection_enabled = Some(enabled);
        self
    }

    /// Set debug logging
    #[must_use]
    pub const fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging_enabled = Some(enabled);
        self
    }

    /// Whether the update changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Parse an update from YAML
    pub fn from_yaml_str(source: &str) -> IdweaveResult<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Parse an update from JSON
    pub fn from_json_str(source: &str) -> IdweaveResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load an update from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: impl AsRef<Path>) -> IdweaveResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let source = std::fs::read_to_string(path)?;
        match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&source),
            Some("json") => Self::from_json_str(&source),
            other => Err(IdweaveError::InvalidConfig {
                message: format!(
                    "unsupported configuration format `{}` for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }

    /// Read an update from `IDWEAVE_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read an update through a custom variable lookup
    #[must_use]
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let flag = |name: &str| var(name).as_deref().and_then(parse_bool_lenient);

        Self {
            enabled: flag("ENABLED"),
            mode: var("MODE").map(|raw| GenerationMode::parse_lenient(&raw)),
            namespace: var("NAMESPACE"),
            include_component_names: flag("INCLUDE_COMPONENT_NAMES"),
            include_element_types: flag("INCLUDE_ELEMENT_TYPES"),
            collision_detection_enabled: flag("COLLISION_DETECTION"),
            debug_logging_enabled: flag("DEBUG_LOGGING"),
        }
    }
}

impl From<&GenerationConfig> for ConfigUpdate {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            enabled: Some(config.enabled),
            mode: Some(config.mode),
            namespace: Some(config.namespace.clone().unwrap_or_default()),
            include_component_names: Some(config.include_component_names),
            include_element_types: Some(config.include_element_types),
            collision_detection_enabled: Some(config.collision_detection_enabled),
            debug_logging_enabled: Some(config.debug_logging_enabled),
        }
    }
}

/// Interpret common boolean spellings; `None` for anything else
#[must_use]
pub fn parse_bool_lenient(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<LenientBool> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        LenientBool::Bool(b) => Some(b),
        LenientBool::Int(i) => Some(i != 0),
        LenientBool::Text(text) => parse_bool_lenient(&text),
    }))
}

fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<GenerationMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|text| GenerationMode::parse_lenient(&text)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod mode_tests {
        use super::*;

        #[test]
        fn test_parse_known_modes() {
            assert_eq!(GenerationMode::parse_lenient("semantic"), GenerationMode::Semantic);
            assert_eq!(GenerationMode::parse_lenient(" Minimal "), GenerationMode::Minimal);
            assert_eq!(GenerationMode::parse_lenient("AUTOMATIC"), GenerationMode::Automatic);
        }

        #[test]
        fn test_unknown_mode_clamps_to_automatic() {
            assert_eq!(GenerationMode::parse_lenient("verbose"), GenerationMode::Automatic);
            assert_eq!(GenerationMode::parse_lenient(""), GenerationMode::Automatic);
        }

        #[test]
        fn test_minimal_excludes_context() {
            assert!(GenerationMode::Automatic.includes_context());
            assert!(GenerationMode::Semantic.includes_context());
            assert!(!GenerationMode::Minimal.includes_context());
        }

        #[test]
        fn test_display() {
            assert_eq!(GenerationMode::Semantic.to_string(), "semantic");
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = GenerationConfig::default();
            assert!(config.enabled);
            assert_eq!(config.mode, GenerationMode::Automatic);
            assert!(config.namespace.is_none());
            assert!(config.include_component_names);
            assert!(config.include_element_types);
            assert!(!config.collision_detection_enabled);
            assert!(!config.debug_logging_enabled);
        }

        #[test]
        fn test_explicit_namespace_wins() {
            let config = GenerationConfig::new().with_namespace("  App ");
            assert_eq!(config.resolved_namespace(), "App");
        }

        #[test]
        fn test_blank_namespace_falls_back_to_detection() {
            let config = GenerationConfig::new().with_namespace("   ");
            assert!(!config.resolved_namespace().is_empty());
        }

        #[test]
        fn test_apply_merges_only_present_fields() {
            let mut config = GenerationConfig::new().with_namespace("App");
            config.apply(&ConfigUpdate::new().mode(GenerationMode::Minimal));
            assert_eq!(config.mode, GenerationMode::Minimal);
            assert_eq!(config.namespace.as_deref(), Some("App"));
            assert!(config.enabled);
        }

        #[test]
        fn test_blank_namespace_update_clears_namespace() {
            let config = GenerationConfig::new()
                .with_namespace("App")
                .merged(&ConfigUpdate::new().namespace(""));
            assert!(config.namespace.is_none());
        }

        #[test]
        fn test_round_trip_through_update() {
            let config = GenerationConfig::new()
                .with_namespace("Shop")
                .with_mode(GenerationMode::Semantic)
                .with_debug_logging(true);
            let rebuilt = GenerationConfig::disabled().merged(&ConfigUpdate::from(&config));
            assert_eq!(rebuilt, config);
        }
    }

    mod update_tests {
        use super::*;

        #[test]
        fn test_empty_update() {
            assert!(ConfigUpdate::new().is_empty());
            assert!(!ConfigUpdate::new().enabled(false).is_empty());
        }

        #[test]
        fn test_yaml_lenient_values() {
            let update = ConfigUpdate::from_yaml_str(
                "enabled: \"yes\"\nmode: shouting\nnamespace: Shop\ndebug_logging_enabled: 1\n",
            )
            .unwrap();
            assert_eq!(update.enabled, Some(true));
            assert_eq!(update.mode, Some(GenerationMode::Automatic));
            assert_eq!(update.namespace.as_deref(), Some("Shop"));
            assert_eq!(update.debug_logging_enabled, Some(true));
            assert_eq!(update.collision_detection_enabled, None);
        }

        #[test]
        fn test_yaml_unrecognised_bool_leaves_field_unset() {
            let update = ConfigUpdate::from_yaml_str("enabled: maybe\n").unwrap();
            assert_eq!(update.enabled, None);
        }

        #[test]
        fn test_empty_yaml_is_empty_update() {
            assert!(ConfigUpdate::from_yaml_str("  \n").unwrap().is_empty());
        }

        #[test]
        fn test_json_update() {
            let update = ConfigUpdate::from_json_str(
                r#"{"mode":"minimal","collision_detection_enabled":true}"#,
            )
            .unwrap();
            assert_eq!(update.mode, Some(GenerationMode::Minimal));
            assert_eq!(update.collision_detection_enabled, Some(true));
        }

        #[test]
        fn test_malformed_json_is_error() {
            assert!(ConfigUpdate::from_json_str("{not json").is_err());
        }

        #[test]
        fn test_from_env_with() {
            let vars: HashMap<&str, &str> = [
                ("IDWEAVE_ENABLED", "off"),
                ("IDWEAVE_MODE", "Semantic"),
                ("IDWEAVE_NAMESPACE", "Bank"),
                ("IDWEAVE_COLLISION_DETECTION", "garbage"),
            ]
            .into_iter()
            .collect();
            let update = ConfigUpdate::from_env_with(|key| vars.get(key).map(|v| (*v).to_string()));
            assert_eq!(update.enabled, Some(false));
            assert_eq!(update.mode, Some(GenerationMode::Semantic));
            assert_eq!(update.namespace.as_deref(), Some("Bank"));
            assert_eq!(update.collision_detection_enabled, None);
            assert_eq!(update.debug_logging_enabled, None);
        }

        #[test]
        fn test_from_path_yaml_and_json() {
            let dir = tempfile::tempdir().unwrap();
            let yaml = dir.path().join("idweave.yml");
            std::fs::write(&yaml, "namespace: FromYaml\n").unwrap();
            let json = dir.path().join("idweave.json");
            std::fs::write(&json, r#"{"namespace":"FromJson"}"#).unwrap();

            assert_eq!(
                ConfigUpdate::from_path(&yaml).unwrap().namespace.as_deref(),
                Some("FromYaml")
            );
            assert_eq!(
                ConfigUpdate::from_path(&json).unwrap().namespace.as_deref(),
                Some("FromJson")
            );
        }

        #[test]
        fn test_from_path_rejects_unknown_extension() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("idweave.toml");
            std::fs::write(&path, "namespace = 'x'").unwrap();
            let err = ConfigUpdate::from_path(&path).unwrap_err();
            assert!(matches!(err, IdweaveError::InvalidConfig { .. }));
        }

        #[test]
        fn test_parse_bool_lenient() {
            assert_eq!(parse_bool_lenient("TRUE"), Some(true));
            assert_eq!(parse_bool_lenient(" no "), Some(false));
            assert_eq!(parse_bool_lenient("2"), None);
        }
    }
}
