//! Label resolver: human-facing accessibility labels.
//!
//! Precedence, first match wins:
//!
//! 1. explicit label override
//! 2. localization of the text content for the active locale
//! 3. the text content verbatim
//! 4. no label
//!
//! A component without any of these stays unlabeled; no placeholder is
//! invented.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::generator::IdentityDescriptor;
use crate::result::{IdweaveError, IdweaveResult};

/// Locale tag such as `en`, `es-MX` or `pt_BR`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale(String);

impl Locale {
    /// Create a locale tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The full tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language part of the tag (`es` for `es-MX`)
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(&self.0)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of translated strings
pub trait LocalizationProvider: Send + Sync {
    /// Translation of `key` for `locale`, if one exists
    fn lookup(&self, key: &str, locale: &Locale) -> Option<String>;
}

/// In-memory per-locale catalogs.
///
/// Lookups try the exact locale tag first, then its language.
#[derive(Debug, Clone, Default)]
pub struct CatalogLocalization {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl CatalogLocalization {
    /// An empty set of catalogs
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one translation
    pub fn insert(&mut self, locale: &str, key: impl Into<String>, value: impl Into<String>) {
        self.catalogs
            .entry(locale.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert)
    #[must_use]
    pub fn with_entry(mut self, locale: &str, key: &str, value: &str) -> Self {
        self.insert(locale, key, value);
        self
    }

    /// Merge a `.strings`-style catalog into `locale`; returns entries loaded
    pub fn load_strings(&mut self, locale: &str, source: &str) -> IdweaveResult<usize> {
        let entries = parse_strings(source)?;
        let count = entries.len();
        self.catalogs
            .entry(locale.to_string())
            .or_default()
            .extend(entries);
        Ok(count)
    }

    /// Locales with at least one catalog
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    /// Number of entries for `locale`
    #[must_use]
    pub fn len(&self, locale: &str) -> usize {
        self.catalogs.get(locale).map_or(0, HashMap::len)
    }

    /// Whether no catalog holds any entry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalogs.values().all(HashMap::is_empty)
    }
}

impl LocalizationProvider for CatalogLocalization {
    fn lookup(&self, key: &str, locale: &Locale) -> Option<String> {
        self.catalogs
            .get(locale.as_str())
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.catalogs
                    .get(locale.language())
                    .and_then(|catalog| catalog.get(key))
            })
            .cloned()
    }
}

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^"((?:[^"\\]|\\.)*)"\s*=\s*"((?:[^"\\]|\\.)*)"\s*;$"#)
            .expect("catalog entry pattern is valid")
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse `"key" = "value";` lines.
///
/// Blank lines, `//` comments and `/* ... */` blocks are skipped. Any other
/// line that is not an entry is an error.
pub fn parse_strings(source: &str) -> IdweaveResult<HashMap<String, String>> {
    let mut entries = HashMap::new();
    let mut in_block_comment = false;

    for (index, line) in source.lines().enumerate() {
        let mut line = line.trim();
        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }
        if line.starts_with("/*") {
            match line.find("*/") {
                Some(end) => line = line[end + 2..].trim(),
                None => {
                    in_block_comment = true;
                    continue;
                }
            }
        }
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let captures = entry_pattern()
            .captures(line)
            .ok_or_else(|| IdweaveError::CatalogParse {
                line: index + 1,
                message: format!("expected `\"key\" = \"value\";`, found `{line}`"),
            })?;
        entries.insert(unescape(&captures[1]), unescape(&captures[2]));
    }

    Ok(entries)
}

/// Derives accessibility labels from identity signals
#[derive(Clone, Default)]
pub struct LabelResolver {
    provider: Option<Arc<dyn LocalizationProvider>>,
    locale: Locale,
}

impl fmt::Debug for LabelResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelResolver")
            .field("has_provider", &self.provider.is_some())
            .field("locale", &self.locale)
            .finish()
    }
}

impl LabelResolver {
    /// Resolver without localization
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `provider` for translations
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn LocalizationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the active locale
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.locale = locale.into();
        self
    }

    /// The active locale
    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Resolve the label for `identity`
    #[must_use]
    pub fn resolve(&self, identity: &IdentityDescriptor) -> Option<String> {
        if let Some(label) = identity
            .explicit_label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
        {
            return Some(label.to_string());
        }

        let text = identity
            .inferred_text_content
            .as_deref()
            .filter(|text| !text.trim().is_empty())?;

        if let Some(translated) = self
            .provider
            .as_ref()
            .and_then(|provider| provider.lookup(text, &self.locale))
        {
            return Some(translated);
        }
        trace!(key = text, locale = %self.locale, "no translation; using text verbatim");
        Some(text.to_string())
    }
}
