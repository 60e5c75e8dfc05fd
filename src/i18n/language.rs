//! Language types: integer language codes and validated languages.
//!
//! Translations are keyed by a small integer code (`LanguageId`) rather than by
//! the symbolic ISO code, so storage only ever sees integers. `Language` pairs
//! the two after validating against a registry.

use crate::error::{Result, TranslationError};
use crate::i18n::{LanguageConfig, LanguageRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable integer code identifying a language in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(pub i32);

impl LanguageId {
    /// The default-language sentinel used by fallback resolution.
    ///
    /// Conventionally the first registered language.
    pub const DEFAULT: LanguageId = LanguageId(1);

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl From<i32> for LanguageId {
    fn from(value: i32) -> Self {
        LanguageId(value)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated language.
///
/// Only languages that exist and are enabled in a registry can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "fr")
    code: &'static str,

    id: LanguageId,
}

impl Language {
    /// Create a Language from a language code using the global registry.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is valid and the language is enabled
    /// * `Err` if the code is not found or the language is disabled
    pub fn from_code(code: &str) -> Result<Language> {
        Self::from_code_in(LanguageRegistry::global(), code)
    }

    /// Same as [`Language::from_code`] against an explicit registry.
    pub fn from_code_in(registry: &LanguageRegistry, code: &str) -> Result<Language> {
        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language::from_config(config)),
            Some(_) => Err(TranslationError::UnknownLanguage(format!("{} (disabled)", code))),
            None => Err(TranslationError::UnknownLanguage(code.to_string())),
        }
    }

    /// Resolve a locale string such as `fr-CA` or `pt_BR` by its primary subtag.
    pub fn from_locale_in(registry: &LanguageRegistry, locale: &str) -> Result<Language> {
        let primary = locale
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::from_code_in(registry, &primary)
    }

    /// The registry's default language (the one fallback resolution prefers).
    pub fn default_in(registry: &LanguageRegistry) -> Language {
        Language::from_config(registry.default_language())
    }

    pub(crate) fn from_config(config: &LanguageConfig) -> Language {
        Language {
            code: config.code,
            id: config.id,
        }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the integer language code used by translation records.
    pub fn id(&self) -> LanguageId {
        self.id
    }

    pub fn is_default(&self) -> bool {
        self.id.is_default()
    }
}

impl From<Language> for LanguageId {
    fn from(language: Language) -> Self {
        language.id
    }
}
