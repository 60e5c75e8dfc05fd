//! Language registry: mapping between symbolic language codes and integer ids.
//!
//! Registries can be built explicitly and passed around, and a process-wide
//! instance is available through `LanguageRegistry::global()`. The global
//! instance uses `OnceLock`; it can be replaced once with `install` before
//! first use, otherwise the default language set is loaded.

use crate::error::{Result, TranslationError};
use crate::i18n::LanguageId;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "es", "fr")
    pub code: &'static str,

    /// Integer code stored in `language_id` columns
    pub id: LanguageId,

    /// English name of the language (e.g., "English", "Spanish", "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "Español", "Français")
    pub native_name: &'static str,

    /// Whether this language is enabled for use
    pub enabled: bool,
}

impl LanguageConfig {
    pub fn new(code: &'static str, id: i32) -> Self {
        Self {
            code,
            id: LanguageId(id),
            name: code,
            native_name: code,
            enabled: true,
        }
    }
}

/// Ordered set of languages.
///
/// Order is significant: `all_translations` walks languages in registry order.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Build a registry, rejecting empty sets and duplicate codes or ids.
    pub fn new(languages: Vec<LanguageConfig>) -> Result<Self> {
        if languages.is_empty() {
            return Err(TranslationError::InvalidRegistry(
                "at least one language is required".to_string(),
            ));
        }

        let mut codes = HashSet::new();
        let mut ids = HashSet::new();
        for lang in &languages {
            if !codes.insert(lang.code) {
                return Err(TranslationError::InvalidRegistry(format!(
                    "duplicate language code '{}'",
                    lang.code
                )));
            }
            if !ids.insert(lang.id) {
                return Err(TranslationError::InvalidRegistry(format!(
                    "duplicate language id {}",
                    lang.id
                )));
            }
        }

        Ok(Self { languages })
    }

    /// Shorthand for `code => id` registries.
    pub fn from_pairs(pairs: &[(&'static str, i32)]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|(code, id)| LanguageConfig::new(*code, *id))
                .collect(),
        )
    }

    /// Get the global language registry instance.
    pub fn global() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Replace the global registry before anything has read it.
    ///
    /// Returns the registry back if the global instance was already initialized.
    pub fn install(registry: LanguageRegistry) -> std::result::Result<(), LanguageRegistry> {
        debug!("Installing global language registry ({} languages)", registry.len());
        REGISTRY.set(registry)
    }

    /// Get a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get a language configuration by its integer id.
    pub fn get_by_id(&self, id: LanguageId) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.id == id)
    }

    /// Symbolic code -> integer id (enabled languages only).
    pub fn id_for(&self, code: &str) -> Option<LanguageId> {
        self.get_by_code(code)
            .filter(|lang| lang.enabled)
            .map(|lang| lang.id)
    }

    /// Integer id -> symbolic code.
    pub fn code_for(&self, id: LanguageId) -> Option<&'static str> {
        self.get_by_id(id).map(|lang| lang.code)
    }

    /// Get all enabled languages, in registry order.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Get all languages (including disabled ones).
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Ids of all enabled languages, in registry order.
    pub fn ids(&self) -> Vec<LanguageId> {
        self.list_enabled().into_iter().map(|lang| lang.id).collect()
    }

    /// The language fallback resolution prefers: the one carrying
    /// `LanguageId::DEFAULT`, or the first registered language if none does.
    pub fn default_language(&self) -> &LanguageConfig {
        self.get_by_id(LanguageId::DEFAULT)
            .unwrap_or(&self.languages[0])
    }

    /// Check if a language code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.id_for(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Default language configurations.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            id: LanguageId(1),
            name: "English",
            native_name: "English",
            enabled: true,
        },
        LanguageConfig {
            code: "es",
            id: LanguageId(2),
            name: "Spanish",
            native_name: "Español",
            enabled: true,
        },
        LanguageConfig {
            code: "fr",
            id: LanguageId(3),
            name: "French",
            native_name: "Français",
            enabled: true,
        },
        LanguageConfig {
            code: "de",
            id: LanguageId(4),
            name: "German",
            native_name: "Deutsch",
            enabled: true,
        },
    ]
}
