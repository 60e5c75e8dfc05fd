//! Current-language providers.
//!
//! Accessors that are called without an explicit language ask a
//! `CurrentLanguage` provider. How the locale is negotiated (request headers,
//! user settings) is up to the caller; this module only maps a locale to a
//! registered language id, falling back to the registry default.

use crate::i18n::{Language, LanguageId, LanguageRegistry};
use std::sync::Arc;
use tracing::debug;

/// Supplies the caller's current language code.
pub trait CurrentLanguage: Send + Sync {
    fn current_language(&self) -> LanguageId;
}

impl<F> CurrentLanguage for F
where
    F: Fn() -> LanguageId + Send + Sync,
{
    fn current_language(&self) -> LanguageId {
        self()
    }
}

/// Always answers the same language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLanguage(pub LanguageId);

impl CurrentLanguage for FixedLanguage {
    fn current_language(&self) -> LanguageId {
        self.0
    }
}

impl Default for FixedLanguage {
    fn default() -> Self {
        FixedLanguage(LanguageId::DEFAULT)
    }
}

/// Maps a locale string (`fr-CA`, `en`, `pt_BR`) to a registered language.
///
/// Unknown or disabled locales resolve to the registry's default language.
#[derive(Debug, Clone)]
pub struct LocaleLanguage {
    locale: String,
    registry: Arc<LanguageRegistry>,
}

impl LocaleLanguage {
    pub fn new(locale: impl Into<String>, registry: Arc<LanguageRegistry>) -> Self {
        Self {
            locale: locale.into(),
            registry,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }
}

impl CurrentLanguage for LocaleLanguage {
    fn current_language(&self) -> LanguageId {
        match Language::from_locale_in(&self.registry, &self.locale) {
            Ok(language) => language.id(),
            Err(_) => {
                let default = Language::default_in(&self.registry);
                debug!(
                    "Locale '{}' is not registered, using default language '{}'",
                    self.locale,
                    default.code()
                );
                default.id()
            }
        }
    }
}
