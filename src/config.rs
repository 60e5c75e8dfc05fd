use crate::declaration::{MissPolicy, TranslationOptions};
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Locale used when a request carries none
    pub default_locale: String,

    // Storage (in-memory when unset)
    pub database_url: Option<String>,

    // Declaration defaults
    pub fallback: bool,
    pub lookup: MissPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            default_locale: std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),

            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),

            fallback: std::env::var("TRANSLATION_FALLBACK")
                .ok()
                .map(|v| v.parse::<bool>())
                .transpose()
                .context("TRANSLATION_FALLBACK must be 'true' or 'false'")?
                .unwrap_or(false),

            lookup: std::env::var("TRANSLATION_LOOKUP")
                .ok()
                .map(|v| v.parse::<MissPolicy>())
                .transpose()
                .context("Invalid TRANSLATION_LOOKUP")?
                .unwrap_or_default(),
        })
    }

    /// Declaration options carrying the configured defaults.
    pub fn translation_options(&self) -> TranslationOptions {
        TranslationOptions::default()
            .with_fallback(self.fallback)
            .with_lookup(self.lookup)
    }
}
