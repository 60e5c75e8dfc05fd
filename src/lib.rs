//! Per-language variants of entity attributes.
//!
//! An entity type declares which of its attributes are translatable. Each
//! entity instance then owns one translation record per language, and reads
//! resolve the record for a requested language under the declared fallback
//! policy. Writes build missing translations on demand; storage providers
//! save them with the entity.

pub mod config;
pub mod declaration;
pub mod error;
pub mod i18n;
pub mod naming;
pub mod resolution;
pub mod store;
pub mod translation;

pub use declaration::{
    declare, Constraint, Declarations, MissPolicy, TranslationConfig, TranslationDescriptor,
    TranslationOptions,
};
pub use error::{Result, TranslationError};
pub use i18n::{CurrentLanguage, FixedLanguage, Language, LanguageId, LanguageRegistry, LocaleLanguage};
pub use resolution::{HasTranslations, TranslationSet};
pub use store::{MemoryStore, PgTranslationStore, TranslationStore};
pub use translation::Translation;
