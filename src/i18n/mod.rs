//! Language identity for translated content.
//!
//! # Architecture
//!
//! - `registry`: ordered mapping between symbolic language codes and integer ids
//! - `language`: `LanguageId` and the validated `Language` type
//! - `locale`: current-language providers used by accessors called without a language
//! - `metrics`: counters describing how lookups were answered
//!
//! # Example
//!
//! ```rust,ignore
//! use has_translations::i18n::{LanguageRegistry, LocaleLanguage, CurrentLanguage};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(LanguageRegistry::from_pairs(&[("en", 1), ("fr", 2)])?);
//! let current = LocaleLanguage::new("fr-CA", registry);
//! assert_eq!(current.current_language().get(), 2);
//! ```

mod language;
mod locale;
mod metrics;
mod registry;

pub use language::{Language, LanguageId};
pub use locale::{CurrentLanguage, FixedLanguage, LocaleLanguage};
pub use metrics::{MetricsReport, ResolutionMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
