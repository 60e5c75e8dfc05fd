//! Resolution engine.
//!
//! A `TranslationSet` is the per-instance view of an entity's translations:
//! the records loaded from storage plus any built in memory since. All lookups
//! are synchronous and work only on that loaded set; building appends to it.
//!
//! Lookup rules:
//!
//! - `find_translation(L)`: the translation in language `L`; on a miss the
//!   first loaded translation when the miss policy is `FirstLoaded` (default).
//! - `translation(L, fallback)`: `find_translation(L)`, else (when `fallback`
//!   and something is loaded) the default-language translation, else the first.
//! - `find_or_build_translation(L)` / `find_or_create_translation(L)`: exact
//!   match only, so they never hand out another language's record.

use crate::declaration::{MissPolicy, TranslationDescriptor};
use crate::error::Result;
use crate::i18n::{CurrentLanguage, LanguageId, LanguageRegistry};
use crate::store::TranslationStore;
use crate::translation::Translation;
use std::sync::Arc;
use tracing::debug;

/// How a lookup was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Exact,
    FirstLoaded,
    Fallback,
    Miss,
}

/// The translations of one entity instance.
#[derive(Debug, Clone)]
pub struct TranslationSet {
    descriptor: Arc<TranslationDescriptor>,
    loaded: Option<Vec<Translation>>,
}

impl TranslationSet {
    /// A set whose translations have not been loaded. Resolves like an empty set.
    pub fn new(descriptor: Arc<TranslationDescriptor>) -> Self {
        Self {
            descriptor,
            loaded: None,
        }
    }

    pub fn with_translations(
        descriptor: Arc<TranslationDescriptor>,
        translations: Vec<Translation>,
    ) -> Self {
        Self {
            descriptor,
            loaded: Some(translations),
        }
    }

    pub fn descriptor(&self) -> &Arc<TranslationDescriptor> {
        &self.descriptor
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Replace the loaded translations (storage order is kept).
    pub fn load(&mut self, mut translations: Vec<Translation>) {
        translations.iter_mut().for_each(Translation::mark_clean);
        self.loaded = Some(translations);
    }

    pub fn as_slice(&self) -> &[Translation] {
        self.loaded.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Translation> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// The translation in exactly `language_id`, if loaded.
    pub fn find_exact(&self, language_id: LanguageId) -> Option<&Translation> {
        self.iter().find(|t| t.is_for(language_id))
    }

    /// The translation in `language_id`; on a miss, applies the declared miss policy.
    pub fn find_translation(&self, language_id: LanguageId) -> Option<&Translation> {
        self.lookup(language_id, false).0
    }

    /// `find_translation`, then the fallback branch when `fallback` is set.
    pub fn translation(&self, language_id: LanguageId, fallback: bool) -> Option<&Translation> {
        self.lookup(language_id, fallback).0
    }

    /// `translation` with the declared fallback option.
    pub fn resolve(&self, language_id: LanguageId) -> Option<&Translation> {
        self.translation(language_id, self.descriptor.config().fallback)
    }

    /// `resolve` for generated readers; the outcome is counted in the
    /// descriptor's metrics.
    pub(crate) fn resolve_for_read(&self, language_id: LanguageId) -> Option<&Translation> {
        let (found, outcome) = self.lookup(language_id, self.descriptor.config().fallback);
        let metrics = self.descriptor.metrics();

        match outcome {
            Outcome::Exact => metrics.record_exact_hit(),
            Outcome::FirstLoaded => metrics.record_first_loaded(),
            Outcome::Miss => metrics.record_miss(),
            Outcome::Fallback => {
                metrics.record_fallback();
                debug!(
                    "No {} in language {}, falling back",
                    self.descriptor.translation_type(),
                    language_id
                );
            }
        }

        found
    }

    fn lookup(&self, language_id: LanguageId, fallback: bool) -> (Option<&Translation>, Outcome) {
        if let Some(found) = self.find_exact(language_id) {
            return (Some(found), Outcome::Exact);
        }

        if self.descriptor.config().lookup == MissPolicy::FirstLoaded {
            if let Some(first) = self.as_slice().first() {
                return (Some(first), Outcome::FirstLoaded);
            }
        }

        if !fallback || self.is_empty() {
            return (None, Outcome::Miss);
        }

        let substitute = self
            .find_exact(LanguageId::DEFAULT)
            .or_else(|| self.as_slice().first());
        (substitute, Outcome::Fallback)
    }

    /// True when `find_translation` answers something for `language_id`.
    pub fn has_translation(&self, language_id: LanguageId) -> bool {
        self.find_translation(language_id).is_some()
    }

    /// The loaded translation in `language_id`, or a new one staged in this
    /// set for cascade persistence.
    pub fn find_or_build_translation(&mut self, language_id: LanguageId) -> &mut Translation {
        let translations = self.loaded.get_or_insert_with(Vec::new);

        let index = match translations.iter().position(|t| t.is_for(language_id)) {
            Some(index) => index,
            None => {
                self.descriptor.metrics().record_built();
                debug!(
                    "Building {} for language {}",
                    self.descriptor.translation_type(),
                    language_id
                );
                translations.push(Translation::for_language(language_id));
                translations.len() - 1
            }
        };

        &mut translations[index]
    }

    /// A detached copy of the translation in `language_id` (or a new one),
    /// with its owner assigned, ready to be saved directly.
    pub fn find_or_create_translation(
        &self,
        language_id: LanguageId,
        owner_id: Option<i64>,
    ) -> Translation {
        let mut translation = self
            .find_exact(language_id)
            .cloned()
            .unwrap_or_else(|| Translation::for_language(language_id));
        translation.owner_id = owner_id;
        translation
    }

    /// One translation per enabled language, in registry order.
    pub fn all_translations(
        &self,
        registry: &LanguageRegistry,
        owner_id: Option<i64>,
    ) -> Vec<(LanguageId, Translation)> {
        registry
            .ids()
            .into_iter()
            .map(|language_id| {
                (
                    language_id,
                    self.find_or_create_translation(language_id, owner_id),
                )
            })
            .collect()
    }

    /// The loaded translations if there are any, otherwise a complete
    /// per-language draft set from `all_translations`.
    pub fn form_translations(
        &self,
        registry: &LanguageRegistry,
        owner_id: Option<i64>,
    ) -> Vec<Translation> {
        if !self.is_empty() {
            return self.as_slice().to_vec();
        }
        self.all_translations(registry, owner_id)
            .into_iter()
            .map(|(_, translation)| translation)
            .collect()
    }

    /// Run the generated reader for `name` in `language_id`.
    pub fn read(&self, name: &str, language_id: LanguageId) -> Result<Option<String>> {
        self.descriptor.read(self, name, language_id)
    }

    /// Run the generated writer for `name` in `language_id`.
    pub fn write(
        &mut self,
        name: &str,
        language_id: LanguageId,
        value: Option<String>,
    ) -> Result<()> {
        let descriptor = Arc::clone(&self.descriptor);
        descriptor.write(self, name, language_id, value)
    }

    /// Run the generated raw accessor for `name` in `language_id`.
    pub fn read_before_type_cast(&self, name: &str, language_id: LanguageId) -> Result<Option<String>> {
        self.descriptor.read_raw(self, name, language_id)
    }

    /// Translations that are new or carry unsaved changes.
    pub fn pending(&self) -> Vec<&Translation> {
        self.iter().filter(|t| t.has_changes()).collect()
    }

    /// Save pending translations when the declaration enables cascade
    /// persistence. Returns how many records were written.
    pub async fn persist<S: TranslationStore>(&mut self, store: &S, owner_id: i64) -> Result<usize> {
        if !self.descriptor.config().cascade_persist {
            return Ok(0);
        }
        self.save_pending(store, owner_id).await
    }

    /// Save pending translations unconditionally.
    pub async fn save_pending<S: TranslationStore>(
        &mut self,
        store: &S,
        owner_id: i64,
    ) -> Result<usize> {
        let descriptor = Arc::clone(&self.descriptor);
        let mut saved = 0;

        if let Some(translations) = self.loaded.as_mut() {
            for translation in translations.iter_mut().filter(|t| t.has_changes()) {
                translation.owner_id = Some(owner_id);
                store.save(&descriptor, translation).await?;
                saved += 1;
            }
        }

        Ok(saved)
    }

    /// Replace the loaded set with what storage holds for `owner_id`.
    pub async fn reload<S: TranslationStore>(&mut self, store: &S, owner_id: i64) -> Result<()> {
        let translations = store.load(&self.descriptor, owner_id).await?;
        self.load(translations);
        Ok(())
    }
}

/// An entity whose attributes are translated.
///
/// Implementors expose their id and translation set; the provided methods
/// carry the lookup, accessor and draft-set behavior.
pub trait HasTranslations {
    /// Storage id, `None` until the entity is saved.
    fn record_id(&self) -> Option<i64>;

    fn translations(&self) -> &TranslationSet;

    fn translations_mut(&mut self) -> &mut TranslationSet;

    fn find_translation(&self, language_id: LanguageId) -> Option<&Translation> {
        self.translations().find_translation(language_id)
    }

    fn translation(&self, language_id: LanguageId, fallback: bool) -> Option<&Translation> {
        self.translations().translation(language_id, fallback)
    }

    fn resolve_translation(&self, language_id: LanguageId) -> Option<&Translation> {
        self.translations().resolve(language_id)
    }

    fn has_translation(&self, language_id: LanguageId) -> bool {
        self.translations().has_translation(language_id)
    }

    fn find_or_build_translation(&mut self, language_id: LanguageId) -> &mut Translation {
        self.translations_mut().find_or_build_translation(language_id)
    }

    fn find_or_create_translation(&self, language_id: LanguageId) -> Translation {
        self.translations()
            .find_or_create_translation(language_id, self.record_id())
    }

    fn all_translations(&self, registry: &LanguageRegistry) -> Vec<(LanguageId, Translation)> {
        self.translations().all_translations(registry, self.record_id())
    }

    fn form_translations(&self, registry: &LanguageRegistry) -> Vec<Translation> {
        self.translations().form_translations(registry, self.record_id())
    }

    /// Generated reader: explicit language, or the provider's current one.
    fn read_translated(
        &self,
        name: &str,
        language_id: Option<LanguageId>,
        current: &dyn CurrentLanguage,
    ) -> Result<Option<String>> {
        let language_id = language_id.unwrap_or_else(|| current.current_language());
        self.translations().read(name, language_id)
    }

    /// Generated writer: always writes in the provider's current language.
    fn write_translated(
        &mut self,
        name: &str,
        value: Option<String>,
        current: &dyn CurrentLanguage,
    ) -> Result<()> {
        let language_id = current.current_language();
        self.translations_mut().write(name, language_id, value)
    }

    /// Generated raw accessor in the provider's current language.
    fn translated_before_type_cast(
        &self,
        name: &str,
        current: &dyn CurrentLanguage,
    ) -> Result<Option<String>> {
        self.translations()
            .read_before_type_cast(name, current.current_language())
    }
}
