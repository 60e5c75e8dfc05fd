use crate::declaration::TranslationDescriptor;
use crate::error::{Result, TranslationError};
use crate::i18n::LanguageId;
use crate::store::TranslationStore;
use crate::translation::Translation;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// In-process storage provider, keyed by translation table.
///
/// Rows keep insertion order, which is the order `load` returns them in.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    rows: HashMap<String, Vec<Translation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored translations for a descriptor's table.
    pub fn count(&self, descriptor: &TranslationDescriptor) -> usize {
        self.tables()
            .rows
            .get(&descriptor.translation_table())
            .map_or(0, Vec::len)
    }
}

impl TranslationStore for MemoryStore {
    async fn load(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<Vec<Translation>> {
        Ok(self
            .tables()
            .rows
            .get(&descriptor.translation_table())
            .map(|rows| {
                rows.iter()
                    .filter(|t| t.owner_id == Some(owner_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save(&self, descriptor: &TranslationDescriptor, translation: &mut Translation) -> Result<()> {
        let table = descriptor.translation_table();

        let language_id = translation
            .language_id
            .ok_or_else(|| TranslationError::MissingLanguage(table.clone()))?;
        let owner_id = translation
            .owner_id
            .ok_or_else(|| TranslationError::MissingOwner(table.clone()))?;

        let mut tables = self.tables();
        let Tables { next_id, rows } = &mut *tables;
        let rows = rows.entry(table.clone()).or_default();

        let taken = rows.iter().any(|row| {
            row.owner_id == Some(owner_id) && row.is_for(language_id) && row.id != translation.id
        });
        if taken {
            warn!(
                "Rejected {} for owner {}: language {} already present",
                descriptor.translation_type(),
                owner_id,
                language_id
            );
            return Err(TranslationError::DuplicateLanguage {
                table,
                owner: owner_id,
                language: language_id,
            });
        }

        let now = Utc::now();
        match translation.id {
            Some(id) => {
                let row = rows
                    .iter_mut()
                    .find(|row| row.id == Some(id))
                    .ok_or(TranslationError::RecordNotFound(id))?;
                translation.mark_persisted(id, now);
                *row = translation.clone();
            }
            None => {
                *next_id += 1;
                translation.mark_persisted(*next_id, now);
                rows.push(translation.clone());
                info!(
                    "Created {} #{} (owner {}, language {})",
                    descriptor.translation_type(),
                    next_id,
                    owner_id,
                    language_id
                );
            }
        }

        Ok(())
    }

    async fn destroy_owner(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<u64> {
        let mut tables = self.tables();
        let Some(rows) = tables.rows.get_mut(&descriptor.translation_table()) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|row| row.owner_id != Some(owner_id));
        Ok((before - rows.len()) as u64)
    }

    async fn translated(&self, descriptor: &TranslationDescriptor, language_id: LanguageId) -> Result<Vec<i64>> {
        let tables = self.tables();
        let mut owners: Vec<i64> = Vec::new();

        for row in tables
            .rows
            .get(&descriptor.translation_table())
            .into_iter()
            .flatten()
            .filter(|row| row.is_for(language_id))
        {
            if let Some(owner) = row.owner_id {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }

        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::TranslationOptions;

    const EN: LanguageId = LanguageId(1);
    const FR: LanguageId = LanguageId(2);

    fn descriptor() -> TranslationDescriptor {
        TranslationDescriptor::build("Product", &["title"], TranslationOptions::default()).unwrap()
    }

    fn translation(owner: i64, language_id: LanguageId, title: &str) -> Translation {
        let mut t = Translation::for_language(language_id).with("title", title);
        t.owner_id = Some(owner);
        t
    }

    // ==================== Save Tests ====================

    #[tokio::test]
    async fn test_save_assigns_ids() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        let mut first = translation(1, EN, "Hello");
        let mut second = translation(1, FR, "Bonjour");
        store.save(&descriptor, &mut first).await.unwrap();
        store.save(&descriptor, &mut second).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert!(!first.has_changes());
        assert!(first.created_at.is_some());
        assert_eq!(store.count(&descriptor), 2);
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_language() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        store.save(&descriptor, &mut translation(1, EN, "Hello")).await.unwrap();
        let result = store.save(&descriptor, &mut translation(1, EN, "Hi")).await;

        assert!(matches!(
            result,
            Err(TranslationError::DuplicateLanguage { owner: 1, .. })
        ));
        assert_eq!(store.count(&descriptor), 1);
    }

    #[tokio::test]
    async fn test_same_language_different_owners() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        store.save(&descriptor, &mut translation(1, EN, "Hello")).await.unwrap();
        store.save(&descriptor, &mut translation(2, EN, "Hello")).await.unwrap();
        assert_eq!(store.count(&descriptor), 2);
    }

    #[tokio::test]
    async fn test_save_requires_language() {
        let store = MemoryStore::new();
        let mut t = Translation::new().with("title", "Hello");
        t.owner_id = Some(1);

        let result = store.save(&descriptor(), &mut t).await;
        assert!(matches!(result, Err(TranslationError::MissingLanguage(_))));
    }

    #[tokio::test]
    async fn test_save_requires_owner() {
        let store = MemoryStore::new();
        let mut t = Translation::for_language(EN);

        let result = store.save(&descriptor(), &mut t).await;
        assert!(matches!(result, Err(TranslationError::MissingOwner(_))));
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        let mut t = translation(1, EN, "Hello");
        store.save(&descriptor, &mut t).await.unwrap();
        t.set("title", Some("Hi".to_string()));
        store.save(&descriptor, &mut t).await.unwrap();

        let loaded = store.load(&descriptor, 1).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].get("title"), Some("Hi"));
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let store = MemoryStore::new();
        let mut t = translation(1, EN, "Hello");
        t.id = Some(99);

        let result = store.save(&descriptor(), &mut t).await;
        assert!(matches!(result, Err(TranslationError::RecordNotFound(99))));
    }

    // ==================== Load / Destroy / Query Tests ====================

    #[tokio::test]
    async fn test_load_keeps_insertion_order() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        store.save(&descriptor, &mut translation(1, FR, "Bonjour")).await.unwrap();
        store.save(&descriptor, &mut translation(2, EN, "Other")).await.unwrap();
        store.save(&descriptor, &mut translation(1, EN, "Hello")).await.unwrap();

        let loaded = store.load(&descriptor, 1).await.unwrap();
        let languages: Vec<_> = loaded.iter().map(|t| t.language_id).collect();
        assert_eq!(languages, vec![Some(FR), Some(EN)]);
    }

    #[tokio::test]
    async fn test_destroy_owner_cascades() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        store.save(&descriptor, &mut translation(1, EN, "Hello")).await.unwrap();
        store.save(&descriptor, &mut translation(1, FR, "Bonjour")).await.unwrap();
        store.save(&descriptor, &mut translation(2, EN, "Other")).await.unwrap();

        assert_eq!(store.destroy_owner(&descriptor, 1).await.unwrap(), 2);
        assert!(store.load(&descriptor, 1).await.unwrap().is_empty());
        assert_eq!(store.load(&descriptor, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_destroy_owner_empty_table() {
        let store = MemoryStore::new();
        assert_eq!(store.destroy_owner(&descriptor(), 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_translated_and_alias() {
        let store = MemoryStore::new();
        let descriptor = descriptor();

        store.save(&descriptor, &mut translation(3, FR, "Bonjour")).await.unwrap();
        store.save(&descriptor, &mut translation(1, EN, "Hello")).await.unwrap();
        store.save(&descriptor, &mut translation(1, FR, "Salut")).await.unwrap();

        assert_eq!(store.translated(&descriptor, FR).await.unwrap(), vec![3, 1]);
        assert_eq!(store.where_language_id(&descriptor, EN).await.unwrap(), vec![1]);
        assert!(store.translated(&descriptor, LanguageId(9)).await.unwrap().is_empty());
    }
}
