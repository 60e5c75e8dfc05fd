//! Integration tests for declared translations
//!
//! These tests exercise declaration, resolution and persistence together
//! against the in-memory store. The PostgreSQL store shares the same trait
//! and is covered by its SQL builder unit tests.

use has_translations::{
    Declarations, FixedLanguage, HasTranslations, LanguageId, LanguageRegistry, MemoryStore,
    MissPolicy, TranslationDescriptor, TranslationError, TranslationOptions, TranslationSet,
    TranslationStore,
};
use std::sync::Arc;

// ==================== Test Helpers ====================

const EN: LanguageId = LanguageId(1);
const FR: LanguageId = LanguageId(2);
const DE: LanguageId = LanguageId(3);

struct Page {
    id: Option<i64>,
    translations: TranslationSet,
}

impl HasTranslations for Page {
    fn record_id(&self) -> Option<i64> {
        self.id
    }

    fn translations(&self) -> &TranslationSet {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut TranslationSet {
        &mut self.translations
    }
}

fn registry() -> LanguageRegistry {
    LanguageRegistry::from_pairs(&[("en", 1), ("fr", 2), ("de", 3)]).expect("valid registry")
}

fn declare_page(options: TranslationOptions) -> Arc<TranslationDescriptor> {
    Declarations::new()
        .declare("Page", &["title", "body"], options)
        .expect("valid declaration")
}

fn page(id: i64, descriptor: &Arc<TranslationDescriptor>) -> Page {
    Page {
        id: Some(id),
        translations: TranslationSet::new(Arc::clone(descriptor)),
    }
}

async fn load_page<S: TranslationStore>(
    id: i64,
    descriptor: &Arc<TranslationDescriptor>,
    store: &S,
) -> Page {
    let mut page = page(id, descriptor);
    page.translations_mut()
        .reload(store, id)
        .await
        .expect("load translations");
    page
}

// ==================== Write, Save, Read ====================

#[tokio::test]
async fn test_written_translations_survive_reload() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let store = MemoryStore::new();

    let mut page = page(1, &descriptor);
    page.write_translated("title", Some("Welcome".to_string()), &FixedLanguage(EN))
        .unwrap();
    page.write_translated("title", Some("Bienvenue".to_string()), &FixedLanguage(FR))
        .unwrap();

    let saved = page.translations_mut().persist(&store, 1).await.unwrap();
    assert_eq!(saved, 2);
    assert!(page.translations().pending().is_empty());

    let reloaded = load_page(1, &descriptor, &store).await;
    let current = FixedLanguage(DE);
    assert_eq!(
        reloaded.read_translated("title", Some(FR), &current).unwrap().as_deref(),
        Some("Bienvenue")
    );
    assert_eq!(
        reloaded.read_translated("title", Some(EN), &current).unwrap().as_deref(),
        Some("Welcome")
    );
}

#[tokio::test]
async fn test_cascade_persist_disabled_saves_nothing() {
    let descriptor = declare_page(
        TranslationOptions::default()
            .with_writer(true)
            .with_cascade_persist(false),
    );
    let store = MemoryStore::new();

    let mut page = page(1, &descriptor);
    page.write_translated("title", Some("Welcome".to_string()), &FixedLanguage(EN))
        .unwrap();

    assert_eq!(page.translations_mut().persist(&store, 1).await.unwrap(), 0);
    assert_eq!(store.count(&descriptor), 0);

    // Explicit saves still work
    assert_eq!(page.translations_mut().save_pending(&store, 1).await.unwrap(), 1);
    assert_eq!(store.count(&descriptor), 1);
}

#[tokio::test]
async fn test_updates_do_not_duplicate() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let store = MemoryStore::new();
    let english = FixedLanguage(EN);

    let mut page = page(1, &descriptor);
    page.write_translated("title", Some("Welcome".to_string()), &english).unwrap();
    page.translations_mut().persist(&store, 1).await.unwrap();

    let mut page = load_page(1, &descriptor, &store).await;
    page.write_translated("body", Some("Hello there".to_string()), &english).unwrap();
    page.translations_mut().persist(&store, 1).await.unwrap();

    let reloaded = load_page(1, &descriptor, &store).await;
    assert_eq!(reloaded.translations().len(), 1);
    assert_eq!(
        reloaded.read_translated("body", None, &english).unwrap().as_deref(),
        Some("Hello there")
    );
}

async fn write_titles<S: TranslationStore>(
    id: i64,
    descriptor: &Arc<TranslationDescriptor>,
    store: &S,
) -> has_translations::Result<usize> {
    let mut page = load_page(id, descriptor, store).await;
    page.write_translated("title", Some("Welcome".to_string()), &FixedLanguage(EN))?;
    page.write_translated("body", Some("Read on".to_string()), &FixedLanguage(EN))?;
    page.write_translated("title", Some("Bienvenue".to_string()), &FixedLanguage(FR))?;
    page.translations_mut().persist(store, id).await
}

#[tokio::test]
async fn test_repeated_write_flow_updates_existing_rows() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let store = MemoryStore::new();

    assert_eq!(write_titles(1, &descriptor, &store).await.unwrap(), 2);
    write_titles(1, &descriptor, &store)
        .await
        .expect("second pass updates in place");

    assert_eq!(store.count(&descriptor), 2);
    let reloaded = load_page(1, &descriptor, &store).await;
    assert_eq!(
        reloaded
            .read_translated("title", Some(FR), &FixedLanguage(EN))
            .unwrap()
            .as_deref(),
        Some("Bienvenue")
    );
}

// ==================== Uniqueness ====================

#[tokio::test]
async fn test_two_translations_same_owner_and_language_fail() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let store = MemoryStore::new();

    let mut first = page(1, &descriptor);
    first.write_translated("title", Some("One".to_string()), &FixedLanguage(EN)).unwrap();
    first.translations_mut().persist(&store, 1).await.unwrap();

    // A second in-memory copy that never loaded the first record
    let mut second = page(1, &descriptor);
    second.write_translated("title", Some("Two".to_string()), &FixedLanguage(EN)).unwrap();
    let result = second.translations_mut().persist(&store, 1).await;

    assert!(matches!(result, Err(TranslationError::DuplicateLanguage { .. })));
    assert_eq!(store.count(&descriptor), 1);
}

// ==================== Fallback Scenarios ====================

#[tokio::test]
async fn test_first_loaded_quirk_through_storage() {
    // registry = {en:1, fr:2, de:3}; the page only has an English title
    for fallback in [true, false] {
        let descriptor = declare_page(
            TranslationOptions::default()
                .with_writer(true)
                .with_fallback(fallback),
        );
        let store = MemoryStore::new();

        let mut page = page(1, &descriptor);
        page.write_translated("title", Some("Hello".to_string()), &FixedLanguage(EN))
            .unwrap();
        page.translations_mut().persist(&store, 1).await.unwrap();

        let page = load_page(1, &descriptor, &store).await;
        assert_eq!(
            page.read_translated("title", Some(FR), &FixedLanguage(EN))
                .unwrap()
                .as_deref(),
            Some("Hello"),
            "fallback = {}",
            fallback
        );
    }
}

#[tokio::test]
async fn test_exact_policy_fallback_to_default_language() {
    let store = MemoryStore::new();
    let with_fallback = declare_page(
        TranslationOptions::default()
            .with_writer(true)
            .with_lookup(MissPolicy::Exact)
            .with_fallback(true),
    );

    let mut page = page(1, &with_fallback);
    page.write_translated("title", Some("Hallo".to_string()), &FixedLanguage(DE)).unwrap();
    page.write_translated("title", Some("Hello".to_string()), &FixedLanguage(EN)).unwrap();
    page.translations_mut().persist(&store, 1).await.unwrap();

    let page = load_page(1, &with_fallback, &store).await;
    assert_eq!(
        page.read_translated("title", Some(FR), &FixedLanguage(FR))
            .unwrap()
            .as_deref(),
        Some("Hello")
    );

    let without_fallback = declare_page(
        TranslationOptions::default()
            .with_writer(true)
            .with_lookup(MissPolicy::Exact),
    );
    let page = load_page(1, &without_fallback, &store).await;
    assert_eq!(
        page.read_translated("title", Some(FR), &FixedLanguage(FR))
            .unwrap()
            .as_deref(),
        Some("")
    );
}

// ==================== All / Form Translations ====================

#[tokio::test]
async fn test_all_translations_saved_twice_creates_no_duplicates() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let store = MemoryStore::new();
    let registry = registry();

    let mut page = page(1, &descriptor);
    page.write_translated("title", Some("Bonjour".to_string()), &FixedLanguage(FR))
        .unwrap();
    page.translations_mut().persist(&store, 1).await.unwrap();

    for _ in 0..2 {
        let page = load_page(1, &descriptor, &store).await;
        let mut all = page.all_translations(&registry);
        assert_eq!(all.len(), 3);
        for (_, translation) in all.iter_mut() {
            store.save(&descriptor, translation).await.unwrap();
        }
    }

    assert_eq!(store.count(&descriptor), 3);
    let reloaded = load_page(1, &descriptor, &store).await;
    assert_eq!(
        reloaded.translations().find_exact(FR).and_then(|t| t.get("title")),
        Some("Bonjour")
    );
}

#[tokio::test]
async fn test_form_translations() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let registry = registry();

    let empty = page(1, &descriptor);
    let drafts = empty.form_translations(&registry);
    assert_eq!(drafts.len(), 3);
    assert!(drafts.iter().all(|t| t.is_new_record() && t.owner_id == Some(1)));

    let mut written = page(2, &descriptor);
    written
        .write_translated("title", Some("Hallo".to_string()), &FixedLanguage(DE))
        .unwrap();
    let form = written.form_translations(&registry);
    assert_eq!(form.len(), 1);
    assert_eq!(form[0].language_id, Some(DE));
}

// ==================== Owner Queries and Cascade Delete ====================

#[tokio::test]
async fn test_translated_query_and_destroy() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let store = MemoryStore::new();

    for (id, language) in [(1, EN), (2, FR), (3, EN)] {
        let mut page = page(id, &descriptor);
        page.write_translated("title", Some(format!("Page {}", id)), &FixedLanguage(language))
            .unwrap();
        page.translations_mut().persist(&store, id).await.unwrap();
    }

    assert_eq!(store.translated(&descriptor, EN).await.unwrap(), vec![1, 3]);
    assert_eq!(store.where_language_id(&descriptor, FR).await.unwrap(), vec![2]);

    assert_eq!(store.destroy_owner(&descriptor, 1).await.unwrap(), 1);
    assert_eq!(store.translated(&descriptor, EN).await.unwrap(), vec![3]);
}

// ==================== Declaration Failures ====================

#[test]
fn test_unknown_option_key_fails_at_declaration() {
    let options = TranslationOptions::from_json(serde_json::json!({
        "writer": true,
        "default_locale": "en"
    }));
    assert!(matches!(options, Err(TranslationError::InvalidOption(_))));
}

#[test]
fn test_unknown_attribute_fails_fast() {
    let descriptor = declare_page(TranslationOptions::default().with_writer(true));
    let mut page = page(1, &descriptor);

    let result = page.write_translated("subtitle", Some("x".to_string()), &FixedLanguage(EN));
    assert!(matches!(result, Err(TranslationError::UnknownAttribute { .. })));
    assert!(page.translations().is_empty());
}
