use anyhow::{Context, Result};
use has_translations::config::Config;
use has_translations::{
    declare, HasTranslations, LanguageRegistry, LocaleLanguage, MemoryStore, PgTranslationStore,
    TranslationDescriptor, TranslationSet, TranslationStore,
};
use std::sync::Arc;
use tracing::info;

/// Demo entity: a product with a translated title and description.
struct Product {
    id: Option<i64>,
    translations: TranslationSet,
}

impl HasTranslations for Product {
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

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("has_translations=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let registry = Arc::new(LanguageRegistry::global().clone());

    let options = config.translation_options().with_writer(true);
    let descriptor = declare("Product", &["title", "description"], options)
        .context("Failed to declare Product translations")?;

    match &config.database_url {
        Some(url) => {
            let store = PgTranslationStore::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store
                .ensure_schema(&descriptor)
                .await
                .context("Failed to create translation table")?;
            store
                .ensure_owner(&descriptor, 1)
                .await
                .context("Failed to create demo product")?;
            run(&store, descriptor, registry, &config).await
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            run(&MemoryStore::new(), descriptor, registry, &config).await
        }
    }
}

async fn run<S: TranslationStore>(
    store: &S,
    descriptor: Arc<TranslationDescriptor>,
    registry: Arc<LanguageRegistry>,
    config: &Config,
) -> Result<()> {
    let mut current = LocaleLanguage::new(&config.default_locale, Arc::clone(&registry));
    let mut product = Product {
        id: Some(1),
        translations: TranslationSet::new(Arc::clone(&descriptor)),
    };

    let owner_id = product.record_id().context("Product has no id")?;

    // Start from what storage already holds
    product
        .translations_mut()
        .reload(store, owner_id)
        .await
        .context("Failed to load translations")?;

    // Write in the default locale, then in French
    product.write_translated("title", Some("Espresso machine".to_string()), &current)?;
    product.write_translated("description", Some("15 bar pump".to_string()), &current)?;
    current.set_locale("fr");
    product.write_translated("title", Some("Machine à espresso".to_string()), &current)?;

    let saved = product
        .translations_mut()
        .persist(store, owner_id)
        .await
        .context("Failed to save translations")?;
    info!("Saved {} translations", saved);

    // Reload from storage and read every language
    product
        .translations_mut()
        .reload(store, owner_id)
        .await
        .context("Failed to reload translations")?;

    for language in registry.list_enabled() {
        let title = product.read_translated("title", Some(language.id), &current)?;
        let description = product.read_translated("description", Some(language.id), &current)?;
        info!(
            "[{}] title={:?} description={:?} (exact: {})",
            language.code,
            title,
            description,
            product.translations().find_exact(language.id).is_some()
        );
    }

    let french = registry.id_for("fr").context("French is not registered")?;
    let owners = store.translated(&descriptor, french).await?;
    info!("Products translated to French: {:?}", owners);

    let report = serde_json::to_string_pretty(&descriptor.metrics().report())?;
    println!("{}", report);

    Ok(())
}
