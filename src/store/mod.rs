//! Storage providers.
//!
//! Resolution never touches storage; providers load translation sets, save
//! records built or changed in memory, and enforce the declared constraints
//! (`language_id` present, unique per owner).

mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgTranslationStore;

use crate::declaration::TranslationDescriptor;
use crate::error::Result;
use crate::i18n::LanguageId;
use crate::translation::Translation;

/// Persistence capability consumed by `TranslationSet`.
#[allow(async_fn_in_trait)]
pub trait TranslationStore {
    /// Translations owned by `owner_id`, in storage order.
    async fn load(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<Vec<Translation>>;

    /// Insert or update one translation, enforcing the declared constraints.
    async fn save(&self, descriptor: &TranslationDescriptor, translation: &mut Translation) -> Result<()>;

    /// Delete every translation owned by `owner_id` (owner destroyed).
    async fn destroy_owner(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<u64>;

    /// Ids of owners having a translation in `language_id`.
    async fn translated(&self, descriptor: &TranslationDescriptor, language_id: LanguageId) -> Result<Vec<i64>>;

    /// Alias of [`TranslationStore::translated`].
    async fn where_language_id(
        &self,
        descriptor: &TranslationDescriptor,
        language_id: LanguageId,
    ) -> Result<Vec<i64>> {
        self.translated(descriptor, language_id).await
    }
}
