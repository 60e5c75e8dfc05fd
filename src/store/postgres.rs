//! PostgreSQL storage provider (sqlx).
//!
//! Column and table names come from the descriptor, whose attribute and type
//! names are validated as lowercase identifiers at declaration time. They are
//! double-quoted into SQL text; values are always bound.

use crate::declaration::TranslationDescriptor;
use crate::error::{Result, TranslationError};
use crate::i18n::LanguageId;
use crate::store::TranslationStore;
use crate::translation::Translation;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{info, warn};

/// Double-quote an identifier. Declared names may be SQL keywords (`order`, `user`).
fn quoted(ident: &str) -> String {
    format!("\"{}\"", ident)
}

fn quoted_attributes(descriptor: &TranslationDescriptor) -> Vec<String> {
    descriptor.attributes().iter().map(|attr| quoted(attr)).collect()
}

/// `CREATE TABLE` for a descriptor's translation table, carrying the
/// required-field and per-owner uniqueness constraints.
pub fn create_table_sql(descriptor: &TranslationDescriptor) -> String {
    let fk = quoted(descriptor.owner_foreign_key());
    let mut columns = vec![
        "\"id\" BIGSERIAL PRIMARY KEY".to_string(),
        format!("{} BIGINT NOT NULL", fk),
        "\"language_id\" INTEGER NOT NULL".to_string(),
    ];
    columns.extend(quoted_attributes(descriptor).into_iter().map(|attr| format!("{} TEXT", attr)));
    columns.push("\"created_at\" TIMESTAMPTZ NOT NULL DEFAULT now()".to_string());
    columns.push("\"updated_at\" TIMESTAMPTZ NOT NULL DEFAULT now()".to_string());
    columns.push(format!("UNIQUE ({}, \"language_id\")", fk));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quoted(&descriptor.translation_table()),
        columns.join(",\n    ")
    )
}

/// Minimal owner table for the `translated` join, used when the entity table
/// is not managed elsewhere.
pub fn create_entity_table_sql(descriptor: &TranslationDescriptor) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\"id\" BIGINT PRIMARY KEY)",
        quoted(&descriptor.entity_table())
    )
}

pub fn insert_owner_sql(descriptor: &TranslationDescriptor) -> String {
    format!(
        "INSERT INTO {} (\"id\") VALUES ($1) ON CONFLICT (\"id\") DO NOTHING",
        quoted(&descriptor.entity_table())
    )
}

pub fn select_sql(descriptor: &TranslationDescriptor) -> String {
    format!(
        "SELECT \"id\", {fk}, \"language_id\", {attrs}, \"created_at\", \"updated_at\" FROM {table} WHERE {fk} = $1 ORDER BY \"id\"",
        fk = quoted(descriptor.owner_foreign_key()),
        attrs = quoted_attributes(descriptor).join(", "),
        table = quoted(&descriptor.translation_table()),
    )
}

pub fn insert_sql(descriptor: &TranslationDescriptor) -> String {
    let attrs = quoted_attributes(descriptor);
    let placeholders: Vec<String> = (0..attrs.len() + 2).map(|i| format!("${}", i + 1)).collect();

    format!(
        "INSERT INTO {table} ({fk}, \"language_id\", {attrs}) VALUES ({values}) RETURNING \"id\", \"created_at\", \"updated_at\"",
        table = quoted(&descriptor.translation_table()),
        fk = quoted(descriptor.owner_foreign_key()),
        attrs = attrs.join(", "),
        values = placeholders.join(", "),
    )
}

pub fn update_sql(descriptor: &TranslationDescriptor) -> String {
    let assignments: Vec<String> = quoted_attributes(descriptor)
        .iter()
        .enumerate()
        .map(|(i, attr)| format!("{} = ${}", attr, i + 3))
        .collect();

    format!(
        "UPDATE {table} SET \"language_id\" = $2, {assignments}, \"updated_at\" = now() WHERE \"id\" = $1 RETURNING \"updated_at\"",
        table = quoted(&descriptor.translation_table()),
        assignments = assignments.join(", "),
    )
}

pub fn delete_owner_sql(descriptor: &TranslationDescriptor) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        quoted(&descriptor.translation_table()),
        quoted(descriptor.owner_foreign_key())
    )
}

/// Owners having a translation in a language: the entity table joined to its
/// translations, filtered on the prefixed `language_id`.
pub fn translated_sql(descriptor: &TranslationDescriptor) -> String {
    let entities = quoted(&descriptor.entity_table());
    let translations = quoted(&descriptor.translation_table());

    format!(
        "SELECT DISTINCT {entities}.\"id\" FROM {entities} INNER JOIN {translations} ON {translations}.{fk} = {entities}.\"id\" WHERE {translations}.\"language_id\" = $1 ORDER BY {entities}.\"id\"",
        fk = quoted(descriptor.owner_foreign_key()),
    )
}

/// Translation storage backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgTranslationStore {
    pool: PgPool,
}

impl PgTranslationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        info!("Connected translation store to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Create the translation table for a descriptor if it does not exist.
    pub async fn ensure_schema(&self, descriptor: &TranslationDescriptor) -> Result<()> {
        sqlx::query(&create_table_sql(descriptor))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Make sure an owner row exists so `translated` can join to it.
    pub async fn ensure_owner(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<()> {
        sqlx::query(&create_entity_table_sql(descriptor))
            .execute(&self.pool)
            .await?;
        sqlx::query(&insert_owner_sql(descriptor))
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn decode(descriptor: &TranslationDescriptor, row: &PgRow) -> Result<Translation> {
        let mut translation = Translation::new();
        for attr in descriptor.attributes() {
            translation.set(attr, row.try_get::<Option<String>, _>(attr.as_str())?);
        }
        translation.id = Some(row.try_get("id")?);
        translation.owner_id = Some(row.try_get(descriptor.owner_foreign_key())?);
        translation.language_id = Some(LanguageId(row.try_get("language_id")?));
        translation.created_at = Some(row.try_get("created_at")?);
        translation.updated_at = Some(row.try_get("updated_at")?);
        translation.mark_clean();
        Ok(translation)
    }
}

fn write_error(
    err: sqlx::Error,
    descriptor: &TranslationDescriptor,
    owner: i64,
    language: LanguageId,
) -> TranslationError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            warn!(
                "Rejected {} for owner {}: language {} already present",
                descriptor.translation_type(),
                owner,
                language
            );
            return TranslationError::DuplicateLanguage {
                table: descriptor.translation_table(),
                owner,
                language,
            };
        }
    }
    TranslationError::Database(err)
}

impl TranslationStore for PgTranslationStore {
    async fn load(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<Vec<Translation>> {
        let rows = sqlx::query(&select_sql(descriptor))
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|row| Self::decode(descriptor, row)).collect()
    }

    async fn save(&self, descriptor: &TranslationDescriptor, translation: &mut Translation) -> Result<()> {
        let table = descriptor.translation_table();
        let language_id = translation
            .language_id
            .ok_or_else(|| TranslationError::MissingLanguage(table.clone()))?;
        let owner_id = translation
            .owner_id
            .ok_or_else(|| TranslationError::MissingOwner(table))?;

        let values: Vec<Option<String>> = descriptor
            .attributes()
            .iter()
            .map(|attr| translation.get(attr).map(str::to_string))
            .collect();

        match translation.id {
            Some(id) => {
                let sql = update_sql(descriptor);
                let mut query = sqlx::query(&sql).bind(id).bind(language_id.get());
                for value in values {
                    query = query.bind(value);
                }
                let row = query
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| write_error(e, descriptor, owner_id, language_id))?
                    .ok_or(TranslationError::RecordNotFound(id))?;

                let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
                translation.mark_persisted(id, updated_at);
            }
            None => {
                let sql = insert_sql(descriptor);
                let mut query = sqlx::query(&sql).bind(owner_id).bind(language_id.get());
                for value in values {
                    query = query.bind(value);
                }
                let row = query
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| write_error(e, descriptor, owner_id, language_id))?;

                let id: i64 = row.try_get("id")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;
                translation.mark_persisted(id, created_at);
                info!(
                    "Created {} #{} (owner {}, language {})",
                    descriptor.translation_type(),
                    id,
                    owner_id,
                    language_id
                );
            }
        }

        Ok(())
    }

    async fn destroy_owner(&self, descriptor: &TranslationDescriptor, owner_id: i64) -> Result<u64> {
        let result = sqlx::query(&delete_owner_sql(descriptor))
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn translated(&self, descriptor: &TranslationDescriptor, language_id: LanguageId) -> Result<Vec<i64>> {
        let rows = sqlx::query(&translated_sql(descriptor))
            .bind(language_id.get())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>(0).map_err(TranslationError::from))
            .collect()
    }
}
