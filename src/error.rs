use crate::i18n::LanguageId;
use thiserror::Error;

/// Errors raised while declaring, resolving or persisting translations.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// An option key outside the recognized set (or a malformed value).
    #[error("invalid translation option: {0}")]
    InvalidOption(String),

    #[error("no translatable attributes declared for {0}")]
    NoAttributes(String),

    #[error("invalid attribute name '{name}' for {entity}: {reason}")]
    InvalidAttribute {
        entity: String,
        name: String,
        reason: &'static str,
    },

    #[error("translations already declared for {0}")]
    AlreadyDeclared(String),

    #[error("no translations declared for {0}")]
    NotDeclared(String),

    #[error("unknown translatable attribute '{name}' on {entity}")]
    UnknownAttribute { entity: String, name: String },

    #[error("{kind} accessor for '{name}' was not generated on {entity}")]
    AccessorNotGenerated {
        entity: String,
        name: String,
        kind: &'static str,
    },

    /// Required-field constraint on `language_id`.
    #[error("{0}: language_id can't be blank")]
    MissingLanguage(String),

    /// Uniqueness constraint on (owner, language_id).
    #[error("{table}: language_id {language} has already been taken for owner {owner}")]
    DuplicateLanguage {
        table: String,
        owner: i64,
        language: LanguageId,
    },

    #[error("{0}: owner id can't be blank")]
    MissingOwner(String),

    #[error("unknown language code: '{0}'")]
    UnknownLanguage(String),

    #[error("invalid language registry: {0}")]
    InvalidRegistry(String),

    #[error("translation #{0} not found")]
    RecordNotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, TranslationError>;
