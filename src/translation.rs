use crate::i18n::LanguageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One language's variant of an entity's translatable attributes.
///
/// `language_id` is optional only so that storage can reject records that
/// were never given one; every translation built by this crate carries it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub id: Option<i64>,
    pub owner_id: Option<i64>,
    pub language_id: Option<LanguageId>,
    fields: BTreeMap<String, Option<String>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    changed: bool,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, unsaved translation for `language_id`.
    pub fn for_language(language_id: LanguageId) -> Self {
        Self {
            language_id: Some(language_id),
            changed: true,
            ..Self::default()
        }
    }

    /// Builder-style field assignment, handy for fixtures and loaders.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Read a field. Unset and explicitly nil fields both read as `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_deref())
    }

    pub fn set(&mut self, name: &str, value: Option<String>) {
        let previous = self.fields.insert(name.to_string(), value.clone());
        if previous.flatten() != value {
            self.changed = true;
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// New records and records with unsaved field changes.
    pub fn has_changes(&self) -> bool {
        self.is_new_record() || self.changed
    }

    pub fn is_for(&self, language_id: LanguageId) -> bool {
        self.language_id == Some(language_id)
    }

    /// Called by storage providers after a successful insert or update.
    pub fn mark_persisted(&mut self, id: i64, at: DateTime<Utc>) {
        if self.id.is_none() {
            self.created_at = Some(at);
        }
        self.id = Some(id);
        self.updated_at = Some(at);
        self.changed = false;
    }

    /// Reset change tracking on a record loaded from storage.
    pub fn mark_clean(&mut self) {
        self.changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_language_is_new_and_changed() {
        let t = Translation::for_language(LanguageId(2));
        assert_eq!(t.language_id, Some(LanguageId(2)));
        assert!(t.is_new_record());
        assert!(t.has_changes());
        assert!(t.is_for(LanguageId(2)));
        assert!(!t.is_for(LanguageId(1)));
    }

    #[test]
    fn test_get_unset_and_nil() {
        let mut t = Translation::for_language(LanguageId(1));
        assert_eq!(t.get("title"), None);
        t.set("title", None);
        assert_eq!(t.get("title"), None);
        t.set("title", Some("Hello".to_string()));
        assert_eq!(t.get("title"), Some("Hello"));
    }

    #[test]
    fn test_change_tracking() {
        let mut t = Translation::for_language(LanguageId(1)).with("title", "Hello");
        t.mark_persisted(7, Utc::now());
        assert!(!t.has_changes());

        // Same value is not a change
        t.set("title", Some("Hello".to_string()));
        assert!(!t.has_changes());

        t.set("title", Some("Bonjour".to_string()));
        assert!(t.has_changes());
    }

    #[test]
    fn test_mark_persisted_keeps_created_at() {
        let mut t = Translation::for_language(LanguageId(1));
        let first = Utc::now();
        t.mark_persisted(1, first);
        let later = first + chrono::Duration::seconds(5);
        t.mark_persisted(1, later);

        assert_eq!(t.created_at, Some(first));
        assert_eq!(t.updated_at, Some(later));
    }

    #[test]
    fn test_fields_iteration_order() {
        let t = Translation::new().with("title", "T").with("body", "B");
        let names: Vec<_> = t.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["body", "title"]);
    }

    #[test]
    fn test_serde_skips_change_flag() {
        let t = Translation::for_language(LanguageId(3)).with("title", "Hallo");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["language_id"], 3);
        assert_eq!(json["fields"]["title"], "Hallo");
        assert!(json.get("changed").is_none());
    }
}
