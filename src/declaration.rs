//! Declaration engine.
//!
//! `declare` turns an entity type name, its translatable attribute names and a
//! set of options into a `TranslationDescriptor`: the resolved configuration,
//! the ownership relation and storage constraints, and a dispatch table of
//! per-attribute accessors. Descriptors are registered per entity type and are
//! immutable once registered.
//!
//! # Example
//!
//! ```rust,ignore
//! use has_translations::{declare, TranslationOptions};
//!
//! let product = declare(
//!     "Product",
//!     &["title", "description"],
//!     TranslationOptions::default().with_writer(true).with_fallback(true),
//! )?;
//! assert_eq!(product.translation_table(), "product_translations");
//! ```

use crate::error::{Result, TranslationError};
use crate::i18n::{LanguageId, ResolutionMetrics};
use crate::naming;
use crate::resolution::TranslationSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::info;

/// What `find_translation` answers when no translation matches the language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissPolicy {
    /// Answer the first loaded translation, whatever its language.
    ///
    /// This happens before (and regardless of) the `fallback` option, so with
    /// this policy `fallback` only matters when nothing is loaded at all.
    #[default]
    FirstLoaded,

    /// Answer nothing; leave substitution to the `fallback` option.
    Exact,
}

impl FromStr for MissPolicy {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first_loaded" => Ok(Self::FirstLoaded),
            "exact" => Ok(Self::Exact),
            other => Err(TranslationError::InvalidOption(format!(
                "unknown lookup policy '{}', expected 'first_loaded' or 'exact'",
                other
            ))),
        }
    }
}

/// Options accepted by `declare`.
///
/// Every field is optional; unset fields take the documented defaults when
/// the options are resolved. Unknown keys are rejected when parsing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationOptions {
    /// Substitute another translation when none matches (default: false)
    pub fallback: Option<bool>,

    /// Generate read accessors (default: true)
    pub reader: Option<bool>,

    /// Generate write and raw accessors (default: false)
    pub writer: Option<bool>,

    /// Value readers return when nothing resolves (default: `Some("")`).
    /// `null` means readers return `None`.
    #[serde(default, alias = "nil", deserialize_with = "explicit_null")]
    pub missing_value: Option<Option<String>>,

    /// Save new and changed translations with the entity (default: `writer`)
    #[serde(alias = "autosave")]
    pub cascade_persist: Option<bool>,

    /// Translation type name (default: `<EntityType>Translation`)
    #[serde(alias = "translation_class")]
    pub translation_type: Option<String>,

    /// Miss policy for `find_translation` (default: first loaded)
    pub lookup: Option<MissPolicy>,
}

/// Distinguishes `"missing_value": null` from an absent key.
fn explicit_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl TranslationOptions {
    /// Parse options from a JSON object, failing on unrecognized keys.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| TranslationError::InvalidOption(e.to_string()))
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_reader(mut self, reader: bool) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_writer(mut self, writer: bool) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_missing_value(mut self, missing_value: Option<&str>) -> Self {
        self.missing_value = Some(missing_value.map(str::to_string));
        self
    }

    pub fn with_cascade_persist(mut self, cascade_persist: bool) -> Self {
        self.cascade_persist = Some(cascade_persist);
        self
    }

    pub fn with_translation_type(mut self, translation_type: impl Into<String>) -> Self {
        self.translation_type = Some(translation_type.into());
        self
    }

    pub fn with_lookup(mut self, lookup: MissPolicy) -> Self {
        self.lookup = Some(lookup);
        self
    }

    fn resolve(self, attributes: Vec<String>) -> TranslationConfig {
        let writer = self.writer.unwrap_or(false);
        TranslationConfig {
            translatable_attributes: attributes,
            fallback: self.fallback.unwrap_or(false),
            generate_reader: self.reader.unwrap_or(true),
            generate_writer: writer,
            missing_value: self.missing_value.unwrap_or_else(|| Some(String::new())),
            cascade_persist: self.cascade_persist.unwrap_or(writer),
            lookup: self.lookup.unwrap_or_default(),
        }
    }
}

/// Resolved per-entity-type configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationConfig {
    pub translatable_attributes: Vec<String>,
    pub fallback: bool,
    pub generate_reader: bool,
    pub generate_writer: bool,
    pub missing_value: Option<String>,
    pub cascade_persist: bool,
    pub lookup: MissPolicy,
}

/// What happens to translations when their owner is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependent {
    Destroy,
}

/// The one-to-many ownership relation between entity and translation type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HasManyRelation {
    pub name: &'static str,
    pub owner_type: String,
    pub translation_type: String,
    pub foreign_key: String,
    pub dependent: Dependent,
    pub autosave: bool,
}

/// Constraints storage providers must enforce on translation records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Presence { field: String },
    Uniqueness { field: String, scope: String },
}

type ReaderFn = Box<dyn Fn(&TranslationSet, LanguageId) -> Option<String> + Send + Sync>;
type WriterFn = Box<dyn Fn(&mut TranslationSet, LanguageId, Option<String>) + Send + Sync>;

/// Accessors generated for one attribute.
pub struct Accessor {
    reader: Option<ReaderFn>,
    writer: Option<WriterFn>,
    raw: Option<ReaderFn>,
}

impl Accessor {
    fn generate(name: &str, config: &Arc<TranslationConfig>) -> Self {
        let reader = config.generate_reader.then(|| {
            let name = name.to_string();
            let config = Arc::clone(config);
            Box::new(move |set: &TranslationSet, language_id: LanguageId| {
                set.resolve_for_read(language_id)
                    .and_then(|t| t.get(&name))
                    .map(str::to_string)
                    .or_else(|| config.missing_value.clone())
            }) as ReaderFn
        });

        let writer = config.generate_writer.then(|| {
            let name = name.to_string();
            Box::new(
                move |set: &mut TranslationSet, language_id: LanguageId, value: Option<String>| {
                    set.find_or_build_translation(language_id).set(&name, value);
                },
            ) as WriterFn
        });

        // Raw values skip the missing-value default and never build a translation.
        let raw = config.generate_writer.then(|| {
            let name = name.to_string();
            Box::new(move |set: &TranslationSet, language_id: LanguageId| {
                set.translation(language_id, false)
                    .and_then(|t| t.get(&name))
                    .map(str::to_string)
            }) as ReaderFn
        });

        Self { reader, writer, raw }
    }

    pub fn has_reader(&self) -> bool {
        self.reader.is_some()
    }

    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .field("raw", &self.raw.is_some())
            .finish()
    }
}

/// Everything `declare` produced for one entity type.
#[derive(Debug)]
pub struct TranslationDescriptor {
    type_path: String,
    entity_type: String,
    translation_type: String,
    config: Arc<TranslationConfig>,
    relation: HasManyRelation,
    constraints: Vec<Constraint>,
    accessors: HashMap<String, Accessor>,
    metrics: ResolutionMetrics,
}

impl TranslationDescriptor {
    /// Validate and resolve a declaration without registering it.
    pub fn build(
        entity_type: &str,
        attribute_names: &[&str],
        options: TranslationOptions,
    ) -> Result<Self> {
        let translation_type = options
            .translation_type
            .clone()
            .unwrap_or_else(|| naming::translation_type_for(entity_type));

        for type_name in [entity_type, translation_type.as_str()] {
            if !naming::is_valid_identifier(&naming::underscore(type_name)) {
                return Err(TranslationError::InvalidOption(format!(
                    "'{}' is not a usable type name",
                    type_name
                )));
            }
        }

        let foreign_key = naming::foreign_key_for(entity_type);
        let attributes = validate_attributes(entity_type, &foreign_key, attribute_names)?;
        let config = Arc::new(options.resolve(attributes));

        let relation = HasManyRelation {
            name: "translations",
            owner_type: naming::demodulize(entity_type).to_string(),
            translation_type: translation_type.clone(),
            foreign_key: foreign_key.clone(),
            dependent: Dependent::Destroy,
            autosave: config.cascade_persist,
        };

        let constraints = vec![
            Constraint::Presence {
                field: "language_id".to_string(),
            },
            Constraint::Uniqueness {
                field: "language_id".to_string(),
                scope: foreign_key,
            },
        ];

        let accessors = config
            .translatable_attributes
            .iter()
            .map(|name| (name.clone(), Accessor::generate(name, &config)))
            .collect();

        Ok(Self {
            type_path: entity_type.to_string(),
            entity_type: naming::demodulize(entity_type).to_string(),
            translation_type,
            config,
            relation,
            constraints,
            accessors,
            metrics: ResolutionMetrics::new(),
        })
    }

    /// The entity type as declared, module path included (`shop::Page`).
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// The entity type without its module path (`Page`).
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn translation_type(&self) -> &str {
        &self.translation_type
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Translatable attribute names in declaration order.
    pub fn attributes(&self) -> &[String] {
        &self.config.translatable_attributes
    }

    pub fn relation(&self) -> &HasManyRelation {
        &self.relation
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn metrics(&self) -> &ResolutionMetrics {
        &self.metrics
    }

    pub fn entity_table(&self) -> String {
        naming::tableize(&self.entity_type)
    }

    pub fn translation_table(&self) -> String {
        naming::tableize(&self.translation_type)
    }

    pub fn owner_foreign_key(&self) -> &str {
        &self.relation.foreign_key
    }

    /// `product_translations.language_id`
    pub fn prefixed_language_id(&self) -> String {
        format!("{}.language_id", self.translation_table())
    }

    pub fn is_translatable(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    pub fn accessor(&self, name: &str) -> Result<&Accessor> {
        self.accessors
            .get(name)
            .ok_or_else(|| TranslationError::UnknownAttribute {
                entity: self.entity_type.clone(),
                name: name.to_string(),
            })
    }

    /// Run the generated reader for `name`.
    pub(crate) fn read(
        &self,
        set: &TranslationSet,
        name: &str,
        language_id: LanguageId,
    ) -> Result<Option<String>> {
        let reader = self
            .accessor(name)?
            .reader
            .as_ref()
            .ok_or_else(|| self.not_generated(name, "reader"))?;
        Ok(reader(set, language_id))
    }

    /// Run the generated writer for `name`.
    pub(crate) fn write(
        &self,
        set: &mut TranslationSet,
        name: &str,
        language_id: LanguageId,
        value: Option<String>,
    ) -> Result<()> {
        let writer = self
            .accessor(name)?
            .writer
            .as_ref()
            .ok_or_else(|| self.not_generated(name, "writer"))?;
        writer(set, language_id, value);
        Ok(())
    }

    /// Run the generated raw (before type cast) accessor for `name`.
    pub(crate) fn read_raw(
        &self,
        set: &TranslationSet,
        name: &str,
        language_id: LanguageId,
    ) -> Result<Option<String>> {
        let raw = self
            .accessor(name)?
            .raw
            .as_ref()
            .ok_or_else(|| self.not_generated(name, "raw"))?;
        Ok(raw(set, language_id))
    }

    fn not_generated(&self, name: &str, kind: &'static str) -> TranslationError {
        TranslationError::AccessorNotGenerated {
            entity: self.entity_type.clone(),
            name: name.to_string(),
            kind,
        }
    }
}

fn validate_attributes(
    entity_type: &str,
    foreign_key: &str,
    attribute_names: &[&str],
) -> Result<Vec<String>> {
    if attribute_names.is_empty() {
        return Err(TranslationError::NoAttributes(entity_type.to_string()));
    }

    let invalid = |name: &str, reason| TranslationError::InvalidAttribute {
        entity: entity_type.to_string(),
        name: name.to_string(),
        reason,
    };

    let mut seen = HashSet::new();
    for &name in attribute_names {
        if !naming::is_valid_identifier(name) {
            return Err(invalid(name, "not a lowercase identifier"));
        }
        if naming::RESERVED_COLUMNS.contains(&name) || name == foreign_key {
            return Err(invalid(name, "reserved column name"));
        }
        if !seen.insert(name) {
            return Err(invalid(name, "declared twice"));
        }
    }

    Ok(attribute_names.iter().map(|name| name.to_string()).collect())
}

/// Entity type path -> registered descriptor.
#[derive(Debug, Default)]
pub struct Declarations {
    types: RwLock<HashMap<String, Arc<TranslationDescriptor>>>,
}

/// Global declarations (initialized lazily)
static DECLARATIONS: OnceLock<Declarations> = OnceLock::new();

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static Declarations {
        DECLARATIONS.get_or_init(Declarations::new)
    }

    /// Build a descriptor and register it under its entity type path.
    pub fn declare(
        &self,
        entity_type: &str,
        attribute_names: &[&str],
        options: TranslationOptions,
    ) -> Result<Arc<TranslationDescriptor>> {
        let descriptor = TranslationDescriptor::build(entity_type, attribute_names, options)?;
        self.register(descriptor)
    }

    pub fn register(&self, descriptor: TranslationDescriptor) -> Result<Arc<TranslationDescriptor>> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        let type_path = descriptor.type_path().to_string();
        if types.contains_key(&type_path) {
            return Err(TranslationError::AlreadyDeclared(type_path));
        }

        info!(
            "Declared translations for {} ({}): {:?}",
            type_path,
            descriptor.translation_table(),
            descriptor.attributes()
        );

        let descriptor = Arc::new(descriptor);
        types.insert(type_path, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Look up the descriptor for an entity type path, exactly as declared.
    pub fn get(&self, entity_type: &str) -> Result<Arc<TranslationDescriptor>> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_type)
            .cloned()
            .ok_or_else(|| TranslationError::NotDeclared(entity_type.to_string()))
    }

    pub fn is_declared(&self, entity_type: &str) -> bool {
        self.get(entity_type).is_ok()
    }

    pub fn entity_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Declare translations for an entity type in the global registry.
pub fn declare(
    entity_type: &str,
    attribute_names: &[&str],
    options: TranslationOptions,
) -> Result<Arc<TranslationDescriptor>> {
    Declarations::global().declare(entity_type, attribute_names, options)
}
