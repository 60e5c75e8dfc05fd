//! Naming conventions shared by the declaration engine and the storage providers.
//!
//! Entity types are named in `CamelCase` (`Product`, `BlogPost`). From that name
//! we derive the translation type (`BlogPostTranslation`), the owner foreign key
//! (`blog_post_id`) and table names (`blog_posts`, `blog_post_translations`).

use regex::Regex;
use std::sync::OnceLock;

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Columns every translation record carries regardless of declared attributes.
pub const RESERVED_COLUMNS: &[&str] = &["id", "language_id", "created_at", "updated_at"];

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_REGEX.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid regex"))
}

/// Check that a name is usable as a storage column (lowercase snake_case).
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// Strip any module path (`shop::Product` -> `Product`).
pub fn demodulize(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// `BlogPost` -> `blog_post`
pub fn underscore(type_name: &str) -> String {
    let name = demodulize(type_name);
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }

    out
}

/// Naive English pluralization, enough for table names.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// `BlogPost` -> `blog_posts`
pub fn tableize(type_name: &str) -> String {
    pluralize(&underscore(type_name))
}

/// `BlogPost` -> `BlogPostTranslation`
pub fn translation_type_for(entity_type: &str) -> String {
    format!("{}Translation", demodulize(entity_type))
}

/// `BlogPost` -> `blog_post_id`
pub fn foreign_key_for(entity_type: &str) -> String {
    format!("{}_id", underscore(entity_type))
}
