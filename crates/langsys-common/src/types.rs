//! Shared wire and data-model types for the Langsys client

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel category holding tokens that carry no explicit category marker
pub const UNCATEGORIZED: &str = "__uncategorized__";

/// Self-referential marker key every category map carries, equal to its own
/// category name
pub const CATEGORY_KEY: &str = "__category__";

/// Structural marker names reserved by the wire format. A bare token equal to
/// one of these must never be queued for translation.
pub const RESERVED_TOKENS: &[&str] = &[
    UNCATEGORIZED,
    CATEGORY_KEY,
    "__DirectToken__",
    "__symbol__",
];

/// Whether the given token collides with a reserved structural marker
pub fn is_reserved_token(token: &str) -> bool {
    RESERVED_TOKENS.contains(&token)
}

/// A single category's token map. `None` is the pending marker: the token has
/// been reported to the server but carries no translation yet.
pub type CategoryMap = HashMap<String, Option<String>>;

/// The full translation set for one locale: category -> token -> translation
pub type TranslationData = HashMap<String, CategoryMap>;

/// An unresolved token queued for submission to the translation manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTokenRecord {
    /// The Langsys project this token belongs to
    #[serde(rename = "projectid")]
    pub project_id: String,
    /// Category the token was looked up under; empty for uncategorized
    pub category: String,
    /// The literal source-language string used as the lookup key
    pub token: String,
}

impl MissingTokenRecord {
    pub fn new(
        project_id: impl Into<String>,
        category: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            category: category.into(),
            token: token.into(),
        }
    }

    /// Dedup key: two records are the same missing token iff their
    /// (category, token) pairs match
    pub fn key(&self) -> (&str, &str) {
        (&self.category, &self.token)
    }
}

/// Locale directory entry with full and language-only display names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleInfo {
    /// The locale code (e.g., "fr-CA")
    pub code: String,
    /// Full locale name (e.g., "French (Canada)")
    pub locale_name: String,
    /// Language name only (e.g., "French")
    pub lang_name: String,
}

/// Flat locale directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleName {
    pub code: String,
    pub name: String,
}

/// Categorized locale directory: language name -> locales for that language
pub type LocaleDirectory = HashMap<String, Vec<LocaleName>>;
