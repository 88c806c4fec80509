//! Token parsing for the resolution surface
//!
//! Tokens may carry an optional leading category marker of the form
//! `{[CATEGORY]}`, giving translators context for otherwise identical
//! strings (the word "Home" on a menu button vs. in page content).

use langsys_common::is_reserved_token;
use once_cell::sync::Lazy;
use regex::Regex;

// Case-insensitive; category characters restricted to letters, digits,
// space, underscore, hyphen, period; one optional trailing whitespace is
// swallowed with the marker.
static CATEGORY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\{\[([a-z0-9\s_\-.]*)\]\}\s?").unwrap());

/// A lookup token split into its category and bare-string parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    /// Extracted category; empty when no marker was present
    pub category: String,
    /// The bare token with any marker stripped
    pub token: String,
}

impl ParsedToken {
    /// Parse a full token, extracting and stripping the category marker if
    /// present
    pub fn parse(full_token: &str) -> Self {
        match CATEGORY_MARKER.captures(full_token) {
            Some(captures) => {
                let matched = captures.get(0).map(|m| m.end()).unwrap_or(0);
                Self {
                    category: captures[1].to_string(),
                    token: full_token[matched..].to_string(),
                }
            }
            None => Self {
                category: String::new(),
                token: full_token.to_string(),
            },
        }
    }

    /// Whether the bare token collides with a reserved structural marker and
    /// must never be queued for translation
    pub fn is_reserved(&self) -> bool {
        is_reserved_token(&self.token)
    }
}
