//! Column name normalization
//!
//! The portfolio API reports field names in camelCase or PascalCase
//! (`userId`, `DateOfBirth`). SQL users expect snake_case columns, so every
//! key is normalized before it becomes a column name.

use once_cell::sync::Lazy;
use regex::Regex;

/// Boundary before a capitalized word: `userName` -> `user_Name`,
/// `HTTPStatus` -> `HTTP_Status` (acronym run stays intact).
static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));

/// Boundary between a lowercase letter or digit and an uppercase letter:
/// `parseXML` -> `parse_XML`.
static LOWER_TO_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Convert a mixed-case identifier into its canonical snake_case form.
///
/// The transformation is deterministic and idempotent: applying it to an
/// already-normalized name returns the name unchanged. Any string input is
/// accepted; there are no failure modes.
pub fn to_snake_case(name: &str) -> String {
    let pass = CAPITALIZED_WORD.replace_all(name, "${1}_${2}");
    LOWER_TO_UPPER.replace_all(&pass, "${1}_${2}").to_lowercase()
}
