//! Identifier splitting and validation.
//!
//! Command identifiers arrive as free-form strings such as `"db migrate"` or
//! `"services.list"`. They are split on runs of whitespace or `.` into
//! tokens; each token becomes one level of the command tree. Alias names are
//! single tokens.
//!
//! # Examples
//!
//! ```
//! use command_scaffold_core::*;
//!
//! assert_eq!(split_identifier("db  migrate"), vec!["db", "migrate"]);
//! assert_eq!(split_identifier("services.list"), vec!["services", "list"]);
//! assert!(validate_token("mdb").is_ok());
//! assert!(validate_token("m db").is_err());
//! ```

use crate::error::BuildError;

/// Returns `true` for characters that separate identifier tokens.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '.'
}

/// Splits a raw identifier into its tokens, dropping empty pieces.
pub fn split_identifier(raw: &str) -> Vec<String> {
    raw.split(is_separator)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Validates a single token of a command path or an alias name.
///
/// A token must be non-empty, contain no separator, and must not start with
/// `-` (it would be read as an option).
///
/// # Examples
///
/// ```
/// use command_scaffold_core::{BuildError, validate_token};
///
/// assert!(validate_token("migrate").is_ok());
/// assert_eq!(
///     validate_token("--dry-run"),
///     Err(BuildError::InvalidIdentifier("--dry-run".into()))
/// );
/// ```
pub fn validate_token(token: &str) -> Result<(), BuildError> {
    if token.is_empty() || token.starts_with('-') || token.chars().any(is_separator) {
        return Err(BuildError::InvalidIdentifier(token.to_string()));
    }
    Ok(())
}

/// Converts a declared parameter name into its long option form.
///
/// Underscores become dashes and camelCase humps are split, so both
/// `dry_run` and `dryRun` render as `dry-run`.
pub fn option_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if c == '_' {
            if !out.ends_with('-') {
                out.push('-');
            }
            previous_lower = false;
        } else if c.is_uppercase() {
            if previous_lower {
                out.push('-');
            }
            out.extend(c.to_lowercase());
            previous_lower = false;
        } else {
            out.push(c);
            previous_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out.trim_matches('-').to_string()
}
