//! Section-aware configuration merging.
//!
//! Configuration is folded from several sources in order. Each top-level key
//! is merged according to its [`SectionPolicy`]:
//!
//! - `extensions`, `paths`, `services`, `imports`: sequences, concatenated in
//!   source order. Duplicates are kept.
//! - `settings`: a mapping, merged by key union with the later source winning.
//! - anything else: copied when absent; sequences concatenate and mappings
//!   union (shallow) when both sides agree; otherwise the later value wins.
//!
//! # Example
//!
//! ```
//! use command_scaffold_core::*;
//! use serde_json::json;
//!
//! let mut merger = ConfigMerger::new();
//! merger.merge(json!({"imports": ["app.a"], "settings": {"a": 1}})).unwrap();
//! merger.merge(json!({"imports": ["app.b"], "settings": {"a": 2, "b": 3}})).unwrap();
//!
//! assert_eq!(
//!     merger.finish(),
//!     json!({"imports": ["app.a", "app.b"], "settings": {"a": 2, "b": 3}})
//! );
//! ```

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::MergeError;

/// Sections whose values are sequences merged by concatenation.
pub const SEQUENCE_SECTIONS: &[&str] = &["extensions", "paths", "services", "imports"];

/// Sections whose values are mappings merged by key union.
pub const MAPPING_SECTIONS: &[&str] = &["settings"];

/// How a top-level key is merged.
///
/// # Examples
///
/// ```
/// use command_scaffold_core::*;
///
/// assert_eq!(SectionPolicy::for_key("imports"), SectionPolicy::Append);
/// assert_eq!(SectionPolicy::for_key("settings"), SectionPolicy::Union);
/// assert_eq!(SectionPolicy::for_key("orm"), SectionPolicy::Override);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPolicy {
    /// Sequence concatenation.
    Append,
    /// Mapping key union, later value wins per key.
    Union,
    /// Later value wins unless both sides are sequences or mappings.
    Override,
}

impl SectionPolicy {
    /// Policy for a top-level key.
    pub fn for_key(key: &str) -> Self {
        if SEQUENCE_SECTIONS.contains(&key) {
            SectionPolicy::Append
        } else if MAPPING_SECTIONS.contains(&key) {
            SectionPolicy::Union
        } else {
            SectionPolicy::Override
        }
    }
}

/// Name of the JSON kind of `value`, used in type diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Accumulates configuration sources in order.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    merged: Map<String, Value>,
}

impl ConfigMerger {
    /// Starts from an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `incoming` into the accumulated configuration.
    ///
    /// # Errors
    ///
    /// [`MergeError::NotAMapping`] when `incoming` is not a mapping, and
    /// [`MergeError::SectionType`] when a recognized section has the wrong
    /// kind. The accumulated configuration is unchanged on error.
    pub fn merge(&mut self, incoming: Value) -> Result<&mut Self, MergeError> {
        let Value::Object(incoming) = incoming else {
            return Err(MergeError::NotAMapping(value_kind(&incoming)));
        };
        let mut next = self.merged.clone();
        merge_config(&mut next, incoming)?;
        self.merged = next;
        Ok(self)
    }

    /// The configuration accumulated so far.
    pub fn current(&self) -> &Map<String, Value> {
        &self.merged
    }

    /// Consumes the merger, returning the merged mapping as a value.
    pub fn finish(self) -> Value {
        Value::Object(self.merged)
    }
}

/// Merges `incoming` into `base` in place.
///
/// # Errors
///
/// [`MergeError::SectionType`] when a recognized section, on either side,
/// has the wrong kind. `base` may be partially updated on error; use
/// [`ConfigMerger`] for all-or-nothing folding.
pub fn merge_config(
    base: &mut Map<String, Value>,
    incoming: Map<String, Value>,
) -> Result<(), MergeError> {
    for (key, value) in incoming {
        match SectionPolicy::for_key(&key) {
            SectionPolicy::Append => {
                let items = expect_sequence(&key, value)?;
                match base.get_mut(&key) {
                    Some(existing) => match existing {
                        Value::Array(existing) => existing.extend(items),
                        other => {
                            return Err(section_type(&key, "sequence", other));
                        }
                    },
                    None => {
                        base.insert(key, Value::Array(items));
                    }
                }
            }
            SectionPolicy::Union => {
                let entries = expect_mapping(&key, value)?;
                match base.get_mut(&key) {
                    Some(existing) => match existing {
                        Value::Object(existing) => existing.extend(entries),
                        other => {
                            return Err(section_type(&key, "mapping", other));
                        }
                    },
                    None => {
                        base.insert(key, Value::Object(entries));
                    }
                }
            }
            SectionPolicy::Override => merge_other(base, key, value),
        }
    }

    debug!(keys = base.len(), "merged configuration source");
    Ok(())
}

fn merge_other(base: &mut Map<String, Value>, key: String, value: Value) {
    match (base.get_mut(&key), value) {
        (Some(Value::Array(existing)), Value::Array(items)) => existing.extend(items),
        (Some(Value::Object(existing)), Value::Object(entries)) => existing.extend(entries),
        (_, value) => {
            base.insert(key, value);
        }
    }
}

fn expect_sequence(section: &str, value: Value) -> Result<Vec<Value>, MergeError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(section_type(section, "sequence", &other)),
    }
}

fn expect_mapping(section: &str, value: Value) -> Result<Map<String, Value>, MergeError> {
    match value {
        Value::Object(entries) => Ok(entries),
        other => Err(section_type(section, "mapping", &other)),
    }
}

fn section_type(section: &str, expected: &'static str, actual: &Value) -> MergeError {
    MergeError::SectionType {
        section: section.to_string(),
        expected,
        actual: value_kind(actual),
    }
}
