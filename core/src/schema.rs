//! Parameter schema inference.
//!
//! Turns a handler's declared parameters into parser-facing
//! [`ParameterSpec`]s. The rules:
//!
//! - no annotation: string, required unless a default is declared;
//! - a single concrete type: that type, required unless a default is declared;
//! - a union: exactly one concrete member is allowed, and the parameter is
//!   optional when "none" is a member;
//! - booleans are presence flags and never required; absence is `false`, so
//!   any other declared default is rejected.
//!
//! Every non-boolean parameter renders as a named `--option value`; no
//! positional arguments are synthesized.
//!
//! # Examples
//!
//! ```
//! use command_scaffold_core::*;
//! use serde_json::json;
//!
//! let specs = infer_parameters("app::migrate", &[
//!     ParameterDecl::new("target").typed(ValueType::String),
//!     ParameterDecl::new("dryRun").typed(ValueType::Bool).with_default(json!(false)),
//! ]).unwrap();
//!
//! assert!(specs[0].required);
//! assert!(!specs[1].required);
//! assert!(specs[1].is_flag());
//! ```

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::error::BuildError;
use crate::types::{Annotation, ParameterDecl, ParameterSpec, ValueType};

/// Option names the generated parser defines itself.
const RESERVED_OPTIONS: &[&str] = &["help", "process-debug"];

/// Infers the schema of every declared parameter of `handler`.
///
/// # Errors
///
/// - [`BuildError::AmbiguousType`] when a union has zero or several concrete
///   members.
/// - [`BuildError::DuplicateParameter`] when two parameters render to the
///   same option name.
/// - [`BuildError::FlagDefault`] when a boolean declares a default other
///   than `false`.
/// - [`BuildError::ReservedParameter`] when a parameter would shadow
///   `--help` or the global `--process-debug` flag.
pub fn infer_parameters(
    handler: &str,
    decls: &[ParameterDecl],
) -> Result<Vec<ParameterSpec>, BuildError> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(decls.len());

    for decl in decls {
        let spec = infer_parameter(handler, decl)?;
        let long = spec.long_name();
        if long.is_empty() || RESERVED_OPTIONS.contains(&long.as_str()) {
            return Err(BuildError::ReservedParameter {
                handler: handler.to_string(),
                parameter: decl.name.clone(),
            });
        }
        if !seen.insert(long) {
            return Err(BuildError::DuplicateParameter {
                handler: handler.to_string(),
                parameter: decl.name.clone(),
            });
        }
        specs.push(spec);
    }

    debug!(handler, parameters = specs.len(), "inferred parameter schema");
    Ok(specs)
}

fn infer_parameter(handler: &str, decl: &ParameterDecl) -> Result<ParameterSpec, BuildError> {
    let has_default = decl.default.is_some();

    let (value_type, required) = match &decl.annotation {
        None => (ValueType::String, !has_default),
        Some(Annotation::Plain(value_type)) => (value_type.clone(), !has_default),
        Some(Annotation::Union { members, nullable }) => {
            let [member] = members.as_slice() else {
                return Err(BuildError::AmbiguousType {
                    handler: handler.to_string(),
                    parameter: decl.name.clone(),
                    types: members.iter().map(|m| m.label().to_string()).collect(),
                });
            };
            (member.clone(), !nullable && !has_default)
        }
    };

    if value_type == ValueType::Bool {
        let explicit = decl
            .default
            .as_ref()
            .filter(|d| !matches!(d, Value::Null | Value::Bool(false)));
        if let Some(default) = explicit {
            return Err(BuildError::FlagDefault {
                handler: handler.to_string(),
                parameter: decl.name.clone(),
                default: default.to_string(),
            });
        }
        return Ok(ParameterSpec {
            name: decl.name.clone(),
            value_type,
            required: false,
            default: Some(Value::Bool(false)),
        });
    }

    Ok(ParameterSpec {
        name: decl.name.clone(),
        value_type,
        required,
        default: decl.default.clone(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unannotated_defaults_to_required_string() {
        let specs = infer_parameters("app::auth", &[ParameterDecl::new("name")]).unwrap();
        assert_eq!(specs[0].value_type, ValueType::String);
        assert!(specs[0].required);
    }

    #[test]
    fn test_unannotated_with_default_is_optional() {
        let specs = infer_parameters(
            "app::auth",
            &[ParameterDecl::new("realm").with_default(json!("main"))],
        )
        .unwrap();
        assert!(!specs[0].required);
        assert_eq!(specs[0].default, Some(json!("main")));
    }

    #[test]
    fn test_optional_union_is_not_required() {
        let specs = infer_parameters(
            "app::greet",
            &[ParameterDecl::new("count").optional(ValueType::Integer)],
        )
        .unwrap();
        assert_eq!(specs[0].value_type, ValueType::Integer);
        assert!(!specs[0].required);
        assert_eq!(specs[0].default, None);
    }

    #[test]
    fn test_non_nullable_single_member_union_is_required() {
        let specs = infer_parameters(
            "app::greet",
            &[ParameterDecl::new("count").union(vec![ValueType::Float], false)],
        )
        .unwrap();
        assert_eq!(specs[0].value_type, ValueType::Float);
        assert!(specs[0].required);
    }

    #[test]
    fn test_multi_type_union_is_ambiguous() {
        let err = infer_parameters(
            "app::greet",
            &[ParameterDecl::new("count").union(vec![ValueType::Integer, ValueType::String], true)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            BuildError::AmbiguousType {
                handler: "app::greet".to_string(),
                parameter: "count".to_string(),
                types: vec!["int".to_string(), "str".to_string()],
            }
        );
    }

    #[test]
    fn test_bool_is_flag_defaulting_false() {
        let specs = infer_parameters(
            "app::migrate",
            &[ParameterDecl::new("force").typed(ValueType::Bool)],
        )
        .unwrap();
        assert!(!specs[0].required);
        assert_eq!(specs[0].default, Some(json!(false)));
    }

    #[test]
    fn test_bool_true_default_rejected() {
        let err = infer_parameters(
            "app::x",
            &[ParameterDecl::new("verbose")
                .typed(ValueType::Bool)
                .with_default(json!(true))],
        )
        .unwrap_err();
        assert_eq!(
            err,
            BuildError::FlagDefault {
                handler: "app::x".to_string(),
                parameter: "verbose".to_string(),
                default: "true".to_string(),
            }
        );

        let specs = infer_parameters(
            "app::x",
            &[ParameterDecl::new("quiet")
                .optional(ValueType::Bool)
                .with_default(Value::Null)],
        )
        .unwrap();
        assert_eq!(specs[0].default, Some(json!(false)));
    }

    #[test]
    fn test_colliding_option_names_rejected() {
        let err = infer_parameters(
            "app::migrate",
            &[
                ParameterDecl::new("dry_run").typed(ValueType::Bool),
                ParameterDecl::new("dryRun").typed(ValueType::Bool),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_help_is_reserved() {
        let err = infer_parameters("app::x", &[ParameterDecl::new("help")]).unwrap_err();
        assert!(matches!(err, BuildError::ReservedParameter { .. }));

        let err = infer_parameters("app::x", &[ParameterDecl::new("process_debug")]).unwrap_err();
        assert!(matches!(err, BuildError::ReservedParameter { .. }));
    }
}
