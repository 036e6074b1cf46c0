//! Secondary names for registered commands.
//!
//! An alias is a single top-level token bound to the canonical path of a
//! command already in the [`CommandTree`]. Dispatching through the alias uses
//! the same node, so the parser, handler and defaults are identical to the
//! canonical invocation.
//!
//! # Examples
//!
//! ```
//! use command_scaffold_core::*;
//!
//! let mut tree = CommandTree::new();
//! tree.insert(Command::new("db migrate", Handler::new("app::migrate", |_| Ok(()))).unwrap())
//!     .unwrap();
//!
//! let mut aliases = AliasRegistry::new();
//! let target = CommandId::parse("db migrate").unwrap();
//! aliases.register("mdb", &target, &tree).unwrap();
//!
//! assert_eq!(aliases.resolve("mdb"), Some(&target));
//! assert!(matches!(
//!     aliases.register("mdb", &target, &tree),
//!     Err(BuildError::AliasConflict { .. })
//! ));
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::BuildError;
use crate::tree::CommandTree;
use crate::types::CommandId;
use crate::validate::validate_token;

/// Alias table: alias name to canonical command path.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    aliases: BTreeMap<String, CommandId>,
}

impl AliasRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to the command at `canonical`.
    ///
    /// # Errors
    ///
    /// - [`BuildError::InvalidIdentifier`] when `name` is not a single token.
    /// - [`BuildError::UnknownAliasTarget`] when no command sits at
    ///   `canonical`.
    /// - [`BuildError::AliasConflict`] when `name` is already an alias or a
    ///   top-level name in the tree. The error names the existing owner and
    ///   its description.
    pub fn register(
        &mut self,
        name: &str,
        canonical: &CommandId,
        tree: &CommandTree,
    ) -> Result<(), BuildError> {
        validate_token(name)?;

        let target = tree
            .resolve(canonical.tokens())
            .map_err(|_| BuildError::UnknownAliasTarget {
                alias: name.to_string(),
                target: canonical.to_string(),
            })?;
        let target_identity = target.handler().identity().to_string();

        if let Some(existing) = self.aliases.get(name) {
            let owner = tree.resolve(existing.tokens()).ok();
            return Err(BuildError::AliasConflict {
                alias: name.to_string(),
                target: target_identity,
                owner: owner
                    .map(|c| c.handler().identity().to_string())
                    .unwrap_or_else(|| existing.to_string()),
                owner_description: Some(format!("alias to \"{existing}\"")),
            });
        }

        if let Some(node) = tree.root().child(name) {
            let (owner, owner_description) = match node.command() {
                Some(command) => (
                    command.handler().identity().to_string(),
                    command.description().map(String::from),
                ),
                None => (name.to_string(), Some("command group".to_string())),
            };
            return Err(BuildError::AliasConflict {
                alias: name.to_string(),
                target: target_identity,
                owner,
                owner_description,
            });
        }

        debug!(alias = name, target = %canonical, "registered alias");
        self.aliases.insert(name.to_string(), canonical.clone());
        Ok(())
    }

    /// Canonical path bound to `name`.
    pub fn resolve(&self, name: &str) -> Option<&CommandId> {
        self.aliases.get(name)
    }

    /// Aliases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandId)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Aliases pointing at `canonical`, in name order.
    pub fn aliases_of(&self, canonical: &CommandId) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, target)| *target == canonical)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` when no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{Command, Handler};

    use super::*;

    fn tree_with(ids: &[(&str, &str, &str)]) -> CommandTree {
        let mut tree = CommandTree::new();
        for (id, identity, description) in ids {
            tree.insert(
                Command::new(id, Handler::new(identity, |_| Ok(())))
                    .unwrap()
                    .with_description(description),
            )
            .unwrap();
        }
        tree
    }

    #[test]
    fn test_alias_conflicts_with_canonical_name() {
        let tree = tree_with(&[
            ("services list", "app::EntityList", "List all services."),
            ("doc", "app::EntityShow", "Show a service."),
        ]);
        let mut aliases = AliasRegistry::new();
        let target = CommandId::parse("services list").unwrap();

        let err = aliases.register("doc", &target, &tree).unwrap_err();
        assert_eq!(
            err,
            BuildError::AliasConflict {
                alias: "doc".to_string(),
                target: "app::EntityList".to_string(),
                owner: "app::EntityShow".to_string(),
                owner_description: Some("Show a service.".to_string()),
            }
        );
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_alias_conflicts_with_routing_node() {
        let tree = tree_with(&[("services list", "app::EntityList", "")]);
        let mut aliases = AliasRegistry::new();
        let target = CommandId::parse("services list").unwrap();

        let err = aliases.register("services", &target, &tree).unwrap_err();
        assert!(matches!(err, BuildError::AliasConflict { owner, .. } if owner == "services"));
    }

    #[test]
    fn test_alias_conflicts_with_existing_alias() {
        let tree = tree_with(&[("a", "app::a", ""), ("b", "app::b", "")]);
        let mut aliases = AliasRegistry::new();
        aliases
            .register("x", &CommandId::parse("a").unwrap(), &tree)
            .unwrap();

        let err = aliases
            .register("x", &CommandId::parse("b").unwrap(), &tree)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::AliasConflict { ref target, ref owner, .. }
                if target == "app::b" && owner == "app::a"
        ));
        assert_eq!(aliases.resolve("x").unwrap().to_string(), "a");
    }

    #[test]
    fn test_alias_requires_existing_target_and_single_token() {
        let tree = tree_with(&[("a", "app::a", "")]);
        let mut aliases = AliasRegistry::new();

        assert!(matches!(
            aliases.register("x", &CommandId::parse("missing").unwrap(), &tree),
            Err(BuildError::UnknownAliasTarget { .. })
        ));
        assert!(matches!(
            aliases.register("x y", &CommandId::parse("a").unwrap(), &tree),
            Err(BuildError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_aliases_of_lists_names() {
        let tree = tree_with(&[("a", "app::a", "")]);
        let mut aliases = AliasRegistry::new();
        let target = CommandId::parse("a").unwrap();
        aliases.register("z", &target, &tree).unwrap();
        aliases.register("y", &target, &tree).unwrap();

        assert_eq!(aliases.aliases_of(&target), vec!["y", "z"]);
    }
}
