//! Command trie keyed by identifier tokens.
//!
//! Each [`CommandNode`] either holds one registered [`Command`], routes to
//! children, or both (so `foo` and `foo bar` can coexist). Children are kept
//! in a [`BTreeMap`], which gives lexicographic traversal for deterministic
//! help output.
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
//! assert!(tree.resolve(&["db", "migrate"]).is_ok());
//! assert!(matches!(tree.resolve(&["db"]), Err(DispatchError::RoutingOnly(_))));
//! assert!(matches!(tree.resolve(&["nope"]), Err(DispatchError::NotFound(_))));
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{BuildError, DispatchError};
use crate::types::Command;

/// One level of the command tree.
#[derive(Debug, Clone, Default)]
pub struct CommandNode {
    children: BTreeMap<String, CommandNode>,
    command: Option<Command>,
}

impl CommandNode {
    /// Command attached to this exact path.
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// Child routed by `token`.
    pub fn child(&self, token: &str) -> Option<&CommandNode> {
        self.children.get(token)
    }

    /// Children in lexicographic token order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &CommandNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` when the node has sub-paths.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns `true` for a node that only groups sub-paths.
    pub fn is_routing(&self) -> bool {
        self.command.is_none()
    }
}

/// Trie of registered commands.
#[derive(Debug, Clone, Default)]
pub struct CommandTree {
    root: CommandNode,
    len: usize,
}

impl CommandTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a command, creating routing nodes along its path.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateCommand`] when a command already sits at
    /// the same path. The tree is left unchanged in that case.
    pub fn insert(&mut self, command: Command) -> Result<(), BuildError> {
        if let Some(existing) = self.node(command.id().tokens()).and_then(CommandNode::command) {
            return Err(BuildError::DuplicateCommand {
                id: command.id().to_string(),
                existing: existing.handler().identity().to_string(),
                rejected: command.handler().identity().to_string(),
            });
        }

        let mut node = &mut self.root;
        for token in command.id().tokens() {
            node = node.children.entry(token.clone()).or_default();
        }

        debug!(id = %command.id(), handler = command.handler().identity(), "registered command");
        node.command = Some(command);
        self.len += 1;
        Ok(())
    }

    /// Node at `path`, routing or terminal. The empty path is the root.
    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(&self.root, |node, token| node.child(token.as_ref()))
    }

    /// Command registered at exactly `path`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] when no node exists at the path, and
    /// [`DispatchError::RoutingOnly`] when the node only groups sub-paths.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Result<&Command, DispatchError> {
        let joined = path
            .iter()
            .map(|token| token.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        match self.node(path) {
            Some(node) => node.command().ok_or(DispatchError::RoutingOnly(joined)),
            None => Err(DispatchError::NotFound(joined)),
        }
    }

    /// The root node (no command, empty token).
    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// All commands, depth first in lexicographic token order.
    pub fn commands(&self) -> Vec<&Command> {
        fn walk<'a>(node: &'a CommandNode, out: &mut Vec<&'a Command>) {
            if let Some(command) = node.command() {
                out.push(command);
            }
            for (_, child) in node.children() {
                walk(child, out);
            }
        }

        let mut out = Vec::with_capacity(self.len);
        walk(&self.root, &mut out);
        out
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no command is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
