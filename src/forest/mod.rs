//! This module contains the execution forest: a compact overview of every
//! path that the verifier explored, with its decision points and outcomes.
//!
//! The verifier ships the forest as an [`ExecutionForest`], a string in a
//! terse grammar plus a table of the messages it refers to. The [`codec`]
//! turns that into trees of [`ForestNode`]s, and the [`layout`] engine turns
//! those into sized [`layout::LayoutNode`]s that can be drawn and clicked.

pub mod codec;
pub mod layout;

use itertools::Itertools;
use serde::Deserialize;

use crate::constant::{
    BRANCH_NODE_LABEL,
    ERROR_NODE_LABEL,
    PATH_TOKEN_SEPARATOR,
    SUCCESS_NODE_LABEL,
};

pub use codec::decode;

/// The execution forest as it is reported by the verifier.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ExecutionForest {
    /// The messages that the forest string refers to by index.
    #[serde(rename = "msgs")]
    pub messages: Vec<String>,

    /// The forest string itself.
    pub forest: String,
}

impl ExecutionForest {
    /// Constructs a new execution forest from its `messages` table and its
    /// encoded `forest`.
    #[must_use]
    pub fn new(messages: Vec<String>, forest: impl Into<String>) -> Self {
        let forest = forest.into();
        Self { messages, forest }
    }

    /// Decodes the forest into its top-level trees.
    ///
    /// # Errors
    ///
    /// See [`codec::decode`].
    pub fn decode(&self) -> crate::error::forest::Result<Vec<ForestNode>> {
        decode(&self.messages, &self.forest)
    }
}

/// A node in a tree of the execution forest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForestNode {
    pub kind: NodeKind,

    /// The nodes that follow this one, in order.
    pub children: Vec<ForestNode>,
}

impl ForestNode {
    /// Constructs a new node of `kind` with the provided `children`.
    #[must_use]
    pub fn new(kind: NodeKind, children: Vec<ForestNode>) -> Self {
        Self { kind, children }
    }
}

/// The kinds of node that occur in the execution forest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// A step of execution, which can be replayed up to by its `path`.
    Exec { message: String, path: Path },

    /// A point at which execution split.
    Branch,

    /// A path of execution that verified successfully.
    Success,

    /// A path of execution that failed.
    Error,
}

impl NodeKind {
    /// Gets the text that a viewer displays for a node of this kind.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Exec { message, .. } => message,
            Self::Branch => BRANCH_NODE_LABEL,
            Self::Success => SUCCESS_NODE_LABEL,
            Self::Error => ERROR_NODE_LABEL,
        }
    }

    #[must_use]
    pub fn is_exec(&self) -> bool {
        matches!(self, Self::Exec { .. })
    }

    /// Gets the replay path of the node if it is an exec node.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Exec { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// The position of an exec node in the forest, as the index of each exec node
/// among the exec nodes that share its nearest exec ancestor.
///
/// The indices are stored innermost first, so that extending a path with one
/// more level only touches its front.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Path {
    indices: Vec<usize>,
}

impl Path {
    /// Gets the path of a top-level node, which is empty.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Constructs a path from its indices, outermost first.
    #[must_use]
    pub fn from_outermost(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.reverse();
        Self { indices }
    }

    /// Gets the path of a node one level below `self` at position `index`.
    #[must_use]
    pub fn extended(&self, index: usize) -> Self {
        let indices = std::iter::once(index).chain(self.indices.iter().copied()).collect();
        Self { indices }
    }

    /// Gets the indices of the path, innermost first.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// Renders the path as the token that is sent to the verifier to replay
    /// execution up to the node it identifies.
    #[must_use]
    pub fn token(&self) -> PathToken {
        PathToken(self.indices.iter().rev().join(PATH_TOKEN_SEPARATOR))
    }
}

/// An opaque token that identifies an exec node to the verifier.
///
/// It consists of the indices of the node's [`Path`], outermost first,
/// separated by commas.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PathToken(String);

impl PathToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PathToken> for String {
    fn from(value: PathToken) -> Self {
        value.0
    }
}
