//! This module contains the decoder for the compact encoding of the execution
//! forest.
//!
//! # Grammar
//!
//! ```text
//! forest   := node*
//! node     := ('#' digits | 'B' | 'S' | 'E') children?
//! children := '[' node* ']' | node
//! ```
//!
//! - `#<id>` is an exec node whose message is entry `id` of the message table.
//! - `B` is a branch node.
//! - `S` and `E` are the success and failure outcomes. They are leaves, so
//!   they only ever take a bracketed children clause; a node written directly
//!   after them is their next sibling rather than their child.
//!
//! A node with no children clause (because it is followed by `]` or by the
//! end of the string) has no children. Nodes may nest at most
//! [`MAX_FOREST_DEPTH`] levels deep.
//!
//! # Paths
//!
//! Each exec node numbers the exec nodes below it (looking through branch
//! nodes) in the order in which they occur, and the top level of the forest is
//! numbered the same way. The path of an exec node is its number prefixed by
//! the path of its nearest exec ancestor.

use tracing::debug;

use crate::{
    constant::MAX_FOREST_DEPTH,
    error::{
        container::Locatable,
        forest::{Error, Result},
    },
    forest::{ForestNode, NodeKind, Path},
};

/// Decodes the `forest` string, resolving its message ids against `messages`,
/// into its top-level trees.
///
/// # Errors
///
/// If the forest contains an unrecognised tag, an unterminated children
/// clause, a message id that does not index `messages`, or nodes nested more
/// than [`MAX_FOREST_DEPTH`] levels deep. The error carries
/// the offset of the offending character in `forest`.
pub fn decode(messages: &[String], forest: &str) -> Result<Vec<ForestNode>> {
    let mut decoder = Decoder::new(messages, forest);
    let trees = decoder.forest()?;

    debug!(
        length = forest.len(),
        trees = trees.len(),
        "Decoded execution forest"
    );

    Ok(trees)
}

/// A single left-to-right pass over a forest string.
struct Decoder<'a> {
    /// The message table that exec nodes index into.
    messages: &'a [String],

    /// The forest string being decoded.
    input: &'a str,

    /// The offset of the next unconsumed character in `input`.
    position: usize,
}

impl<'a> Decoder<'a> {
    fn new(messages: &'a [String], input: &'a str) -> Self {
        let position = 0;
        Self {
            messages,
            input,
            position,
        }
    }

    /// Gets the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Consumes the next character, which has already been peeked as ASCII.
    fn bump(&mut self) {
        self.position += 1;
    }

    /// Decodes every top-level tree in the input.
    fn forest(&mut self) -> Result<Vec<ForestNode>> {
        let root = Path::root();
        let mut counter = 0;
        let mut trees = Vec::new();
        while let Some(tag) = self.peek() {
            trees.push(self.node(tag, &root, &mut counter, 1)?);
        }

        Ok(trees)
    }

    /// Decodes the node starting with `tag` at the current position, which
    /// sits `depth` levels down from the top of the forest.
    ///
    /// An exec node takes the next index from `counter` and starts a fresh
    /// numbering for the nodes below it. Other nodes leave the numbering to
    /// their children.
    fn node(
        &mut self,
        tag: char,
        path: &Path,
        counter: &mut usize,
        depth: usize,
    ) -> Result<ForestNode> {
        let start = self.position;
        if depth > MAX_FOREST_DEPTH {
            return Err(Error::NestingTooDeep {
                limit: MAX_FOREST_DEPTH,
            }
            .locate(start));
        }

        let (kind, children) = match tag {
            '#' => {
                self.bump();
                let message = self.message()?;
                let own_path = path.extended(*counter);
                *counter += 1;

                let mut child_counter = 0;
                let children = self.children(&own_path, &mut child_counter, depth, true)?;
                let kind = NodeKind::Exec {
                    message,
                    path: own_path,
                };
                (kind, children)
            }
            'B' => {
                self.bump();
                (NodeKind::Branch, self.children(path, counter, depth, true)?)
            }
            'S' => {
                self.bump();
                (NodeKind::Success, self.children(path, counter, depth, false)?)
            }
            'E' => {
                self.bump();
                (NodeKind::Error, self.children(path, counter, depth, false)?)
            }
            other => return Err(Error::UnrecognizedTag(other).locate(start)),
        };

        Ok(ForestNode::new(kind, children))
    }

    /// Decodes the message id at the current position and looks it up.
    fn message(&mut self) -> Result<String> {
        let start = self.position;
        let digits = self.input[start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Err(Error::MissingMessageId.locate(start));
        }
        self.position += digits;

        let id = &self.input[start..self.position];
        id.parse::<usize>()
            .ok()
            .and_then(|index| self.messages.get(index))
            .cloned()
            .ok_or_else(|| {
                Error::UnknownMessage {
                    id:        id.to_string(),
                    available: self.messages.len(),
                }
                .locate(start)
            })
    }

    /// Decodes the children clause that follows a node at `depth`, if there
    /// is one.
    ///
    /// A bare node is only taken as the single child when `bare_child` is set.
    fn children(
        &mut self,
        path: &Path,
        counter: &mut usize,
        depth: usize,
        bare_child: bool,
    ) -> Result<Vec<ForestNode>> {
        match self.peek() {
            Some('[') => {
                let open = self.position;
                self.bump();
                let mut children = Vec::new();
                loop {
                    match self.peek() {
                        Some(']') => {
                            self.bump();
                            return Ok(children);
                        }
                        Some(tag) => children.push(self.node(tag, path, counter, depth + 1)?),
                        None => return Err(Error::UnterminatedChildren.locate(open)),
                    }
                }
            }
            Some(']') | None => Ok(Vec::new()),
            Some(tag) if bare_child => Ok(vec![self.node(tag, path, counter, depth + 1)?]),
            Some(_) => Ok(Vec::new()),
        }
    }
}
