//! This module contains the vocabulary of context events that a verifier emits
//! while symbolically executing a program.
//!
//! # Ordering
//!
//! The verifier reports its context as a list with the _most recent_ event
//! first. Consumers in [`crate::trace`] therefore walk the list from its end to
//! replay the events in the order in which they happened.
//!
//! # Wire Format
//!
//! Each event arrives as a JSON array whose first element is the tag of the
//! event. The [`serde::Deserialize`] implementations that understand this
//! shape live in [`wire`].

pub mod wire;

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    constant::FULL_COEFFICIENT,
    error::location::{Error, Result},
};

/// A symbolic term, as pretty-printed by the verifier.
pub type Term = String;

/// The symbolic heap of a frame, in the order the verifier reported it.
pub type Heap = Vec<HeapChunk>;

/// The local variables of a frame, mapping each name to its symbolic value.
///
/// The verifier does not give the bindings a meaningful order, so they are
/// kept sorted by name.
pub type Env = BTreeMap<String, Term>;

/// A single event in the context log of the verifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextEvent {
    /// The verifier evaluated a statement or expression.
    Executing(Executing),

    /// A nested evaluation (usually a call) was entered.
    PushSubcontext,

    /// The innermost nested evaluation was left.
    PopSubcontext,

    /// The verifier assumed `Term` to hold from here on.
    Assuming(Term),

    /// The verifier nondeterministically took one side of a branch at the
    /// location of the most recent [`ContextEvent::Executing`] event.
    Branching(BranchKind),
}

impl ContextEvent {
    /// Gets the tag that identifies this kind of event on the wire.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Executing(_) => "Executing",
            Self::PushSubcontext => "PushSubcontext",
            Self::PopSubcontext => "PopSubcontext",
            Self::Assuming(_) => "Assuming",
            Self::Branching(_) => "Branching",
        }
    }
}

/// A concrete evaluation step, which doubles as a frame of the call stack.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Executing {
    /// The symbolic heap at this point of the evaluation.
    pub heap: Heap,

    /// The local variables in scope.
    pub env: Env,

    /// Where in the source this evaluation happens.
    pub location: Location,

    /// What the verifier was doing.
    pub message: String,
}

impl Executing {
    /// Constructs a new frame.
    #[must_use]
    pub fn new(
        heap: Heap,
        env: Env,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            heap,
            env,
            location,
            message,
        }
    }

    /// Renders the heap sorted by chunk and then by coefficient.
    ///
    /// Chunks held with a full coefficient are rendered bare, and all others
    /// are prefixed by their coefficient in square brackets.
    #[must_use]
    pub fn heap_lines(&self) -> Vec<String> {
        self.heap
            .iter()
            .sorted_by(|a, b| (&a.chunk, &a.coefficient).cmp(&(&b.chunk, &b.coefficient)))
            .map(HeapChunk::to_string)
            .collect()
    }

    /// Renders the local variables as `name: value` lines, sorted.
    #[must_use]
    pub fn env_lines(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .sorted()
            .collect()
    }
}

/// A chunk of the symbolic heap, held with some fractional coefficient.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HeapChunk {
    /// The fraction of the chunk that is owned.
    pub coefficient: Term,

    /// The chunk itself.
    pub chunk: Term,
}

impl HeapChunk {
    /// Constructs a new heap chunk held with `coefficient`.
    #[must_use]
    pub fn new(coefficient: impl Into<Term>, chunk: impl Into<Term>) -> Self {
        let coefficient = coefficient.into();
        let chunk = chunk.into();
        Self { coefficient, chunk }
    }
}

impl std::fmt::Display for HeapChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.coefficient == FULL_COEFFICIENT {
            write!(f, "{}", self.chunk)
        } else {
            write!(f, "[{}]{}", self.coefficient, self.chunk)
        }
    }
}

/// The side of a branch that the verifier chose to explore.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum BranchKind {
    Left,
    Right,
}

/// A position in a source file, as reported by the verifier.
///
/// Lines and columns are 1-based.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SrcPos {
    pub path:   String,
    pub line:   u32,
    pub column: u32,
}

impl SrcPos {
    /// Constructs a new source position.
    #[must_use]
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        let path = path.into();
        Self { path, line, column }
    }

    /// Converts the position to a 0-based line and column.
    fn zero_based(&self) -> Result<LineColumn> {
        LineColumn::from_one_based(self.line, self.column)
    }
}

/// The location that the verifier attaches to an evaluation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Location {
    /// A span of source text.
    Lexed { start: SrcPos, end: SrcPos },

    /// A location that does not correspond to any source text.
    Dummy,

    /// A token produced by expanding a macro body at `call_site`.
    MacroExpansion {
        call_site: Box<Location>,
        body:      Box<Location>,
    },

    /// A token produced by substituting `argument` for a macro parameter
    /// occurring at `parameter`.
    MacroParameterExpansion {
        argument:  Box<Location>,
        parameter: Box<Location>,
    },
}

impl Location {
    /// Constructs a lexed location spanning from `start` to `end` within a
    /// single file.
    #[must_use]
    pub fn lexed(path: impl Into<String>, start: (u32, u32), end: (u32, u32)) -> Self {
        let path = path.into();
        Self::Lexed {
            start: SrcPos::new(path.clone(), start.0, start.1),
            end:   SrcPos::new(path, end.0, end.1),
        }
    }

    /// Gets the tag that identifies this kind of location on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lexed { .. } => "Lexed",
            Self::Dummy => "DummyLoc",
            Self::MacroExpansion { .. } => "MacroExpansion",
            Self::MacroParameterExpansion { .. } => "MacroParameterExpansion",
        }
    }

    /// Follows macro expansions back to the location written in the source
    /// that the user is editing.
    #[must_use]
    pub fn call_site(&self) -> &Location {
        match self {
            Self::MacroExpansion { call_site, .. } => call_site.call_site(),
            Self::MacroParameterExpansion { argument, .. } => argument.call_site(),
            other => other,
        }
    }

    /// Converts a lexed location into a 0-based source range.
    ///
    /// # Errors
    ///
    /// If the location is not [`Location::Lexed`], if it starts and ends in
    /// different files, or if its positions are not 1-based.
    pub fn source_range(&self) -> Result<SourceRange> {
        let Self::Lexed { start, end } = self else {
            return Err(Error::NotLexed { kind: self.kind() });
        };
        if start.path != end.path {
            return Err(Error::PathMismatch {
                start: start.path.clone(),
                end:   end.path.clone(),
            });
        }

        Ok(SourceRange {
            path:  start.path.clone(),
            start: start.zero_based()?,
            end:   end.zero_based()?,
        })
    }
}

/// A 0-based line and column in a source file.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LineColumn {
    pub line:   u32,
    pub column: u32,
}

impl LineColumn {
    /// Converts the 1-based `line` and `column` reported by the verifier.
    ///
    /// # Errors
    ///
    /// If either of them is zero.
    pub fn from_one_based(line: u32, column: u32) -> Result<Self> {
        match (line.checked_sub(1), column.checked_sub(1)) {
            (Some(line), Some(column)) => Ok(Self { line, column }),
            _ => Err(Error::NotOneBased { line, column }),
        }
    }
}

/// A 0-based range of source text within a single file.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SourceRange {
    pub path:  String,
    pub start: LineColumn,
    pub end:   LineColumn,
}
