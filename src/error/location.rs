//! This module contains errors from interpreting verifier source locations and
//! the use sites that refer to them.

use thiserror::Error;

/// Errors that occur when a [`crate::context::Location`] cannot be turned into
/// a concrete source range.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Location of kind `{kind}` has no source range")]
    NotLexed { kind: &'static str },

    #[error("Location starts in {start:?} but ends in {end:?}")]
    PathMismatch { start: String, end: String },

    #[error("Source position {line}:{column} is not 1-based")]
    NotOneBased { line: u32, column: u32 },

    #[error("Definition refers to file {index} but only {files} files were reported")]
    UnknownDefinitionFile { index: usize, files: usize },
}

/// The result type for functions that may return location errors.
pub type Result<T> = std::result::Result<T, Error>;
