//! This module contains the error type that pertains to decoding the compact
//! execution forest encoding.

use thiserror::Error;

use crate::error::container;

/// Errors that occur while decoding an execution forest string into
/// [`crate::forest::ForestNode`]s.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Unrecognized node tag {0:?}")]
    UnrecognizedTag(char),

    #[error("Node nests more than {limit} levels deep")]
    NestingTooDeep { limit: usize },

    #[error("Children clause opened here is never closed")]
    UnterminatedChildren,

    #[error("Expected a message id after `#`")]
    MissingMessageId,

    #[error("Message id {id:?} does not index a table of {available} messages")]
    UnknownMessage { id: String, available: usize },
}

/// A forest error with the character offset in the forest string.
pub type LocatedError = container::Located<Error>;

/// The result type for functions that may return forest errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, location: usize) -> Self::Located {
        container::Located {
            location,
            payload: self,
        }
    }
}
