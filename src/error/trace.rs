//! This module contains the error type that pertains to reconstructing steps
//! and call stacks from a verifier trace.

use thiserror::Error;

use crate::error::container;

/// Errors that indicate a structurally invalid trace.
///
/// Every one of these is fatal to the reconstruction that encountered it: no
/// partial step tree or call stack is ever returned alongside them.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Encountered `{event}` before any frame was executing")]
    NoActiveFrame { event: &'static str },

    #[error("Encountered `PopSubcontext` with no open subcontext")]
    UnmatchedPop,

    #[error("Subcontext was opened with no step to attach its children to")]
    MissingParentStep,

    #[error("The trace contains no executing frame")]
    EmptyTrace,

    #[error("The innermost subcontext has no executing frame")]
    EmptyCallStack,
}

/// A trace error with the index of the event that exposed it.
pub type LocatedError = container::Located<Error>;

/// The result type for functions that may return trace errors.
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
