//! This module contains the primary error type for the library's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod container;
pub mod forest;
pub mod location;
pub mod trace;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by the
/// clients of the library) should be members of this enum.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// Errors that come from reconstructing steps or call stacks from a trace.
    #[error(transparent)]
    Trace(#[from] trace::Error),

    /// Errors from decoding an execution forest.
    #[error(transparent)]
    Forest(#[from] forest::Error),

    /// Errors from interpreting a source location.
    #[error(transparent)]
    Location(#[from] location::Error),
}

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

/// A library error with an associated input offset.
pub type LocatedError = container::Located<Error>;

/// Allow simple conversions from located trace errors by re-wrapping the
/// located error around the more general payload.
impl From<trace::LocatedError> for LocatedError {
    fn from(value: trace::LocatedError) -> Self {
        Self {
            location: value.location,
            payload:  Error::from(value.payload),
        }
    }
}

/// Allow simple conversions from located forest errors by re-wrapping the
/// located error around the more general payload.
impl From<forest::LocatedError> for LocatedError {
    fn from(value: forest::LocatedError) -> Self {
        Self {
            location: value.location,
            payload:  Error::from(value.payload),
        }
    }
}
