use std::fmt::Formatter;

use thiserror::Error;

/// An error that is localised to a particular offset in the input being
/// processed.
///
/// What the offset counts depends on the subsystem: the trace builders use the
/// index of the offending event in the input list, while the forest decoder
/// uses the character offset in the forest string.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// The offset in the input where the error occurred.
    pub location: usize,

    /// The error data
    pub payload: E,
}

/// Displays the error prefixed by the offset in the input where it occurred.
impl<E> std::fmt::Display for Located<E>
where
    E: std::fmt::Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.location, self.payload)
    }
}

/// A trait for types that can have an input offset attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached offset.
    type Located;

    /// Attach the input offset described by `location` to the error.
    fn locate(self, location: usize) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, location: usize) -> Self::Located {
        self.map_err(|e| Located {
            location,
            payload: e,
        })
    }
}
