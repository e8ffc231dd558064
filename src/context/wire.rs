//! This module contains the [`Deserialize`] implementations for the JSON shapes
//! in which the verifier reports its context.
//!
//! The verifier encodes its sum types as arrays with the name of the variant in
//! the first slot, followed by the variant's fields. For example, a frame is
//! reported as
//!
//! ```text
//! ["Executing", [["1", "chunk"]], {"x": "x0"}, ["Lexed", [["a.c", 1, 1], ["a.c", 1, 4]]], "message"]
//! ```
//!
//! which serde cannot express through its attributes, so the enums are
//! deserialized through hand-written visitors over the sequence instead.

use std::fmt;

use serde::{
    de::{self, Expected, SeqAccess, Visitor},
    Deserialize,
    Deserializer,
};

use crate::context::{BranchKind, ContextEvent, Executing, HeapChunk, Location, SrcPos, Term};

/// The tags that are valid in the first slot of a context event.
const CONTEXT_EVENT_TAGS: &[&str] = &[
    "Executing",
    "PushSubcontext",
    "PopSubcontext",
    "Assuming",
    "Branching",
];

/// The tags that are valid in the first slot of a location.
const LOCATION_TAGS: &[&str] = &[
    "Lexed",
    "DummyLoc",
    "MacroExpansion",
    "MacroParameterExpansion",
];

/// The names under which the branch kinds are reported.
const BRANCH_KINDS: &[&str] = &["LeftBranch", "RightBranch"];

/// Reads the next element of `seq`, reporting the element at `index` as
/// missing if the sequence has run out.
fn next<'de, A, T>(seq: &mut A, index: usize, expected: &dyn Expected) -> Result<T, A::Error>
where
    A: SeqAccess<'de>,
    T: Deserialize<'de>,
{
    seq.next_element()?
        .ok_or_else(|| de::Error::invalid_length(index, expected))
}

struct ContextEventVisitor;

impl<'de> Visitor<'de> for ContextEventVisitor {
    type Value = ContextEvent;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a context event array starting with its tag")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ContextEvent, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let tag: String = next(&mut seq, 0, &self)?;
        let event = match tag.as_str() {
            "Executing" => {
                let heap = next(&mut seq, 1, &self)?;
                let env = next(&mut seq, 2, &self)?;
                let location = next(&mut seq, 3, &self)?;
                let message: String = next(&mut seq, 4, &self)?;
                ContextEvent::Executing(Executing::new(heap, env, location, message))
            }
            "PushSubcontext" => ContextEvent::PushSubcontext,
            "PopSubcontext" => ContextEvent::PopSubcontext,
            "Assuming" => ContextEvent::Assuming(next(&mut seq, 1, &self)?),
            "Branching" => ContextEvent::Branching(next(&mut seq, 1, &self)?),
            other => return Err(de::Error::unknown_variant(other, CONTEXT_EVENT_TAGS)),
        };

        Ok(event)
    }
}

impl<'de> Deserialize<'de> for ContextEvent {
    fn deserialize<D>(deserializer: D) -> Result<ContextEvent, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(ContextEventVisitor)
    }
}

struct LocationVisitor;

impl<'de> Visitor<'de> for LocationVisitor {
    type Value = Location;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a location array starting with its tag")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Location, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let tag: String = next(&mut seq, 0, &self)?;
        let location = match tag.as_str() {
            "Lexed" => {
                let (start, end): (SrcPos, SrcPos) = next(&mut seq, 1, &self)?;
                Location::Lexed { start, end }
            }
            "DummyLoc" => Location::Dummy,
            "MacroExpansion" => Location::MacroExpansion {
                call_site: next(&mut seq, 1, &self)?,
                body:      next(&mut seq, 2, &self)?,
            },
            "MacroParameterExpansion" => Location::MacroParameterExpansion {
                argument:  next(&mut seq, 1, &self)?,
                parameter: next(&mut seq, 2, &self)?,
            },
            other => return Err(de::Error::unknown_variant(other, LOCATION_TAGS)),
        };

        Ok(location)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Location, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(LocationVisitor)
    }
}

impl<'de> Deserialize<'de> for BranchKind {
    fn deserialize<D>(deserializer: D) -> Result<BranchKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        match name.as_str() {
            "LeftBranch" => Ok(BranchKind::Left),
            "RightBranch" => Ok(BranchKind::Right),
            other => Err(de::Error::unknown_variant(other, BRANCH_KINDS)),
        }
    }
}

/// Source positions arrive as `[path, line, column]` triples.
impl<'de> Deserialize<'de> for SrcPos {
    fn deserialize<D>(deserializer: D) -> Result<SrcPos, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (path, line, column) = <(String, u32, u32)>::deserialize(deserializer)?;
        Ok(SrcPos { path, line, column })
    }
}

/// Heap chunks arrive as `[coefficient, chunk]` pairs.
impl<'de> Deserialize<'de> for HeapChunk {
    fn deserialize<D>(deserializer: D) -> Result<HeapChunk, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (coefficient, chunk) = <(Term, Term)>::deserialize(deserializer)?;
        Ok(HeapChunk { coefficient, chunk })
    }
}
