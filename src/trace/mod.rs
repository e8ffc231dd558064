//! This module contains the reconstructions of a verifier's context log.
//!
//! Both reconstructions walk the log from its end, which replays the events in
//! the order that they happened, and both are single-pass:
//!
//! - [`call_stack`] reduces the log to the call stack that is active once the
//!   log ends.
//! - [`steps`] reduces the log to a navigable tree of [`steps::Step`]s, each
//!   of which carries its own snapshot of the call stack, assumptions, and
//!   branch decisions.

pub mod call_stack;
pub mod steps;

pub use call_stack::project_call_stack;
pub use steps::{build_steps, Step, StepId, StepTree};
