//! This library turns the raw output of a symbolic-execution program verifier
//! into structures that a viewer can navigate. It is concerned only with the
//! _data_ of that output; drawing, editor integration, and running the
//! verifier are left to its clients.
//!
//! # How it Works
//!
//! A failed verification reports two things, each handled by its own part of
//! the library.
//!
//! 1. A context log: the sequence of [`context::ContextEvent`]s that the
//!    verifier passed through on its way to the failure, most recent first.
//!    The [`trace`] module replays it into a [`trace::StepTree`] of navigable
//!    steps, and projects the call stack that was active when the verifier
//!    stopped.
//! 2. An [`forest::ExecutionForest`]: an overview of every path the verifier
//!    explored, as a compact string. The [`forest`] module decodes it into
//!    trees and lays those out on a grid of fixed-size cells, so that a click
//!    on the canvas can be mapped back to the node under it.
//!
//! The verifier also reports where each symbol that the program uses is
//! defined. The [`use_site`] module indexes these so that a position in the
//! source can be resolved to the definition of the symbol under it.
//!
//! The [`session`] module ties these together into the state that a viewer
//! keeps for the most recent result.
//!
//! # Basic Usage
//!
//! ```
//! use verifier_trace_explorer::{
//!     forest::{layout::Config, ExecutionForest},
//!     session::ForestView,
//! };
//!
//! let forest = ExecutionForest::new(vec!["Verifying main".into()], "#0[SE]");
//! let view = ForestView::new(&forest, Config::default()).unwrap();
//! let cell = view.config().cell_size();
//!
//! assert_eq!(view.labels(), vec!["Verifying main"]);
//!
//! // Clicking the root's marker yields the token that replays up to it.
//! let token = view.click(cell, cell / 2.0).unwrap();
//! assert_eq!(token.as_str(), "0");
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod constant;
pub mod context;
pub mod error;
pub mod forest;
pub mod session;
pub mod trace;
pub mod use_site;

// Re-exports to provide the library interface.
pub use forest::ExecutionForest;
pub use session::{ForestView, Session, TraceView};
pub use trace::{build_steps, project_call_stack};
