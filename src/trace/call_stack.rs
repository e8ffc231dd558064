//! This module contains the projection of a context log onto the call stack
//! that is active when the log ends.

use tracing::debug;

use crate::{
    context::{ContextEvent, Executing},
    error::{
        container::Locatable,
        trace::{Error, Result},
    },
};

/// Projects the context log `events` (most recent event first) onto the call
/// stack active at the point where the verifier stopped.
///
/// The returned frames are ordered innermost first, so the first frame is the
/// evaluation that was in progress and each subsequent frame is the caller of
/// the one before it.
///
/// # Errors
///
/// If a `PopSubcontext` event closes a subcontext that was never opened, or if
/// the innermost subcontext has no executing frame.
pub fn project_call_stack(events: &[ContextEvent]) -> Result<Vec<Executing>> {
    // One slot per open subcontext, holding the most recent frame in it.
    let mut slots: Vec<Option<&Executing>> = vec![None];

    for (index, event) in events.iter().enumerate().rev() {
        match event {
            ContextEvent::Executing(frame) => {
                if let Some(slot) = slots.last_mut() {
                    *slot = Some(frame);
                }
            }
            ContextEvent::PushSubcontext => slots.push(None),
            ContextEvent::PopSubcontext => {
                if slots.len() <= 1 {
                    return Err(Error::UnmatchedPop.locate(index));
                }
                slots.pop();
            }
            ContextEvent::Assuming(_) | ContextEvent::Branching(_) => {}
        }
    }

    if !matches!(slots.last(), Some(Some(_))) {
        return Err(Error::EmptyCallStack.locate(0));
    }

    let stack: Vec<Executing> = slots.into_iter().rev().flatten().cloned().collect();
    debug!(
        events = events.len(),
        depth = stack.len(),
        "Projected call stack"
    );

    Ok(stack)
}
