//! This module contains the reconstruction of a context log into a navigable
//! tree of [`Step`]s.
//!
//! # Snapshots
//!
//! Each step owns a copy of the call stack, the assumptions, and the branch
//! decisions that were in effect when it happened. Replaying the log in the
//! order in which the events happened means that all of this is already known
//! by the time that a step is created, so the tree is built in a single pass
//! with no need to revisit steps to fill in their context.
//!
//! # Navigation
//!
//! The steps are stored in an arena inside the [`StepTree`] and refer to each
//! other by [`StepId`]. Ownership flows strictly from a parent to its
//! children, and the parent link on each step exists only to allow walking
//! back up the tree.

use std::{iter, mem};

use tracing::{debug, trace, warn};

use crate::{
    constant::{LEFT_BRANCH_STEP_LABEL, RIGHT_BRANCH_STEP_LABEL},
    context::{BranchKind, ContextEvent, Executing, Location, Term},
    error::{
        container::Locatable,
        trace::{Error, Result},
    },
};

/// Reconstructs the tree of steps described by the context log `events`
/// (most recent event first).
///
/// One step is created for every `Executing` event and for every `Branching`
/// event in the log. Subcontexts that are still open when the log ends are
/// closed as if the log contained the matching `PopSubcontext` events.
///
/// # Errors
///
/// If the log is structurally invalid, namely if:
///
/// - a `PushSubcontext` or `Branching` event occurs with no frame executing;
/// - a `PopSubcontext` event closes a subcontext that was never opened;
/// - the log contains no `Executing` event at all.
pub fn build_steps(events: &[ContextEvent]) -> Result<StepTree> {
    let mut builder = StepTreeBuilder::default();
    for (index, event) in events.iter().enumerate().rev() {
        trace!(index, event = event.tag(), "Replaying context event");
        builder.replay(index, event)?;
    }
    let tree = builder.finish()?;

    debug!(
        events = events.len(),
        steps = tree.len(),
        roots = tree.roots().len(),
        "Reconstructed step tree"
    );

    Ok(tree)
}

/// The identifier of a [`Step`] within its [`StepTree`].
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StepId(usize);

impl StepId {
    /// Gets the position of the step in the order in which the steps
    /// happened.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single navigable point in the reconstructed trace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// What the verifier was doing at this step.
    label: String,

    /// The call stack at this step, innermost frame first.
    frames: Vec<Executing>,

    /// The assumptions made up to this step.
    assumptions: Vec<Term>,

    /// The branch decisions taken up to this step, with the location at which
    /// each was taken.
    branches: Vec<(BranchKind, Location)>,

    /// The step that the subcontext containing this step was entered from.
    parent: Option<StepId>,

    /// The steps inside the subcontext entered from this step.
    children: Vec<StepId>,
}

impl Step {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the call stack at this step, innermost frame first.
    ///
    /// This is never empty.
    #[must_use]
    pub fn frames(&self) -> &[Executing] {
        &self.frames
    }

    /// Gets the frame that was executing at this step.
    #[must_use]
    pub fn current_frame(&self) -> Option<&Executing> {
        self.frames.first()
    }

    /// Gets the frame that called into the subcontext of this step, if any.
    #[must_use]
    pub fn caller_frame(&self) -> Option<&Executing> {
        self.frames.get(1)
    }

    #[must_use]
    pub fn assumptions(&self) -> &[Term] {
        &self.assumptions
    }

    #[must_use]
    pub fn branches(&self) -> &[(BranchKind, Location)] {
        &self.branches
    }

    #[must_use]
    pub fn parent(&self) -> Option<StepId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[StepId] {
        &self.children
    }
}

/// The result of reconstructing a context log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepTree {
    /// Every step, in the order in which they happened.
    steps: Vec<Step>,

    /// The steps that happened outside of any subcontext.
    roots: Vec<StepId>,

    /// The step that happened last, usually the one that failed.
    last: StepId,
}

impl StepTree {
    /// Gets the steps that happened outside of any subcontext, in order.
    #[must_use]
    pub fn roots(&self) -> &[StepId] {
        &self.roots
    }

    /// Gets the step that happened last.
    ///
    /// This is the step that a viewer should show by default, as it is where
    /// the verifier stopped.
    #[must_use]
    pub fn last(&self) -> StepId {
        self.last
    }

    /// Gets the step identified by `id`, if it belongs to this tree.
    #[must_use]
    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id.0)
    }

    /// Gets the number of steps in the tree.
    #[allow(clippy::len_without_is_empty)] // The tree cannot be empty.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Iterates over all of the steps in the order in which they happened.
    pub fn iter(&self) -> impl Iterator<Item = (StepId, &Step)> {
        self.steps.iter().enumerate().map(|(index, step)| (StepId(index), step))
    }

    /// Gets the chain of steps that enclose `id`, starting with its parent and
    /// ending with a root step.
    #[must_use]
    pub fn ancestors(&self, id: StepId) -> Vec<StepId> {
        iter::successors(self.get(id).and_then(Step::parent), |parent| {
            self.get(*parent).and_then(Step::parent)
        })
        .collect()
    }

    /// Gets the locations and messages of the frames of the step `id`, with
    /// the outermost frame first.
    ///
    /// This is the order in which they are reported as related information for
    /// a diagnostic.
    #[must_use]
    pub fn backtrace(&self, id: StepId) -> Vec<(&Location, &str)> {
        self.get(id)
            .map(|step| {
                step.frames
                    .iter()
                    .rev()
                    .map(|frame| (&frame.location, frame.message.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Gathers the state that a viewer shows for the step `id`.
    #[must_use]
    pub fn inspect(&self, id: StepId) -> Option<StepInspection<'_>> {
        let step = self.get(id)?;
        let frame = step.current_frame()?;

        Some(StepInspection {
            heap:          frame.heap_lines(),
            locals:        frame.env_lines(),
            caller_locals: step.caller_frame().map(Executing::env_lines),
            assumptions:   &step.assumptions,
            branches:      &step.branches,
        })
    }
}

/// The state of the verifier at a given step, rendered for display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepInspection<'a> {
    /// The heap chunks of the executing frame, sorted.
    pub heap: Vec<String>,

    /// The locals of the executing frame as `name: value` lines.
    pub locals: Vec<String>,

    /// The locals of the calling frame, or [`None`] if the step has no caller.
    pub caller_locals: Option<Vec<String>>,

    pub assumptions: &'a [Term],

    pub branches: &'a [(BranchKind, Location)],
}

/// The running state of a single reconstruction pass.
#[derive(Default)]
struct StepTreeBuilder<'a> {
    /// The steps created so far.
    steps: Vec<Step>,

    /// The frames that called into each open subcontext, outermost first.
    callers: Vec<&'a Executing>,

    /// The sibling lists of the enclosing subcontexts, outermost first.
    pending: Vec<Vec<StepId>>,

    /// The sibling list of the innermost open subcontext.
    current: Vec<StepId>,

    /// The step that the innermost open subcontext was entered from.
    parent: Option<StepId>,

    /// The most recent frame of the innermost open subcontext.
    active_frame: Option<&'a Executing>,

    last_step: Option<StepId>,

    assumptions: Vec<Term>,

    branches: Vec<(BranchKind, Location)>,
}

impl<'a> StepTreeBuilder<'a> {
    /// Replays the `event` found at `index` in the log.
    fn replay(&mut self, index: usize, event: &'a ContextEvent) -> Result<()> {
        match event {
            ContextEvent::Executing(frame) => {
                self.active_frame = Some(frame);
                self.add_step(frame.message.clone(), frame);
            }
            ContextEvent::PushSubcontext => {
                let frame = self
                    .active_frame
                    .take()
                    .ok_or_else(|| no_active_frame(event, index))?;
                let parent = *self
                    .current
                    .last()
                    .ok_or_else(|| Error::MissingParentStep.locate(index))?;

                self.callers.push(frame);
                self.pending.push(mem::take(&mut self.current));
                self.parent = Some(parent);
            }
            ContextEvent::PopSubcontext => self.pop_subcontext(index)?,
            ContextEvent::Assuming(term) => self.assumptions.push(term.clone()),
            ContextEvent::Branching(kind) => {
                let frame = self.active_frame.ok_or_else(|| no_active_frame(event, index))?;
                let label = match kind {
                    BranchKind::Left => LEFT_BRANCH_STEP_LABEL,
                    BranchKind::Right => RIGHT_BRANCH_STEP_LABEL,
                };

                self.add_step(label.to_string(), frame);
                self.branches.push((*kind, frame.location.clone()));
            }
        }

        Ok(())
    }

    /// Adds a step executing `frame` to the innermost open subcontext,
    /// snapshotting the current context into it.
    fn add_step(&mut self, label: String, frame: &Executing) {
        let id = StepId(self.steps.len());
        let frames = iter::once(frame)
            .chain(self.callers.iter().rev().copied())
            .cloned()
            .collect();

        self.steps.push(Step {
            label,
            frames,
            assumptions: self.assumptions.clone(),
            branches: self.branches.clone(),
            parent: self.parent,
            children: Vec::new(),
        });
        self.current.push(id);
        self.last_step = Some(id);
    }

    /// Closes the innermost open subcontext, attaching its steps as the
    /// children of the step it was entered from.
    ///
    /// A step that enters several subcontexts in turn keeps the steps of all
    /// of them, in order.
    fn pop_subcontext(&mut self, index: usize) -> Result<()> {
        let caller = self
            .callers
            .pop()
            .ok_or_else(|| Error::UnmatchedPop.locate(index))?;
        let enclosing = self
            .pending
            .pop()
            .ok_or_else(|| Error::MissingParentStep.locate(index))?;
        let parent = *enclosing
            .last()
            .ok_or_else(|| Error::MissingParentStep.locate(index))?;

        let children = mem::replace(&mut self.current, enclosing);
        self.steps
            .get_mut(parent.0)
            .ok_or_else(|| Error::MissingParentStep.locate(index))?
            .children
            .extend(children);

        self.active_frame = Some(caller);
        self.parent = self.pending.last().and_then(|siblings| siblings.last()).copied();

        Ok(())
    }

    /// Closes any subcontexts left open at the end of the log and produces the
    /// finished tree.
    fn finish(mut self) -> Result<StepTree> {
        if !self.callers.is_empty() {
            warn!(
                open = self.callers.len(),
                "Closing subcontexts left open at the end of the trace"
            );
        }
        while !self.callers.is_empty() {
            self.pop_subcontext(0)?;
        }

        let last = self.last_step.ok_or_else(|| Error::EmptyTrace.locate(0))?;
        Ok(StepTree {
            steps: self.steps,
            roots: self.current,
            last,
        })
    }
}

/// Builds the error for an `event` at `index` that requires an executing frame
/// when there is none.
fn no_active_frame(event: &ContextEvent, index: usize) -> crate::error::trace::LocatedError {
    Error::NoActiveFrame { event: event.tag() }.locate(index)
}

#[cfg(test)]
mod test {
    use crate::{
        constant::{LEFT_BRANCH_STEP_LABEL, RIGHT_BRANCH_STEP_LABEL},
        context::{BranchKind, ContextEvent, Env, Executing, Location},
        error::trace::Error,
        trace::steps::{build_steps, StepId, StepTree},
    };

    fn frame_at(message: &str, line: u32) -> Executing {
        Executing::new(
            vec![],
            Env::from([(format!("{message}_var"), "0".to_string())]),
            Location::lexed("main.c", (line, 1), (line, 10)),
            message,
        )
    }

    fn exec_at(message: &str, line: u32) -> ContextEvent {
        ContextEvent::Executing(frame_at(message, line))
    }

    fn labels(tree: &StepTree, ids: &[StepId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| tree.get(*id))
            .map(|step| step.label().to_string())
            .collect()
    }

    #[test]
    fn flat_logs_become_a_list_of_roots() -> anyhow::Result<()> {
        let events = vec![
            exec_at("second", 2),
            ContextEvent::Assuming("x == 1".into()),
            exec_at("first", 1),
        ];
        let tree = build_steps(&events)?;

        assert_eq!(tree.len(), 2);
        assert_eq!(labels(&tree, tree.roots()), vec!["first", "second"]);

        let first = tree.get(tree.roots()[0]).unwrap();
        let second = tree.get(tree.roots()[1]).unwrap();
        assert!(first.assumptions().is_empty());
        assert_eq!(second.assumptions(), ["x == 1".to_string()]);
        assert_eq!(tree.last(), tree.roots()[1]);

        Ok(())
    }

    #[test]
    fn subcontexts_become_children_of_the_calling_step() -> anyhow::Result<()> {
        let events = vec![
            exec_at("after call", 3),
            ContextEvent::PopSubcontext,
            exec_at("in callee", 10),
            ContextEvent::PushSubcontext,
            exec_at("call f", 2),
        ];
        let tree = build_steps(&events)?;

        assert_eq!(labels(&tree, tree.roots()), vec!["call f", "after call"]);
        let call = tree.get(tree.roots()[0]).unwrap();
        assert_eq!(labels(&tree, call.children()), vec!["in callee"]);

        let callee_id = call.children()[0];
        let callee = tree.get(callee_id).unwrap();
        assert_eq!(callee.parent(), Some(tree.roots()[0]));
        assert_eq!(callee.frames(), [frame_at("in callee", 10), frame_at("call f", 2)]);

        let after = tree.get(tree.roots()[1]).unwrap();
        assert_eq!(after.parent(), None);
        assert_eq!(after.frames(), [frame_at("after call", 3)]);
        assert_eq!(tree.last(), tree.roots()[1]);

        Ok(())
    }

    #[test]
    fn consecutive_subcontexts_share_their_calling_step() -> anyhow::Result<()> {
        let events = vec![
            ContextEvent::PopSubcontext,
            exec_at("in g", 20),
            ContextEvent::PushSubcontext,
            ContextEvent::PopSubcontext,
            exec_at("in f", 10),
            ContextEvent::PushSubcontext,
            exec_at("call f then g", 2),
        ];
        let tree = build_steps(&events)?;

        assert_eq!(labels(&tree, tree.roots()), vec!["call f then g"]);
        let call = tree.get(tree.roots()[0]).unwrap();
        assert_eq!(labels(&tree, call.children()), vec!["in f", "in g"]);

        Ok(())
    }

    #[test]
    fn nested_frames_are_ordered_innermost_first() -> anyhow::Result<()> {
        let events = vec![
            exec_at("in h", 30),
            ContextEvent::PushSubcontext,
            exec_at("call h", 20),
            ContextEvent::PushSubcontext,
            exec_at("call g", 10),
        ];
        let tree = build_steps(&events)?;

        let last = tree.get(tree.last()).unwrap();
        assert_eq!(
            last.frames(),
            [frame_at("in h", 30), frame_at("call h", 20), frame_at("call g", 10)]
        );
        assert_eq!(last.caller_frame(), Some(&frame_at("call h", 20)));
        assert_eq!(tree.ancestors(tree.last()).len(), 2);
        assert_eq!(labels(&tree, &tree.ancestors(tree.last())), vec!["call h", "call g"]);

        Ok(())
    }

    #[test]
    fn branching_creates_a_step_and_records_the_decision() -> anyhow::Result<()> {
        let events = vec![
            exec_at("then", 5),
            ContextEvent::Branching(BranchKind::Left),
            exec_at("if", 4),
        ];
        let tree = build_steps(&events)?;

        assert_eq!(
            labels(&tree, tree.roots()),
            vec!["if", LEFT_BRANCH_STEP_LABEL, "then"]
        );

        let branch = tree.get(tree.roots()[1]).unwrap();
        assert_eq!(branch.frames(), [frame_at("if", 4)]);
        assert!(branch.branches().is_empty());

        let then = tree.get(tree.roots()[2]).unwrap();
        assert_eq!(
            then.branches(),
            [(BranchKind::Left, Location::lexed("main.c", (4, 1), (4, 10)))]
        );

        Ok(())
    }

    #[test]
    fn branches_after_a_return_are_taken_in_the_caller() -> anyhow::Result<()> {
        let events = vec![
            exec_at("else", 3),
            ContextEvent::Branching(BranchKind::Right),
            ContextEvent::PopSubcontext,
            exec_at("in callee", 10),
            ContextEvent::PushSubcontext,
            exec_at("if f()", 2),
        ];
        let tree = build_steps(&events)?;

        assert_eq!(
            labels(&tree, tree.roots()),
            vec!["if f()", RIGHT_BRANCH_STEP_LABEL, "else"]
        );
        let last = tree.get(tree.last()).unwrap();
        assert_eq!(
            last.branches(),
            [(BranchKind::Right, Location::lexed("main.c", (2, 1), (2, 10)))]
        );

        Ok(())
    }

    #[test]
    fn open_subcontexts_are_closed_at_the_end() -> anyhow::Result<()> {
        let events = vec![
            exec_at("in callee", 10),
            ContextEvent::PushSubcontext,
            exec_at("call", 1),
        ];
        let tree = build_steps(&events)?;

        assert_eq!(labels(&tree, tree.roots()), vec!["call"]);
        let call = tree.get(tree.roots()[0]).unwrap();
        assert_eq!(call.children(), [tree.last()]);
        assert_eq!(tree.get(tree.last()).unwrap().label(), "in callee");

        Ok(())
    }

    #[test]
    fn assumptions_accumulate_across_subcontexts() -> anyhow::Result<()> {
        let events = vec![
            exec_at("after", 3),
            ContextEvent::PopSubcontext,
            ContextEvent::Assuming("inner".into()),
            exec_at("in callee", 10),
            ContextEvent::PushSubcontext,
            ContextEvent::Assuming("outer".into()),
            exec_at("call", 1),
        ];
        let tree = build_steps(&events)?;

        let last = tree.get(tree.last()).unwrap();
        assert_eq!(last.assumptions(), ["outer".to_string(), "inner".to_string()]);

        Ok(())
    }

    #[test]
    fn inspection_shows_caller_locals_only_inside_calls() -> anyhow::Result<()> {
        let events = vec![
            exec_at("in callee", 10),
            ContextEvent::PushSubcontext,
            exec_at("call", 1),
        ];
        let tree = build_steps(&events)?;

        let root = tree.inspect(tree.roots()[0]).unwrap();
        assert_eq!(root.locals, vec!["call_var: 0".to_string()]);
        assert_eq!(root.caller_locals, None);

        let last = tree.inspect(tree.last()).unwrap();
        assert_eq!(last.locals, vec!["in callee_var: 0".to_string()]);
        assert_eq!(last.caller_locals, Some(vec!["call_var: 0".to_string()]));

        Ok(())
    }

    #[test]
    fn backtraces_list_the_outermost_frame_first() -> anyhow::Result<()> {
        let events = vec![
            exec_at("in callee", 10),
            ContextEvent::PushSubcontext,
            exec_at("call", 1),
        ];
        let tree = build_steps(&events)?;

        let messages: Vec<&str> = tree
            .backtrace(tree.last())
            .into_iter()
            .map(|(_, message)| message)
            .collect();
        assert_eq!(messages, vec!["call", "in callee"]);

        Ok(())
    }

    #[test]
    fn pushing_without_a_frame_is_malformed() {
        let events = vec![exec_at("x", 1), ContextEvent::PushSubcontext];
        let error = build_steps(&events).unwrap_err();

        assert_eq!(
            error.payload,
            Error::NoActiveFrame {
                event: "PushSubcontext",
            }
        );
        assert_eq!(error.location, 1);
    }

    #[test]
    fn branching_straight_after_a_push_is_malformed() {
        let events = vec![
            ContextEvent::Branching(BranchKind::Left),
            ContextEvent::PushSubcontext,
            exec_at("call", 1),
        ];
        let error = build_steps(&events).unwrap_err();

        assert_eq!(error.payload, Error::NoActiveFrame { event: "Branching" });
        assert_eq!(error.location, 0);
    }

    #[test]
    fn unmatched_pops_are_malformed() {
        let events = vec![exec_at("after", 2), ContextEvent::PopSubcontext, exec_at("x", 1)];
        let error = build_steps(&events).unwrap_err();

        assert_eq!(error.payload, Error::UnmatchedPop);
        assert_eq!(error.location, 1);
    }

    #[test]
    fn logs_without_frames_are_malformed() {
        let error = build_steps(&[ContextEvent::Assuming("true".into())]).unwrap_err();
        assert_eq!(error.payload, Error::EmptyTrace);

        let error = build_steps(&[]).unwrap_err();
        assert_eq!(error.payload, Error::EmptyTrace);
    }
}
