//! This module is an integration test that reconstructs a hand-written
//! verifier trace, read from its wire form, into steps and a call stack.
#![cfg(test)]

use verifier_trace_explorer::{
    build_steps,
    context::{BranchKind, LineColumn},
    error::{trace, Error},
    project_call_stack,
    trace::StepTree,
    TraceView,
};

mod common;

fn labels(tree: &StepTree, ids: &[verifier_trace_explorer::trace::StepId]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| tree.get(*id))
        .map(|step| step.label().to_string())
        .collect()
}

#[test]
fn reconstructs_calls_as_nested_steps() -> anyhow::Result<()> {
    let events = common::parse_trace(common::deposit_trace())?;
    let tree = build_steps(&events)?;

    // One step per executing event and per branch taken
    assert_eq!(tree.len(), 6);
    assert_eq!(
        labels(&tree, tree.roots()),
        vec!["Verifying main", "Calling deposit", "Asserting balance"]
    );

    // The call holds everything that happened inside of it
    let call = tree.roots()[1];
    let call_step = tree.get(call).ok_or(anyhow::anyhow!("missing call step"))?;
    assert_eq!(
        labels(&tree, call_step.children()),
        vec!["Verifying deposit", "Executing left branch", "Returning from deposit"]
    );
    for child in call_step.children() {
        assert_eq!(tree.get(*child).and_then(|step| step.parent()), Some(call));
        assert_eq!(tree.ancestors(*child), vec![call]);
    }

    // The failure is shown by default
    let last = tree.get(tree.last()).ok_or(anyhow::anyhow!("missing last step"))?;
    assert_eq!(last.label(), "Asserting balance");

    Ok(())
}

#[test]
fn inspects_the_state_inside_a_call() -> anyhow::Result<()> {
    let events = common::parse_trace(common::deposit_trace())?;
    let tree = build_steps(&events)?;
    let returning = tree
        .iter()
        .find(|(_, step)| step.label() == "Returning from deposit")
        .map(|(id, _)| id)
        .ok_or(anyhow::anyhow!("missing return step"))?;

    let inspection = tree
        .inspect(returning)
        .ok_or(anyhow::anyhow!("missing inspection"))?;
    assert_eq!(
        inspection.heap,
        vec!["account(a0, amount0)", "[1/2]integer(&limit, 100)"]
    );
    assert_eq!(inspection.locals, vec!["account: a0", "amount: amount0"]);
    assert_eq!(inspection.caller_locals, Some(vec!["a: a0".to_string()]));
    assert_eq!(inspection.assumptions, ["0 <= amount0".to_string()]);

    // The branch was taken at the frame that was executing when it happened
    assert_eq!(inspection.branches.len(), 1);
    let (kind, location) = &inspection.branches[0];
    assert_eq!(*kind, BranchKind::Left);
    assert_eq!(location.source_range()?.start, LineColumn { line: 4, column: 4 });

    Ok(())
}

#[test]
fn backtraces_list_the_outermost_frame_first() -> anyhow::Result<()> {
    let events = common::parse_trace(common::deposit_trace())?;
    let tree = build_steps(&events)?;
    let call = tree.roots()[1];
    let inner = *tree
        .get(call)
        .and_then(|step| step.children().first())
        .ok_or(anyhow::anyhow!("missing inner step"))?;

    let messages: Vec<&str> = tree.backtrace(inner).into_iter().map(|(_, m)| m).collect();
    assert_eq!(messages, vec!["Calling deposit", "Verifying deposit"]);

    Ok(())
}

#[test]
fn projects_the_call_stack_after_returning() -> anyhow::Result<()> {
    let events = common::parse_trace(common::deposit_trace())?;
    let stack = project_call_stack(&events)?;

    assert_eq!(stack.len(), 1);
    assert_eq!(stack[0].message, "Asserting balance");

    Ok(())
}

#[test]
fn projects_the_call_stack_inside_a_call() -> anyhow::Result<()> {
    let mut trace = common::deposit_trace();
    trace.truncate(7);
    let events = common::parse_trace(trace)?;
    let stack = project_call_stack(&events)?;

    let messages: Vec<&str> = stack.iter().map(|frame| frame.message.as_str()).collect();
    assert_eq!(messages, vec!["Returning from deposit", "Calling deposit"]);

    Ok(())
}

#[test]
fn trace_views_show_steps_on_request() -> anyhow::Result<()> {
    let events = common::parse_trace(common::deposit_trace())?;
    let mut view = TraceView::new(&events)?;
    assert_eq!(
        view.current_step().map(|step| step.label().to_string()),
        Some("Asserting balance".to_string())
    );

    let first = view.tree().roots()[0];
    let inspection = view.show(first).ok_or(anyhow::anyhow!("missing inspection"))?;
    assert_eq!(inspection.caller_locals, None);
    assert_eq!(view.current(), first);

    Ok(())
}

#[test]
fn rejects_returns_from_calls_that_never_happened() -> anyhow::Result<()> {
    let events = common::parse_trace(vec![
        common::executing("Verifying main", 1, &[], &[]),
        common::pop(),
        common::executing("Asserting", 2, &[], &[]),
    ])?;

    // The log is most recent first, so the return sits at index 1
    let error = TraceView::new(&events).unwrap_err();
    assert_eq!(error.payload, Error::Trace(trace::Error::UnmatchedPop));
    assert_eq!(error.location, 1);

    Ok(())
}

#[test]
fn rejects_branches_before_anything_executes() -> anyhow::Result<()> {
    let events = common::parse_trace(vec![
        common::right_branch(),
        common::executing("Verifying main", 1, &[], &[]),
    ])?;

    let error = build_steps(&events).unwrap_err();
    assert_eq!(
        error.payload,
        trace::Error::NoActiveFrame {
            event: "Branching",
        }
    );
    assert_eq!(error.location, 1);

    Ok(())
}
