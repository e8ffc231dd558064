//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.
//!
//! Traces are written here in the order in which their events happened, and
//! are reversed into the most-recent-first order of the verifier's context log
//! when they are parsed.

#![cfg(test)]

use serde_json::{json, Value};
use verifier_trace_explorer::{context::ContextEvent, ExecutionForest};

/// The source file that all of the fixture locations point into.
pub const SOURCE_FILE: &str = "account.c";

/// Builds the wire form of an `Executing` event at `line` of the fixture
/// source, with the provided `heap` chunks and `env` bindings.
#[allow(unused)] // It is actually
pub fn executing(message: &str, line: u32, heap: &[(&str, &str)], env: &[(&str, &str)]) -> Value {
    let heap: Vec<Value> = heap.iter().map(|(coef, chunk)| json!([coef, chunk])).collect();
    let env: serde_json::Map<String, Value> = env
        .iter()
        .map(|(name, value)| ((*name).to_string(), json!(value)))
        .collect();

    json!([
        "Executing",
        heap,
        env,
        ["Lexed", [[SOURCE_FILE, line, 5], [SOURCE_FILE, line, 20]]],
        message
    ])
}

#[allow(unused)] // It is actually
pub fn push() -> Value {
    json!(["PushSubcontext"])
}

#[allow(unused)] // It is actually
pub fn pop() -> Value {
    json!(["PopSubcontext"])
}

#[allow(unused)] // It is actually
pub fn assuming(term: &str) -> Value {
    json!(["Assuming", term])
}

#[allow(unused)] // It is actually
pub fn left_branch() -> Value {
    json!(["Branching", "LeftBranch"])
}

#[allow(unused)] // It is actually
pub fn right_branch() -> Value {
    json!(["Branching", "RightBranch"])
}

/// Parses a trace written in the order in which its events happened into a
/// context log.
#[allow(unused)] // It is actually
pub fn parse_trace(chronological: Vec<Value>) -> anyhow::Result<Vec<ContextEvent>> {
    let mut log = chronological;
    log.reverse();

    Ok(serde_json::from_value(Value::Array(log))?)
}

/// A trace in which `main` calls `deposit`, which explores one side of a
/// branch under an assumption before returning, after which `main` fails.
#[allow(unused)] // It is actually
pub fn deposit_trace() -> Vec<Value> {
    vec![
        executing("Verifying main", 20, &[], &[]),
        executing("Calling deposit", 22, &[("1", "account(a, 0)")], &[("a", "a0")]),
        push(),
        executing(
            "Verifying deposit",
            5,
            &[("1", "account(a0, 0)")],
            &[("amount", "amount0"), ("account", "a0")],
        ),
        assuming("0 <= amount0"),
        left_branch(),
        executing(
            "Returning from deposit",
            9,
            &[("1", "account(a0, amount0)"), ("1/2", "integer(&limit, 100)")],
            &[("amount", "amount0"), ("account", "a0")],
        ),
        pop(),
        executing("Asserting balance", 23, &[("1", "account(a0, amount0)")], &[("a", "a0")]),
    ]
}

/// Parses the wire form of an execution forest.
#[allow(unused)] // It is actually
pub fn parse_forest(messages: &[&str], forest: &str) -> anyhow::Result<ExecutionForest> {
    Ok(serde_json::from_value(json!({
        "msgs": messages,
        "forest": forest,
    }))?)
}
