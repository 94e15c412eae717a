//! Feedback-loop detection over the primitive dependency graph.
//!
//! A cycle of primitive outputs feeding back into their own inputs is how
//! SHDL expresses bistable state — a cross-coupled NOR latch is exactly two
//! primitives each driving the other. This is not an error; the driver map
//! already guarantees every sink has exactly one driver, so a cycle here
//! just means "this primitive's value next tick depends on its value this
//! tick," which codegen's tick function already handles by construction
//! (it reads the previous state word for every gather).
//!
//! What this pass exists for is to report *which* primitives participate
//! in a feedback loop, so tooling built on top of analysis (explain output,
//! the conformance suite's propagation-depth checks) can tell a purely
//! combinational component from one with latched state.

use shdl_ir::{BaseComponent, PrimitiveId, PrimitivePort, SinkRef, SourceRef};
use std::collections::{HashMap, HashSet};

/// Builds the primitive-to-primitive dependency graph (edge `a -> b` means
/// `a`'s output feeds one of `b`'s inputs) and returns the set of
/// primitives that lie on at least one cycle.
pub fn find_feedback_primitives(
    base: &BaseComponent,
    driver_map: &HashMap<SinkRef, SourceRef>,
) -> HashSet<PrimitiveId> {
    let mut edges: HashMap<PrimitiveId, Vec<PrimitiveId>> = HashMap::new();
    for (id, _) in base.primitives.iter() {
        edges.entry(id).or_default();
    }
    for (sink, source) in driver_map {
        let SinkRef::PrimitiveInput { instance: to, .. } = sink else {
            continue;
        };
        if let SourceRef::PrimitiveOutput(from) = source {
            edges.entry(*from).or_default().push(*to);
        }
    }

    let mut state: HashMap<PrimitiveId, Visit> = HashMap::new();
    let mut in_cycle = HashSet::new();
    let ids: Vec<PrimitiveId> = base.primitives.iter().map(|(id, _)| id).collect();
    for start in ids {
        if !state.contains_key(&start) {
            let mut stack = Vec::new();
            visit(start, &edges, &mut state, &mut stack, &mut in_cycle);
        }
    }
    in_cycle
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

fn visit(
    node: PrimitiveId,
    edges: &HashMap<PrimitiveId, Vec<PrimitiveId>>,
    state: &mut HashMap<PrimitiveId, Visit>,
    stack: &mut Vec<PrimitiveId>,
    in_cycle: &mut HashSet<PrimitiveId>,
) {
    state.insert(node, Visit::Active);
    stack.push(node);
    if let Some(succs) = edges.get(&node) {
        for &next in succs {
            match state.get(&next) {
                None => visit(next, edges, state, stack, in_cycle),
                Some(Visit::Active) => {
                    if let Some(pos) = stack.iter().position(|&n| n == next) {
                        for &n in &stack[pos..] {
                            in_cycle.insert(n);
                        }
                    }
                }
                Some(Visit::Done) => {}
            }
        }
    }
    stack.pop();
    state.insert(node, Visit::Done);
}

/// Helper used by tests to name primitives in feedback sets readably.
pub fn names(base: &BaseComponent, ids: &HashSet<PrimitiveId>) -> HashSet<String> {
    ids.iter().map(|id| base.primitives.get(*id).name.clone()).collect()
}
