//! Semantic analysis over the Base-SHDL intermediate representation.
//!
//! Consumes a flattened [`BaseComponent`] and checks the invariants the
//! flattener alone can't enforce: every sink driven exactly once, every
//! remaining port reference in range. The result is the Base component
//! paired with its driver map and feedback-loop membership — the only
//! extra structure code generation needs.

#![warn(missing_docs)]

pub mod driver_map;
pub mod feedback;

use shdl_diagnostics::DiagnosticSink;
use shdl_ir::{BaseComponent, PrimitiveId, SinkRef, SourceRef};
use std::collections::{HashMap, HashSet};

/// A Base component that has passed semantic analysis, enriched with its
/// driver map and the set of primitives participating in a feedback loop.
pub struct AnalyzedComponent {
    /// The analyzed component itself.
    pub base: BaseComponent,
    /// Maps every sink to the single source that drives it.
    pub driver_map: HashMap<SinkRef, SourceRef>,
    /// Primitives that lie on a feedback cycle (latches, registers).
    pub feedback_primitives: HashSet<PrimitiveId>,
}

impl AnalyzedComponent {
    /// Returns `true` if the given primitive participates in a feedback loop.
    pub fn has_feedback(&self, id: PrimitiveId) -> bool {
        self.feedback_primitives.contains(&id)
    }
}

/// Runs semantic analysis on a flattened component.
///
/// Returns `None` and leaves diagnostics in `sink` if any sink is left
/// unconnected, multiply driven, or out of range — codegen never runs on a
/// component that failed analysis.
pub fn analyze(base: BaseComponent, sink: &DiagnosticSink) -> Option<AnalyzedComponent> {
    let driver_map = driver_map::build_driver_map(&base, sink);
    if sink.has_errors() {
        return None;
    }
    let feedback_primitives = feedback::find_feedback_primitives(&base, &driver_map);
    Some(AnalyzedComponent {
        base,
        driver_map,
        feedback_primitives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_ir::{BasePort, PrimitiveKind, PrimitivePort};
    use shdl_source::{FileId, Span};

    fn dummy_span() -> Span {
        Span::new(FileId::from_raw(0), 0, 0)
    }

    #[test]
    fn well_formed_component_analyzes_cleanly() {
        let mut comp = BaseComponent::new(
            "HalfAdder",
            vec![
                BasePort { name: "A".into(), width: 1 },
                BasePort { name: "B".into(), width: 1 },
            ],
            vec![BasePort { name: "Sum".into(), width: 1 }],
        );
        let xor = comp.add_primitive("g1", PrimitiveKind::Xor, dummy_span());
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::ComponentInput { port: "A".into(), bit: 0 },
            dst: SinkRef::PrimitiveInput { instance: xor, port: PrimitivePort::A },
            span: dummy_span(),
        });
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::ComponentInput { port: "B".into(), bit: 0 },
            dst: SinkRef::PrimitiveInput { instance: xor, port: PrimitivePort::B },
            span: dummy_span(),
        });
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::PrimitiveOutput(xor),
            dst: SinkRef::ComponentOutput { port: "Sum".into(), bit: 0 },
            span: dummy_span(),
        });

        let sink = DiagnosticSink::new();
        let analyzed = analyze(comp, &sink).expect("analysis should succeed");
        assert_eq!(analyzed.driver_map.len(), 3);
        assert!(analyzed.feedback_primitives.is_empty());
    }

    #[test]
    fn component_with_unconnected_input_fails_analysis() {
        let mut comp = BaseComponent::new(
            "Broken",
            vec![BasePort { name: "A".into(), width: 1 }],
            vec![BasePort { name: "Q".into(), width: 1 }],
        );
        let not1 = comp.add_primitive("g1", PrimitiveKind::Not, dummy_span());
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::PrimitiveOutput(not1),
            dst: SinkRef::ComponentOutput { port: "Q".into(), bit: 0 },
            span: dummy_span(),
        });

        let sink = DiagnosticSink::new();
        assert!(analyze(comp, &sink).is_none());
        assert!(sink.has_errors());
    }
}
