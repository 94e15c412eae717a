//! The five-phase flattener: reduces an Expanded-SHDL component (generators,
//! bit-slice expanders, named constants, hierarchical instances) down to a
//! [`shdl_ir::BaseComponent`] — a flat netlist of primitives wired by
//! single-bit connections.
//!
//! The phases run as: generator expansion ([`generators`]), bit-slice
//! expansion ([`expander`]), constant materialization ([`constants`]), and
//! hierarchy flattening ([`hierarchy`]) — module-resolution ("phase 1") is
//! handled upstream by `shdl_resolve` and consumed here as a flat symbol
//! environment.

#![warn(missing_docs)]

pub mod constants;
pub mod expander;
pub mod generators;
pub mod hierarchy;
pub mod types;

use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use shdl_ir::{BaseComponent, Connection, PrimitiveId, PrimitivePort, SinkRef, SourceRef};
use shdl_resolve::ResolvedProgram;
use std::collections::HashMap;
use types::BitEndpoint;

/// Runs all five flattening phases on `entry_component`, drawing its
/// sub-components from every module reachable from `program`'s entry
/// module.
///
/// Returns `None` if the component is undefined or diagnostics prevented a
/// complete Base-level netlist from being produced; check `sink` either way
/// for accumulated errors and warnings.
pub fn flatten(
    program: &ResolvedProgram,
    entry_component: &str,
    sink: &DiagnosticSink,
) -> Option<BaseComponent> {
    let symbols = program.symbol_environment();
    let flat = hierarchy::flatten_entry(entry_component, &symbols, sink)?;
    if sink.has_errors() {
        return None;
    }
    Some(to_base_component(entry_component, flat, sink))
}

fn to_base_component(
    name: &str,
    flat: types::FlattenedComponent,
    sink: &DiagnosticSink,
) -> BaseComponent {
    let mut base = BaseComponent::new(name, flat.inputs, flat.outputs);
    let mut ids: HashMap<String, PrimitiveId> = HashMap::new();
    for (inst_name, kind, span) in &flat.instances {
        let id = base.add_primitive(inst_name.clone(), *kind, span.clone());
        ids.insert(inst_name.clone(), id);
    }

    for conn in &flat.connections {
        let Some(src) = resolve_source(&conn.src, &ids) else {
            internal_inconsistency(
                sink,
                format!("connection source '{:?}' references an unknown instance", conn.src),
            );
            continue;
        };
        let Some(dst) = resolve_sink(&conn.dst, &ids) else {
            internal_inconsistency(
                sink,
                format!("connection sink '{:?}' references an unknown instance or port", conn.dst),
            );
            continue;
        };
        base.connections.push(Connection {
            src,
            dst,
            span: conn.span,
        });
    }

    base
}

fn resolve_source(endpoint: &BitEndpoint, ids: &HashMap<String, PrimitiveId>) -> Option<SourceRef> {
    match endpoint {
        BitEndpoint::ComponentPort { name, bit } => Some(SourceRef::ComponentInput {
            port: name.clone(),
            bit: bit - 1,
        }),
        BitEndpoint::Instance { instance, .. } => {
            ids.get(instance).map(|id| SourceRef::PrimitiveOutput(*id))
        }
    }
}

fn resolve_sink(endpoint: &BitEndpoint, ids: &HashMap<String, PrimitiveId>) -> Option<SinkRef> {
    match endpoint {
        BitEndpoint::ComponentPort { name, bit } => Some(SinkRef::ComponentOutput {
            port: name.clone(),
            bit: bit - 1,
        }),
        BitEndpoint::Instance { instance, port, .. } => {
            let id = *ids.get(instance)?;
            let port = match port.as_str() {
                "A" => PrimitivePort::A,
                "B" => PrimitivePort::B,
                _ => return None,
            };
            Some(SinkRef::PrimitiveInput { instance: id, port })
        }
    }
}

/// Produces an internal-error diagnostic for inconsistencies the flattener
/// itself should never surface to users — an instance referenced by a
/// connection but absent from the instance list is a flattener defect, not
/// a source-level mistake.
fn internal_inconsistency(sink: &DiagnosticSink, message: impl Into<String>) {
    sink.emit(Diagnostic::error(
        DiagnosticCode::error(Stage::Name, 99),
        message.into(),
        shdl_source::Span::DUMMY,
    ));
}
