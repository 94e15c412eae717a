//! Driver-map construction and the single-driver invariant.

use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use shdl_ir::{BaseComponent, PrimitivePort, SinkRef, SourceRef};
use std::collections::HashMap;

/// Every sink a Base component is expected to drive exactly once: each
/// primitive's input ports, and every bit of every component output port.
fn expected_sinks(base: &BaseComponent) -> Vec<SinkRef> {
    let mut sinks = Vec::new();
    for (id, inst) in base.primitives.iter() {
        match inst.kind.input_count() {
            0 => {}
            1 => sinks.push(SinkRef::PrimitiveInput {
                instance: id,
                port: PrimitivePort::A,
            }),
            _ => {
                sinks.push(SinkRef::PrimitiveInput {
                    instance: id,
                    port: PrimitivePort::A,
                });
                sinks.push(SinkRef::PrimitiveInput {
                    instance: id,
                    port: PrimitivePort::B,
                });
            }
        }
    }
    for port in &base.outputs {
        for bit in 0..port.width {
            sinks.push(SinkRef::ComponentOutput {
                port: port.name.clone(),
                bit,
            });
        }
    }
    sinks
}

/// Builds the driver map (one entry per sink with exactly one driver) and
/// reports unconnected and multiply-driven sinks, plus out-of-range
/// component port references, to `sink`.
///
/// Sinks with zero or more than one driver are omitted from the returned
/// map — codegen only ever runs once every sink resolves to exactly one
/// driver, so a caller should treat any error emitted here as fatal.
pub fn build_driver_map(
    base: &BaseComponent,
    sink: &DiagnosticSink,
) -> HashMap<SinkRef, SourceRef> {
    let mut by_dst: HashMap<SinkRef, Vec<&SourceRef>> = HashMap::new();
    for conn in &base.connections {
        by_dst.entry(conn.dst.clone()).or_default().push(&conn.src);
        validate_in_range(base, &conn.src, &conn.dst, sink, conn.span);
    }

    let mut driver_map = HashMap::new();
    for expected in expected_sinks(base) {
        match by_dst.get(&expected) {
            None => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Connection, 1),
                    format!("{} has no driver", describe_sink(base, &expected)),
                    shdl_source::Span::DUMMY,
                ));
            }
            Some(drivers) if drivers.len() > 1 => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Connection, 2),
                    format!(
                        "{} has {} drivers, expected exactly one",
                        describe_sink(base, &expected),
                        drivers.len()
                    ),
                    shdl_source::Span::DUMMY,
                ));
            }
            Some(drivers) => {
                driver_map.insert(expected, drivers[0].clone());
            }
        }
    }
    driver_map
}

fn validate_in_range(
    base: &BaseComponent,
    src: &SourceRef,
    dst: &SinkRef,
    sink: &DiagnosticSink,
    span: shdl_source::Span,
) {
    if let SourceRef::ComponentInput { port, bit } = src {
        match base.input_width(port) {
            Some(w) if *bit < w => {}
            _ => sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::Connection, 3),
                format!("component input reference '{port}[{bit}]' is out of range"),
                span,
            )),
        }
    }
    if let SinkRef::ComponentOutput { port, bit } = dst {
        match base.output_width(port) {
            Some(w) if *bit < w => {}
            _ => sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::Connection, 3),
                format!("component output reference '{port}[{bit}]' is out of range"),
                span,
            )),
        }
    }
}

fn describe_sink(base: &BaseComponent, s: &SinkRef) -> String {
    match s {
        SinkRef::PrimitiveInput { instance, port } => {
            format!("{}.{port}", base.primitives.get(*instance).name)
        }
        SinkRef::ComponentOutput { port, bit } => format!("output '{port}[{bit}]'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_ir::PrimitiveKind;
    use shdl_source::{FileId, Span};

    fn dummy_span() -> Span {
        Span::new(FileId::from_raw(0), 0, 0)
    }

    fn half_adder() -> BaseComponent {
        let mut comp = BaseComponent::new(
            "HalfAdder",
            vec![
                shdl_ir::BasePort { name: "A".into(), width: 1 },
                shdl_ir::BasePort { name: "B".into(), width: 1 },
            ],
            vec![
                shdl_ir::BasePort { name: "Sum".into(), width: 1 },
                shdl_ir::BasePort { name: "Cout".into(), width: 1 },
            ],
        );
        let xor = comp.add_primitive("g1", PrimitiveKind::Xor, dummy_span());
        let and = comp.add_primitive("g2", PrimitiveKind::And, dummy_span());
        for (id, port) in [(xor, PrimitivePort::A), (xor, PrimitivePort::B)] {
            comp.connections.push(shdl_ir::Connection {
                src: SourceRef::ComponentInput {
                    port: if port == PrimitivePort::A { "A".into() } else { "B".into() },
                    bit: 0,
                },
                dst: SinkRef::PrimitiveInput { instance: id, port },
                span: dummy_span(),
            });
        }
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::ComponentInput { port: "A".into(), bit: 0 },
            dst: SinkRef::PrimitiveInput { instance: and, port: PrimitivePort::A },
            span: dummy_span(),
        });
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::ComponentInput { port: "B".into(), bit: 0 },
            dst: SinkRef::PrimitiveInput { instance: and, port: PrimitivePort::B },
            span: dummy_span(),
        });
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::PrimitiveOutput(xor),
            dst: SinkRef::ComponentOutput { port: "Sum".into(), bit: 0 },
            span: dummy_span(),
        });
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::PrimitiveOutput(and),
            dst: SinkRef::ComponentOutput { port: "Cout".into(), bit: 0 },
            span: dummy_span(),
        });
        comp
    }

    #[test]
    fn fully_driven_component_has_no_errors() {
        let comp = half_adder();
        let sink = DiagnosticSink::new();
        let map = build_driver_map(&comp, &sink);
        assert!(!sink.has_errors());
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn unconnected_input_is_an_error() {
        let mut comp = half_adder();
        comp.connections.remove(0);
        let sink = DiagnosticSink::new();
        build_driver_map(&comp, &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn multi_driven_sink_is_an_error() {
        let mut comp = half_adder();
        let xor = comp.primitives.iter().next().unwrap().0;
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::ComponentInput { port: "B".into(), bit: 0 },
            dst: SinkRef::PrimitiveInput { instance: xor, port: PrimitivePort::A },
            span: dummy_span(),
        });
        let sink = DiagnosticSink::new();
        build_driver_map(&comp, &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn out_of_range_output_bit_is_an_error() {
        let mut comp = half_adder();
        comp.connections.push(shdl_ir::Connection {
            src: SourceRef::ComponentInput { port: "A".into(), bit: 0 },
            dst: SinkRef::ComponentOutput { port: "Sum".into(), bit: 5 },
            span: dummy_span(),
        });
        let sink = DiagnosticSink::new();
        build_driver_map(&comp, &sink);
        assert!(sink.has_errors());
    }
}
