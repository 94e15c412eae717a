//! Phase 3: bit-slice expansion.
//!
//! Every signal reference surviving generator expansion still denotes a
//! possibly-multi-bit quantity — a whole port, a `[:k]`/`[k:]`/`[a:b]`
//! slice, or (implicitly) a full un-indexed port. This phase resolves each
//! reference's width against the enclosing component and its instances'
//! types, checks that source and destination widths agree, and emits one
//! [`BitConnection`] per bit.

use crate::types::{BitConnection, BitEndpoint, FlatConnection, FlatConstant, FlatInstance, FlatSignalRef, ResolvedIndex};
use shdl_ast::ComponentDef;
use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use std::collections::HashMap;

/// Resolves the bit width of a constant, honoring an explicit width or
/// falling back to the smallest width that represents its value.
pub fn constant_width(c: &FlatConstant) -> u32 {
    match c.width {
        Some(w) => w,
        None => bits_needed(c.value),
    }
}

fn bits_needed(value: u64) -> u32 {
    if value == 0 {
        1
    } else {
        64 - value.leading_zeros()
    }
}

/// What kind of thing a signal reference's base name resolves to.
enum BaseWidth {
    /// This component's own port.
    ComponentPort(u32),
    /// `instance.port`, where `port_width` is the resolved port's width.
    InstancePort { width: u32 },
    /// A named constant, not yet materialized.
    Constant { width: u32 },
}

fn resolve_base_width(
    sig: &FlatSignalRef,
    comp: &ComponentDef,
    instances: &[FlatInstance],
    constants: &[FlatConstant],
    symbols: &HashMap<String, &ComponentDef>,
    sink: &DiagnosticSink,
) -> Option<BaseWidth> {
    if let Some(member) = &sig.member {
        let inst = instances.iter().find(|i| i.name == sig.base);
        let Some(inst) = inst else {
            sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::Name, 1),
                format!("reference to undefined instance '{}'", sig.base),
                sig.span,
            ));
            return None;
        };
        if let Some(kind) = shdl_ir::PrimitiveKind::from_keyword(&inst.type_name) {
            if kind.has_state_word() {
                let valid = matches!(member.as_str(), "A" | "B" | "O");
                if !valid || (member.as_str() == "B" && kind.input_count() < 2) {
                    sink.emit(Diagnostic::error(
                        DiagnosticCode::error(Stage::Name, 2),
                        format!("primitive '{}' has no port named '{member}'", inst.name),
                        sig.span,
                    ));
                    return None;
                }
            } else if member != "O" {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Name, 2),
                    format!("primitive '{}' has no port named '{member}'", inst.name),
                    sig.span,
                ));
                return None;
            }
            return Some(BaseWidth::InstancePort { width: 1 });
        }
        let Some(def) = symbols.get(&inst.type_name) else {
            sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::Name, 3),
                format!("undefined component type '{}'", inst.type_name),
                sig.span,
            ));
            return None;
        };
        let port = def
            .inputs
            .iter()
            .chain(def.outputs.iter())
            .find(|p| &p.name == member);
        match port {
            Some(p) => Some(BaseWidth::InstancePort { width: p.width }),
            None => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Name, 2),
                    format!("component '{}' has no port named '{member}'", inst.type_name),
                    sig.span,
                ));
                None
            }
        }
    } else if let Some(port) = comp
        .inputs
        .iter()
        .chain(comp.outputs.iter())
        .find(|p| p.name == sig.base)
    {
        Some(BaseWidth::ComponentPort(port.width))
    } else if let Some(c) = constants.iter().find(|c| c.name == sig.base) {
        Some(BaseWidth::Constant {
            width: constant_width(c),
        })
    } else {
        sink.emit(Diagnostic::error(
            DiagnosticCode::error(Stage::Name, 1),
            format!("undefined signal reference '{}'", sig.base),
            sig.span,
        ));
        None
    }
}

/// Resolves the 1-based bit sequence a reference's index/slice selects,
/// given the full width of the thing it indexes into.
fn index_bit_sequence(
    index: &Option<ResolvedIndex>,
    full_width: u32,
    is_constant: bool,
    span: shdl_source::Span,
    sink: &DiagnosticSink,
) -> Vec<u32> {
    let out_of_range = |sink: &DiagnosticSink| {
        if is_constant {
            sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::Constant, 1),
                "constant index out of range for its inferred width",
                span,
            ));
        } else {
            sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::TypeWidth, 2),
                "bit index out of range",
                span,
            ));
        }
    };
    match index {
        None => (1..=full_width).collect(),
        Some(ResolvedIndex::Bit(k)) => {
            if *k < 1 || *k as u32 > full_width {
                out_of_range(sink);
                Vec::new()
            } else {
                vec![*k as u32]
            }
        }
        Some(ResolvedIndex::SliceTo(k)) => {
            if *k < 1 || *k as u32 > full_width {
                out_of_range(sink);
                Vec::new()
            } else {
                (1..=*k as u32).collect()
            }
        }
        Some(ResolvedIndex::SliceFrom(k)) => {
            if *k < 1 || *k as u32 > full_width {
                out_of_range(sink);
                Vec::new()
            } else {
                (*k as u32..=full_width).collect()
            }
        }
        Some(ResolvedIndex::SliceRange(a, b)) => {
            if *a < 1 || *b as u32 > full_width || a > b {
                out_of_range(sink);
                Vec::new()
            } else {
                (*a as u32..=*b as u32).collect()
            }
        }
    }
}

fn endpoint_for_bit(sig: &FlatSignalRef, bit: u32) -> BitEndpoint {
    match &sig.member {
        Some(member) => BitEndpoint::Instance {
            instance: sig.base.clone(),
            port: member.clone(),
            bit,
        },
        None => BitEndpoint::ComponentPort {
            name: sig.base.clone(),
            bit,
        },
    }
}

/// Expands every generator-expanded connection into single-bit
/// connections, checking width agreement. Constant references are left as
/// [`BitEndpoint::ComponentPort`]-shaped placeholders keyed by the
/// constant's name; [`crate::constants`] rewrites them afterward.
pub fn expand_connections(
    comp: &ComponentDef,
    flat_connections: &[FlatConnection],
    instances: &[FlatInstance],
    constants: &[FlatConstant],
    symbols: &HashMap<String, &ComponentDef>,
    sink: &DiagnosticSink,
) -> Vec<BitConnection> {
    let mut out = Vec::new();
    for conn in flat_connections {
        let src_base = resolve_base_width(&conn.src, comp, instances, constants, symbols, sink);
        let dst_base = resolve_base_width(&conn.dst, comp, instances, constants, symbols, sink);
        let (Some(src_base), Some(dst_base)) = (src_base, dst_base) else {
            continue;
        };
        let (src_width, src_is_const) = match src_base {
            BaseWidth::ComponentPort(w) | BaseWidth::InstancePort { width: w } => (w, false),
            BaseWidth::Constant { width } => (width, true),
        };
        let (dst_width, dst_is_const) = match dst_base {
            BaseWidth::ComponentPort(w) | BaseWidth::InstancePort { width: w } => (w, false),
            BaseWidth::Constant { width } => (width, true),
        };

        let src_bits = index_bit_sequence(&conn.src.index, src_width, src_is_const, conn.span, sink);
        let dst_bits = index_bit_sequence(&conn.dst.index, dst_width, dst_is_const, conn.span, sink);
        if src_bits.is_empty() || dst_bits.is_empty() {
            continue;
        }
        if src_bits.len() != dst_bits.len() {
            sink.emit(Diagnostic::error(
                DiagnosticCode::error(Stage::TypeWidth, 1),
                format!(
                    "width mismatch in connection: expected width {}, found width {}",
                    dst_bits.len(),
                    src_bits.len()
                ),
                conn.span,
            ));
            continue;
        }
        for (sbit, dbit) in src_bits.into_iter().zip(dst_bits) {
            out.push(BitConnection {
                src: endpoint_for_bit(&conn.src, sbit),
                dst: endpoint_for_bit(&conn.dst, dbit),
                span: conn.span,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_ast::{parse_module, lex};
    use shdl_diagnostics::DiagnosticSink;
    use shdl_source::SourceDb;

    fn parse_one(source: &str) -> ComponentDef {
        let mut db = SourceDb::new();
        let fid = db.add_source("t.shdl", source.to_string());
        let sink = DiagnosticSink::new();
        let tokens = lex(source, fid, &sink);
        let module = parse_module(source, fid, "t", tokens, &sink);
        module.components.into_iter().next().unwrap()
    }

    #[test]
    fn whole_port_connection_expands_per_bit() {
        let comp = parse_one("component C(A[4]) -> (B[4]) { connect { A -> B; } }");
        let sink = DiagnosticSink::new();
        let symbols = HashMap::new();
        let flat = crate::generators::expand_component(&comp, &sink);
        let bits = expand_connections(&comp, &flat.connections, &flat.instances, &flat.constants, &symbols, &sink);
        assert!(!sink.has_errors());
        assert_eq!(bits.len(), 4);
    }

    #[test]
    fn mismatched_slice_widths_report_error() {
        let comp = parse_one("component C(A[4]) -> (B[8]) { connect { A[:4] -> B[:8]; } }");
        let sink = DiagnosticSink::new();
        let symbols = HashMap::new();
        let flat = crate::generators::expand_component(&comp, &sink);
        expand_connections(&comp, &flat.connections, &flat.instances, &flat.constants, &symbols, &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn bits_needed_matches_inferred_widths() {
        assert_eq!(bits_needed(0), 1);
        assert_eq!(bits_needed(1), 1);
        assert_eq!(bits_needed(4), 3);
        assert_eq!(bits_needed(255), 8);
    }

    #[test]
    fn vcc_member_other_than_o_is_a_name_error() {
        let comp = parse_one("component C() -> (Q) { connect { } }");
        let sink = DiagnosticSink::new();
        let instances = vec![FlatInstance {
            name: "myVcc".into(),
            type_name: "__VCC__".into(),
            span: comp.span,
        }];
        let sig = FlatSignalRef {
            base: "myVcc".into(),
            member: Some("bogus".into()),
            index: None,
            span: comp.span,
        };
        let symbols = HashMap::new();
        let result = resolve_base_width(&sig, &comp, &instances, &[], &symbols, &sink);
        assert!(result.is_none());
        assert!(sink.has_errors());
    }

    #[test]
    fn vcc_o_member_resolves_to_a_single_bit() {
        let comp = parse_one("component C() -> (Q) { connect { } }");
        let sink = DiagnosticSink::new();
        let instances = vec![FlatInstance {
            name: "myVcc".into(),
            type_name: "__VCC__".into(),
            span: comp.span,
        }];
        let sig = FlatSignalRef {
            base: "myVcc".into(),
            member: Some("O".into()),
            index: None,
            span: comp.span,
        };
        let symbols = HashMap::new();
        let result = resolve_base_width(&sig, &comp, &instances, &[], &symbols, &sink);
        assert!(!sink.has_errors());
        assert!(matches!(result, Some(BaseWidth::InstancePort { width: 1 })));
    }
}
