//! Phase 2: generator expansion.
//!
//! Unrolls `> v [ranges] { ... }` blocks innermost-first, substituting the
//! loop variable into `{expr}` template suffixes and arithmetic index
//! expressions, and flags generator variables that shadow a port, a
//! constant, or an enclosing generator variable.

use crate::types::{FlatConnection, FlatConstant, FlatInstance, FlatSignalRef, ResolvedIndex};
use shdl_ast::{
    ComponentDef, Connection, Expr, GenBodyItem, Generator, IndexSpec, Item, RangeSpec, SignalRef,
    TemplatedIdent,
};
use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use std::collections::{HashMap, HashSet};

/// The three kinds of top-level item a component body or generator body
/// expands into.
pub struct ExpandedItems {
    /// Expanded instance declarations.
    pub instances: Vec<FlatInstance>,
    /// Expanded named constants.
    pub constants: Vec<FlatConstant>,
    /// Expanded connections, gathered from every `connect` block.
    pub connections: Vec<FlatConnection>,
}

/// Expands every generator in a component's body and connect blocks,
/// returning the fully unrolled (but not yet bit-sliced) item lists.
pub fn expand_component(comp: &ComponentDef, sink: &DiagnosticSink) -> ExpandedItems {
    let mut instances = Vec::new();
    let mut constants = Vec::new();
    let mut connections = Vec::new();
    let bindings = HashMap::new();

    let mut reserved: HashSet<String> = comp
        .inputs
        .iter()
        .chain(comp.outputs.iter())
        .map(|p| p.name.clone())
        .collect();

    for item in &comp.items {
        match item {
            Item::Instance(decl) => instances.push(FlatInstance {
                name: realize_ident(&decl.name, &bindings, sink),
                type_name: decl.type_name.clone(),
                span: decl.span,
            }),
            Item::Constant(c) => {
                reserved.insert(c.name.base.clone());
                constants.push(FlatConstant {
                    name: realize_ident(&c.name, &bindings, sink),
                    width: c.width,
                    value: c.value,
                    span: c.span,
                });
            }
            Item::Generator(gen) => {
                expand_generator(gen, &bindings, &reserved, sink, &mut instances, &mut connections)
            }
            Item::ConnectBlock(cb) => {
                for citem in &cb.items {
                    match citem {
                        shdl_ast::ConnectItem::Connection(c) => {
                            connections.push(realize_connection(c, &bindings, sink));
                        }
                        shdl_ast::ConnectItem::Generator(gen) => expand_generator(
                            gen,
                            &bindings,
                            &reserved,
                            sink,
                            &mut instances,
                            &mut connections,
                        ),
                    }
                }
            }
        }
    }

    ExpandedItems {
        instances,
        constants,
        connections,
    }
}

/// Checks a generator's loop variable against the names already in scope,
/// emitting the appropriate diagnostic for whichever kind of shadowing (if
/// any) it commits.
///
/// Shadowing a port or constant is ambiguous — a bare reference to that name
/// inside the generator body could mean either the signal or the loop
/// variable — and is a hard error (`E0606`). Shadowing an enclosing
/// generator variable only confuses a reader, since the inner binding always
/// wins unambiguously, so it is a warning (`W0106`).
fn check_shadowing(gen: &Generator, outer: &HashMap<String, i64>, reserved: &HashSet<String>, sink: &DiagnosticSink) {
    if reserved.contains(&gen.var) {
        sink.emit(Diagnostic::error(
            DiagnosticCode::error(Stage::Generator, 6),
            format!(
                "generator variable '{}' shadows a port or constant of the same name",
                gen.var
            ),
            gen.span,
        ));
    } else if outer.contains_key(&gen.var) {
        sink.emit(Diagnostic::warning(
            DiagnosticCode::warning(Stage::Generator, 6),
            format!(
                "generator variable '{}' shadows an enclosing generator variable of the same name",
                gen.var
            ),
            gen.span,
        ));
    }
}

fn expand_generator(
    gen: &Generator,
    outer: &HashMap<String, i64>,
    reserved: &HashSet<String>,
    sink: &DiagnosticSink,
    instances: &mut Vec<FlatInstance>,
    connections: &mut Vec<FlatConnection>,
) {
    check_shadowing(gen, outer, reserved, sink);

    let values = range_list_to_values(&gen.ranges, sink);
    for v in values {
        let mut bindings = outer.clone();
        bindings.insert(gen.var.clone(), v);
        for body_item in &gen.body {
            match body_item {
                GenBodyItem::Instance(decl) => instances.push(FlatInstance {
                    name: realize_ident(&decl.name, &bindings, sink),
                    type_name: decl.type_name.clone(),
                    span: decl.span,
                }),
                GenBodyItem::Connection(c) => {
                    connections.push(realize_connection(c, &bindings, sink))
                }
                GenBodyItem::Generator(nested) => {
                    expand_generator(nested, &bindings, reserved, sink, instances, connections)
                }
            }
        }
    }
}

/// Resolves a comma-separated range list into the concrete, ordered
/// iteration sequence it denotes.
///
/// A single `Single(k)` range standing alone means `1..=k`; the same form
/// appearing among other ranges in the list denotes the singleton `k`.
pub fn range_list_to_values(ranges: &[RangeSpec], sink: &DiagnosticSink) -> Vec<i64> {
    let mut values = Vec::new();
    let solo = ranges.len() == 1;
    for range in ranges {
        match range {
            RangeSpec::Single(k, span) => {
                if solo {
                    if *k < 1 {
                        report_bad_range(sink, *span);
                        continue;
                    }
                    values.extend(1..=*k);
                } else {
                    values.push(*k);
                }
            }
            RangeSpec::Closed(a, b, span) => {
                if a > b {
                    report_bad_range(sink, *span);
                    continue;
                }
                values.extend(*a..=*b);
            }
            RangeSpec::OpenUpper(_, span) | RangeSpec::OpenLower(_, span) => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Generator, 2),
                    "open-ended range requires an enclosing signal width and cannot appear in a generator's iteration header",
                    *span,
                ));
            }
        }
    }
    values
}

fn report_bad_range(sink: &DiagnosticSink, span: shdl_source::Span) {
    sink.emit(Diagnostic::error(
        DiagnosticCode::error(Stage::Generator, 1),
        "generator range is empty or descending",
        span,
    ));
}

fn realize_connection(
    c: &Connection,
    bindings: &HashMap<String, i64>,
    sink: &DiagnosticSink,
) -> FlatConnection {
    FlatConnection {
        src: realize_signal_ref(&c.src, bindings, sink),
        dst: realize_signal_ref(&c.dst, bindings, sink),
        span: c.span,
    }
}

fn realize_signal_ref(
    s: &SignalRef,
    bindings: &HashMap<String, i64>,
    sink: &DiagnosticSink,
) -> FlatSignalRef {
    FlatSignalRef {
        base: realize_ident(&s.base, bindings, sink),
        member: s.member.as_ref().map(|m| realize_ident(m, bindings, sink)),
        index: s.index.as_ref().map(|idx| realize_index(idx, bindings, sink)),
        span: s.span,
    }
}

fn realize_index(
    idx: &IndexSpec,
    bindings: &HashMap<String, i64>,
    sink: &DiagnosticSink,
) -> ResolvedIndex {
    match idx {
        IndexSpec::Bit(e) => ResolvedIndex::Bit(eval_expr(e, bindings, sink)),
        IndexSpec::SliceTo(e) => ResolvedIndex::SliceTo(eval_expr(e, bindings, sink)),
        IndexSpec::SliceFrom(e) => ResolvedIndex::SliceFrom(eval_expr(e, bindings, sink)),
        IndexSpec::SliceRange(a, b) => {
            ResolvedIndex::SliceRange(eval_expr(a, bindings, sink), eval_expr(b, bindings, sink))
        }
    }
}

fn realize_ident(
    id: &TemplatedIdent,
    bindings: &HashMap<String, i64>,
    sink: &DiagnosticSink,
) -> String {
    match &id.subst {
        Some(expr) => format!("{}{}", id.base, eval_expr(expr, bindings, sink)),
        None => id.base.clone(),
    }
}

fn eval_expr(expr: &Expr, bindings: &HashMap<String, i64>, sink: &DiagnosticSink) -> i64 {
    match expr {
        Expr::Int(v, _) => *v,
        Expr::Var(name, span) => match bindings.get(name) {
            Some(v) => *v,
            None => {
                sink.emit(Diagnostic::error(
                    DiagnosticCode::error(Stage::Generator, 3),
                    format!("reference to undefined generator variable '{name}'"),
                    *span,
                ));
                0
            }
        },
        Expr::Add(a, b, _) => eval_expr(a, bindings, sink) + eval_expr(b, bindings, sink),
        Expr::Sub(a, b, _) => eval_expr(a, bindings, sink) - eval_expr(b, bindings, sink),
        Expr::Mul(a, b, _) => eval_expr(a, bindings, sink) * eval_expr(b, bindings, sink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_source::{FileId, Span};

    fn dummy_span() -> Span {
        Span::new(FileId::from_raw(0), 0, 0)
    }

    #[test]
    fn solo_single_range_is_one_to_k() {
        let sink = DiagnosticSink::new();
        let ranges = vec![RangeSpec::Single(4, dummy_span())];
        assert_eq!(range_list_to_values(&ranges, &sink), vec![1, 2, 3, 4]);
    }

    #[test]
    fn single_among_many_is_a_singleton() {
        let sink = DiagnosticSink::new();
        let ranges = vec![
            RangeSpec::Single(2, dummy_span()),
            RangeSpec::Closed(5, 6, dummy_span()),
        ];
        assert_eq!(range_list_to_values(&ranges, &sink), vec![2, 5, 6]);
    }

    #[test]
    fn open_range_in_header_is_an_error() {
        let sink = DiagnosticSink::new();
        let ranges = vec![RangeSpec::OpenUpper(1, dummy_span())];
        range_list_to_values(&ranges, &sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn descending_closed_range_is_an_error() {
        let sink = DiagnosticSink::new();
        let ranges = vec![RangeSpec::Closed(5, 2, dummy_span())];
        let values = range_list_to_values(&ranges, &sink);
        assert!(values.is_empty());
        assert!(sink.has_errors());
    }

    #[test]
    fn undefined_generator_variable_reports_error() {
        let sink = DiagnosticSink::new();
        let bindings = HashMap::new();
        let v = eval_expr(&Expr::Var("i".into(), dummy_span()), &bindings, &sink);
        assert_eq!(v, 0);
        assert!(sink.has_errors());
    }

    #[test]
    fn nested_generator_reusing_the_outer_variable_name_warns_but_still_expands() {
        let sink = DiagnosticSink::new();
        let inner = Generator {
            var: "i".into(),
            ranges: vec![RangeSpec::Single(2, dummy_span())],
            body: vec![GenBodyItem::Instance(shdl_ast::InstanceDecl {
                name: TemplatedIdent {
                    base: "q".into(),
                    subst: Some(Expr::Var("i".into(), dummy_span())),
                    span: dummy_span(),
                },
                type_name: "NOT".into(),
                span: dummy_span(),
            })],
            span: dummy_span(),
        };
        let outer = Generator {
            var: "i".into(),
            ranges: vec![RangeSpec::Single(1, dummy_span())],
            body: vec![GenBodyItem::Generator(inner)],
            span: dummy_span(),
        };

        let mut instances = Vec::new();
        let mut connections = Vec::new();
        expand_generator(&outer, &HashMap::new(), &HashSet::new(), &sink, &mut instances, &mut connections);

        assert!(!sink.has_errors(), "shadowing is a warning, not a hard error");
        assert!(
            sink.diagnostics().iter().any(|d| d.severity == shdl_diagnostics::Severity::Warning),
            "shadowing an enclosing generator variable should warn"
        );
        assert_eq!(instances.len(), 2, "expansion still runs despite the warning");
        assert_eq!(instances[0].name, "q1");
        assert_eq!(instances[1].name, "q2");
    }

    #[test]
    fn generator_variable_shadowing_a_port_or_constant_is_an_ambiguous_error() {
        let sink = DiagnosticSink::new();
        let gen = Generator {
            var: "A".into(),
            ranges: vec![RangeSpec::Single(2, dummy_span())],
            body: vec![GenBodyItem::Instance(shdl_ast::InstanceDecl {
                name: TemplatedIdent {
                    base: "q".into(),
                    subst: Some(Expr::Var("A".into(), dummy_span())),
                    span: dummy_span(),
                },
                type_name: "NOT".into(),
                span: dummy_span(),
            })],
            span: dummy_span(),
        };
        let mut reserved = HashSet::new();
        reserved.insert("A".to_string());

        let mut instances = Vec::new();
        let mut connections = Vec::new();
        expand_generator(&gen, &HashMap::new(), &reserved, &sink, &mut instances, &mut connections);

        assert!(sink.has_errors(), "shadowing a port or constant must be a hard error");
        assert_eq!(
            sink.diagnostics()[0].code,
            DiagnosticCode::error(Stage::Generator, 6),
            "must be reported as E0606"
        );
    }

    #[test]
    fn templated_ident_realizes_with_binding() {
        let sink = DiagnosticSink::new();
        let mut bindings = HashMap::new();
        bindings.insert("i".to_string(), 3);
        let id = TemplatedIdent {
            base: "g".into(),
            subst: Some(Expr::Var("i".into(), dummy_span())),
            span: dummy_span(),
        };
        assert_eq!(realize_ident(&id, &bindings, &sink), "g3");
    }
}
