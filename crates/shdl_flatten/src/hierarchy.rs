//! Phase 5: hierarchy flattening.
//!
//! Inlines every sub-component instance depth-first: its primitives are
//! renamed `{instance}_{sub_name}` and spliced into the parent, its input
//! ports are substituted with whatever drives `instance.port` in the
//! parent, and its output ports are substituted wherever the parent
//! consumes `instance.port` as a source.

use crate::constants;
use crate::expander;
use crate::generators;
use crate::types::{BitConnection, BitEndpoint, FlattenedComponent};
use shdl_ast::ComponentDef;
use shdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Stage};
use shdl_ir::{BasePort, PrimitiveKind};
use shdl_source::Span;
use std::collections::{HashMap, HashSet};

/// Flattens every component reachable from `entry`, memoizing each
/// component's result so shared sub-components are only flattened once.
pub fn flatten_entry(
    entry: &str,
    symbols: &HashMap<String, &ComponentDef>,
    sink: &DiagnosticSink,
) -> Option<FlattenedComponent> {
    let mut cache = HashMap::new();
    let mut in_progress = HashSet::new();
    flatten_component(entry, symbols, sink, &mut cache, &mut in_progress, Span::DUMMY)
}

fn flatten_component(
    name: &str,
    symbols: &HashMap<String, &ComponentDef>,
    sink: &DiagnosticSink,
    cache: &mut HashMap<String, FlattenedComponent>,
    in_progress: &mut HashSet<String>,
    use_span: Span,
) -> Option<FlattenedComponent> {
    if let Some(cached) = cache.get(name) {
        return Some(cached.clone());
    }
    if !in_progress.insert(name.to_string()) {
        sink.emit(Diagnostic::error(
            DiagnosticCode::error(Stage::Name, 4),
            format!("component '{name}' recursively instantiates itself"),
            use_span,
        ));
        return None;
    }

    let Some(def) = symbols.get(name) else {
        sink.emit(Diagnostic::error(
            DiagnosticCode::error(Stage::Name, 3),
            format!("undefined component type '{name}'"),
            use_span,
        ));
        in_progress.remove(name);
        return None;
    };

    let expanded = generators::expand_component(def, sink);
    let mut connections = expander::expand_connections(
        def,
        &expanded.connections,
        &expanded.instances,
        &expanded.constants,
        symbols,
        sink,
    );
    let materialized = constants::materialize(&expanded.constants, &mut connections);

    let mut result_instances: Vec<(String, PrimitiveKind, Span)> = Vec::new();
    for bit in materialized {
        result_instances.push((bit.name, bit.kind, bit.span));
    }

    for inst in &expanded.instances {
        if let Some(kind) = PrimitiveKind::from_keyword(&inst.type_name) {
            result_instances.push((inst.name.clone(), kind, inst.span));
        }
    }

    for inst in &expanded.instances {
        if PrimitiveKind::from_keyword(&inst.type_name).is_some() {
            continue;
        }
        let Some(sub) = flatten_component(
            &inst.type_name,
            symbols,
            sink,
            cache,
            in_progress,
            inst.span,
        ) else {
            continue;
        };

        let prefix = &inst.name;

        let mut input_feeds: HashMap<(String, u32), BitEndpoint> = HashMap::new();
        connections.retain(|conn| {
            if let BitEndpoint::Instance { instance, port, bit } = &conn.dst {
                if instance == prefix {
                    input_feeds.insert((port.clone(), *bit), conn.src.clone());
                    return false;
                }
            }
            true
        });

        let resolve_sub_src = |src: &BitEndpoint| -> BitEndpoint {
            match src {
                BitEndpoint::ComponentPort { name, bit } => input_feeds
                    .get(&(name.clone(), *bit))
                    .cloned()
                    .unwrap_or_else(|| BitEndpoint::ComponentPort {
                        name: name.clone(),
                        bit: *bit,
                    }),
                BitEndpoint::Instance { instance, port, bit } => BitEndpoint::Instance {
                    instance: format!("{prefix}_{instance}"),
                    port: port.clone(),
                    bit: *bit,
                },
            }
        };

        let mut output_subst: HashMap<(String, u32), BitEndpoint> = HashMap::new();
        for sub_conn in &sub.connections {
            if let BitEndpoint::ComponentPort { name, bit } = &sub_conn.dst {
                output_subst.insert((name.clone(), *bit), resolve_sub_src(&sub_conn.src));
            }
        }

        for (name, kind, span) in &sub.instances {
            result_instances.push((format!("{prefix}_{name}"), *kind, *span));
        }

        for sub_conn in &sub.connections {
            if let BitEndpoint::Instance { instance, port, bit } = &sub_conn.dst {
                connections.push(BitConnection {
                    src: resolve_sub_src(&sub_conn.src),
                    dst: BitEndpoint::Instance {
                        instance: format!("{prefix}_{instance}"),
                        port: port.clone(),
                        bit: *bit,
                    },
                    span: sub_conn.span,
                });
            }
        }

        for conn in connections.iter_mut() {
            if let BitEndpoint::Instance { instance, port, bit } = &conn.src {
                if instance == prefix {
                    if let Some(replacement) = output_subst.get(&(port.clone(), *bit)) {
                        conn.src = replacement.clone();
                    }
                }
            }
        }
    }

    let result = FlattenedComponent {
        inputs: def
            .inputs
            .iter()
            .map(|p| BasePort {
                name: p.name.clone(),
                width: p.width,
            })
            .collect(),
        outputs: def
            .outputs
            .iter()
            .map(|p| BasePort {
                name: p.name.clone(),
                width: p.width,
            })
            .collect(),
        instances: result_instances,
        connections,
    };

    in_progress.remove(name);
    cache.insert(name.to_string(), result.clone());
    Some(result)
}
