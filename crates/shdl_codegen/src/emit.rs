//! Emits a self-contained C translation unit implementing the tick kernel
//! and `reset`/`poke`/`peek`/`step` runtime shell for an analyzed component.

use crate::lanes::{Lane, LaneMap};
use shdl_analyze::AnalyzedComponent;
use shdl_ir::{PrimitiveKind, SinkRef, SourceRef};
use std::fmt::Write as _;

fn word_name(kind: PrimitiveKind, chunk: usize) -> String {
    format!("{kind}_O_{chunk}")
}

fn active_mask(active: usize) -> String {
    if active >= 64 {
        "0xFFFFFFFFFFFFFFFFULL".to_string()
    } else {
        format!("0x{:X}ULL", (1u64 << active) - 1)
    }
}

/// One lane's contribution to a gather word: the branchless deposit of a
/// driver bit into its destination lane, per specification §4.5.3.
fn deposit_expr(lane: usize, source: &SourceRef, lane_map: &LaneMap) -> String {
    let lane_mask = format!("(1ULL << {lane})");
    match source {
        SourceRef::ComponentInput { port, bit } => format!(
            "((uint64_t)(-(int64_t)((g_in_{port} >> {bit}) & 1ULL)) & {lane_mask})"
        ),
        SourceRef::PrimitiveOutput(driver) => match lane_map.lane_of(*driver) {
            Some(Lane { kind, chunk, lane: src_lane }) => format!(
                "((uint64_t)(-(int64_t)((s->{} >> {src_lane}) & 1ULL)) & {lane_mask})",
                word_name(kind, chunk)
            ),
            None => unreachable!("Vcc/Gnd drivers are resolved before reaching deposit_expr"),
        },
    }
}

/// Resolves a primitive-output source that may be a synthesized constant,
/// returning a literal `0`/`1`/`(lane_mask)`-shaped expression directly
/// instead of going through `deposit_expr` (Vcc/Gnd have no state word).
fn resolve_constant_lane(source: &SourceRef, analyzed: &AnalyzedComponent) -> Option<bool> {
    if let SourceRef::PrimitiveOutput(id) = source {
        match analyzed.base.primitives.get(*id).kind {
            PrimitiveKind::Vcc => return Some(true),
            PrimitiveKind::Gnd => return Some(false),
            _ => {}
        }
    }
    None
}

fn gather_word(
    analyzed: &AnalyzedComponent,
    lane_map: &LaneMap,
    kind: PrimitiveKind,
    chunk: usize,
    port: shdl_ir::PrimitivePort,
) -> String {
    let mut terms = Vec::new();
    for (id, inst) in analyzed.base.primitives.iter() {
        if inst.kind != kind {
            continue;
        }
        let Some(lane) = lane_map.lane_of(id) else { continue };
        if lane.chunk != chunk {
            continue;
        }
        let sink = SinkRef::PrimitiveInput { instance: id, port };
        let Some(source) = analyzed.driver_map.get(&sink) else { continue };
        match resolve_constant_lane(source, analyzed) {
            Some(true) => terms.push(format!("(1ULL << {})", lane.lane)),
            Some(false) => {}
            None => terms.push(deposit_expr(lane.lane, source, lane_map)),
        }
    }
    if terms.is_empty() {
        "0ULL".to_string()
    } else {
        terms.join(" | ")
    }
}

fn emit_tick(out: &mut String, analyzed: &AnalyzedComponent, lane_map: &LaneMap) {
    writeln!(out, "static void compute_next(const sim_state_t *s, sim_state_t *next) {{").unwrap();
    for (kind, chunk, active) in lane_map.words() {
        let name = word_name(kind, chunk);
        let mask = active_mask(active);
        let a = gather_word(analyzed, lane_map, kind, chunk, shdl_ir::PrimitivePort::A);
        match kind {
            PrimitiveKind::Not => {
                writeln!(out, "    {{").unwrap();
                writeln!(out, "        uint64_t a = {a};").unwrap();
                writeln!(out, "        next->{name} = (~a) & {mask};").unwrap();
                writeln!(out, "    }}").unwrap();
            }
            PrimitiveKind::Xor | PrimitiveKind::And | PrimitiveKind::Or => {
                let b = gather_word(analyzed, lane_map, kind, chunk, shdl_ir::PrimitivePort::B);
                let op = match kind {
                    PrimitiveKind::Xor => "^",
                    PrimitiveKind::And => "&",
                    PrimitiveKind::Or => "|",
                    _ => unreachable!(),
                };
                writeln!(out, "    {{").unwrap();
                writeln!(out, "        uint64_t a = {a};").unwrap();
                writeln!(out, "        uint64_t b = {b};").unwrap();
                writeln!(out, "        next->{name} = (a {op} b) & {mask};").unwrap();
                writeln!(out, "    }}").unwrap();
            }
            PrimitiveKind::Vcc | PrimitiveKind::Gnd => unreachable!("no state word for constants"),
        }
    }
    writeln!(out, "}}").unwrap();
}

fn output_extraction(analyzed: &AnalyzedComponent, lane_map: &LaneMap, port: &str, bit: u32) -> String {
    let sink = SinkRef::ComponentOutput {
        port: port.to_string(),
        bit,
    };
    match analyzed.driver_map.get(&sink) {
        Some(SourceRef::ComponentInput { port, bit }) => format!("((g_in_{port} >> {bit}) & 1ULL)"),
        Some(source @ SourceRef::PrimitiveOutput(id)) => match resolve_constant_lane(source, analyzed) {
            Some(true) => "1ULL".to_string(),
            Some(false) => "0ULL".to_string(),
            None => {
                let lane = lane_map.lane_of(*id).expect("non-constant primitive has a lane");
                format!(
                    "((s->{} >> {}) & 1ULL)",
                    word_name(lane.kind, lane.chunk),
                    lane.lane
                )
            }
        },
        None => "0ULL".to_string(),
    }
}

fn emit_output_refresh(out: &mut String, analyzed: &AnalyzedComponent, lane_map: &LaneMap) {
    writeln!(out, "static void refresh_outputs(const sim_state_t *s) {{").unwrap();
    for port in &analyzed.base.outputs {
        writeln!(out, "    g_out_{} = 0;", port.name).unwrap();
        for bit in 0..port.width {
            let expr = output_extraction(analyzed, lane_map, &port.name, bit);
            writeln!(out, "    g_out_{} |= {expr} << {bit};", port.name).unwrap();
        }
    }
    writeln!(out, "}}").unwrap();
}

fn emit_state_struct(out: &mut String, lane_map: &LaneMap) {
    writeln!(out, "typedef struct {{").unwrap();
    for (kind, chunk, _) in lane_map.words() {
        writeln!(out, "    uint64_t {};", word_name(kind, chunk)).unwrap();
    }
    writeln!(out, "}} sim_state_t;").unwrap();
}

fn port_mask(width: u32) -> String {
    active_mask(width as usize)
}

fn emit_globals(out: &mut String, analyzed: &AnalyzedComponent) {
    for port in &analyzed.base.inputs {
        writeln!(out, "static uint64_t g_in_{};", port.name).unwrap();
    }
    for port in &analyzed.base.outputs {
        writeln!(out, "static uint64_t g_out_{};", port.name).unwrap();
    }
    writeln!(out, "static sim_state_t g_state;").unwrap();
    writeln!(out, "static sim_state_t g_next;").unwrap();
    writeln!(out, "static int g_next_valid;").unwrap();
    writeln!(out, "static int g_outputs_valid;").unwrap();
}

fn emit_runtime_shell(out: &mut String, analyzed: &AnalyzedComponent, lane_map: &LaneMap) {
    writeln!(out, "void reset(void) {{").unwrap();
    writeln!(out, "    memset(&g_state, 0, sizeof(g_state));").unwrap();
    writeln!(out, "    memset(&g_next, 0, sizeof(g_next));").unwrap();
    for port in &analyzed.base.inputs {
        writeln!(out, "    g_in_{} = 0;", port.name).unwrap();
    }
    writeln!(out, "    g_next_valid = 0;").unwrap();
    writeln!(out, "    g_outputs_valid = 0;").unwrap();
    writeln!(out, "    refresh_outputs(&g_state);").unwrap();
    writeln!(out, "    g_outputs_valid = 1;").unwrap();
    writeln!(out, "}}\n").unwrap();

    writeln!(out, "void eval(void) {{").unwrap();
    writeln!(out, "    compute_next(&g_state, &g_next);").unwrap();
    writeln!(out, "    g_next_valid = 1;").unwrap();
    writeln!(out, "    refresh_outputs(&g_next);").unwrap();
    writeln!(out, "    g_outputs_valid = 1;").unwrap();
    writeln!(out, "}}\n").unwrap();

    writeln!(out, "void step(int32_t cycles) {{").unwrap();
    writeln!(out, "    int32_t i;").unwrap();
    writeln!(out, "    for (i = 0; i < cycles; i++) {{").unwrap();
    writeln!(out, "        compute_next(&g_state, &g_next);").unwrap();
    writeln!(out, "        g_state = g_next;").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "    g_next_valid = 0;").unwrap();
    writeln!(out, "    refresh_outputs(&g_state);").unwrap();
    writeln!(out, "    g_outputs_valid = 1;").unwrap();
    writeln!(out, "}}\n").unwrap();

    writeln!(out, "void poke(const char *name, uint64_t value) {{").unwrap();
    for port in &analyzed.base.inputs {
        writeln!(out, "    if (strcmp(name, \"{}\") == 0) {{", port.name).unwrap();
        writeln!(out, "        g_in_{} = value & {};", port.name, port_mask(port.width)).unwrap();
        writeln!(out, "        g_outputs_valid = 0;").unwrap();
        writeln!(out, "        g_next_valid = 0;").unwrap();
        writeln!(out, "        return;").unwrap();
        writeln!(out, "    }}").unwrap();
    }
    writeln!(out, "    fprintf(stderr, \"poke: unknown signal '%s'\\n\", name);").unwrap();
    writeln!(out, "}}\n").unwrap();

    writeln!(out, "uint64_t peek(const char *name) {{").unwrap();
    for port in &analyzed.base.inputs {
        writeln!(out, "    if (strcmp(name, \"{}\") == 0) {{ return g_in_{}; }}", port.name, port.name).unwrap();
    }
    writeln!(out, "    if (!g_outputs_valid) {{").unwrap();
    writeln!(out, "        refresh_outputs(g_next_valid ? &g_next : &g_state);").unwrap();
    writeln!(out, "        g_outputs_valid = 1;").unwrap();
    writeln!(out, "    }}").unwrap();
    for port in &analyzed.base.outputs {
        writeln!(out, "    if (strcmp(name, \"{}\") == 0) {{ return g_out_{}; }}", port.name, port.name).unwrap();
    }
    for (kind, chunk, _) in lane_map.words() {
        let name = word_name(kind, chunk);
        writeln!(out, "    if (strcmp(name, \"{name}\") == 0) {{ return g_state.{name}; }}").unwrap();
    }
    writeln!(out, "    fprintf(stderr, \"peek: unknown signal '%s'\\n\", name);").unwrap();
    writeln!(out, "    return 0;").unwrap();
    writeln!(out, "}}").unwrap();
}

/// Generates the complete C translation unit for an analyzed component.
///
/// The output is deterministic: identical `AnalyzedComponent` input (same
/// primitive order, same driver map) always yields byte-identical text,
/// since every loop here walks either the primitive arena in allocation
/// order or `LaneMap::words()`'s canonically sorted order.
pub fn generate(analyzed: &AnalyzedComponent) -> String {
    let lane_map = LaneMap::assign(&analyzed.base);
    let mut out = String::new();
    writeln!(out, "/* generated by shdlc for component '{}' */", analyzed.base.name).unwrap();
    writeln!(out, "#include <stdint.h>").unwrap();
    writeln!(out, "#include <string.h>").unwrap();
    writeln!(out, "#include <stdio.h>\n").unwrap();

    emit_state_struct(&mut out, &lane_map);
    out.push('\n');
    emit_globals(&mut out, analyzed);
    out.push('\n');
    emit_tick(&mut out, analyzed, &lane_map);
    out.push('\n');
    emit_output_refresh(&mut out, analyzed, &lane_map);
    out.push('\n');
    emit_runtime_shell(&mut out, analyzed, &lane_map);
    out
}
