//! Phase 4: named-constant materialization.
//!
//! Every named constant becomes one synthesized `__VCC__`/`__GND__`
//! primitive per bit, named `{constant}_bit{n}` (1-based, matching the
//! indexing convention used everywhere else). Every reference to the
//! constant is rewritten to that primitive's output.

use crate::expander::constant_width;
use crate::types::{BitConnection, BitEndpoint, FlatConstant};
use shdl_ir::PrimitiveKind;
use shdl_source::Span;
use std::collections::HashMap;

/// A synthesized constant-source primitive.
pub struct MaterializedBit {
    /// The synthesized instance name, `{constant}_bit{n}`.
    pub name: String,
    /// `Vcc` if this bit is 1, `Gnd` if 0.
    pub kind: PrimitiveKind,
    /// The span of the constant declaration this bit traces back to.
    pub span: Span,
}

/// Materializes every constant into per-bit `__VCC__`/`__GND__` instances
/// and rewrites `bit_connections` so that any reference to
/// `ComponentPort { name: <constant>, bit }` instead points at
/// `Instance { instance: "<constant>_bit<n>", port: "O", bit: 1 }`.
pub fn materialize(
    constants: &[FlatConstant],
    bit_connections: &mut [BitConnection],
) -> Vec<MaterializedBit> {
    let mut bits = Vec::new();
    let mut rewrite: HashMap<(String, u32), BitEndpoint> = HashMap::new();

    for c in constants {
        let width = constant_width(c);
        for n in 1..=width {
            let bit_value = (c.value >> (n - 1)) & 1;
            let name = format!("{}_bit{n}", c.name);
            let kind = if bit_value == 1 {
                PrimitiveKind::Vcc
            } else {
                PrimitiveKind::Gnd
            };
            bits.push(MaterializedBit {
                name: name.clone(),
                kind,
                span: c.span,
            });
            rewrite.insert(
                (c.name.clone(), n),
                BitEndpoint::Instance {
                    instance: name,
                    port: "O".to_string(),
                    bit: 1,
                },
            );
        }
    }

    if rewrite.is_empty() {
        return bits;
    }

    for conn in bit_connections.iter_mut() {
        if let BitEndpoint::ComponentPort { name, bit } = &conn.src {
            if let Some(replacement) = rewrite.get(&(name.clone(), *bit)) {
                conn.src = replacement.clone();
            }
        }
        if let BitEndpoint::ComponentPort { name, bit } = &conn.dst {
            if let Some(replacement) = rewrite.get(&(name.clone(), *bit)) {
                conn.dst = replacement.clone();
            }
        }
    }

    bits
}
