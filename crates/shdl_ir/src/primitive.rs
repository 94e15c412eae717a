//! The six primitive kinds a Base-SHDL component is built from.

use serde::{Deserialize, Serialize};
use shdl_source::Span;
use std::fmt;

/// One of SHDL's six primitive gate kinds.
///
/// `Vcc` and `Gnd` are the synthesized constant sources introduced during
/// constant materialization (flattener phase 4); they have no input ports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Two-input AND gate.
    And,
    /// Two-input OR gate.
    Or,
    /// Single-input NOT gate.
    Not,
    /// Two-input XOR gate.
    Xor,
    /// Always-1 constant source (`__VCC__`).
    Vcc,
    /// Always-0 constant source (`__GND__`).
    Gnd,
}

impl PrimitiveKind {
    /// Looks up a primitive kind from its source-level keyword.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "AND" => Some(PrimitiveKind::And),
            "OR" => Some(PrimitiveKind::Or),
            "NOT" => Some(PrimitiveKind::Not),
            "XOR" => Some(PrimitiveKind::Xor),
            "__VCC__" => Some(PrimitiveKind::Vcc),
            "__GND__" => Some(PrimitiveKind::Gnd),
            _ => None,
        }
    }

    /// Returns the number of input ports this kind has (0, 1, or 2).
    pub fn input_count(self) -> u8 {
        match self {
            PrimitiveKind::And | PrimitiveKind::Or | PrimitiveKind::Xor => 2,
            PrimitiveKind::Not => 1,
            PrimitiveKind::Vcc | PrimitiveKind::Gnd => 0,
        }
    }

    /// Returns `true` if this kind contributes a state word in codegen
    /// (i.e. is not a constant source).
    pub fn has_state_word(self) -> bool {
        !matches!(self, PrimitiveKind::Vcc | PrimitiveKind::Gnd)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveKind::And => "AND",
            PrimitiveKind::Or => "OR",
            PrimitiveKind::Not => "NOT",
            PrimitiveKind::Xor => "XOR",
            PrimitiveKind::Vcc => "__VCC__",
            PrimitiveKind::Gnd => "__GND__",
        };
        write!(f, "{s}")
    }
}

/// A single-letter primitive port: `A` and `B` are inputs, `O` is the sole
/// output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PrimitivePort {
    /// The first (or only) input.
    A,
    /// The second input (AND/OR/XOR only).
    B,
    /// The sole output.
    O,
}

impl fmt::Display for PrimitivePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitivePort::A => "A",
            PrimitivePort::B => "B",
            PrimitivePort::O => "O",
        };
        write!(f, "{s}")
    }
}

/// A single primitive instance in a Base component, named `name: KIND` in
/// the flattened netlist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrimitiveInstance {
    /// The flattened instance name, unique within the component.
    pub name: String,
    /// The primitive kind.
    pub kind: PrimitiveKind,
    /// The span this instance traces back to in pre-expansion source.
    pub span: Span,
}
