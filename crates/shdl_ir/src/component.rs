//! The Base-SHDL component: a flat netlist of primitive instances wired by
//! single-bit connections (the post-flattener IR, specification §3.2).

use crate::arena::Arena;
use crate::ids::PrimitiveId;
use crate::primitive::{PrimitiveInstance, PrimitiveKind, PrimitivePort};
use serde::{Deserialize, Serialize};
use shdl_source::Span;

/// A Base-level port declaration (carried through unchanged from the
/// Expanded AST — ports never get flattened away).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasePort {
    /// The port's name.
    pub name: String,
    /// The port's bit width.
    pub width: u32,
}

/// A single-bit signal that can drive a sink: either a primitive's output,
/// or one bit of a component input port.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceRef {
    /// The output of a primitive instance.
    PrimitiveOutput(PrimitiveId),
    /// One bit of a component input port.
    ComponentInput {
        /// The input port's name.
        port: String,
        /// The 0-based bit index within that port.
        bit: u32,
    },
}

/// A single-bit signal that can be driven: either one input port of a
/// primitive, or one bit of a component output port.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SinkRef {
    /// One input port (`A` or `B`) of a primitive instance.
    PrimitiveInput {
        /// The target primitive instance.
        instance: PrimitiveId,
        /// Which input port.
        port: PrimitivePort,
    },
    /// One bit of a component output port.
    ComponentOutput {
        /// The output port's name.
        port: String,
        /// The 0-based bit index within that port.
        bit: u32,
    },
}

/// A single-bit connection `src -> dst` in the flattened netlist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// The driving signal.
    pub src: SourceRef,
    /// The driven signal.
    pub dst: SinkRef,
    /// The span this connection traces back to in pre-expansion source.
    pub span: Span,
}

/// A fully flattened Base-SHDL component: the output of the five-phase
/// flattener, ready for semantic analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseComponent {
    /// The component's (unflattened) name.
    pub name: String,
    /// The ordered input port list.
    pub inputs: Vec<BasePort>,
    /// The ordered output port list.
    pub outputs: Vec<BasePort>,
    /// The flat list of primitive instances, in deterministic source order.
    pub primitives: Arena<PrimitiveId, PrimitiveInstance>,
    /// The flat list of single-bit connections, in deterministic source order.
    pub connections: Vec<Connection>,
}

impl BaseComponent {
    /// Creates an empty Base component with the given ports.
    pub fn new(name: impl Into<String>, inputs: Vec<BasePort>, outputs: Vec<BasePort>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            primitives: Arena::new(),
            connections: Vec::new(),
        }
    }

    /// Allocates a new primitive instance and returns its ID.
    pub fn add_primitive(
        &mut self,
        name: impl Into<String>,
        kind: PrimitiveKind,
        span: Span,
    ) -> PrimitiveId {
        self.primitives.alloc(PrimitiveInstance {
            name: name.into(),
            kind,
            span,
        })
    }

    /// Returns the bit width of the named input port, if it exists.
    pub fn input_width(&self, name: &str) -> Option<u32> {
        self.inputs.iter().find(|p| p.name == name).map(|p| p.width)
    }

    /// Returns the bit width of the named output port, if it exists.
    pub fn output_width(&self, name: &str) -> Option<u32> {
        self.outputs.iter().find(|p| p.name == name).map(|p| p.width)
    }
}
