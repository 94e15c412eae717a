//! Working representations shared across the flattener's five phases.

use serde::{Deserialize, Serialize};
use shdl_source::Span;

/// An instance declaration after generator expansion: a concrete name and
/// referenced type (primitive keyword or component name).
#[derive(Clone, Debug)]
pub struct FlatInstance {
    /// The expanded instance name.
    pub name: String,
    /// The referenced primitive or component type.
    pub type_name: String,
    /// The span this instance traces back to in pre-expansion source.
    pub span: Span,
}

/// A named constant after generator expansion (still un-materialized).
#[derive(Clone, Debug)]
pub struct FlatConstant {
    /// The expanded constant name.
    pub name: String,
    /// The explicit width, if given in source.
    pub width: Option<u32>,
    /// The constant's value.
    pub value: u64,
    /// The span this constant traces back to.
    pub span: Span,
}

/// A fully-evaluated index/slice suffix — the phase-3 counterpart of
/// [`shdl_ast::IndexSpec`], with all arithmetic already reduced to
/// integers (no generator variables survive past phase 2).
#[derive(Clone, Copy, Debug)]
pub enum ResolvedIndex {
    /// A single bit index (1-based).
    Bit(i64),
    /// `[:k]` — the low `k` bits.
    SliceTo(i64),
    /// `[k:]` — bits from `k` to the enclosing width.
    SliceFrom(i64),
    /// `[a:b]` — an explicit closed range.
    SliceRange(i64, i64),
}

/// A signal reference after generator expansion: a realized base/member
/// name pair plus an optional resolved index.
#[derive(Clone, Debug)]
pub struct FlatSignalRef {
    /// The base identifier (component port, instance, or constant name).
    pub base: String,
    /// The member name, for `instance.port` references.
    pub member: Option<String>,
    /// The optional index/slice.
    pub index: Option<ResolvedIndex>,
    /// The span this reference traces back to.
    pub span: Span,
}

/// A connection after generator expansion, before bit-slice expansion.
#[derive(Clone, Debug)]
pub struct FlatConnection {
    /// The driving signal.
    pub src: FlatSignalRef,
    /// The driven signal.
    pub dst: FlatSignalRef,
    /// The span this connection traces back to.
    pub span: Span,
}

/// A single-bit endpoint after bit-slice expansion (phase 3): either one
/// bit of this component's own port, or one bit of `instance.port`
/// (primitive or, before hierarchy flattening, a sub-component).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitEndpoint {
    /// One bit of this component's own input or output port.
    ComponentPort {
        /// The port's name.
        name: String,
        /// The 1-based bit index.
        bit: u32,
    },
    /// One bit of `instance.port`.
    Instance {
        /// The instance's name.
        instance: String,
        /// The port name (`A`, `B`, `O` for primitives; a declared port
        /// name for a not-yet-inlined sub-component).
        port: String,
        /// The 1-based bit index.
        bit: u32,
    },
}

/// A single-bit connection between two [`BitEndpoint`]s.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BitConnection {
    /// The driving endpoint.
    pub src: BitEndpoint,
    /// The driven endpoint.
    pub dst: BitEndpoint,
    /// The span this connection traces back to.
    pub span: Span,
}

/// A component fully reduced to primitives and single-bit connections
/// referencing only primitives and this component's own ports — the
/// per-component result of phases 2 through 5, before conversion to
/// [`shdl_ir::BaseComponent`].
#[derive(Clone, Debug)]
pub struct FlattenedComponent {
    /// The component's input ports.
    pub inputs: Vec<shdl_ir::BasePort>,
    /// The component's output ports.
    pub outputs: Vec<shdl_ir::BasePort>,
    /// Primitive instances, in deterministic construction order.
    pub instances: Vec<(String, shdl_ir::PrimitiveKind, Span)>,
    /// Single-bit connections, referencing only primitives and this
    /// component's own ports.
    pub connections: Vec<BitConnection>,
}
