//! The Base-SHDL intermediate representation: a flat netlist of primitive
//! gates wired by single-bit connections, produced by the flattener and
//! consumed by the semantic analyzer and code generator.

#![warn(missing_docs)]

pub mod arena;
pub mod component;
pub mod ids;
pub mod primitive;

pub use arena::{Arena, ArenaId};
pub use component::{BaseComponent, BasePort, Connection, SinkRef, SourceRef};
pub use ids::PrimitiveId;
pub use primitive::{PrimitiveInstance, PrimitiveKind, PrimitivePort};
