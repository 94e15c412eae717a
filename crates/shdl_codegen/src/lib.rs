//! Bit-packed code generator: turns an analyzed Base component into a
//! self-contained C translation unit implementing the tick kernel and the
//! `reset`/`poke`/`peek`/`step`/`eval` runtime shell.

#![warn(missing_docs)]

pub mod emit;
pub mod lanes;

pub use emit::generate;
pub use lanes::{Lane, LaneMap, LANES_PER_CHUNK};
