//! Shared foundational types used across the SHDL toolchain.
//!
//! This crate provides content hashing for determinism checks and the
//! common internal-error/result types used by every other crate in the
//! pipeline.

#![warn(missing_docs)]

pub mod hash;
pub mod result;

pub use hash::ContentHash;
pub use result::{InternalError, ShdlResult};
