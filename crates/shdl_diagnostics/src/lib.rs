//! Structured diagnostics for the SHDL compilation pipeline.
//!
//! Every phase of the pipeline (lexer, parser, module resolver, flattener,
//! analyzer) reports problems as [`Diagnostic`]s routed through a shared
//! [`DiagnosticSink`], rather than failing fast — each phase recovers past a
//! bad statement where possible so a single `shdlc` invocation can report
//! every problem in a file, not just the first.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;
pub mod suggested_fix;

pub use code::{DiagnosticCode, Stage};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
pub use suggested_fix::{Replacement, SuggestedFix};
