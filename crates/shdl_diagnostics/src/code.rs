//! Diagnostic codes aligned with the reference `Exxyy`/`W01yy` taxonomy.
//!
//! Error codes are a stage-qualified `E{stage:02}{number:02}`, e.g. `E0401`
//! (type/width stage, error 01). Warnings are a single flat catalog
//! `W01{number:02}` regardless of which stage emits them — the
//! specification groups all warnings under `W01xx` (e.g. `W0106` for
//! generator-variable shadowing, emitted by the generator-expansion phase
//! but numbered in the shared warning catalog, not `W06xx`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight diagnostic stages named in the specification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Stage {
    /// Lexical analysis (`E01xx`).
    Lex,
    /// Parsing (`E02xx`).
    Parse,
    /// Name resolution — undefined component/instance/port, duplicates (`E03xx`).
    Name,
    /// Type/width checking — width mismatch, out-of-range index (`E04xx`).
    TypeWidth,
    /// Connection analysis — multi-driver, unconnected input (`E05xx`).
    Connection,
    /// Generator expansion (`E06xx`).
    Generator,
    /// Module `use` import resolution (`E07xx`).
    Import,
    /// Named-constant materialization (`E08xx`).
    Constant,
}

impl Stage {
    /// Returns the 2-digit stage number used in the code's second/third digits.
    pub fn number(self) -> u8 {
        match self {
            Stage::Lex => 1,
            Stage::Parse => 2,
            Stage::Name => 3,
            Stage::TypeWidth => 4,
            Stage::Connection => 5,
            Stage::Generator => 6,
            Stage::Import => 7,
            Stage::Constant => 8,
        }
    }
}

/// A structured diagnostic code combining a severity prefix, the emitting
/// stage, and a 2-digit number.
///
/// Error codes display as `E{stage:02}{number:02}` (e.g. `E0401`). Warning
/// codes display as `W01{number:02}` (e.g. `W0106`) — `stage` is still
/// recorded for warnings (useful for filtering/grouping diagnostics by
/// origin) but does not appear in the rendered code, matching the
/// specification's single flat `W01xx` warning catalog.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// `true` for an error code, `false` for a warning code.
    pub is_error: bool,
    /// The diagnostic stage that emitted this code.
    pub stage: Stage,
    /// The 2-digit number (0-99): within-stage for errors, within the flat
    /// warning catalog for warnings.
    pub number: u8,
}

impl DiagnosticCode {
    /// Creates a new error code, numbered within `stage`.
    pub fn error(stage: Stage, number: u8) -> Self {
        Self {
            is_error: true,
            stage,
            number,
        }
    }

    /// Creates a new warning code, numbered within the shared `W01xx`
    /// catalog. `stage` records which phase emits it but does not affect
    /// the rendered code.
    pub fn warning(stage: Stage, number: u8) -> Self {
        Self {
            is_error: false,
            stage,
            number,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error {
            write!(f, "E{:02}{:02}", self.stage.number(), self.number)
        } else {
            write!(f, "W01{:02}", self.number)
        }
    }
}
