//! Conformance test helpers for the Base SHDL toolchain.
//!
//! Provides shared pipeline functions that run source text through the
//! front end (resolve → flatten → analyze) and, where a host C compiler is
//! available, all the way to a loaded simulator — returning structured
//! results for assertion in integration tests.

#![warn(missing_docs)]

use shdl_analyze::AnalyzedComponent;
use shdl_diagnostics::{Diagnostic, DiagnosticSink};
use shdl_driver::Simulator;
use shdl_ir::BaseComponent;
use std::path::PathBuf;

/// Result of running source through resolve → flatten, without analysis.
pub struct FrontEndResult {
    /// The flattened Base component, if every stage succeeded.
    pub base: Option<BaseComponent>,
    /// All diagnostics emitted along the way.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
}

/// Writes `source` to a fresh temporary directory as `top.shdl` and returns
/// both the directory (kept alive by the caller) and the file's path.
fn write_entry(source: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir for conformance test");
    let path = dir.path().join("top.shdl");
    std::fs::write(&path, source).expect("failed to write conformance test source");
    (dir, path)
}

/// Runs resolve → flatten on `source`, using an entry component name of
/// `component` if given, else the first component declared in the file.
pub fn front_end(source: &str, component: Option<&str>) -> FrontEndResult {
    let (_dir, path) = write_entry(source);
    let sink = DiagnosticSink::new();
    let base = shdl_driver::analyze_entry(&path, &[], component, &sink);
    let diagnostics = sink.diagnostics();
    FrontEndResult {
        has_errors: sink.has_errors(),
        base,
        diagnostics,
    }
}

/// Runs the full front end (resolve → flatten → analyze) on `source` and
/// returns the analyzed component, or `None` if any stage reported an
/// error. `sink` accumulates diagnostics from every stage.
pub fn analyze(source: &str, component: Option<&str>) -> (Option<AnalyzedComponent>, DiagnosticSink) {
    let (_dir, path) = write_entry(source);
    let sink = DiagnosticSink::new();
    let base = shdl_driver::analyze_entry(&path, &[], component, &sink);
    let analyzed = base.and_then(|b| shdl_analyze::analyze(b, &sink));
    (analyzed, sink)
}

/// Returns `true` if any of `cc`, `gcc`, or `clang` can be spawned on this
/// machine. Tests that need a real compiled simulator skip themselves when
/// this is `false`, matching the pattern `shdl_driver` itself uses for its
/// own toolchain-dependent tests.
pub fn has_any_compiler() -> bool {
    ["cc", "gcc", "clang"]
        .iter()
        .any(|c| std::process::Command::new(c).arg("--version").output().is_ok())
}

/// Builds and loads `source` as a running simulator, or `None` if any stage
/// failed (check `sink` for why) or no host compiler is available.
pub fn simulate(source: &str, component: Option<&str>) -> Option<Simulator> {
    let (_dir, path) = write_entry(source);
    let sink = DiagnosticSink::new();
    shdl_driver::build_and_load(&path, component, 0, &sink).ok().flatten()
}
