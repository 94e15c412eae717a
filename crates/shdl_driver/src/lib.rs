//! Driver glue: the boundary between a `.shdl` file on disk and a loaded
//! simulator. Orchestrates flatten → analyze → emit → invoke the host C
//! toolchain → dlopen, per specification §4.6. None of the compiler's own
//! logic lives here — this crate only shells out and loads results.

#![warn(missing_docs)]

pub mod error;
pub mod simulator;
pub mod toolchain;

pub use error::DriverError;
pub use simulator::Simulator;

use shdl_diagnostics::DiagnosticSink;
use shdl_ir::BaseComponent;
use shdl_source::SourceDb;
use std::path::{Path, PathBuf};

/// Everything the CLI needs to know about where generated artifacts went.
pub struct BuildArtifacts {
    /// The path the generated C source was written to.
    pub source_path: PathBuf,
    /// The path of the compiled shared object, if the toolchain was invoked.
    pub shared_object_path: Option<PathBuf>,
}

/// Tunable knobs for a build, mirroring the `shdlc` CLI flags in
/// specification §6.2.
pub struct BuildOptions<'a> {
    /// Additional search paths for `use` resolution.
    pub search_path: &'a [PathBuf],
    /// Picks the entry component when a file defines several; defaults to
    /// the first component declared in the entry module.
    pub component: Option<&'a str>,
    /// Optimization level passed to the host toolchain.
    pub opt_level: u8,
    /// If `true`, only emit source — never invoke the host toolchain.
    pub compile_only: bool,
    /// Where to write the generated C source.
    pub output_path: PathBuf,
}

/// Runs the front end (resolve → flatten → analyze) and, unless
/// `compile_only`, the back end (emit → compile) for one entry file.
///
/// Returns `None` if any stage reports an error; diagnostics describing why
/// are already in `sink`. `source_db` accumulates every file read along the
/// way, so callers can resolve diagnostic spans after the fact even though
/// this function reports failure only through `sink`.
pub fn build(
    entry_path: &Path,
    options: &BuildOptions,
    source_db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> Result<Option<BuildArtifacts>, DriverError> {
    let Some(program) = shdl_resolve::resolve(entry_path, options.search_path, source_db, sink)
    else {
        return Ok(None);
    };
    if sink.has_errors() {
        return Ok(None);
    }

    let entry_component = match options.component {
        Some(name) => name.to_string(),
        None => match program.modules[&program.entry].components.first() {
            Some(comp) => comp.name.clone(),
            None => return Ok(None),
        },
    };

    let Some(base) = shdl_flatten::flatten(&program, &entry_component, sink) else {
        return Ok(None);
    };
    if sink.has_errors() {
        return Ok(None);
    }

    let Some(analyzed) = shdl_analyze::analyze(base, sink) else {
        return Ok(None);
    };

    let source = shdl_codegen::generate(&analyzed);
    std::fs::write(&options.output_path, &source).map_err(|source_err| DriverError::WriteSource {
        path: options.output_path.clone(),
        source: source_err,
    })?;

    if options.compile_only {
        return Ok(Some(BuildArtifacts {
            source_path: options.output_path.clone(),
            shared_object_path: None,
        }));
    }

    let so_path = options.output_path.with_extension("so");
    toolchain::compile_shared_object(&options.output_path, &so_path, options.opt_level)?;

    Ok(Some(BuildArtifacts {
        source_path: options.output_path.clone(),
        shared_object_path: Some(so_path),
    }))
}

/// Convenience wrapper: builds `entry_path` to a temporary directory and
/// loads the result as a [`Simulator`], for embedding a design directly in
/// a Rust process without managing artifact paths.
pub fn build_and_load(
    entry_path: &Path,
    component: Option<&str>,
    opt_level: u8,
    sink: &DiagnosticSink,
) -> Result<Option<Simulator>, DriverError> {
    let dir = tempfile::tempdir().map_err(|source| DriverError::WriteSource {
        path: PathBuf::from("<tempdir>"),
        source,
    })?;
    let options = BuildOptions {
        search_path: &[],
        component,
        opt_level,
        compile_only: false,
        output_path: dir.path().join("sim.c"),
    };
    let mut source_db = SourceDb::new();
    let Some(artifacts) = build(entry_path, &options, &mut source_db, sink)? else {
        return Ok(None);
    };
    let so_path = artifacts
        .shared_object_path
        .expect("compile_only is false, so a shared object was produced");
    let sim = Simulator::load(&so_path)?;
    Ok(Some(sim))
}

/// Runs just the front end, for callers that want the analyzed IR without
/// generating or compiling anything (used by the conformance suite).
pub fn analyze_entry(
    entry_path: &Path,
    search_path: &[PathBuf],
    component: Option<&str>,
    sink: &DiagnosticSink,
) -> Option<BaseComponent> {
    let mut source_db = shdl_source::SourceDb::new();
    let program = shdl_resolve::resolve(entry_path, search_path, &mut source_db, sink)?;
    if sink.has_errors() {
        return None;
    }
    let entry_component = match component {
        Some(name) => name.to_string(),
        None => program.modules[&program.entry].components.first()?.name.clone(),
    };
    shdl_flatten::flatten(&program, &entry_component, sink)
}
