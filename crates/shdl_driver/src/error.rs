//! Error type for the boundary layer: everything between "source on disk"
//! and "loaded simulator" that isn't a structured compiler diagnostic.

use std::path::PathBuf;

/// Failures specific to driving the external toolchain and loading its
/// output, as opposed to compiler diagnostics (those go through
/// [`shdl_diagnostics::DiagnosticSink`] and never reach this type).
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Compilation failed before codegen could run (diagnostics already
    /// describe why; this variant just signals "stop here").
    #[error("compilation failed with {0} diagnostic(s)")]
    CompilationFailed(usize),

    /// Writing the generated C source to disk failed.
    #[error("failed to write generated source to {path}: {source}")]
    WriteSource {
        /// The path that couldn't be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The host C toolchain could not be spawned at all (not found on PATH).
    #[error("failed to spawn host toolchain '{compiler}': {source}")]
    SpawnToolchain {
        /// The compiler binary that was attempted.
        compiler: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The host C toolchain ran but exited with a non-zero status.
    #[error("host toolchain exited with status {status}: {stderr}")]
    ToolchainFailed {
        /// The process exit status, formatted.
        status: String,
        /// Captured stderr from the toolchain invocation.
        stderr: String,
    },

    /// Loading the compiled shared object failed.
    #[error("failed to load shared object {path}: {source}")]
    LoadLibrary {
        /// The shared object path.
        path: PathBuf,
        /// The underlying `libloading` error.
        #[source]
        source: libloading::Error,
    },

    /// A required ABI symbol (`reset`/`poke`/`peek`/`step`) was missing from
    /// the loaded shared object.
    #[error("shared object is missing required symbol '{0}'")]
    MissingSymbol(&'static str),
}
