//! `shdlc` — compiles a Base SHDL entry file down to a C simulator source
//! (and, unless `--compile-only`, a loadable shared object), per
//! specification §6.2.

#![warn(missing_docs)]

use clap::Parser;
use shdl_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use shdl_driver::BuildOptions;
use shdl_source::SourceDb;
use std::path::PathBuf;
use std::process;

/// Compiles one SHDL entry file to a C simulator.
#[derive(Parser, Debug)]
#[command(name = "shdlc", version, about = "Base SHDL compiler")]
struct Cli {
    /// The entry `.shdl` file to compile.
    input: PathBuf,

    /// Output path for the emitted C source. Defaults to the input's file
    /// stem with a `.c` extension.
    #[arg(short = 'o')]
    output: Option<PathBuf>,

    /// Additional search path for `use` resolution. May be repeated.
    #[arg(short = 'I')]
    search_path: Vec<PathBuf>,

    /// Emit source only; do not invoke the host toolchain.
    #[arg(short = 'c', long = "compile-only")]
    compile_only: bool,

    /// Optimization level passed to the host toolchain.
    #[arg(short = 'O', default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=3))]
    opt_level: u8,

    /// Picks the entry component when the file defines several.
    #[arg(long)]
    component: Option<String>,

    /// Print one-line stage progress to stderr as the pipeline runs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress stage progress (the default); has no effect beyond
    /// overriding a would-be `--verbose`.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn default_output_path(input: &std::path::Path) -> PathBuf {
    input.with_extension("c")
}

fn main() {
    let cli = Cli::parse();
    let output_path = cli.output.clone().unwrap_or_else(|| default_output_path(&cli.input));

    let options = BuildOptions {
        search_path: &cli.search_path,
        component: cli.component.as_deref(),
        opt_level: cli.opt_level,
        compile_only: cli.compile_only,
        output_path,
    };

    let verbose = cli.verbose && !cli.quiet;
    if verbose {
        eprintln!("compiling {}", cli.input.display());
    }

    let sink = DiagnosticSink::new();
    let mut source_db = SourceDb::new();
    let result = shdl_driver::build(&cli.input, &options, &mut source_db, &sink);

    let renderer = TerminalRenderer::new(atty_color());
    for diag in sink.diagnostics() {
        eprint!("{}", renderer.render(&diag, &source_db));
    }

    match result {
        Ok(Some(artifacts)) => {
            if verbose {
                eprintln!("wrote {}", artifacts.source_path.display());
                if let Some(so) = &artifacts.shared_object_path {
                    eprintln!("built {}", so.display());
                }
            }
            process::exit(0)
        }
        Ok(None) => process::exit(1),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}

/// Rough terminal detection for whether to color rendered diagnostics.
fn atty_color() -> bool {
    std::env::var("TERM").is_ok()
}
