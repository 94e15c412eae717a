//! Invokes the host C toolchain to turn generated source into a shared
//! object, per specification §4.6: `-shared -fPIC -O{level}`.

use crate::error::DriverError;
use std::path::Path;
use std::process::Command;

/// Which compiler binary to try, in order, when `CC` isn't set in the
/// environment.
const DEFAULT_COMPILERS: &[&str] = &["cc", "gcc", "clang"];

/// Compiles `source_path` into a shared object at `output_path`, using the
/// compiler named by the `CC` environment variable if set, else the first
/// of [`DEFAULT_COMPILERS`] found on `PATH`.
pub fn compile_shared_object(
    source_path: &Path,
    output_path: &Path,
    opt_level: u8,
) -> Result<(), DriverError> {
    let compiler = std::env::var("CC").ok();
    let candidates: Vec<&str> = match &compiler {
        Some(cc) => vec![cc.as_str()],
        None => DEFAULT_COMPILERS.to_vec(),
    };

    let opt_flag = format!("-O{opt_level}");
    let mut last_err = None;
    for candidate in candidates {
        let result = Command::new(candidate)
            .arg("-shared")
            .arg("-fPIC")
            .arg(&opt_flag)
            .arg("-o")
            .arg(output_path)
            .arg(source_path)
            .output();
        match result {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => {
                return Err(DriverError::ToolchainFailed {
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                });
            }
            Err(err) => last_err = Some((candidate.to_string(), err)),
        }
    }

    let (compiler, source) = last_err.expect("DEFAULT_COMPILERS is non-empty");
    Err(DriverError::SpawnToolchain { compiler, source })
}
