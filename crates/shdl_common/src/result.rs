//! Common result and internal-error types for the SHDL toolchain.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value. `Err` indicates an unrecoverable internal
/// error (a bug in the toolchain), not a user-facing error. User-facing
/// errors (malformed source, unresolved names, width mismatches, ...) are
/// reported through [`DiagnosticSink`](shdl_diagnostics::DiagnosticSink) and
/// the surrounding operation still returns `Ok` with a best-effort, possibly
/// partial, result.
pub type ShdlResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in the toolchain, not a
/// problem with the user's SHDL source.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("lane map missing a chunk");
        assert_eq!(
            format!("{err}"),
            "internal compiler error: lane map missing a chunk"
        );
    }

    #[test]
    fn ok_path() {
        let r: ShdlResult<i32> = Ok(42);
        assert!(r.is_ok());
        assert_eq!(r.ok(), Some(42));
    }

    #[test]
    fn err_path() {
        let r: ShdlResult<i32> = Err(InternalError::new("test error"));
        assert!(r.is_err());
        assert_eq!(r.err().unwrap().message, "test error");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
