//! Diagnostic rendering backends.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use shdl_source::SourceDb;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E0401]: width mismatch in connection
///   --> adder.shdl:10:5
///    |
/// 10 | In[:4] -> Out[:8];
///    |           ^ expected width 4, found width 8
///    |
///    = note: source and destination slice widths must match
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{}[{}]: {}\n",
            diag.severity, diag.code, diag.message
        ));

        if !diag.primary_span.is_dummy() {
            let resolved = source_db.resolve_span(diag.primary_span);
            out.push_str(&format!("  --> {resolved}\n"));

            let file = source_db.get_file(diag.primary_span.file);
            let (line, col) = file.line_col(diag.primary_span.start);
            let line_num = format!("{line}");
            let padding = " ".repeat(line_num.len());

            let line_content = get_source_line(&file.content, diag.primary_span.start);

            out.push_str(&format!("{padding} |\n"));
            out.push_str(&format!("{line_num} | {line_content}\n"));

            let span_len = (diag.primary_span.end - diag.primary_span.start).max(1) as usize;
            let carets = "^".repeat(span_len);
            let col_padding = " ".repeat((col as usize).saturating_sub(1));

            let primary_msg = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| format!(" {}", l.message))
                .unwrap_or_default();

            out.push_str(&format!("{padding} | {col_padding}{carets}{primary_msg}\n"));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

/// Extracts the line of source code containing the given byte offset.
fn get_source_line(content: &str, byte_offset: u32) -> &str {
    let offset = byte_offset as usize;
    let start = content[..offset].rfind('\n').map_or(0, |pos| pos + 1);
    let end = content[offset..]
        .find('\n')
        .map_or(content.len(), |pos| offset + pos);
    &content[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{DiagnosticCode, Stage};
    use crate::label::Label;

    #[test]
    fn render_error_with_span() {
        let mut source_db = SourceDb::new();
        let file_id = source_db.add_source("adder.shdl", "In[:4] -> Out[:8];\n".to_string());

        let code = DiagnosticCode::error(Stage::TypeWidth, 1);
        let span = shdl_source::Span::new(file_id, 10, 18);
        let diag = Diagnostic::error(code, "width mismatch", span)
            .with_label(Label::primary(span, "expected width 4, found width 8"));

        let renderer = TerminalRenderer::new(false);
        let output = renderer.render(&diag, &source_db);

        assert!(output.contains("error[E0401]: width mismatch"));
        assert!(output.contains("--> adder.shdl:1:11"));
        assert!(output.contains("In[:4] -> Out[:8];"));
        assert!(output.contains('^'));
    }

    #[test]
    fn render_warning_with_notes() {
        let source_db = SourceDb::new();
        let code = DiagnosticCode::warning(Stage::Name, 1);
        let diag = Diagnostic::warning(code, "unused port", shdl_source::Span::DUMMY)
            .with_note("port 'Cout' is declared but never driven")
            .with_help("consider removing it or connecting it to GND");

        let renderer = TerminalRenderer::new(false);
        let output = renderer.render(&diag, &source_db);

        assert!(output.contains("warning[W0101]: unused port"));
        assert!(output.contains("= note: port 'Cout' is declared but never driven"));
    }

    #[test]
    fn render_dummy_span_no_source() {
        let source_db = SourceDb::new();
        let code = DiagnosticCode::error(Stage::Connection, 99);
        let diag = Diagnostic::error(code, "general error", shdl_source::Span::DUMMY);

        let renderer = TerminalRenderer::new(false);
        let output = renderer.render(&diag, &source_db);

        assert!(output.contains("error[E0599]: general error"));
        assert!(!output.contains("-->"));
    }
}
