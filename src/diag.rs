//! Diagnostics collected across parsing and compilation.
//!
//! Diagnostics are accumulated, never thrown: a malformed directive degrades to
//! a diagnostic plus a best-effort timeline so live preview keeps working while
//! the user types.

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// 1-based inclusive line range in the source document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceSpan {
    pub fn line(line: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
        }
    }

    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    pub fn error(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_severity() {
        let w = Diagnostic::warning("w", SourceSpan::line(3));
        assert_eq!(w.severity, Severity::Warning);
        assert_eq!(w.span, SourceSpan::lines(3, 3));

        let e = Diagnostic::error("e", SourceSpan::lines(1, 4));
        assert_eq!(e.severity, Severity::Error);
        assert_eq!(e.span.end_line, 4);
    }
}
