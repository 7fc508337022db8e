//! Error types for markup parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    #[error("unterminated comment at {span:?}")]
    UnterminatedComment { span: Span },

    #[error("unterminated <{tag}> element at {span:?}")]
    UnterminatedRawText { tag: String, span: Span },
}

impl MarkupError {
    pub fn span(&self) -> Span {
        match self {
            MarkupError::UnterminatedComment { span }
            | MarkupError::UnterminatedRawText { span, .. } => span.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span();
        let (message, hint) = match self {
            MarkupError::UnterminatedComment { .. } => (
                "Unterminated comment".to_string(),
                "this comment is never closed with '-->'".to_string(),
            ),
            MarkupError::UnterminatedRawText { tag, .. } => (
                format!("Unterminated <{}> element", tag),
                format!("expected a matching '</{}>'", tag),
            ),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&message)
            .with_label(
                Label::new((filename, span))
                    .with_message(hint)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        if written.is_err() {
            return message;
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}
