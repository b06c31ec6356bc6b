use std::{cmp::Ordering, fmt};

use cranelift_entity::entity_impl;
use text_size::{TextRange, TextSize};

/// An opaque identifier of a source file registered with the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);
entity_impl!(FileId);

/// A source location: a byte range inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub range: TextRange,
}

impl Span {
    pub fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }

    /// A zero-width span at the start of `file`, used for synthesized nodes.
    pub fn detached(file: FileId) -> Self {
        Self {
            file,
            range: TextRange::empty(TextSize::from(0)),
        }
    }

    pub fn from_offsets(file: FileId, start: u32, end: u32) -> Self {
        Self {
            file,
            range: TextRange::new(start.into(), end.into()),
        }
    }

    /// Returns the smallest span covering both `self` and `other`. The file of
    /// `self` wins.
    pub fn cover(self, other: Span) -> Span {
        Span {
            file: self.file,
            range: self.range.cover(other.range),
        }
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// File first, then start offset, then end offset.
impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.file, self.range.start(), self.range.end()).cmp(&(
            other.file,
            other.range.start(),
            other.range.end(),
        ))
    }
}

impl Default for Span {
    /// A detached span in the first registered file.
    fn default() -> Self {
        Self::detached(FileId::from_u32(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// The analysis phase a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticPass {
    NameResolution,
    TyLower,
    TraitResolution,
    TraitSatisfaction,
    Config,
}

impl DiagnosticPass {
    pub fn code(self) -> u16 {
        match self {
            Self::NameResolution => 2,
            Self::TyLower => 3,
            Self::TraitResolution => 4,
            Self::TraitSatisfaction => 5,
            Self::Config => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalErrorCode {
    pub pass: DiagnosticPass,
    pub local_code: u16,
}

impl GlobalErrorCode {
    pub fn new(pass: DiagnosticPass, local_code: u16) -> Self {
        Self { pass, local_code }
    }
}

impl fmt::Display for GlobalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.pass.code(), self.local_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubDiagnostic {
    pub style: LabelStyle,
    pub message: String,
    pub span: Option<Span>,
}

impl SubDiagnostic {
    pub fn new(style: LabelStyle, message: String, span: Option<Span>) -> Self {
        Self {
            style,
            message,
            span,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.style, LabelStyle::Primary)
    }
}

/// A fully resolved diagnostic, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompleteDiagnostic {
    pub severity: Severity,
    pub message: String,
    pub sub_diagnostics: Vec<SubDiagnostic>,
    pub notes: Vec<String>,
    pub error_code: GlobalErrorCode,
}

impl CompleteDiagnostic {
    pub fn new(
        severity: Severity,
        message: String,
        sub_diagnostics: Vec<SubDiagnostic>,
        notes: Vec<String>,
        error_code: GlobalErrorCode,
    ) -> Self {
        Self {
            severity,
            message,
            sub_diagnostics,
            notes,
            error_code,
        }
    }

    /// Span of the first primary label.
    ///
    /// # Panics
    /// Panics if the diagnostic has no primary label with a span; every
    /// diagnostic built by the analysis passes has one.
    pub fn primary_span(&self) -> Span {
        self.sub_diagnostics
            .iter()
            .find_map(|sub| sub.is_primary().then_some(sub.span).flatten())
            .expect("diagnostic has no primary span")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_display() {
        let code = GlobalErrorCode::new(DiagnosticPass::TraitResolution, 7);
        assert_eq!(code.to_string(), "E4007");
    }

    #[test]
    fn primary_span_skips_secondary_labels() {
        let file = FileId::from_u32(0);
        let primary = Span::from_offsets(file, 4, 9);
        let diag = CompleteDiagnostic::new(
            Severity::Error,
            "oops".into(),
            vec![
                SubDiagnostic::new(
                    LabelStyle::Secondary,
                    "here".into(),
                    Some(Span::detached(file)),
                ),
                SubDiagnostic::new(LabelStyle::Primary, "there".into(), Some(primary)),
            ],
            vec![],
            GlobalErrorCode::new(DiagnosticPass::TyLower, 1),
        );
        assert_eq!(diag.primary_span(), primary);
    }
}
