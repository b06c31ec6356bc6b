use std::cmp::Ordering;

use codespan_reporting::{
    diagnostic as cs_diag,
    files::{Files, SimpleFiles},
};
use common::{
    config::ConfigDiagnostic,
    diagnostics::{
        CompleteDiagnostic, DiagnosticPass, GlobalErrorCode, LabelStyle, Severity, Span,
    },
};

/// The source files diagnostics point into. File ids line up with
/// [`common::diagnostics::FileId`].
pub type SourceFiles = SimpleFiles<String, String>;

pub trait ToCsDiag {
    fn to_cs(&self, files: &SourceFiles) -> cs_diag::Diagnostic<usize>;
}

impl ToCsDiag for CompleteDiagnostic {
    fn to_cs(&self, files: &SourceFiles) -> cs_diag::Diagnostic<usize> {
        let severity = match self.severity {
            Severity::Error => cs_diag::Severity::Error,
            Severity::Warning => cs_diag::Severity::Warning,
            Severity::Note => cs_diag::Severity::Note,
        };

        // Labels in unregistered files are dropped.
        let labels = self
            .sub_diagnostics
            .iter()
            .filter_map(|sub_diag| {
                let span = sub_diag.span?;
                let file = span.file.as_u32() as usize;
                files.name(file).ok()?;
                let style = match sub_diag.style {
                    LabelStyle::Primary => cs_diag::LabelStyle::Primary,
                    LabelStyle::Secondary => cs_diag::LabelStyle::Secondary,
                };
                Some(cs_diag::Label::new(style, file, span.range).with_message(&sub_diag.message))
            })
            .collect();

        cs_diag::Diagnostic {
            severity,
            code: Some(self.error_code.to_string()),
            message: self.message.clone(),
            labels,
            notes: self.notes.clone(),
        }
    }
}

/// Configuration problems are reported as warnings without a location; the
/// offending value has already been replaced by its default.
pub fn config_diagnostic(diag: &ConfigDiagnostic) -> CompleteDiagnostic {
    let local_code = match diag {
        ConfigDiagnostic::InvalidCrateName(_) => 1,
        ConfigDiagnostic::InvalidRecursionLimit(_) => 2,
        ConfigDiagnostic::UnknownManglingVersion(_) => 3,
        ConfigDiagnostic::UnexpectedTomlData { .. } => 4,
    };
    CompleteDiagnostic::new(
        Severity::Warning,
        diag.to_string(),
        vec![],
        vec![],
        GlobalErrorCode::new(DiagnosticPass::Config, local_code),
    )
}

fn primary_span(diag: &CompleteDiagnostic) -> Option<Span> {
    diag.sub_diagnostics
        .iter()
        .find(|sub| sub.is_primary())
        .and_then(|sub| sub.span)
}

/// Orders diagnostics by location, then by error code. Diagnostics without a
/// location come first.
pub fn cmp_complete_diagnostics(lhs: &CompleteDiagnostic, rhs: &CompleteDiagnostic) -> Ordering {
    primary_span(lhs)
        .cmp(&primary_span(rhs))
        .then_with(|| lhs.error_code.cmp(&rhs.error_code))
}
