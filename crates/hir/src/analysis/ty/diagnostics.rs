use common::diagnostics::{
    CompleteDiagnostic, DiagnosticPass, GlobalErrorCode, LabelStyle, Severity, Span, SubDiagnostic,
};
use smol_str::SmolStr;

use super::{trait_def::ObjectSafetyViolation, trait_lower::TraitArgError};
use crate::analysis::diagnostics::DiagnosticVoucher;

/// Every diagnostic the type and trait analyses can report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyDiag {
    PathRes(PathResDiag),
    TyLower(TyLowerDiag),
    TraitLower(TraitLowerDiag),
    Impl(ImplDiag),
}

impl From<PathResDiag> for TyDiag {
    fn from(diag: PathResDiag) -> Self {
        Self::PathRes(diag)
    }
}

impl From<TyLowerDiag> for TyDiag {
    fn from(diag: TyLowerDiag) -> Self {
        Self::TyLower(diag)
    }
}

impl From<TraitLowerDiag> for TyDiag {
    fn from(diag: TraitLowerDiag) -> Self {
        Self::TraitLower(diag)
    }
}

impl From<ImplDiag> for TyDiag {
    fn from(diag: ImplDiag) -> Self {
        Self::Impl(diag)
    }
}

impl DiagnosticVoucher for TyDiag {
    fn error_code(&self) -> GlobalErrorCode {
        match self {
            Self::PathRes(diag) => diag.error_code(),
            Self::TyLower(diag) => diag.error_code(),
            Self::TraitLower(diag) => diag.error_code(),
            Self::Impl(diag) => diag.error_code(),
        }
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        match self {
            Self::PathRes(diag) => diag.to_complete(),
            Self::TyLower(diag) => diag.to_complete(),
            Self::TraitLower(diag) => diag.to_complete(),
            Self::Impl(diag) => diag.to_complete(),
        }
    }
}

fn primary(message: impl Into<String>, span: Span) -> SubDiagnostic {
    SubDiagnostic::new(LabelStyle::Primary, message.into(), Some(span))
}

fn secondary(message: impl Into<String>, span: Span) -> SubDiagnostic {
    SubDiagnostic::new(LabelStyle::Secondary, message.into(), Some(span))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathResDiag {
    NotFound {
        span: Span,
        path: String,
    },
    Ambiguous {
        span: Span,
        path: String,
        candidates: Vec<String>,
    },
    ExpectedTrait {
        span: Span,
        path: String,
        found: &'static str,
    },
    /// A trait used where a type is expected.
    ExpectedType {
        span: Span,
        path: String,
    },
}

impl PathResDiag {
    fn local_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 1,
            Self::Ambiguous { .. } => 2,
            Self::ExpectedTrait { .. } => 3,
            Self::ExpectedType { .. } => 4,
        }
    }
}

impl DiagnosticVoucher for PathResDiag {
    fn error_code(&self) -> GlobalErrorCode {
        GlobalErrorCode::new(DiagnosticPass::NameResolution, self.local_code())
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        let (message, subs, notes) = match self {
            Self::NotFound { span, path } => (
                format!("`{path}` is not found"),
                vec![primary(format!("`{path}` is not found"), *span)],
                vec![],
            ),
            Self::Ambiguous {
                span,
                path,
                candidates,
            } => (
                format!("`{path}` is ambiguous"),
                vec![primary(format!("`{path}` is ambiguous"), *span)],
                candidates
                    .iter()
                    .map(|candidate| format!("candidate: `{candidate}`"))
                    .collect(),
            ),
            Self::ExpectedTrait { span, path, found } => (
                format!("expected trait, found {found} `{path}`"),
                vec![primary(format!("`{path}` is a {found}"), *span)],
                vec![],
            ),
            Self::ExpectedType { span, path } => (
                format!("expected type, found trait `{path}`"),
                vec![primary(format!("`{path}` is a trait"), *span)],
                vec![format!("use `dyn {path}` for a trait object")],
            ),
        };
        CompleteDiagnostic::new(Severity::Error, message, subs, notes, self.error_code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyLowerDiag {
    AdtArgNumMismatch {
        span: Span,
        adt: SmolStr,
        expected: usize,
        given: usize,
    },
    /// `P::Name` where no bound of `P` declares `Name`.
    UnknownAssocType {
        span: Span,
        param: SmolStr,
        name: SmolStr,
    },
    NotObjectSafe {
        span: Span,
        trait_name: SmolStr,
        violations: Vec<ObjectSafetyViolation>,
        super_traits: Vec<SmolStr>,
    },
}

impl TyLowerDiag {
    fn local_code(&self) -> u16 {
        match self {
            Self::AdtArgNumMismatch { .. } => 1,
            Self::UnknownAssocType { .. } => 2,
            Self::NotObjectSafe { .. } => 3,
        }
    }
}

impl DiagnosticVoucher for TyLowerDiag {
    fn error_code(&self) -> GlobalErrorCode {
        GlobalErrorCode::new(DiagnosticPass::TyLower, self.local_code())
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        let (message, subs, notes) = match self {
            Self::AdtArgNumMismatch {
                span,
                adt,
                expected,
                given,
            } => (
                format!("wrong number of generic arguments for `{adt}`"),
                vec![primary(
                    format!("expected {expected} arguments, but {given} given"),
                    *span,
                )],
                vec![],
            ),
            Self::UnknownAssocType { span, param, name } => (
                format!("associated type `{name}` not found for `{param}`"),
                vec![primary(
                    format!("no bound of `{param}` declares `{name}`"),
                    *span,
                )],
                vec![],
            ),
            Self::NotObjectSafe {
                span,
                trait_name,
                violations,
                super_traits,
            } => {
                let mut subs = vec![primary(
                    format!("`{trait_name}` cannot be made into an object"),
                    *span,
                )];
                subs.extend(
                    violations
                        .iter()
                        .map(|violation| secondary(violation.to_string(), violation.span())),
                );
                let notes = super_traits
                    .iter()
                    .map(|super_trait| {
                        format!("super-trait `{super_trait}` is not object safe")
                    })
                    .collect();
                (
                    format!("the trait `{trait_name}` is not object safe"),
                    subs,
                    notes,
                )
            }
        };
        CompleteDiagnostic::new(Severity::Error, message, subs, notes, self.error_code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraitLowerDiag {
    /// `trait A: B {}` together with `trait B: A {}`. `cycle` starts and ends
    /// with the same trait.
    CyclicSuperTraits {
        span: Span,
        cycle: Vec<SmolStr>,
    },
    RecursionLimitReached {
        span: Span,
        trait_name: SmolStr,
        limit: usize,
    },
    DuplicateTraitItem {
        trait_name: SmolStr,
        name: SmolStr,
        first: Span,
        duplicate: Span,
    },
    TraitArgNumMismatch {
        span: Span,
        trait_name: SmolStr,
        expected: usize,
        given: usize,
    },
    TraitArgKindMismatch {
        span: Span,
        trait_name: SmolStr,
        lifetime: SmolStr,
    },
    UnknownTraitItem {
        span: Span,
        trait_name: SmolStr,
        name: SmolStr,
    },
    UnknownAssocBinding {
        span: Span,
        trait_name: SmolStr,
        name: SmolStr,
    },
}

impl TraitLowerDiag {
    pub fn from_arg_error(err: TraitArgError, span: Span, trait_name: SmolStr) -> Self {
        match err {
            TraitArgError::ArgNumMismatch { expected, given } => Self::TraitArgNumMismatch {
                span,
                trait_name,
                expected,
                given,
            },
            TraitArgError::ArgKindMisMatch { lifetime } => Self::TraitArgKindMismatch {
                span,
                trait_name,
                lifetime,
            },
        }
    }

    fn local_code(&self) -> u16 {
        match self {
            Self::CyclicSuperTraits { .. } => 1,
            Self::RecursionLimitReached { .. } => 2,
            Self::DuplicateTraitItem { .. } => 3,
            Self::TraitArgNumMismatch { .. } => 4,
            Self::TraitArgKindMismatch { .. } => 5,
            Self::UnknownTraitItem { .. } => 6,
            Self::UnknownAssocBinding { .. } => 7,
        }
    }
}

impl DiagnosticVoucher for TraitLowerDiag {
    fn error_code(&self) -> GlobalErrorCode {
        GlobalErrorCode::new(DiagnosticPass::TraitResolution, self.local_code())
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        let (message, subs, notes) = match self {
            Self::CyclicSuperTraits { span, cycle } => (
                "cyclic super-trait relation".to_string(),
                vec![primary("super-trait cycle detected here", *span)],
                vec![format!(
                    "cycle: {}",
                    cycle
                        .iter()
                        .map(|name| format!("`{name}`"))
                        .collect::<Vec<_>>()
                        .join(" -> ")
                )],
            ),
            Self::RecursionLimitReached {
                span,
                trait_name,
                limit,
            } => (
                format!("recursion limit reached while resolving `{trait_name}`"),
                vec![primary(
                    format!("more than {limit} nested trait resolutions"),
                    *span,
                )],
                vec!["consider raising `analysis.recursion-limit`".to_string()],
            ),
            Self::DuplicateTraitItem {
                trait_name,
                name,
                first,
                duplicate,
            } => (
                format!("`{name}` is defined multiple times in trait `{trait_name}`"),
                vec![
                    primary(format!("`{name}` redefined here"), *duplicate),
                    secondary(format!("first definition of `{name}`"), *first),
                ],
                vec![],
            ),
            Self::TraitArgNumMismatch {
                span,
                trait_name,
                expected,
                given,
            } => (
                format!("wrong number of generic arguments for trait `{trait_name}`"),
                vec![primary(
                    format!("expected {expected} arguments, but {given} given"),
                    *span,
                )],
                vec![],
            ),
            Self::TraitArgKindMismatch {
                span,
                trait_name,
                lifetime,
            } => (
                format!("lifetime argument `'{lifetime}` must precede type arguments"),
                vec![primary(
                    format!("misplaced lifetime argument for `{trait_name}`"),
                    *span,
                )],
                vec![],
            ),
            Self::UnknownTraitItem {
                span,
                trait_name,
                name,
            } => (
                format!("no item named `{name}` in trait `{trait_name}`"),
                vec![primary(format!("`{name}` is not a member"), *span)],
                vec![],
            ),
            Self::UnknownAssocBinding {
                span,
                trait_name,
                name,
            } => (
                format!("associated type `{name}` not found in trait `{trait_name}`"),
                vec![primary(format!("unknown binding `{name}`"), *span)],
                vec![],
            ),
        };
        CompleteDiagnostic::new(Severity::Error, message, subs, notes, self.error_code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImplDiag {
    MissingTraitItems {
        span: Span,
        trait_name: SmolStr,
        missing: Vec<SmolStr>,
    },
    NotATraitMember {
        span: Span,
        trait_name: SmolStr,
        name: SmolStr,
    },
}

impl ImplDiag {
    fn local_code(&self) -> u16 {
        match self {
            Self::MissingTraitItems { .. } => 1,
            Self::NotATraitMember { .. } => 2,
        }
    }
}

impl DiagnosticVoucher for ImplDiag {
    fn error_code(&self) -> GlobalErrorCode {
        GlobalErrorCode::new(DiagnosticPass::TraitSatisfaction, self.local_code())
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        let (message, subs) = match self {
            Self::MissingTraitItems {
                span,
                trait_name,
                missing,
            } => {
                let missing = missing
                    .iter()
                    .map(|name| format!("`{name}`"))
                    .collect::<Vec<_>>()
                    .join(", ");
                (
                    format!("not all trait items implemented, missing: {missing}"),
                    vec![primary(
                        format!("missing {missing} in implementation of `{trait_name}`"),
                        *span,
                    )],
                )
            }
            Self::NotATraitMember {
                span,
                trait_name,
                name,
            } => (
                format!("`{name}` is not a member of trait `{trait_name}`"),
                vec![primary(format!("not a member of `{trait_name}`"), *span)],
            ),
        };
        CompleteDiagnostic::new(Severity::Error, message, subs, vec![], self.error_code())
    }
}
