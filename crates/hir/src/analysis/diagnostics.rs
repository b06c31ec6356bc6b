//! Conversion of analysis diagnostics into renderable
//! [`CompleteDiagnostic`]s.

use common::diagnostics::{CompleteDiagnostic, GlobalErrorCode};

/// A diagnostic produced by an analysis pass. Vouchers are cheap to store and
/// compare; the message text is only built by [`to_complete`].
///
/// [`to_complete`]: DiagnosticVoucher::to_complete
pub trait DiagnosticVoucher {
    fn error_code(&self) -> GlobalErrorCode;

    fn to_complete(&self) -> CompleteDiagnostic;
}

impl DiagnosticVoucher for CompleteDiagnostic {
    fn error_code(&self) -> GlobalErrorCode {
        self.error_code
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        self.clone()
    }
}

impl<T> DiagnosticVoucher for Box<T>
where
    T: DiagnosticVoucher + ?Sized,
{
    fn error_code(&self) -> GlobalErrorCode {
        (**self).error_code()
    }

    fn to_complete(&self) -> CompleteDiagnostic {
        (**self).to_complete()
    }
}
