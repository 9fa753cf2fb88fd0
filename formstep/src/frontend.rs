use formstep_types::{FormError, SubmissionReceipt};

use crate::session::FormSession;

/// How a frontend run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The form was submitted and accepted.
    Submitted(SubmissionReceipt),
    /// The user left before submitting. The draft is kept.
    Abandoned,
}

impl SessionOutcome {
    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        match self {
            Self::Submitted(receipt) => Some(receipt),
            Self::Abandoned => None,
        }
    }
}

/// Trait for frontends that drive a user through a form session.
///
/// Frontends render the current step, forward edits and navigation to the
/// session, and decide when the user is done.
pub trait FormFrontend {
    /// The error type for this frontend.
    type Error: Into<anyhow::Error>;

    /// Drive `session` until the form is submitted or abandoned.
    ///
    /// # Returns
    /// * `Ok(Submitted)` after a successful submission
    /// * `Ok(Abandoned)` when the user quits; the draft stays in place
    /// * `Err` on a frontend failure (terminal, I/O)
    ///
    /// Validation and submission failures are shown to the user and never
    /// end the run on their own.
    fn run(&self, session: &mut FormSession) -> Result<SessionOutcome, Self::Error>;
}

/// Run `session` through `frontend`, converting its error.
pub fn run<F: FormFrontend>(
    frontend: &F,
    session: &mut FormSession,
) -> Result<SessionOutcome, FormError> {
    frontend.run(session).map_err(FormError::frontend)
}
