//! Submission gate and HTTP transport.

use formstep_types::{SubmissionPayload, SubmissionReceipt, SubmitError, Submitter};

use crate::client::FormsClient;

/// Where a session stands on the way to a successful submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmitState {
    /// On a content section.
    #[default]
    Editing,
    /// On the review step, intent not yet confirmed.
    Reviewing,
    /// The user confirmed on the review step; `submit` is allowed.
    ConfirmedIntent,
    /// A request is in flight.
    Submitting,
    /// The backend accepted the form.
    Succeeded(SubmissionReceipt),
}

impl SubmitState {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::ConfirmedIntent)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        match self {
            Self::Succeeded(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Reviewing => "reviewing",
            Self::ConfirmedIntent => "confirmed",
            Self::Submitting => "submitting",
            Self::Succeeded(_) => "succeeded",
        }
    }
}

/// Submits forms to the backend's submit endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: FormsClient,
}

impl HttpSubmitter {
    pub fn new(client: FormsClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FormsClient {
        &self.client
    }
}

impl Submitter for HttpSubmitter {
    fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmitError> {
        self.client.submit(payload)
    }
}
