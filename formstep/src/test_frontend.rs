//! Frontend and submitter for driving sessions without a terminal or network.
//!
//! `ScriptedFrontend` replays a fixed list of user actions against a
//! session, and `RecordingSubmitter` captures what would have been sent.
//!
//! # Example
//!
//! ```rust
//! use formstep::{
//!     FieldKind, FormDefinition, FormFrontend, FormItem, FormSession, MemoryDraftStore,
//!     RecordingSubmitter, ScriptedFrontend, SessionOutcome,
//! };
//!
//! let definition = FormDefinition::from_items(
//!     "Check In",
//!     vec![FormItem::new("Name", FieldKind::Text).required()],
//! )
//! .unwrap();
//! let mut session = FormSession::new(
//!     definition,
//!     MemoryDraftStore::new(),
//!     RecordingSubmitter::accepting(),
//! );
//!
//! let outcome = ScriptedFrontend::new()
//!     .set("Name", "Ada")
//!     .next()
//!     .confirm()
//!     .submit()
//!     .run(&mut session)
//!     .unwrap();
//! assert!(matches!(outcome, SessionOutcome::Submitted(_)));
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use formstep_types::{
    FieldKey, FieldValue, SubmissionPayload, SubmissionReceipt, SubmitError, Submitter,
};

use crate::frontend::{FormFrontend, SessionOutcome};
use crate::session::{FormSession, SessionError};

/// One scripted user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Set(FieldKey, FieldValue),
    Clear(FieldKey),
    Next,
    Previous,
    JumpTo(usize),
    Confirm,
    Withdraw,
    Submit,
    Restart,
    Quit,
}

/// Error type for ScriptedFrontend.
///
/// Blocked navigation, incomplete forms and rejected submissions are normal
/// user-facing outcomes and do not end the script. Only actions a real
/// frontend could never produce are errors.
#[derive(Debug, thiserror::Error)]
pub enum ScriptedError {
    #[error("Scripted action {index} ({action:?}) failed: {source}")]
    Action {
        index: usize,
        action: Action,
        #[source]
        source: SessionError,
    },
}

/// A frontend that replays pre-configured actions.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrontend {
    actions: Vec<Action>,
}

impl ScriptedFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn set(self, key: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        self.then(Action::Set(key.into(), value.into()))
    }

    pub fn clear(self, key: impl Into<FieldKey>) -> Self {
        self.then(Action::Clear(key.into()))
    }

    pub fn next(self) -> Self {
        self.then(Action::Next)
    }

    pub fn previous(self) -> Self {
        self.then(Action::Previous)
    }

    pub fn jump_to(self, step: usize) -> Self {
        self.then(Action::JumpTo(step))
    }

    pub fn confirm(self) -> Self {
        self.then(Action::Confirm)
    }

    pub fn submit(self) -> Self {
        self.then(Action::Submit)
    }

    pub fn quit(self) -> Self {
        self.then(Action::Quit)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl FormFrontend for ScriptedFrontend {
    type Error = ScriptedError;

    fn run(&self, session: &mut FormSession) -> Result<SessionOutcome, Self::Error> {
        for (index, action) in self.actions.iter().enumerate() {
            let fail = |source| ScriptedError::Action {
                index,
                action: action.clone(),
                source,
            };
            match action {
                Action::Set(key, value) => session.set_value(key.clone(), value.clone()).map_err(fail)?,
                Action::Clear(key) => session.clear_value(key.clone()).map_err(fail)?,
                Action::Next => {
                    session.go_next();
                }
                Action::Previous => {
                    session.go_previous();
                }
                Action::JumpTo(step) => {
                    session.jump_to(*step).map_err(fail)?;
                }
                Action::Confirm => match session.confirm_intent() {
                    Ok(()) | Err(SessionError::Incomplete { .. }) => {}
                    Err(err) => return Err(fail(err)),
                },
                Action::Withdraw => session.withdraw_intent(),
                Action::Submit => match session.submit() {
                    Ok(_) | Err(SessionError::Submit(_)) | Err(SessionError::IntentNotConfirmed) => {}
                    Err(err) => return Err(fail(err)),
                },
                Action::Restart => session.restart().map_err(fail)?,
                Action::Quit => return Ok(SessionOutcome::Abandoned),
            }
        }

        Ok(match session.state().receipt() {
            Some(receipt) => SessionOutcome::Submitted(receipt.clone()),
            None => SessionOutcome::Abandoned,
        })
    }
}

/// How a `RecordingSubmitter` answers.
#[derive(Debug, Clone, PartialEq)]
enum Reply {
    Accept(SubmissionReceipt),
    Reject { status: u16, message: String },
    Unreachable(String),
}

/// A submitter that records payloads and answers with a fixed reply.
///
/// Clones share the recorded payloads.
#[derive(Debug, Clone)]
pub struct RecordingSubmitter {
    reply: Reply,
    payloads: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl RecordingSubmitter {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            payloads: Arc::default(),
        }
    }

    /// Accept every submission with an empty receipt.
    pub fn accepting() -> Self {
        Self::accepting_with(SubmissionReceipt::default())
    }

    /// Accept every submission with `receipt`.
    pub fn accepting_with(receipt: SubmissionReceipt) -> Self {
        Self::with_reply(Reply::Accept(receipt))
    }

    /// Reject every submission as the backend would.
    pub fn rejecting(status: u16, message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Reject {
            status,
            message: message.into(),
        })
    }

    /// Fail every submission with a transport error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Unreachable(message.into()))
    }

    /// Every payload submitted so far.
    pub fn payloads(&self) -> Vec<SubmissionPayload> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SubmissionPayload>> {
        self.payloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Submitter for RecordingSubmitter {
    fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmitError> {
        self.lock().push(payload.clone());
        match &self.reply {
            Reply::Accept(receipt) => Ok(receipt.clone()),
            Reply::Reject { status, message } => Err(SubmitError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            Reply::Unreachable(message) => Err(SubmitError::Network(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDraftStore;
    use formstep_types::{FieldKind, FormDefinition, FormItem};

    fn session(submitter: RecordingSubmitter) -> FormSession {
        let definition = FormDefinition::from_items(
            "Check In",
            vec![FormItem::new("Name", FieldKind::Text).required()],
        )
        .unwrap();
        FormSession::new(definition, MemoryDraftStore::new(), submitter)
    }

    #[test]
    fn quit_abandons() {
        let mut s = session(RecordingSubmitter::accepting());
        let outcome = ScriptedFrontend::new()
            .set("Name", "Ada")
            .quit()
            .set("Name", "never")
            .run(&mut s)
            .unwrap();
        assert_eq!(outcome, SessionOutcome::Abandoned);
        assert_eq!(s.value(&"Name".into()), Some(&"Ada".into()));
    }

    #[test]
    fn blocked_navigation_is_not_an_error() {
        let mut s = session(RecordingSubmitter::accepting());
        let outcome = ScriptedFrontend::new().next().run(&mut s).unwrap();
        assert_eq!(outcome, SessionOutcome::Abandoned);
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn unknown_field_fails_the_script() {
        let mut s = session(RecordingSubmitter::accepting());
        let err = ScriptedFrontend::new().set("Age", "3").run(&mut s).unwrap_err();
        assert!(matches!(err, ScriptedError::Action { index: 0, .. }));
    }

    #[test]
    fn rejected_submission_keeps_going() {
        let submitter = RecordingSubmitter::unreachable("connection refused");
        let mut s = session(submitter.clone());
        let outcome = ScriptedFrontend::new()
            .set("Name", "Ada")
            .next()
            .confirm()
            .submit()
            .run(&mut s)
            .unwrap();
        assert_eq!(outcome, SessionOutcome::Abandoned);
        assert_eq!(submitter.payloads().len(), 1);
        assert_eq!(s.last_error(), Some("Network error: connection refused"));
    }
}
