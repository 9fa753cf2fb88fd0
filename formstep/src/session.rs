//! A single pass through a form: navigation, values, drafts and submission.

use formstep_types::{
    DraftStore, FieldKey, FieldKind, FieldValue, FormDefinition, FormItem, FormValues, Section,
    SubmissionPayload, SubmissionReceipt, SubmitError, Submitter,
};

use crate::draft::Drafts;
use crate::field::{FieldError, FieldErrors, ValidationRules, validate_section};
use crate::step::{StepController, StepError};
use crate::submit::SubmitState;

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error("Unknown field '{0}'")]
    UnknownField(FieldKey),

    #[error("Section {section} ('{title}') has invalid answers")]
    Incomplete { section: usize, title: String },

    #[error("Submission intent has not been confirmed")]
    IntentNotConfirmed,

    #[error("Intent can only be confirmed on the review step")]
    NotReviewing,

    #[error("The form has already been submitted")]
    AlreadySubmitted,

    #[error("The form has not been submitted yet")]
    NotSubmitted,

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// The result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The step changed; frontends reset their scroll position.
    Moved { from: usize, to: usize },
    /// Already at the boundary.
    Stayed,
    /// The current section has `errors` invalid fields.
    Blocked { errors: usize },
}

impl Navigation {
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// One answered field on the review page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub key: FieldKey,
    pub title: String,
    pub kind: FieldKind,
    pub value: String,
}

/// One section of the review page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    /// Step index to jump to for editing.
    pub index: usize,
    pub title: String,
    pub entries: Vec<ReviewEntry>,
}

/// State of one user filling in one form.
pub struct FormSession {
    definition: FormDefinition,
    steps: StepController,
    values: FormValues,
    errors: FieldErrors,
    state: SubmitState,
    last_error: Option<String>,
    draft_warning: Option<String>,
    drafts: Drafts,
    submitter: Box<dyn Submitter>,
    rules: ValidationRules,
}

impl FormSession {
    /// Start a session, restoring any saved draft from `store`.
    pub fn new(
        definition: FormDefinition,
        store: impl DraftStore + 'static,
        submitter: impl Submitter + 'static,
    ) -> Self {
        let drafts = Drafts::new(store, &definition);
        let values = drafts.restore(&definition);
        tracing::info!(
            form = definition.title(),
            sections = definition.section_count(),
            restored = values.len(),
            "starting form session"
        );
        Self {
            steps: StepController::new(definition.section_count()),
            definition,
            values,
            errors: FieldErrors::new(),
            state: SubmitState::Editing,
            last_error: None,
            draft_warning: None,
            drafts,
            submitter: Box::new(submitter),
            rules: ValidationRules::default(),
        }
    }

    /// Use different validation rules.
    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn current_step(&self) -> usize {
        self.steps.current()
    }

    pub fn total_steps(&self) -> usize {
        self.steps.total_steps()
    }

    pub fn is_review(&self) -> bool {
        self.steps.is_review()
    }

    pub fn is_first_step(&self) -> bool {
        self.steps.is_first()
    }

    /// Completion ratio in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.steps.progress()
    }

    /// The section being edited, or `None` on the review step.
    pub fn current_section(&self) -> Option<&Section> {
        self.steps
            .section_index()
            .and_then(|i| self.definition.section(i))
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Current per-field validation errors.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, key: &FieldKey) -> Option<&FieldError> {
        self.errors.get(key)
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    /// Message of the last failed submission, cleared on the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Why the last draft save failed, if it did. Never blocks editing.
    pub fn draft_warning(&self) -> Option<&str> {
        self.draft_warning.as_deref()
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, SubmitState::Succeeded(_))
    }

    /// Set the value of a field and save the draft.
    ///
    /// Clears that field's validation error. Editing after confirming intent
    /// withdraws the intent.
    pub fn set_value(
        &mut self,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> Result<(), SessionError> {
        let key = self.known_key(key.into())?;
        self.values.insert(key.clone(), value.into());
        self.after_edit(&key);
        Ok(())
    }

    /// Remove the value of a field and save the draft.
    pub fn clear_value(&mut self, key: impl Into<FieldKey>) -> Result<(), SessionError> {
        let key = self.known_key(key.into())?;
        self.values.remove(&key);
        self.after_edit(&key);
        Ok(())
    }

    fn known_key(&self, key: FieldKey) -> Result<FieldKey, SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.definition.item(&key).is_none() {
            return Err(SessionError::UnknownField(key));
        }
        Ok(key)
    }

    fn after_edit(&mut self, key: &FieldKey) {
        self.errors.remove(key);
        if self.state.is_confirmed() {
            self.state = SubmitState::Reviewing;
        }
        self.save_draft();
    }

    fn save_draft(&mut self) {
        match self.drafts.save(&self.values) {
            Ok(()) => self.draft_warning = None,
            Err(err) => {
                tracing::warn!(draft = %self.drafts.key(), error = %err, "could not save draft");
                self.draft_warning = Some(err.to_string());
            }
        }
    }

    /// Validate the current section and advance if it is valid.
    ///
    /// On the review step this never blocks and stays put.
    pub fn go_next(&mut self) -> Navigation {
        let Some(index) = self.steps.section_index() else {
            return Navigation::Stayed;
        };
        let Some(section) = self.definition.section(index) else {
            return Navigation::Stayed;
        };

        let failures = validate_section(section, &self.values, &self.rules);
        for key in section.keys() {
            self.errors.remove(&key);
        }
        if !failures.is_empty() {
            let count = failures.len();
            tracing::debug!(section = index, errors = count, "navigation blocked");
            self.errors.extend(failures);
            return Navigation::Blocked { errors: count };
        }

        let from = self.steps.current();
        self.steps.advance();
        self.sync_state();
        Navigation::Moved {
            from,
            to: self.steps.current(),
        }
    }

    /// Go back one step without validating.
    pub fn go_previous(&mut self) -> Navigation {
        let from = self.steps.current();
        if !self.steps.retreat() {
            return Navigation::Stayed;
        }
        self.sync_state();
        Navigation::Moved {
            from,
            to: self.steps.current(),
        }
    }

    /// Jump to any step without validating, e.g. from the review page.
    pub fn jump_to(&mut self, step: usize) -> Result<Navigation, SessionError> {
        let from = self.steps.current();
        self.steps.jump_to(step)?;
        self.sync_state();
        if from == step {
            Ok(Navigation::Stayed)
        } else {
            Ok(Navigation::Moved { from, to: step })
        }
    }

    fn sync_state(&mut self) {
        match (&self.state, self.steps.is_review()) {
            (SubmitState::Succeeded(_) | SubmitState::Submitting, _) => {}
            (SubmitState::Editing, true) => self.state = SubmitState::Reviewing,
            (SubmitState::Reviewing | SubmitState::ConfirmedIntent, false) => {
                self.state = SubmitState::Editing
            }
            _ => {}
        }
    }

    /// Confirm that the user means to submit.
    ///
    /// Only allowed on the review step. Every section is validated first; the
    /// first invalid section is reported and all errors are recorded.
    pub fn confirm_intent(&mut self) -> Result<(), SessionError> {
        match self.state {
            SubmitState::ConfirmedIntent => return Ok(()),
            SubmitState::Reviewing => {}
            SubmitState::Succeeded(_) => return Err(SessionError::AlreadySubmitted),
            _ => return Err(SessionError::NotReviewing),
        }

        self.errors.clear();
        let mut first_invalid = None;
        for (index, section) in self.definition.sections().iter().enumerate() {
            let failures = validate_section(section, &self.values, &self.rules);
            if !failures.is_empty() && first_invalid.is_none() {
                first_invalid = Some((index, section.title().to_string()));
            }
            self.errors.extend(failures);
        }

        if let Some((section, title)) = first_invalid {
            tracing::debug!(section, "cannot confirm intent, form incomplete");
            return Err(SessionError::Incomplete { section, title });
        }
        self.state = SubmitState::ConfirmedIntent;
        Ok(())
    }

    /// Take back a confirmed intent.
    pub fn withdraw_intent(&mut self) {
        if self.state.is_confirmed() {
            self.state = SubmitState::Reviewing;
        }
    }

    /// Submit the form. Requires confirmed intent.
    ///
    /// On success the draft is deleted and the values cleared. On failure the
    /// session returns to reviewing with `last_error` set, and intent has to be
    /// confirmed again. There is no automatic retry.
    pub fn submit(&mut self) -> Result<SubmissionReceipt, SessionError> {
        if !self.state.is_confirmed() {
            return Err(SessionError::IntentNotConfirmed);
        }
        self.state = SubmitState::Submitting;
        self.last_error = None;

        let payload = SubmissionPayload::new(&self.definition, &self.values);
        match self.submitter.submit(&payload) {
            Ok(receipt) => {
                if let Err(err) = self.drafts.discard() {
                    tracing::warn!(draft = %self.drafts.key(), error = %err, "could not remove draft");
                }
                self.values.clear();
                self.errors.clear();
                self.draft_warning = None;
                self.state = SubmitState::Succeeded(receipt.clone());
                tracing::info!(form_type = %payload.form_type, id = ?receipt.id, "form submitted");
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(form_type = %payload.form_type, error = %err, "submission failed");
                self.last_error = Some(err.to_string());
                self.state = SubmitState::Reviewing;
                Err(err.into())
            }
        }
    }

    /// Start over after a successful submission.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if !self.is_submitted() {
            return Err(SessionError::NotSubmitted);
        }
        self.steps.reset();
        self.values.clear();
        self.errors.clear();
        self.last_error = None;
        self.state = SubmitState::Editing;
        Ok(())
    }

    /// The answered fields, grouped by section.
    ///
    /// Sections without any answer are left out.
    pub fn review(&self) -> Vec<ReviewSection> {
        self.definition
            .sections()
            .iter()
            .enumerate()
            .filter_map(|(index, section)| {
                let entries: Vec<_> = section
                    .questions()
                    .iter()
                    .filter_map(|item| self.review_entry(item))
                    .collect();
                (!entries.is_empty()).then(|| ReviewSection {
                    index,
                    title: section.title().to_string(),
                    entries,
                })
            })
            .collect()
    }

    fn review_entry(&self, item: &FormItem) -> Option<ReviewEntry> {
        let key = item.key();
        let value = self.values.get(&key).filter(|v| !v.is_empty())?;
        Some(ReviewEntry {
            title: item.title().to_string(),
            kind: item.kind(),
            value: value.display(),
            key,
        })
    }
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("form", &self.definition.title())
            .field("step", &self.steps.current())
            .field("state", &self.state)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
