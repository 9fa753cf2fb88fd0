use crate::{DraftError, DraftKey, SubmissionPayload, SubmissionReceipt, SubmitError};

/// Durable key-value storage for form drafts.
///
/// Stores raw serialized drafts. Implementations overwrite on `save`, so
/// repeated saves under the same key are idempotent.
pub trait DraftStore {
    /// Load the draft stored under `key`, if there is one.
    fn load(&self, key: &DraftKey) -> Result<Option<String>, DraftError>;

    /// Store `contents` under `key`, replacing any previous draft.
    fn save(&self, key: &DraftKey, contents: &str) -> Result<(), DraftError>;

    /// Delete the draft stored under `key`. Deleting a missing draft is not an error.
    fn remove(&self, key: &DraftKey) -> Result<(), DraftError>;
}

impl<T: DraftStore + ?Sized> DraftStore for Box<T> {
    fn load(&self, key: &DraftKey) -> Result<Option<String>, DraftError> {
        (**self).load(key)
    }

    fn save(&self, key: &DraftKey, contents: &str) -> Result<(), DraftError> {
        (**self).save(key, contents)
    }

    fn remove(&self, key: &DraftKey) -> Result<(), DraftError> {
        (**self).remove(key)
    }
}

/// Transport that delivers a finished form to the backend.
pub trait Submitter {
    /// Deliver `payload`, returning the backend's acknowledgement.
    ///
    /// There is no retry: a failure is reported once and the caller decides.
    fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmitError>;
}

impl<T: Submitter + ?Sized> Submitter for Box<T> {
    fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmitError> {
        (**self).submit(payload)
    }
}
