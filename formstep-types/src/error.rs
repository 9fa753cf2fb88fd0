use crate::{FieldKey, FieldKind};

/// Error type for running a form through a frontend.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The form definition could not be loaded or was invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Frontend-specific failure (I/O, terminal crash, etc.)
    #[error("Frontend error: {0}")]
    Frontend(#[from] anyhow::Error),
}

impl FormError {
    /// Create a frontend error from any error type.
    pub fn frontend(err: impl Into<anyhow::Error>) -> Self {
        Self::Frontend(err.into())
    }
}

/// Error type for loading a form definition.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The JSON was malformed or used an unknown field type.
    #[error("Could not parse form definition: {0}")]
    Parse(#[from] serde_json::Error),

    /// Neither `sections` nor `items` produced a section.
    #[error("Form '{title}' has no sections")]
    NoSections { title: String },

    /// An item has neither an id nor a title to key its value by.
    #[error("Question {index} in section '{section}' has neither an id nor a title")]
    MissingKey { section: String, index: usize },

    /// Two items resolve to the same field key.
    #[error("Duplicate field key '{key}'")]
    DuplicateKey { key: FieldKey },

    /// A choice-like item declares no options.
    #[error("Field '{key}' of type {kind} needs at least one option")]
    MissingOptions { key: FieldKey, kind: FieldKind },

    /// A layout hint is out of range.
    #[error("Invalid layout for '{location}': {reason}")]
    InvalidLayout { location: String, reason: String },

    /// The definition could not be fetched or read.
    #[error("Could not load form definition from {origin}: {source}")]
    Load {
        origin: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SchemaError {
    /// Create a load error for the given origin (path, URL, slug).
    pub fn load(origin: impl Into<String>, err: impl Into<anyhow::Error>) -> Self {
        Self::Load {
            origin: origin.into(),
            source: err.into(),
        }
    }
}

/// Error type for draft storage operations.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Draft storage is turned off.
    #[error("Draft storage is disabled")]
    Disabled,

    /// Writing the draft would exceed the storage quota.
    #[error("Draft storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: u64, available: u64 },

    /// The underlying storage failed.
    #[error("Draft storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The values could not be encoded.
    #[error("Could not encode draft: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Error type for submitting a form.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never got an answer.
    #[error("Network error: {0}")]
    Network(String),
}

impl SubmitError {
    /// The generic message used when a rejection carries no usable body.
    pub const FALLBACK_MESSAGE: &'static str = "Submission failed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = SubmitError::Rejected {
            status: 400,
            message: "form_type is required".to_string(),
        };
        assert_eq!(err.to_string(), "form_type is required");

        let err = DraftError::QuotaExceeded {
            needed: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "Draft storage quota exceeded: 10 bytes needed, 4 available"
        );
    }

    #[test]
    fn load_error_keeps_origin() {
        let err = SchemaError::load("team_feedback.json", anyhow::anyhow!("not found"));
        assert_eq!(
            err.to_string(),
            "Could not load form definition from team_feedback.json: not found"
        );
    }
}
