//! # formstep
//!
//! Multi-step dynamic forms, driven by declarative JSON definitions.
//! Frontend-agnostic.
//!
//! A `FormDefinition` lists sections of questions. A `FormSession` walks a
//! user through them one section per step, blocks forward navigation on
//! invalid answers, saves a draft after every edit, and ends on a review
//! step from which the form is submitted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use formstep::{FileDraftStore, FormDefinition, FormSession, FormsClient, HttpSubmitter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let definition = FormDefinition::from_json(&std::fs::read_to_string("weekly.json")?)?;
//! let client = FormsClient::new("http://localhost:8000")?;
//! let mut session = FormSession::new(
//!     definition,
//!     FileDraftStore::new("drafts"),
//!     HttpSubmitter::new(client),
//! );
//!
//! session.set_value("Your Name", "Ada")?;
//! session.go_next();
//! # Ok(())
//! # }
//! ```
//!
//! ## Field types
//!
//! `text`, `short`, `paragraph`, `date`, `choice`, `multiple_choice`,
//! `select`, `rating` hold a single string; `checkbox` holds a list.
//! See [`field`] for the validation each one applies.
//!
//! ## Frontends
//!
//! Frontends are separate crates that implement `FormFrontend`:
//! - `formstep-wizard-ratatui` - step-by-step TUI wizard
//! - `formstep-wizard-dialoguer` - CLI prompts via dialoguer

pub use formstep_types::*;

pub mod client;
pub use client::{ClientError, FormsClient, HealthStatus, SubmissionRecord};

pub mod draft;
pub use draft::{Drafts, FileDraftStore, MemoryDraftStore};

pub mod field;
pub use field::{CheckboxRule, FieldError, FieldErrors, RatingOption, ValidationRules};

mod frontend;
pub use frontend::{FormFrontend, SessionOutcome, run};

mod session;
pub use session::{FormSession, Navigation, ReviewEntry, ReviewSection, SessionError};

mod source;
pub use source::{SchemaSource, find_bundled};

mod step;
pub use step::{StepController, StepError};

mod submit;
pub use submit::{HttpSubmitter, SubmitState};

// Scripted frontend for testing forms without user interaction
mod test_frontend;
pub use test_frontend::{Action, RecordingSubmitter, ScriptedError, ScriptedFrontend};
