//! Ratatui frontend for formstep: a step-by-step terminal wizard.
//!
//! Each section of the form is one screen with its questions laid out on the
//! section's column grid. The final screen reviews the answers and submits.
//!
//! ```rust,no_run
//! use formstep::{FormFrontend, FormSession, MemoryDraftStore, RecordingSubmitter};
//! use formstep_wizard_ratatui::RatatuiFrontend;
//!
//! # fn main() -> anyhow::Result<()> {
//! let definition = example_forms::weekly_report()?;
//! let mut session =
//!     FormSession::new(definition, MemoryDraftStore::new(), RecordingSubmitter::accepting());
//! let outcome = RatatuiFrontend::new().run(&mut session)?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod backend;
pub use backend::{RatatuiError, RatatuiFrontend, Theme};
