//! # formstep-wizard-dialoguer
//!
//! Dialoguer frontend for formstep.
//!
//! Questions are asked one at a time, section by section, in a classic
//! CLI wizard style. After each section the user can continue, go back, or
//! save the draft and quit. The last step reviews the answers and submits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use formstep::{FormSession, MemoryDraftStore, RecordingSubmitter, run};
//! use formstep_wizard_dialoguer::DialoguerFrontend;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut session = FormSession::new(
//!         example_forms::team_feedback()?,
//!         MemoryDraftStore::new(),
//!         RecordingSubmitter::accepting(),
//!     );
//!     let outcome = run(&DialoguerFrontend::new(), &mut session)?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

mod backend;

pub use backend::{DialoguerError, DialoguerFrontend};
