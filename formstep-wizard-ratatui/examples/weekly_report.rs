//! Weekly Report in the ratatui wizard, with drafts kept in memory.
//!
//! Run with: cargo run -p formstep-wizard-ratatui --example weekly_report

use formstep::{FormSession, MemoryDraftStore, RecordingSubmitter, SessionOutcome, run};
use formstep_wizard_ratatui::RatatuiFrontend;

fn main() -> anyhow::Result<()> {
    let submitter = RecordingSubmitter::accepting();
    let mut session = FormSession::new(
        example_forms::weekly_report()?,
        MemoryDraftStore::new(),
        submitter.clone(),
    );

    match run(&RatatuiFrontend::new(), &mut session)? {
        SessionOutcome::Submitted(_) => {
            for payload in submitter.payloads() {
                println!("{}", payload.submission_data.to_json()?);
            }
        }
        SessionOutcome::Abandoned => println!("Form abandoned."),
    }

    Ok(())
}

