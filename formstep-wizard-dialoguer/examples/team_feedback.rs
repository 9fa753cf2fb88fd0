//! Team Feedback with dialoguer prompts. Drafts persist in a temp directory
//! for the lifetime of the run.
//!
//! Run with: cargo run -p formstep-wizard-dialoguer --example team_feedback

use formstep::{FileDraftStore, FormSession, RecordingSubmitter, SessionOutcome, run};
use formstep_wizard_dialoguer::DialoguerFrontend;

fn main() -> anyhow::Result<()> {
    let drafts = tempfile::tempdir()?;
    let submitter = RecordingSubmitter::accepting();
    let mut session = FormSession::new(
        example_forms::team_feedback()?,
        FileDraftStore::new(drafts.path()),
        submitter.clone(),
    );

    match run(&DialoguerFrontend::new(), &mut session)? {
        SessionOutcome::Submitted(receipt) => {
            println!("{receipt:?}");
            for payload in submitter.payloads() {
                println!("{}", payload.submission_data.to_json()?);
            }
        }
        SessionOutcome::Abandoned => println!("Form abandoned."),
    }

    Ok(())
}
