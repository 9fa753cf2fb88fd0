//! Peer Review without colors, submitting to a local backend.
//!
//! Run with: cargo run -p formstep-wizard-dialoguer --example plain_prompts

use formstep::{FormSession, FormsClient, HttpSubmitter, MemoryDraftStore, run};
use formstep_wizard_dialoguer::DialoguerFrontend;

fn main() -> anyhow::Result<()> {
    let client = FormsClient::new("http://localhost:8000")?;
    let mut session = FormSession::new(
        example_forms::peer_review()?,
        MemoryDraftStore::new(),
        HttpSubmitter::new(client),
    );

    let outcome = run(&DialoguerFrontend::plain(), &mut session)?;
    println!("{outcome:?}");
    Ok(())
}
