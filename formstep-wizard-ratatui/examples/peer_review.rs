//! 360° Peer Review in the ratatui wizard, posting to a local backend.
//!
//! Run with: cargo run -p formstep-wizard-ratatui --example peer_review
//! Drafts are written to ./drafts.

use formstep::{FileDraftStore, FormFrontend, FormSession, FormsClient, HttpSubmitter};
use formstep_wizard_ratatui::RatatuiFrontend;

fn main() -> anyhow::Result<()> {
    let client = FormsClient::new("http://localhost:8000")?;
    let mut session = FormSession::new(
        example_forms::peer_review()?,
        FileDraftStore::new("drafts"),
        HttpSubmitter::new(client),
    );

    let outcome = RatatuiFrontend::new()
        .with_title("360° Peer Review")
        .run(&mut session)?;
    println!("{outcome:?}");

    Ok(())
}
