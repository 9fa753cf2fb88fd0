//! Subcommand implementations.

use anyhow::{Context, Result, bail};
use formstep::{
    DraftStore, FileDraftStore, FormDefinition, FormError, FormSession, FormsClient,
    HttpSubmitter, MemoryDraftStore, SchemaSource, SessionOutcome, SubmissionReceipt,
    SubmissionRecord, run,
};
use formstep_wizard_dialoguer::{DialoguerError, DialoguerFrontend};
use formstep_wizard_ratatui::{RatatuiError, RatatuiFrontend};
use std::fmt::Write as _;

use crate::cli::{Commands, ConfigCommand, DraftsCommand, SourceArgs};
use crate::config::{CONFIG_FILE, Config, FrontendKind, PROJECT_DIR};

pub fn execute(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Fill {
            source,
            no_drafts,
            plain,
        } => fill(config, &source, no_drafts, plain),
        Commands::Validate { file } => validate(&SchemaSource::File(file)),
        Commands::Forms => forms(),
        Commands::Drafts { command } => drafts(config, command),
        Commands::Submissions { form_type, json } => submissions(config, form_type.as_deref(), json),
        Commands::Health => health(config),
        Commands::Config { command } => config_command(config, command),
    }
}

fn client(config: &Config) -> Result<FormsClient> {
    FormsClient::with_timeout(&config.api_base_url, config.request_timeout())
        .context("Failed to create HTTP client")
}

fn draft_store(config: &Config) -> FileDraftStore {
    let store = FileDraftStore::new(&config.draft_dir);
    match config.draft_quota_bytes {
        Some(quota) => store.with_quota(quota),
        None => store,
    }
}

fn load_definition(client: &FormsClient, source: &SourceArgs) -> Result<FormDefinition> {
    let source = source.to_source()?;
    let bundled = example_forms::all().context("Bundled forms are invalid")?;
    source
        .load(client, &bundled)
        .with_context(|| format!("Failed to load form from {source}"))
}

fn fill(config: &Config, source: &SourceArgs, no_drafts: bool, plain: bool) -> Result<()> {
    let client = client(config)?;
    let definition = load_definition(&client, source)?;
    tracing::info!(
        form = definition.title(),
        frontend = ?config.frontend,
        drafts = !no_drafts,
        "filling form"
    );

    let submitter = HttpSubmitter::new(client);
    let session = if no_drafts {
        FormSession::new(definition, MemoryDraftStore::new(), submitter)
    } else {
        FormSession::new(definition, draft_store(config), submitter)
    };
    let mut session = session.with_rules(config.validation_rules());

    let outcome = match frontend_for(config.frontend, plain) {
        FrontendKind::Ratatui => run(&RatatuiFrontend::new(), &mut session),
        FrontendKind::Dialoguer if plain => run(&DialoguerFrontend::plain(), &mut session),
        FrontendKind::Dialoguer => run(&DialoguerFrontend::new(), &mut session),
    };

    match outcome {
        Ok(SessionOutcome::Submitted(receipt)) => println!("{}", receipt_line(&receipt)),
        Ok(SessionOutcome::Abandoned) => {
            if no_drafts {
                println!("Form abandoned.");
            } else {
                println!("Draft saved. Run the same command to continue.");
            }
        }
        Err(FormError::Frontend(err)) if is_cancelled(&err) => println!("Cancelled."),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// `--plain` only exists for the prompt frontend, so it selects it.
fn frontend_for(configured: FrontendKind, plain: bool) -> FrontendKind {
    if plain { FrontendKind::Dialoguer } else { configured }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<RatatuiError>(), Some(RatatuiError::Cancelled))
        || matches!(err.downcast_ref::<DialoguerError>(), Some(DialoguerError::Cancelled))
}

fn receipt_line(receipt: &SubmissionReceipt) -> String {
    let message = receipt
        .message
        .as_deref()
        .unwrap_or("Form submitted successfully");
    match receipt.id {
        Some(id) => format!("{message} (#{id})"),
        None => message.to_string(),
    }
}

fn validate(source: &SchemaSource) -> Result<()> {
    let client = FormsClient::new(formstep::client::DEFAULT_BASE_URL)?;
    let definition = source.load(&client, &[])?;
    print!("{}", describe(&definition));
    Ok(())
}

/// Human-readable summary of a definition.
fn describe(definition: &FormDefinition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", definition.title());
    let _ = writeln!(out, "  form type: {}", definition.form_type());
    let _ = writeln!(out, "  draft key: {}", definition.draft_key());
    let _ = writeln!(
        out,
        "  steps: {} ({} sections + review)",
        definition.total_steps(),
        definition.section_count()
    );
    for (i, section) in definition.sections().iter().enumerate() {
        let required = section.questions().iter().filter(|q| q.is_required()).count();
        let _ = writeln!(
            out,
            "  {}. {} ({} questions, {} required)",
            i + 1,
            section.title(),
            section.questions().len(),
            required
        );
    }
    out
}

fn forms() -> Result<()> {
    for definition in example_forms::all()? {
        println!("{:<28} {}", definition.form_type(), definition.title());
    }
    Ok(())
}

fn drafts(config: &Config, command: DraftsCommand) -> Result<()> {
    let store = draft_store(config);
    match command {
        DraftsCommand::List => {
            let files = store.list()?;
            if files.is_empty() {
                println!("No drafts in {}", store.dir().display());
            }
            for file in files {
                println!("{}", file.display());
            }
        }
        DraftsCommand::Show { source } => {
            let definition = load_definition(&client(config)?, &source)?;
            match store.load(&definition.draft_key())? {
                Some(raw) => println!("{}", pretty_draft(&raw)),
                None => println!("No draft for {}", definition.title()),
            }
        }
        DraftsCommand::Clear { source } => {
            let definition = load_definition(&client(config)?, &source)?;
            store.remove(&definition.draft_key())?;
            tracing::info!(form = definition.title(), "draft cleared");
            println!("Draft for {} cleared.", definition.title());
        }
    }
    Ok(())
}

/// Pretty-print a stored draft, or return it unchanged when it is not JSON.
fn pretty_draft(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| raw.to_string())
}

fn submissions(config: &Config, form_type: Option<&str>, json: bool) -> Result<()> {
    let records = client(config)?.submissions(form_type)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No submissions.");
    }
    for record in &records {
        println!("{}", submission_line(record));
    }
    Ok(())
}

fn submission_line(record: &SubmissionRecord) -> String {
    format!(
        "#{:<5} {:<20} {} ({} answers)",
        record.id,
        record.submitted_at.as_deref().unwrap_or("-"),
        if record.form_title.is_empty() {
            &record.form_type
        } else {
            &record.form_title
        },
        record.submission_data.len()
    )
}

fn health(config: &Config) -> Result<()> {
    let status = client(config)?
        .health()
        .with_context(|| format!("Backend at {} is not healthy", config.api_base_url))?;
    println!("{}: {}", status.status, status.message);
    if !status.is_ok() {
        bail!("Backend reported status '{}'", status.status);
    }
    Ok(())
}

fn config_command(config: &Config, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => print!("{}", config.to_toml()?),
        ConfigCommand::Init { project, force } => {
            let path = if project {
                std::env::current_dir()?.join(PROJECT_DIR).join(CONFIG_FILE)
            } else {
                Config::user_config_path().context("No user config directory on this system")?
            };
            Config::default().write_to(&path, force)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn describes_weekly_report() {
        let text = describe(&example_forms::weekly_report().unwrap());
        let lines: Vec<_> = text.lines().take(5).collect();
        assert_eq!(
            lines,
            [
                "Weekly Report",
                "  form type: weekly-report",
                "  draft key: form_draft_Weekly_Report",
                "  steps: 7 (6 sections + review)",
                "  1. Week Overview (4 questions, 4 required)",
            ]
        );
    }

    #[test]
    fn receipt_lines() {
        let receipt = SubmissionReceipt {
            id: Some(7),
            message: Some("Form submitted successfully".into()),
            submitted_at: None,
        };
        assert_eq!(receipt_line(&receipt), "Form submitted successfully (#7)");
        assert_eq!(
            receipt_line(&SubmissionReceipt::default()),
            "Form submitted successfully"
        );
    }

    #[test]
    fn plain_selects_the_prompt_frontend() {
        assert_eq!(frontend_for(FrontendKind::Ratatui, true), FrontendKind::Dialoguer);
        assert_eq!(frontend_for(FrontendKind::Dialoguer, true), FrontendKind::Dialoguer);
        assert_eq!(frontend_for(FrontendKind::Ratatui, false), FrontendKind::Ratatui);
        assert_eq!(frontend_for(FrontendKind::Dialoguer, false), FrontendKind::Dialoguer);
    }

    #[test]
    fn cancellation_is_recognised() {
        assert!(is_cancelled(&RatatuiError::Cancelled.into()));
        assert!(is_cancelled(&DialoguerError::Cancelled.into()));
        assert!(!is_cancelled(&anyhow::anyhow!("boom")));
    }

    #[test]
    fn drafts_are_pretty_printed() {
        assert_eq!(pretty_draft(r#"{"a":"b"}"#), "{\n  \"a\": \"b\"\n}");
        assert_eq!(pretty_draft("[1, 2"), "[1, 2");
    }

    #[test]
    fn submission_line_falls_back_to_form_type() {
        let mut values = serde_json::Map::new();
        values.insert("Q".into(), serde_json::json!(true));
        let record = SubmissionRecord {
            id: 3,
            form_type: "poll".into(),
            form_title: String::new(),
            submitted_by: None,
            submission_data: values,
            submitted_at: Some("2024-03-04T10:00:00Z".into()),
        };
        assert_eq!(
            submission_line(&record),
            "#3     2024-03-04T10:00:00Z poll (1 answers)"
        );
    }

    #[test]
    fn quota_is_applied_to_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            draft_dir: dir.path().to_path_buf(),
            draft_quota_bytes: Some(8),
            ..Config::default()
        };
        let store = draft_store(&config);
        let key = formstep::DraftKey::from_name("Poll");
        assert!(store.save(&key, "{\"Q\":\"a long answer\"}").is_err());
        store.save(&key, "{}").unwrap();
        assert_eq!(store.load(&key).unwrap().as_deref(), Some("{}"));
    }
}
