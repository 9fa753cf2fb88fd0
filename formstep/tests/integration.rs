//! Integration tests for formstep sessions

use formstep::{
    CheckboxRule, DraftKey, DraftStore, FieldError, FieldKind, FileDraftStore, FormDefinition,
    FormFrontend, FormItem, FormSession, MemoryDraftStore, Navigation, RecordingSubmitter,
    ScriptedFrontend, Section, SessionOutcome, SubmissionReceipt, SubmitState, ValidationRules,
};
use pretty_assertions::assert_eq;

fn name_and_notes() -> FormDefinition {
    FormDefinition::from_json(
        r#"{
            "title": "Check In",
            "sections": [
                { "title": "Who", "questions": [
                    { "title": "Name", "type": "text", "required": true }
                ] },
                { "title": "Anything else", "questions": [
                    { "title": "Notes", "type": "paragraph" }
                ] }
            ]
        }"#,
    )
    .unwrap()
}

fn weekly_report() -> FormDefinition {
    FormDefinition::new(
        "Weekly Report",
        vec![
            Section::new(
                "Week Overview",
                vec![
                    FormItem::new("Your Name", FieldKind::Text).with_id("name").required(),
                    FormItem::new("Week Of", FieldKind::Date).with_id("week").required(),
                    FormItem::new("Overall Status", FieldKind::MultipleChoice)
                        .with_id("status")
                        .with_options(["On Track", "Some Challenges", "Blocked"])
                        .required(),
                ],
            ),
            Section::new(
                "Focus",
                vec![
                    FormItem::new("Areas", FieldKind::Checkbox)
                        .with_id("areas")
                        .with_options(["Frontend", "Backend", "Ops"])
                        .required(),
                    FormItem::new("Energy", FieldKind::Rating)
                        .with_id("energy")
                        .with_options(["1 - Drained", "3 - Okay", "5 - Energized"]),
                ],
            ),
        ],
    )
    .unwrap()
}

#[test]
fn step_counts() {
    let def = name_and_notes();
    assert_eq!(def.total_steps(), def.section_count() + 1);
    assert_eq!(def.review_step(), 2);

    let session = FormSession::new(def, MemoryDraftStore::new(), RecordingSubmitter::accepting());
    assert_eq!(session.total_steps(), 3);
    assert_eq!(session.current_step(), 0);
}

#[test]
fn two_section_walkthrough() {
    let submitter = RecordingSubmitter::accepting();
    let store = MemoryDraftStore::new();
    let mut session = FormSession::new(name_and_notes(), store.clone(), submitter.clone());

    // Empty required name blocks.
    assert_eq!(session.go_next(), Navigation::Blocked { errors: 1 });
    assert_eq!(
        session.error(&"Name".into()).map(ToString::to_string).as_deref(),
        Some("This field is required")
    );

    session.set_value("Name", "Ada").unwrap();
    assert!(session.go_next().moved());

    // The optional paragraph never blocks.
    assert!(session.go_next().moved());
    assert!(session.is_review());

    let review = session.review();
    assert_eq!(review.len(), 1);
    assert_eq!(review[0].title, "Who");

    session.confirm_intent().unwrap();
    session.submit().unwrap();

    let payloads = submitter.payloads();
    assert_eq!(
        serde_json::to_value(&payloads[0]).unwrap(),
        serde_json::json!({
            "form_type": "check-in",
            "form_title": "Check In",
            "submission_data": { "Name": "Ada" }
        })
    );
    assert!(!store.contains(&DraftKey::from_name("Check In")));
}

#[test]
fn jump_to_any_step_from_review() {
    let mut session = FormSession::new(
        name_and_notes(),
        MemoryDraftStore::new(),
        RecordingSubmitter::accepting(),
    );
    for k in 0..=2 {
        session.jump_to(k).unwrap();
        assert_eq!(session.current_step(), k);
    }
    assert!(session.jump_to(3).is_err());
    assert_eq!(session.current_step(), 2);
}

#[test]
fn weekly_report_identifiers() {
    let def = weekly_report();
    assert_eq!(def.form_type(), "weekly-report");
    assert_eq!(def.draft_key().as_str(), "form_draft_Weekly_Report");
}

#[test]
fn weekly_report_uses_ids_as_keys() {
    let submitter = RecordingSubmitter::accepting();
    let mut session = FormSession::new(weekly_report(), MemoryDraftStore::new(), submitter.clone());

    let outcome = ScriptedFrontend::new()
        .set("name", "Ada")
        .set("week", "2024-03-04")
        .set("status", "On Track")
        .next()
        .set("areas", vec!["Backend"])
        .set("energy", "5 - Energized")
        .next()
        .confirm()
        .submit()
        .run(&mut session)
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Submitted(_)));
    let data = &submitter.payloads()[0].submission_data;
    assert_eq!(data.get_text(&"week".into()).unwrap(), "2024-03-04");
    assert_eq!(data.get_list(&"areas".into()).unwrap(), ["Backend".to_string()]);
}

#[test]
fn invalid_date_blocks() {
    let mut session = FormSession::new(
        weekly_report(),
        MemoryDraftStore::new(),
        RecordingSubmitter::accepting(),
    );
    session.set_value("name", "Ada").unwrap();
    session.set_value("week", "03/04/2024").unwrap();
    session.set_value("status", "On Track").unwrap();
    assert_eq!(session.go_next(), Navigation::Blocked { errors: 1 });
    assert!(session.error(&"week".into()).is_some());
}

#[test]
fn optional_date_blocks_only_when_malformed() {
    let def = FormDefinition::from_items(
        "Leave Request",
        vec![FormItem::new("Return Date", FieldKind::Date)],
    )
    .unwrap();
    let mut session = FormSession::new(def, MemoryDraftStore::new(), RecordingSubmitter::accepting());

    session.set_value("Return Date", "next tuesday").unwrap();
    assert_eq!(session.go_next(), Navigation::Blocked { errors: 1 });
    assert_eq!(
        session.error(&"Return Date".into()).map(ToString::to_string),
        Some(FieldError::InvalidDate { value: "next tuesday".into() }.to_string())
    );

    session.clear_value("Return Date").unwrap();
    assert!(session.go_next().moved());
}

#[test]
fn checkbox_rule_is_configurable() {
    let answer_first_section = |session: &mut FormSession| {
        session.set_value("name", "Ada").unwrap();
        session.set_value("week", "2024-03-04").unwrap();
        session.set_value("status", "Blocked").unwrap();
        assert!(session.go_next().moved());
    };

    let mut lenient = FormSession::new(
        weekly_report(),
        MemoryDraftStore::new(),
        RecordingSubmitter::accepting(),
    );
    answer_first_section(&mut lenient);
    assert!(lenient.go_next().moved());

    let mut strict = FormSession::new(
        weekly_report(),
        MemoryDraftStore::new(),
        RecordingSubmitter::accepting(),
    )
    .with_rules(ValidationRules::with_checkbox(CheckboxRule::AtLeastOne));
    answer_first_section(&mut strict);
    assert_eq!(strict.go_next(), Navigation::Blocked { errors: 1 });
}

#[test]
fn draft_survives_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDraftStore::new(dir.path());

    let mut first = FormSession::new(weekly_report(), store.clone(), RecordingSubmitter::accepting());
    first.set_value("name", "Ada").unwrap();
    first.set_value("areas", vec!["Ops", "Frontend"]).unwrap();
    let saved = first.values().clone();
    drop(first);

    let second = FormSession::new(weekly_report(), store, RecordingSubmitter::accepting());
    assert_eq!(second.values(), &saved);
    assert_eq!(second.current_step(), 0);
}

#[test]
fn malformed_draft_starts_blank() {
    let store = MemoryDraftStore::new();
    store.insert(&DraftKey::from_name("Weekly Report"), "[1, 2");
    let session = FormSession::new(weekly_report(), store, RecordingSubmitter::accepting());
    assert!(session.values().is_empty());
}

#[test]
fn abandoning_keeps_the_draft() {
    let store = MemoryDraftStore::new();
    let mut session = FormSession::new(name_and_notes(), store.clone(), RecordingSubmitter::accepting());
    let outcome = ScriptedFrontend::new()
        .set("Name", "Ada")
        .quit()
        .run(&mut session)
        .unwrap();
    assert_eq!(outcome, SessionOutcome::Abandoned);
    assert_eq!(
        store.load(&DraftKey::from_name("Check In")).unwrap().as_deref(),
        Some(r#"{"Name":"Ada"}"#)
    );
}

#[test]
fn draft_removed_after_submit() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDraftStore::new(dir.path());
    let receipt = SubmissionReceipt {
        id: Some(12),
        message: Some("Form submitted successfully".into()),
        submitted_at: None,
    };
    let mut session = FormSession::new(
        name_and_notes(),
        store.clone(),
        RecordingSubmitter::accepting_with(receipt.clone()),
    );

    let outcome = ScriptedFrontend::new()
        .set("Name", "Ada")
        .jump_to(2)
        .confirm()
        .submit()
        .run(&mut session)
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Submitted(receipt));
    assert_eq!(store.load(&DraftKey::from_name("Check In")).unwrap(), None);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn failed_submit_needs_new_confirmation() {
    let submitter = RecordingSubmitter::rejecting(500, "Submission failed");
    let mut session = FormSession::new(name_and_notes(), MemoryDraftStore::new(), submitter.clone());
    ScriptedFrontend::new()
        .set("Name", "Ada")
        .jump_to(2)
        .confirm()
        .submit()
        .submit()
        .run(&mut session)
        .unwrap();

    // The second submit was refused locally.
    assert_eq!(submitter.payloads().len(), 1);
    assert_eq!(*session.state(), SubmitState::Reviewing);
    assert_eq!(session.last_error(), Some("Submission failed"));
}
