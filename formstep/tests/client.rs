//! Forms client tests against a mock backend

use formstep::{
    ClientError, FieldKind, FormDefinition, FormItem, FormSession, FormsClient, HttpSubmitter,
    MemoryDraftStore, SchemaError, SchemaSource, SessionError, SubmissionPayload, SubmitError,
    Submitter,
};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

fn payload() -> SubmissionPayload {
    let def = FormDefinition::from_items(
        "Weekly Report",
        vec![FormItem::new("Your Name", FieldKind::Text)],
    )
    .unwrap();
    let mut values = formstep::FormValues::new();
    values.insert("Your Name", "Ada");
    SubmissionPayload::new(&def, &values)
}

#[test]
fn submit_posts_payload_and_reads_receipt() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/forms/submit/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "form_type": "weekly-report",
            "form_title": "Weekly Report",
            "submission_data": { "Your Name": "Ada" }
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7,"message":"Form submitted successfully","submitted_at":"2024-03-04T10:00:00Z"}"#)
        .create();

    let client = FormsClient::new(server.url()).unwrap();
    let receipt = HttpSubmitter::new(client).submit(&payload()).unwrap();

    mock.assert();
    assert_eq!(receipt.id, Some(7));
    assert_eq!(receipt.message.as_deref(), Some("Form submitted successfully"));
}

#[test]
fn odd_success_body_still_succeeds() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/forms/submit/")
        .with_status(200)
        .with_body("OK")
        .create();

    let receipt = FormsClient::new(server.url()).unwrap().submit(&payload()).unwrap();
    assert_eq!(receipt, Default::default());
}

#[test]
fn rejection_uses_error_field() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/forms/submit/")
        .with_status(400)
        .with_body(r#"{"error":"form_type is required"}"#)
        .create();

    let err = FormsClient::new(server.url()).unwrap().submit(&payload()).unwrap_err();
    match err {
        SubmitError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "form_type is required");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn rejection_without_message_falls_back() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/forms/submit/")
        .with_status(500)
        .with_body("<h1>Server Error</h1>")
        .create();

    let err = FormsClient::new(server.url()).unwrap().submit(&payload()).unwrap_err();
    assert_eq!(err.to_string(), "Submission failed");
}

#[test]
fn unreachable_backend_is_a_network_error() {
    let client = FormsClient::new("http://127.0.0.1:9").unwrap();
    assert!(matches!(client.submit(&payload()), Err(SubmitError::Network(_))));
}

#[test]
fn session_surfaces_backend_message() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/forms/submit/")
        .with_status(400)
        .with_body(r#"{"message":"Duplicate submission"}"#)
        .create();

    let def = FormDefinition::from_items("Poll", vec![FormItem::new("Q", FieldKind::Text)]).unwrap();
    let submitter = HttpSubmitter::new(FormsClient::new(server.url()).unwrap());
    let mut session = FormSession::new(def, MemoryDraftStore::new(), submitter);
    session.jump_to(1).unwrap();
    session.confirm_intent().unwrap();

    assert!(matches!(session.submit(), Err(SessionError::Submit(_))));
    assert_eq!(session.last_error(), Some("Duplicate submission"));
}

#[test]
fn fetches_definition_by_slug() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/definitions/team-feedback/")
        .with_status(200)
        .with_body(
            json!({
                "id": 1,
                "title": "Team Feedback",
                "slug": "team-feedback",
                "description": "Quarterly pulse",
                "definition": {
                    "title": "Team Feedback",
                    "sections": [ { "title": "Pulse", "questions": [
                        { "title": "Mood", "type": "rating", "options": ["1 - Low", "5 - High"] }
                    ] } ]
                },
                "is_active": true,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z"
            })
            .to_string(),
        )
        .create();

    let client = FormsClient::new(server.url()).unwrap();
    let def = SchemaSource::Remote("team-feedback".into())
        .load(&client, &[])
        .unwrap();
    assert_eq!(def.title(), "Team Feedback");
    assert_eq!(def.description(), Some("Quarterly pulse"));
    assert_eq!(def.draft_key().as_str(), "form_draft_team-feedback");
}

#[test]
fn missing_definition_is_a_load_error() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/definitions/nope/")
        .with_status(404)
        .with_body(r#"{"detail":"Not found."}"#)
        .create();

    let client = FormsClient::new(server.url()).unwrap();
    let err = SchemaSource::Remote("nope".into()).load(&client, &[]).unwrap_err();
    assert!(matches!(err, SchemaError::Load { .. }));
}

#[test]
fn fetches_definition_document_by_path() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/team_feedback.json")
        .with_status(200)
        .with_body(r#"{"title":"Team Update","items":[{"title":"Wins","type":"paragraph"}]}"#)
        .create();

    let client = FormsClient::new(server.url()).unwrap();
    let def = SchemaSource::Url("/team_feedback.json".into())
        .load(&client, &[])
        .unwrap();
    assert_eq!(def.sections()[0].title(), "Team Update");
}

#[test]
fn invalid_remote_definition_is_a_schema_error() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/bad.json")
        .with_status(200)
        .with_body(r#"{"title":"Bad","items":[{"title":"X","type":"slider"}]}"#)
        .create();

    let client = FormsClient::new(server.url()).unwrap();
    let err = SchemaSource::Url("/bad.json".into()).load(&client, &[]).unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}

#[test]
fn lists_submissions_with_filter() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/forms/submissions/")
        .match_query(Matcher::UrlEncoded("form_type".into(), "weekly-report".into()))
        .with_status(200)
        .with_body(
            json!([{
                "id": 3,
                "form_type": "weekly-report",
                "form_title": "Weekly Report",
                "submitted_by": null,
                "submission_data": { "Your Name": "Ada", "Areas": ["Ops"] },
                "submitted_at": "2024-03-04T10:00:00Z",
                "ip_address": "127.0.0.1"
            }])
            .to_string(),
        )
        .create();

    let client = FormsClient::new(server.url()).unwrap();
    let records = client.submissions(Some("weekly-report")).unwrap();
    mock.assert();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 3);
    assert_eq!(records[0].submission_data.len(), 2);
}

#[test]
fn lists_submissions_from_other_clients() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/submissions/")
        .with_status(200)
        .with_body(
            json!([{
                "id": 1,
                "form_type": "daily-status",
                "form_title": "Daily Status",
                "submitted_by": "alice",
                "submission_data": { "Blockers": false, "Hours": 8, "Notes": "ok" },
                "submitted_at": "2024-03-05T09:00:00Z",
                "ip_address": "10.0.0.4"
            }])
            .to_string(),
        )
        .create();

    let records = FormsClient::new(server.url()).unwrap().submissions(None).unwrap();
    assert_eq!(records[0].submitted_by.as_deref(), Some("alice"));
    assert_eq!(records[0].submission_data["Blockers"], json!(false));
    assert_eq!(records[0].submission_data["Hours"], json!(8));
}

#[test]
fn malformed_listing_names_the_bad_field() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/submissions/")
        .with_status(200)
        .with_body(r#"[{"id":"seven","form_type":"poll"}]"#)
        .create();

    let err = FormsClient::new(server.url()).unwrap().submissions(None).unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert!(err.to_string().contains("invalid type"), "{err}");
}

#[test]
fn lists_paginated_submissions() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/submissions/")
        .with_status(200)
        .with_body(r#"{"count":1,"next":null,"previous":null,"results":[{"id":1,"form_type":"poll"}]}"#)
        .create();

    let records = FormsClient::new(server.url()).unwrap().submissions(None).unwrap();
    assert_eq!(records[0].form_type, "poll");
}

#[test]
fn health_check() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/health/")
        .with_status(200)
        .with_body(r#"{"status":"ok","message":"Django backend is running"}"#)
        .create();

    let health = FormsClient::new(server.url()).unwrap().health().unwrap();
    assert!(health.is_ok());
}

#[test]
fn health_check_failure() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/forms/health/")
        .with_status(503)
        .with_body(r#"{"error":"database unavailable"}"#)
        .create();

    let err = FormsClient::new(server.url()).unwrap().health().unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}
