//! Blocking client for the forms REST API.

use std::time::Duration;

use formstep_types::{
    FormDefinition, SchemaError, SubmissionPayload, SubmissionReceipt, SubmitError,
};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Base URL used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Request timeout used when nothing is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SUBMIT_PATH: &str = "/api/forms/submit/";
const SUBMISSIONS_PATH: &str = "/api/forms/submissions/";
const DEFINITIONS_PATH: &str = "/api/forms/definitions/";
const HEALTH_PATH: &str = "/api/forms/health/";

/// Error type for the forms client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A fetched form definition was invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A stored form definition as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub definition: serde_json::Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_true() -> bool {
    true
}

impl DefinitionRecord {
    /// Parse the embedded definition.
    ///
    /// The record's own title and description fill in when the embedded JSON
    /// omits them.
    pub fn to_definition(&self) -> Result<FormDefinition, SchemaError> {
        let mut value = self.definition.clone();
        if let Some(object) = value.as_object_mut() {
            object
                .entry("title")
                .or_insert_with(|| self.title.clone().into());
            if let Some(description) = &self.description {
                object
                    .entry("description")
                    .or_insert_with(|| description.clone().into());
            }
            object
                .entry("id")
                .or_insert_with(|| self.slug.clone().into());
        }
        FormDefinition::from_value(value)
    }
}

/// A past submission as listed by the backend.
///
/// `submission_data` is kept as raw JSON: other clients post booleans,
/// numbers and nested objects that `FormValues` does not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub form_type: String,
    #[serde(default)]
    pub form_title: String,
    /// Username of the submitter, if the backend knew one.
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub submission_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

/// The health endpoint's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Decode a list endpoint's answer: a bare array or a paginated page.
///
/// Item decode errors are reported as-is rather than as a shape mismatch.
fn listing<T: DeserializeOwned>(value: serde_json::Value) -> Result<Vec<T>, serde_json::Error> {
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value),
        serde_json::Value::Object(mut page) => match page.remove("results") {
            Some(results) => serde_json::from_value(results),
            None => Err(serde::de::Error::missing_field("results")),
        },
        other => Err(serde::de::Error::invalid_type(
            serde::de::Unexpected::Other(json_kind(&other)),
            &"a list or a page with `results`",
        )),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Client for the forms endpoints of one backend.
#[derive(Debug, Clone)]
pub struct FormsClient {
    http: Client,
    base_url: String,
}

impl FormsClient {
    /// Create a client for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client for `base_url` with a request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("formstep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a path or absolute URL against the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Submit a completed form.
    ///
    /// Rejections carry the backend's `error` or `message`, or a generic
    /// message when the body has neither.
    pub fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmitError> {
        let url = self.url(SUBMIT_PATH);
        tracing::info!(form_type = %payload.form_type, %url, "submitting form");

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .map_err(|err| SubmitError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| SubmitError::Network(err.to_string()))?;

        if !status.is_success() {
            let message = rejection_message(&body);
            tracing::warn!(status = status.as_u16(), %message, "submission rejected");
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        // The form is accepted at this point; an odd body only costs the receipt.
        let receipt = serde_json::from_str(&body).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not parse submission receipt");
            SubmissionReceipt::default()
        });
        tracing::info!(?receipt, "submission accepted");
        Ok(receipt)
    }

    /// Fetch the stored definition record for `slug`.
    pub fn definition_record(&self, slug: &str) -> Result<DefinitionRecord, ClientError> {
        let url = self.url(&format!("{DEFINITIONS_PATH}{slug}/"));
        self.get_json(&url)
    }

    /// Fetch and parse the form definition stored under `slug`.
    pub fn definition(&self, slug: &str) -> Result<FormDefinition, ClientError> {
        Ok(self.definition_record(slug)?.to_definition()?)
    }

    /// Fetch a raw definition document, e.g. `/team_feedback.json`.
    pub fn definition_at(&self, path_or_url: &str) -> Result<FormDefinition, ClientError> {
        let value: serde_json::Value = self.get_json(&self.url(path_or_url))?;
        Ok(FormDefinition::from_value(value)?)
    }

    /// List past submissions, optionally only those of one form type.
    pub fn submissions(&self, form_type: Option<&str>) -> Result<Vec<SubmissionRecord>, ClientError> {
        let mut request = self.http.get(self.url(SUBMISSIONS_PATH));
        if let Some(form_type) = form_type {
            request = request.query(&[("form_type", form_type)]);
        }
        let body: serde_json::Value = decode(request.send()?)?;
        Ok(listing(body)?)
    }

    /// Ask the backend whether it is up.
    pub fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get_json(&self.url(HEALTH_PATH))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        tracing::debug!(%url, "GET");
        decode(self.http.get(url).send()?)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: rejection_message(&body),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Pull a human-readable message out of an error body.
///
/// Prefers a non-empty `error`, then `message`; anything else yields the
/// generic fallback.
pub fn rejection_message(body: &str) -> String {
    let Ok(serde_json::Value::Object(object)) = serde_json::from_str(body) else {
        return SubmitError::FALLBACK_MESSAGE.to_string();
    };
    ["error", "message"]
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(|value| match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Null | serde_json::Value::Bool(false) => None,
            serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| SubmitError::FALLBACK_MESSAGE.to_string())
}
