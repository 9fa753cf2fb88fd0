//! Form definitions bundled with formstep.
//!
//! Each definition ships as a JSON document and is parsed and validated on
//! every call, so a broken document surfaces as a `SchemaError` instead of a
//! panic.

use formstep_types::{FormDefinition, SchemaError};

const WEEKLY_REPORT: &str = include_str!("../forms/weekly_report.json");
const PEER_REVIEW: &str = include_str!("../forms/peer_review.json");
const TEAM_FEEDBACK: &str = include_str!("../forms/team_feedback.json");

/// Six-section weekly status report.
pub fn weekly_report() -> Result<FormDefinition, SchemaError> {
    FormDefinition::from_json(WEEKLY_REPORT)
}

/// 360° peer review with competency ratings and written feedback.
pub fn peer_review() -> Result<FormDefinition, SchemaError> {
    FormDefinition::from_json(PEER_REVIEW)
}

/// Short team pulse. Uses every field type and explicit field ids.
pub fn team_feedback() -> Result<FormDefinition, SchemaError> {
    FormDefinition::from_json(TEAM_FEEDBACK)
}

/// All bundled definitions, in a stable order.
pub fn all() -> Result<Vec<FormDefinition>, SchemaError> {
    Ok(vec![weekly_report()?, peer_review()?, team_feedback()?])
}
