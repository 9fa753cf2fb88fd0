//! Core types for the formstep crate.
//!
//! This crate provides the foundational types for defining multi-step forms:
//! - `FormDefinition`, `Section` and `FormItem` - The declarative form schema
//! - `FieldKind` - The closed set of field types
//! - `FormValues`, `FieldKey` and `FieldValue` - Entered data and its keys
//! - `DraftStore` and `Submitter` traits - For plugging in persistence and transport

mod field_key;
pub use field_key::{DraftKey, FieldKey};

mod field_value;
pub use field_value::FieldValue;

mod form_values;
pub use form_values::{FormValues, ValueError};

mod schema;
pub use schema::{FieldKind, FormDefinition, FormItem, Section};

mod submission;
pub use submission::{SubmissionPayload, SubmissionReceipt};

mod error;
pub use error::{DraftError, FormError, SchemaError, SubmitError};

mod traits;
pub use traits::{DraftStore, Submitter};
