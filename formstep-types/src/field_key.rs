use std::fmt;

use serde::{Deserialize, Serialize};

/// The key a field's value is stored under in `FormValues`.
///
/// A key is the item's `id` when it has one, otherwise its `title`.
/// Keys are unique within a `FormDefinition`; loading rejects duplicates.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey {
    key: String,
}

impl FieldKey {
    /// Create a new key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Check if the key is empty.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl From<&str> for FieldKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for FieldKey {
    fn from(s: &String) -> Self {
        Self::new(s.clone())
    }
}

/// The storage key a form's draft is persisted under.
///
/// Always of the form `form_draft_<name>`, where `<name>` is the form's `id`
/// (or its title when no id is set) with every whitespace run replaced by `_`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DraftKey {
    key: String,
}

impl DraftKey {
    /// The prefix shared by every draft key.
    pub const PREFIX: &'static str = "form_draft_";

    /// Derive a draft key from a form name.
    pub fn from_name(name: &str) -> Self {
        Self {
            key: format!("{}{}", Self::PREFIX, collapse_whitespace(name, "_")),
        }
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Replace every run of whitespace in `s` with a single `separator`.
///
/// Leading and trailing runs are replaced too, not trimmed.
pub(crate) fn collapse_whitespace(s: &str, separator: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push_str(separator);
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
