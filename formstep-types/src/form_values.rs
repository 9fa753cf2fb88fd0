use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FieldKey, FieldValue};

/// Error type for value access operations.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("Missing value for field: {0}")]
    MissingKey(FieldKey),

    #[error("Type mismatch at field '{key}': expected {expected}, got {actual}")]
    TypeMismatch {
        key: FieldKey,
        expected: &'static str,
        actual: &'static str,
    },
}

/// The values entered into a form, keyed by field key.
///
/// This is the mutable heart of a session. It serializes as a flat JSON
/// object, which is both the draft format and the `submission_data` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues {
    values: BTreeMap<FieldKey, FieldValue>,
}

impl FormValues {
    /// Create a new empty value map.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Insert a value for the given key, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<FieldKey>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Get the value for the given key.
    pub fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Check if a value exists for the given key.
    pub fn contains(&self, key: &FieldKey) -> bool {
        self.values.contains_key(key)
    }

    /// Remove the value for the given key.
    pub fn remove(&mut self, key: &FieldKey) -> Option<FieldValue> {
        self.values.remove(key)
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Keep only the values whose key satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&FieldKey) -> bool) {
        self.values.retain(|key, _| keep(key));
    }

    /// Iterate over all key-value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.values.iter()
    }

    /// Get the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if the field at `key` holds a non-empty answer.
    pub fn has_value(&self, key: &FieldKey) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Get a text value for the given key.
    pub fn get_text(&self, key: &FieldKey) -> Result<&str, ValueError> {
        match self.get(key) {
            Some(FieldValue::Text(s)) => Ok(s),
            Some(other) => Err(ValueError::TypeMismatch {
                key: key.clone(),
                expected: "Text",
                actual: other.type_name(),
            }),
            None => Err(ValueError::MissingKey(key.clone())),
        }
    }

    /// Get a list value for the given key.
    pub fn get_list(&self, key: &FieldKey) -> Result<&[String], ValueError> {
        match self.get(key) {
            Some(FieldValue::List(items)) => Ok(items),
            Some(other) => Err(ValueError::TypeMismatch {
                key: key.clone(),
                expected: "List",
                actual: other.type_name(),
            }),
            None => Err(ValueError::MissingKey(key.clone())),
        }
    }

    /// Serialize to the JSON object used for drafts and submissions.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON object of strings and string arrays.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl IntoIterator for FormValues {
    type Item = (FieldKey, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<FieldKey, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a FieldKey, &'a FieldValue);
    type IntoIter = std::collections::btree_map::Iter<'a, FieldKey, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<K: Into<FieldKey>, V: Into<FieldValue>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
