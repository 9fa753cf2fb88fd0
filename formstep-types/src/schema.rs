use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field_key::collapse_whitespace;
use crate::{DraftKey, FieldKey, SchemaError};

fn default_columns() -> u16 {
    2
}

fn default_column_span() -> u16 {
    1
}

/// The closed set of field types a form item can declare.
///
/// Deserializing an unrecognized `type` fails, so a definition never carries
/// a field that no frontend knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Single-line text (alias kept for older definitions).
    Short,
    /// Multi-line text.
    Paragraph,
    /// Pick exactly one option (radio group).
    Choice,
    /// Pick exactly one option. Despite the name this is a radio group too.
    MultipleChoice,
    /// Pick any number of options.
    Checkbox,
    /// A calendar date, `YYYY-MM-DD`.
    Date,
    /// Pick exactly one option (drop-down).
    Select,
    /// Pick one option of the form `"4 - Good"`.
    Rating,
}

impl FieldKind {
    /// Every field kind, in declaration order.
    pub const ALL: [FieldKind; 9] = [
        FieldKind::Text,
        FieldKind::Short,
        FieldKind::Paragraph,
        FieldKind::Choice,
        FieldKind::MultipleChoice,
        FieldKind::Checkbox,
        FieldKind::Date,
        FieldKind::Select,
        FieldKind::Rating,
    ];

    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Short => "short",
            Self::Paragraph => "paragraph",
            Self::Choice => "choice",
            Self::MultipleChoice => "multiple_choice",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Select => "select",
            Self::Rating => "rating",
        }
    }

    /// Whether items of this kind must declare `options`.
    pub fn needs_options(&self) -> bool {
        self.is_single_select() || self.is_multi_select()
    }

    /// Whether the value is one option out of `options`.
    pub fn is_single_select(&self) -> bool {
        matches!(
            self,
            Self::Choice | Self::MultipleChoice | Self::Select | Self::Rating
        )
    }

    /// Whether the value is a list of options.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, Self::Checkbox)
    }

    /// Whether the value is free multi-line text.
    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Paragraph)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single question in a form section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    title: String,

    #[serde(rename = "type")]
    kind: FieldKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,

    #[serde(default)]
    required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,

    #[serde(default = "default_column_span")]
    column_span: u16,
}

impl FormItem {
    /// Create a new optional item without options.
    pub fn new(title: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: None,
            title: title.into(),
            kind,
            options: Vec::new(),
            required: false,
            placeholder: None,
            column_span: default_column_span(),
        }
    }

    /// Set a stable id, used as the field key instead of the title.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the selectable options.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the item as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the placeholder text.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set how many grid columns the item spans.
    pub fn with_column_span(mut self, span: u16) -> Self {
        self.column_span = span;
        self
    }

    /// The declared id, if any. An empty id counts as absent.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// The question text.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The selectable options (empty for free-text kinds).
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Whether an answer is required to leave the section.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The declared placeholder, if any.
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// The placeholder to show, falling back to a per-kind default.
    pub fn placeholder_text(&self) -> &str {
        match (self.placeholder(), self.kind) {
            (Some(p), _) => p,
            (None, FieldKind::Date) => "YYYY-MM-DD",
            (None, FieldKind::Paragraph) => "Your detailed answer...",
            (None, _) => "Your answer...",
        }
    }

    /// How many grid columns the item spans.
    pub fn column_span(&self) -> u16 {
        self.column_span
    }

    /// The key this item's value is stored under: its id, else its title.
    pub fn key(&self) -> FieldKey {
        match self.id() {
            Some(id) => FieldKey::new(id),
            None => FieldKey::new(self.title.clone()),
        }
    }
}

/// A titled group of questions shown together as one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default = "default_columns")]
    columns: u16,

    #[serde(default, alias = "items")]
    questions: Vec<FormItem>,
}

impl Section {
    /// Create a new section with the given questions.
    pub fn new(title: impl Into<String>, questions: Vec<FormItem>) -> Self {
        Self {
            title: title.into(),
            description: None,
            columns: default_columns(),
            questions,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the number of layout columns.
    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = columns;
        self
    }

    /// The section title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The layout column count.
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// The questions, in display order.
    pub fn questions(&self) -> &[FormItem] {
        &self.questions
    }

    /// The keys of this section's questions, in display order.
    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.questions.iter().map(FormItem::key)
    }
}

/// The JSON shape accepted on input: either `sections` or a legacy flat `items` list.
#[derive(Deserialize)]
struct RawFormDefinition {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sections: Option<Vec<Section>>,
    #[serde(default)]
    items: Option<Vec<FormItem>>,
}

/// A validated, normalized form definition.
///
/// Always has at least one section, unique field keys, and options for every
/// choice-like item. Never mutated once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    sections: Vec<Section>,
}

impl FormDefinition {
    /// Build a definition from sections, validating it.
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Result<Self, SchemaError> {
        let definition = Self {
            id: None,
            title: title.into(),
            description: None,
            sections,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Build a definition from a flat item list (one implicit section).
    pub fn from_items(title: impl Into<String>, items: Vec<FormItem>) -> Result<Self, SchemaError> {
        let title = title.into();
        let section = Section::new(title.clone(), items);
        Self::new(title, vec![section])
    }

    /// Parse and validate a JSON definition.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let raw: RawFormDefinition = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse and validate an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let raw: RawFormDefinition = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawFormDefinition) -> Result<Self, SchemaError> {
        // `sections` is authoritative whenever present, even if empty.
        let sections = match (raw.sections, raw.items) {
            (Some(sections), _) => sections,
            (None, Some(items)) => vec![Section::new(raw.title.clone(), items)],
            (None, None) => Vec::new(),
        };
        let definition = Self {
            id: raw.id.filter(|id| !id.is_empty()),
            title: raw.title,
            description: raw.description,
            sections,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Set a stable identifier, used for the draft key instead of the title.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into()).filter(|id: &String| !id.is_empty());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.sections.is_empty() {
            return Err(SchemaError::NoSections {
                title: self.title.clone(),
            });
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.columns == 0 {
                return Err(SchemaError::InvalidLayout {
                    location: section.title.clone(),
                    reason: "columns must be at least 1".to_string(),
                });
            }
            for (index, item) in section.questions.iter().enumerate() {
                let key = item.key();
                if key.is_empty() {
                    return Err(SchemaError::MissingKey {
                        section: section.title.clone(),
                        index,
                    });
                }
                if item.column_span == 0 {
                    return Err(SchemaError::InvalidLayout {
                        location: key.to_string(),
                        reason: "columnSpan must be at least 1".to_string(),
                    });
                }
                if item.kind.needs_options() && item.options.is_empty() {
                    return Err(SchemaError::MissingOptions {
                        key,
                        kind: item.kind,
                    });
                }
                if !seen.insert(key.clone()) {
                    return Err(SchemaError::DuplicateKey { key });
                }
            }
        }
        Ok(())
    }

    /// The stable identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The form title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// All sections, in step order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The section at `index`, if it exists.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Number of content sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Content sections plus the review step.
    pub fn total_steps(&self) -> usize {
        self.sections.len() + 1
    }

    /// The index of the synthetic review step.
    pub fn review_step(&self) -> usize {
        self.sections.len()
    }

    /// Iterate over every item across all sections.
    pub fn items(&self) -> impl Iterator<Item = &FormItem> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    /// Look up an item by its field key.
    pub fn item(&self, key: &FieldKey) -> Option<&FormItem> {
        self.items().find(|item| &item.key() == key)
    }

    /// The index of the section containing the field `key`.
    pub fn section_of(&self, key: &FieldKey) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.questions.iter().any(|item| &item.key() == key))
    }

    /// The backend form-type identifier: the lowercased title with whitespace runs as `-`.
    pub fn form_type(&self) -> String {
        collapse_whitespace(&self.title.to_lowercase(), "-")
    }

    /// The key this form's draft is stored under.
    pub fn draft_key(&self) -> DraftKey {
        DraftKey::from_name(self.id().unwrap_or(&self.title))
    }

    /// Serialize the normalized definition as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
