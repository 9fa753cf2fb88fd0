//! Field registry: one validation strategy per field kind.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use formstep_types::{FieldKey, FieldKind, FieldValue, FormItem, FormValues, Section};
use serde::{Deserialize, Serialize};

/// The message shown under an empty required field.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Whether a required checkbox group must have a selection.
///
/// Checkbox groups historically never blocked navigation even when marked
/// required. `Never` keeps that behaviour; `AtLeastOne` enforces a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxRule {
    #[default]
    Never,
    AtLeastOne,
}

/// Rules that tune validation beyond what the schema declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRules {
    pub checkbox: CheckboxRule,
}

impl ValidationRules {
    /// Rules with the given checkbox rule.
    pub fn with_checkbox(checkbox: CheckboxRule) -> Self {
        Self { checkbox }
    }
}

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,

    #[error("'{value}' is not one of the available options")]
    UnknownOption { value: String },

    #[error("'{value}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("Expected a {expected} value, got {actual}")]
    WrongShape {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Per-field validation failures, keyed by field key.
pub type FieldErrors = BTreeMap<FieldKey, FieldError>;

/// The shape of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Text,
    List,
}

impl ValueShape {
    /// The empty value of this shape.
    pub fn blank(&self) -> FieldValue {
        match self {
            Self::Text => FieldValue::Text(String::new()),
            Self::List => FieldValue::List(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::List => "List",
        }
    }
}

/// Validation strategy for one family of field kinds.
pub trait FieldStrategy: Sync {
    /// The value shape this strategy expects.
    fn shape(&self) -> ValueShape;

    /// Check `value` (absent when never entered) against `item`.
    fn validate(
        &self,
        item: &FormItem,
        value: Option<&FieldValue>,
        rules: &ValidationRules,
    ) -> Result<(), FieldError>;
}

/// Single-line and multi-line free text.
pub struct TextField;

/// ISO calendar dates.
pub struct DateField;

/// One option out of `options` (choice, multiple_choice, select).
pub struct ChoiceField;

/// Zero or more options out of `options`.
pub struct CheckboxField;

/// One full rating option such as `"4 - Good"`.
pub struct RatingField;

/// Resolve the strategy for a field kind.
pub fn strategy_for(kind: FieldKind) -> &'static dyn FieldStrategy {
    match kind {
        FieldKind::Text | FieldKind::Short | FieldKind::Paragraph => &TextField,
        FieldKind::Date => &DateField,
        FieldKind::Choice | FieldKind::MultipleChoice | FieldKind::Select => &ChoiceField,
        FieldKind::Checkbox => &CheckboxField,
        FieldKind::Rating => &RatingField,
    }
}

/// Validate one item against its current value.
pub fn validate_item(
    item: &FormItem,
    value: Option<&FieldValue>,
    rules: &ValidationRules,
) -> Result<(), FieldError> {
    strategy_for(item.kind()).validate(item, value, rules)
}

/// Validate every item of `section`, collecting all failures.
pub fn validate_section(
    section: &Section,
    values: &FormValues,
    rules: &ValidationRules,
) -> FieldErrors {
    section
        .questions()
        .iter()
        .filter_map(|item| {
            let key = item.key();
            validate_item(item, values.get(&key), rules)
                .err()
                .map(|err| (key, err))
        })
        .collect()
}

/// Common text handling: `Ok(None)` for an acceptable empty answer.
fn non_empty_text<'v>(
    item: &FormItem,
    value: Option<&'v FieldValue>,
) -> Result<Option<&'v str>, FieldError> {
    match value {
        Some(FieldValue::Text(s)) if !s.trim().is_empty() => Ok(Some(s)),
        Some(FieldValue::List(_)) => Err(FieldError::WrongShape {
            expected: ValueShape::Text.name(),
            actual: "List",
        }),
        _ if item.is_required() => Err(FieldError::Required),
        _ => Ok(None),
    }
}

fn ensure_option(item: &FormItem, value: &str) -> Result<(), FieldError> {
    if item.options().iter().any(|o| o == value) {
        Ok(())
    } else {
        Err(FieldError::UnknownOption {
            value: value.to_string(),
        })
    }
}

impl FieldStrategy for TextField {
    fn shape(&self) -> ValueShape {
        ValueShape::Text
    }

    fn validate(
        &self,
        item: &FormItem,
        value: Option<&FieldValue>,
        _rules: &ValidationRules,
    ) -> Result<(), FieldError> {
        non_empty_text(item, value).map(|_| ())
    }
}

impl FieldStrategy for DateField {
    fn shape(&self) -> ValueShape {
        ValueShape::Text
    }

    fn validate(
        &self,
        item: &FormItem,
        value: Option<&FieldValue>,
        _rules: &ValidationRules,
    ) -> Result<(), FieldError> {
        let Some(text) = non_empty_text(item, value)? else {
            return Ok(());
        };
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| FieldError::InvalidDate {
                value: text.to_string(),
            })
    }
}

impl FieldStrategy for ChoiceField {
    fn shape(&self) -> ValueShape {
        ValueShape::Text
    }

    fn validate(
        &self,
        item: &FormItem,
        value: Option<&FieldValue>,
        _rules: &ValidationRules,
    ) -> Result<(), FieldError> {
        match non_empty_text(item, value)? {
            Some(choice) => ensure_option(item, choice),
            None => Ok(()),
        }
    }
}

impl FieldStrategy for RatingField {
    fn shape(&self) -> ValueShape {
        ValueShape::Text
    }

    fn validate(
        &self,
        item: &FormItem,
        value: Option<&FieldValue>,
        _rules: &ValidationRules,
    ) -> Result<(), FieldError> {
        match non_empty_text(item, value)? {
            Some(rating) => ensure_option(item, rating),
            None => Ok(()),
        }
    }
}

impl FieldStrategy for CheckboxField {
    fn shape(&self) -> ValueShape {
        ValueShape::List
    }

    fn validate(
        &self,
        item: &FormItem,
        value: Option<&FieldValue>,
        rules: &ValidationRules,
    ) -> Result<(), FieldError> {
        let selected: &[String] = match value {
            Some(FieldValue::List(items)) => items,
            Some(FieldValue::Text(_)) => {
                return Err(FieldError::WrongShape {
                    expected: ValueShape::List.name(),
                    actual: "Text",
                });
            }
            None => &[],
        };
        if selected.is_empty()
            && item.is_required()
            && rules.checkbox == CheckboxRule::AtLeastOne
        {
            return Err(FieldError::Required);
        }
        selected.iter().try_for_each(|s| ensure_option(item, s))
    }
}

/// A rating option split for display into a badge and a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingOption<'a> {
    /// The short badge, normally the number before `" - "`.
    pub badge: String,
    /// The text after `" - "`, or the whole option when there is none.
    pub label: &'a str,
    /// The full option, which is what gets stored as the value.
    pub value: &'a str,
}

impl<'a> RatingOption<'a> {
    /// Split `option` (at position `index` in the option list).
    ///
    /// The badge falls back to the 1-based position when the option has no
    /// `" - "` separator or nothing before it.
    pub fn parse(option: &'a str, index: usize) -> Self {
        match option.split_once(" - ") {
            Some((badge, label)) if !badge.trim().is_empty() => Self {
                badge: badge.trim().to_string(),
                label,
                value: option,
            },
            Some((_, label)) => Self {
                badge: (index + 1).to_string(),
                label,
                value: option,
            },
            None => Self {
                badge: (index + 1).to_string(),
                label: option,
                value: option,
            },
        }
    }

    /// Split every option of a rating item.
    pub fn all(item: &'a FormItem) -> Vec<Self> {
        item.options()
            .iter()
            .enumerate()
            .map(|(i, o)| Self::parse(o, i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstep_types::FieldKind;
    use pretty_assertions::assert_eq;

    fn rules() -> ValidationRules {
        ValidationRules::default()
    }

    #[test]
    fn required_text_must_be_non_empty() {
        let item = FormItem::new("Name", FieldKind::Text).required();
        assert_eq!(validate_item(&item, None, &rules()), Err(FieldError::Required));
        assert_eq!(
            validate_item(&item, Some(&"  ".into()), &rules()),
            Err(FieldError::Required)
        );
        assert_eq!(validate_item(&item, Some(&"Ada".into()), &rules()), Ok(()));
    }

    #[test]
    fn optional_text_may_be_empty() {
        let item = FormItem::new("Notes", FieldKind::Paragraph);
        assert_eq!(validate_item(&item, None, &rules()), Ok(()));
        assert_eq!(validate_item(&item, Some(&"".into()), &rules()), Ok(()));
    }

    #[test]
    fn text_rejects_lists() {
        let item = FormItem::new("Name", FieldKind::Short);
        assert!(matches!(
            validate_item(&item, Some(&vec!["a"].into()), &rules()),
            Err(FieldError::WrongShape { .. })
        ));
    }

    #[test]
    fn dates_must_parse() {
        let item = FormItem::new("Week Of", FieldKind::Date).required();
        assert_eq!(validate_item(&item, Some(&"2024-03-04".into()), &rules()), Ok(()));
        assert!(matches!(
            validate_item(&item, Some(&"next monday".into()), &rules()),
            Err(FieldError::InvalidDate { .. })
        ));
        assert_eq!(validate_item(&item, None, &rules()), Err(FieldError::Required));
    }

    #[test]
    fn choice_must_be_an_option() {
        let item = FormItem::new("Status", FieldKind::MultipleChoice)
            .with_options(["On Track", "Blocked"])
            .required();
        assert_eq!(validate_item(&item, Some(&"Blocked".into()), &rules()), Ok(()));
        assert!(matches!(
            validate_item(&item, Some(&"Sideways".into()), &rules()),
            Err(FieldError::UnknownOption { .. })
        ));
        assert_eq!(validate_item(&item, None, &rules()), Err(FieldError::Required));
    }

    #[test]
    fn required_checkbox_does_not_block_by_default() {
        let item = FormItem::new("Areas", FieldKind::Checkbox)
            .with_options(["Frontend", "Backend"])
            .required();
        assert_eq!(validate_item(&item, None, &rules()), Ok(()));
        assert_eq!(validate_item(&item, Some(&FieldValue::List(vec![])), &rules()), Ok(()));
    }

    #[test]
    fn at_least_one_rule_blocks_empty_checkbox() {
        let item = FormItem::new("Areas", FieldKind::Checkbox)
            .with_options(["Frontend", "Backend"])
            .required();
        let strict = ValidationRules::with_checkbox(CheckboxRule::AtLeastOne);
        assert_eq!(validate_item(&item, None, &strict), Err(FieldError::Required));
        assert_eq!(
            validate_item(&item, Some(&vec!["Backend"].into()), &strict),
            Ok(())
        );
    }

    #[test]
    fn checkbox_entries_must_be_options() {
        let item = FormItem::new("Areas", FieldKind::Checkbox).with_options(["Frontend"]);
        assert!(matches!(
            validate_item(&item, Some(&vec!["Frontend", "Ops"].into()), &rules()),
            Err(FieldError::UnknownOption { value }) if value == "Ops"
        ));
    }

    #[test]
    fn rating_option_split() {
        let opt = RatingOption::parse("4 - Good", 3);
        assert_eq!(opt.badge, "4");
        assert_eq!(opt.label, "Good");
        assert_eq!(opt.value, "4 - Good");

        let opt = RatingOption::parse("Excellent", 4);
        assert_eq!(opt.badge, "5");
        assert_eq!(opt.label, "Excellent");

        let opt = RatingOption::parse("5 - Very - Good", 0);
        assert_eq!(opt.label, "Very - Good");
    }

    #[test]
    fn section_collects_every_failure() {
        let section = Section::new(
            "Overview",
            vec![
                FormItem::new("Name", FieldKind::Text).required(),
                FormItem::new("Team", FieldKind::Text).required(),
                FormItem::new("Notes", FieldKind::Paragraph),
            ],
        );
        let mut values = FormValues::new();
        values.insert("Team", "Core");

        let errors = validate_section(&section, &values, &rules());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(&FieldKey::new("Name")), Some(&FieldError::Required));
    }

    #[test]
    fn shapes() {
        for kind in FieldKind::ALL {
            let expected = if kind.is_multi_select() {
                ValueShape::List
            } else {
                ValueShape::Text
            };
            assert_eq!(strategy_for(kind).shape(), expected, "{kind}");
        }
    }
}
