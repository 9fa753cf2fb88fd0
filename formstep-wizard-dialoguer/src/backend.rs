//! Dialoguer implementation of the FormFrontend trait.

use formstep::{
    FieldError, FieldKind, FieldValue, FormFrontend, FormItem, FormSession, Navigation, RatingOption,
    ReviewSection, Section, SessionError, SessionOutcome, field,
};
use dialoguer::{
    Confirm, Editor, FuzzySelect, Input, MultiSelect, Select,
    theme::{ColorfulTheme, SimpleTheme, Theme},
};
use thiserror::Error;

/// Error type for the Dialoguer frontend.
#[derive(Debug, Error)]
pub enum DialoguerError {
    /// User cancelled the form (e.g., pressed Ctrl+C or Escape).
    #[error("Form cancelled by user")]
    Cancelled,

    /// An I/O error occurred during prompting.
    #[error("Dialoguer error: {0}")]
    Dialoguer(#[from] dialoguer::Error),
}

/// Helper to check if a dialoguer error is a cancellation (Ctrl+C / Escape)
fn is_cancelled(err: &dialoguer::Error) -> bool {
    matches!(err, dialoguer::Error::IO(io_err) if io_err.kind() == std::io::ErrorKind::Interrupted)
}

fn prompt_result<T>(result: Result<T, dialoguer::Error>) -> Result<T, DialoguerError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if is_cancelled(&e) => Err(DialoguerError::Cancelled),
        Err(e) => Err(DialoguerError::Dialoguer(e)),
    }
}

/// Label of the entry that leaves an optional choice unanswered.
const NO_ANSWER: &str = "(no answer)";

/// Dialoguer frontend for line-oriented terminals.
///
/// Asks each section's questions in order, then offers to continue, go back,
/// or save the draft and quit.
#[derive(Debug, Clone)]
pub struct DialoguerFrontend {
    /// Use colorful theme for prompts.
    colorful: bool,
}

impl Default for DialoguerFrontend {
    fn default() -> Self {
        Self::new()
    }
}

/// What the user picked after answering a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepChoice {
    Continue,
    Back,
    Quit,
}

/// What the user picked on the review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewChoice {
    Edit(usize),
    Submit,
    Quit,
}

impl DialoguerFrontend {
    /// Create a new Dialoguer frontend with default (colorful) theme.
    pub fn new() -> Self {
        Self { colorful: true }
    }

    /// Create a frontend with plain (no color) theme.
    pub fn plain() -> Self {
        Self { colorful: false }
    }

    fn theme(&self) -> Box<dyn Theme> {
        if self.colorful {
            Box::new(ColorfulTheme::default())
        } else {
            Box::new(SimpleTheme)
        }
    }

    /// Ask every question of `section`, or only the invalid ones on a retry.
    fn ask_section(
        &self,
        session: &mut FormSession,
        section: &Section,
        only_invalid: bool,
    ) -> Result<(), DialoguerError> {
        for item in section.questions() {
            if only_invalid && session.error(&item.key()).is_none() {
                continue;
            }
            self.ask_item(session, item)?;
        }
        Ok(())
    }

    fn ask_item(&self, session: &mut FormSession, item: &FormItem) -> Result<(), DialoguerError> {
        let key = item.key();
        loop {
            let current = session.value(&key).cloned();
            let answer = match item.kind() {
                FieldKind::Paragraph => self.ask_paragraph(item, current.as_ref())?,
                FieldKind::Checkbox => self.ask_checkbox(item, current.as_ref())?,
                kind if kind.is_single_select() => self.ask_choice(item, current.as_ref())?,
                _ => self.ask_text(item, current.as_ref())?,
            };

            // Blank required fields are reported when leaving the section
            match field::validate_item(item, answer.as_ref(), session.rules()) {
                Ok(()) | Err(FieldError::Required) => {}
                Err(err) => {
                    println!("Error: {err}");
                    continue;
                }
            }

            let stored = match answer {
                Some(value) => session.set_value(key.clone(), value),
                None => session.clear_value(key.clone()),
            };
            if let Err(err) = stored {
                println!("Error: {err}");
            }
            if let Some(warning) = session.draft_warning() {
                println!("Warning: draft not saved ({warning})");
            }
            return Ok(());
        }
    }

    fn ask_text(
        &self,
        item: &FormItem,
        current: Option<&FieldValue>,
    ) -> Result<Option<FieldValue>, DialoguerError> {
        let prompt = if item.kind() == FieldKind::Date {
            format!("{} ({})", prompt_for(item), item.placeholder_text())
        } else {
            prompt_for(item)
        };
        let theme = self.theme();
        let mut builder = Input::<String>::with_theme(&*theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(text) = current.and_then(FieldValue::as_text) {
            builder = builder.with_initial_text(text);
        }

        let value = prompt_result(builder.interact_text())?;
        Ok(text_answer(value))
    }

    fn ask_paragraph(
        &self,
        item: &FormItem,
        current: Option<&FieldValue>,
    ) -> Result<Option<FieldValue>, DialoguerError> {
        println!("{} (opens your editor)", prompt_for(item));
        let initial = current.and_then(FieldValue::as_text).unwrap_or_default();
        match prompt_result(Editor::new().edit(initial))? {
            Some(value) => Ok(text_answer(value.trim_end().to_string())),
            // Editor was aborted, keep what was there
            None => Ok(current.cloned()),
        }
    }

    fn ask_choice(
        &self,
        item: &FormItem,
        current: Option<&FieldValue>,
    ) -> Result<Option<FieldValue>, DialoguerError> {
        let labels = option_labels(item);
        let selected = current
            .and_then(FieldValue::as_text)
            .and_then(|text| item.options().iter().position(|o| o == text));
        let theme = self.theme();
        let prompt = prompt_for(item);

        let index = if item.kind() == FieldKind::Select {
            let mut builder = FuzzySelect::with_theme(&*theme)
                .with_prompt(prompt)
                .items(&labels);
            if let Some(selected) = selected {
                builder = builder.default(selected);
            }
            prompt_result(builder.interact())?
        } else {
            prompt_result(
                Select::with_theme(&*theme)
                    .with_prompt(prompt)
                    .items(&labels)
                    .default(selected.unwrap_or(0))
                    .interact(),
            )?
        };

        Ok(item
            .options()
            .get(index)
            .map(|option| FieldValue::Text(option.clone())))
    }

    fn ask_checkbox(
        &self,
        item: &FormItem,
        current: Option<&FieldValue>,
    ) -> Result<Option<FieldValue>, DialoguerError> {
        let checked: Vec<bool> = item
            .options()
            .iter()
            .map(|option| {
                current
                    .and_then(FieldValue::as_list)
                    .is_some_and(|list| list.contains(option))
            })
            .collect();
        let theme = self.theme();
        let picked = prompt_result(
            MultiSelect::with_theme(&*theme)
                .with_prompt(prompt_for(item))
                .items(item.options())
                .defaults(&checked)
                .interact(),
        )?;
        let selected = picked
            .into_iter()
            .filter_map(|i| item.options().get(i).cloned())
            .collect();
        Ok(Some(FieldValue::List(selected)))
    }

    fn ask_step_choice(&self, first: bool) -> Result<StepChoice, DialoguerError> {
        let choices = step_choices(first);
        let labels: Vec<&str> = choices.iter().map(|(label, _)| *label).collect();
        let theme = self.theme();
        let index = prompt_result(
            Select::with_theme(&*theme)
                .with_prompt("What next?")
                .items(&labels)
                .default(0)
                .interact(),
        )?;
        Ok(choices.get(index).map_or(StepChoice::Continue, |(_, c)| *c))
    }

    fn ask_review_choice(&self, review: &[ReviewSection]) -> Result<ReviewChoice, DialoguerError> {
        let choices = review_choices(review);
        let labels: Vec<&str> = choices.iter().map(|(label, _)| label.as_str()).collect();
        let theme = self.theme();
        let index = prompt_result(
            Select::with_theme(&*theme)
                .with_prompt("Review")
                .items(&labels)
                .default(0)
                .interact(),
        )?;
        Ok(choices.get(index).map_or(ReviewChoice::Quit, |(_, c)| *c))
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, DialoguerError> {
        let theme = self.theme();
        prompt_result(
            Confirm::with_theme(&*theme)
                .with_prompt(prompt)
                .default(default)
                .interact(),
        )
    }

    /// Run one content step. Returns `false` when the user quits.
    fn content_step(&self, session: &mut FormSession, index: usize) -> Result<bool, DialoguerError> {
        let Some(section) = session.definition().section(index).cloned() else {
            return Ok(true);
        };
        println!();
        println!(
            "== {} ({}/{}) ==",
            section.title(),
            index + 1,
            session.definition().section_count()
        );
        if let Some(description) = section.description() {
            println!("{description}");
        }

        let mut only_invalid = false;
        loop {
            self.ask_section(session, &section, only_invalid)?;
            match self.ask_step_choice(session.is_first_step())? {
                StepChoice::Quit => return Ok(false),
                StepChoice::Back => {
                    session.go_previous();
                    return Ok(true);
                }
                StepChoice::Continue => match session.go_next() {
                    Navigation::Blocked { .. } => {
                        for item in section.questions() {
                            if let Some(err) = session.error(&item.key()) {
                                println!("Error: {}: {err}", item.title());
                            }
                        }
                        only_invalid = true;
                    }
                    Navigation::Moved { .. } | Navigation::Stayed => return Ok(true),
                },
            }
        }
    }

    /// Run the review step. Returns `false` when the user quits.
    fn review_step(&self, session: &mut FormSession) -> Result<bool, DialoguerError> {
        let review = session.review();
        println!();
        for line in review_lines(&review) {
            println!("{line}");
        }
        if let Some(error) = session.last_error() {
            println!("Error: {error}");
        }

        match self.ask_review_choice(&review)? {
            ReviewChoice::Quit => Ok(false),
            ReviewChoice::Edit(step) => {
                if let Err(err) = session.jump_to(step) {
                    println!("Error: {err}");
                }
                Ok(true)
            }
            ReviewChoice::Submit => {
                if !self.confirm("Submit this form?", true)? {
                    return Ok(true);
                }
                match session.confirm_intent() {
                    Ok(()) => {}
                    Err(SessionError::Incomplete { section, title }) => {
                        println!("Error: please complete \"{title}\" before submitting");
                        session.jump_to(section).ok();
                        return Ok(true);
                    }
                    Err(err) => {
                        println!("Error: {err}");
                        return Ok(true);
                    }
                }
                println!("Submitting...");
                // A failure is printed from `last_error` on the next pass
                session.submit().ok();
                Ok(true)
            }
        }
    }
}

impl FormFrontend for DialoguerFrontend {
    type Error = DialoguerError;

    fn run(&self, session: &mut FormSession) -> Result<SessionOutcome, Self::Error> {
        let definition = session.definition();
        println!("{}", definition.title());
        if let Some(description) = definition.description() {
            println!("{description}");
        }
        if !session.values().is_empty() {
            println!("Restored your saved draft.");
        }

        let mut last_receipt = None;
        loop {
            if let Some(receipt) = session.state().receipt().cloned() {
                println!();
                println!(
                    "{}",
                    receipt
                        .message
                        .as_deref()
                        .unwrap_or("Form submitted successfully")
                );
                if let Some(id) = receipt.id {
                    println!("Reference #{id}");
                }
                last_receipt = Some(receipt);
                if self.confirm("Submit another response?", false)? {
                    session.restart().ok();
                    continue;
                }
                break;
            }

            let step = session.current_step();
            let keep_going = if session.is_review() {
                self.review_step(session)?
            } else {
                self.content_step(session, step)?
            };
            if !keep_going {
                println!("Draft saved. Run again to continue where you left off.");
                break;
            }
        }

        Ok(match last_receipt {
            Some(receipt) => SessionOutcome::Submitted(receipt),
            None => SessionOutcome::Abandoned,
        })
    }
}

fn prompt_for(item: &FormItem) -> String {
    if item.is_required() {
        format!("{} *", item.title())
    } else {
        item.title().to_string()
    }
}

fn text_answer(value: String) -> Option<FieldValue> {
    if value.trim().is_empty() {
        None
    } else {
        Some(FieldValue::Text(value))
    }
}

/// Display labels for a choice item's options.
///
/// Optional items get a trailing entry that leaves them unanswered.
fn option_labels(item: &FormItem) -> Vec<String> {
    let mut labels: Vec<String> = item
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| {
            if item.kind() == FieldKind::Rating {
                let rating = RatingOption::parse(option, i);
                format!("[{}] {}", rating.badge, rating.label)
            } else {
                option.clone()
            }
        })
        .collect();
    if !item.is_required() {
        labels.push(NO_ANSWER.to_string());
    }
    labels
}

fn step_choices(first: bool) -> Vec<(&'static str, StepChoice)> {
    let mut choices = vec![("Continue", StepChoice::Continue)];
    if !first {
        choices.push(("Back", StepChoice::Back));
    }
    choices.push(("Save draft and quit", StepChoice::Quit));
    choices
}

fn review_choices(review: &[ReviewSection]) -> Vec<(String, ReviewChoice)> {
    let mut choices = vec![("Submit".to_string(), ReviewChoice::Submit)];
    choices.extend(
        review
            .iter()
            .map(|section| (format!("Edit \"{}\"", section.title), ReviewChoice::Edit(section.index))),
    );
    choices.push(("Save draft and quit".to_string(), ReviewChoice::Quit));
    choices
}

fn review_lines(review: &[ReviewSection]) -> Vec<String> {
    if review.is_empty() {
        return vec!["No answers yet.".to_string()];
    }
    let mut lines = Vec::new();
    for section in review {
        lines.push(format!("== {} ==", section.title));
        for entry in &section.entries {
            lines.push(format!("  {}: {}", entry.title, entry.value));
        }
    }
    lines
}
