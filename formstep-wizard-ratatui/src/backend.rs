//! Ratatui implementation of the FormFrontend trait.
//!
//! Provides a terminal UI with a header, progress bar, field grid and help
//! bar for walking a form one section at a time.

use std::io::{self, Stdout};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use formstep::{
    FieldKind, FieldValue, FormFrontend, FormItem, FormSession, Navigation, RatingOption,
    Section, SessionError, SessionOutcome, SubmissionReceipt,
};
use ratatui::{
    Frame, Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use thiserror::Error;

/// Error type for the Ratatui frontend.
#[derive(Debug, Error)]
pub enum RatatuiError {
    /// User interrupted the wizard (Ctrl+C).
    #[error("Form cancelled by user")]
    Cancelled,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal setup/restore error.
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Color theme for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
    pub muted: Color,
    pub highlight: Color,
    pub error: Color,
    pub success: Color,
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Blue,
            text: Color::White,
            muted: Color::DarkGray,
            highlight: Color::Yellow,
            error: Color::Red,
            success: Color::Green,
            border: Color::Gray,
        }
    }
}

/// Ratatui-based step-by-step form wizard.
#[derive(Debug, Clone, Default)]
pub struct RatatuiFrontend {
    /// Overrides the form title in the header.
    title: Option<String>,
    theme: Theme,
}

impl RatatuiFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `title` in the header instead of the form title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set a custom color theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    fn setup_terminal(&self) -> Result<Terminal<CrosstermBackend<Stdout>>, RatatuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    fn restore_terminal(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<(), RatatuiError> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        Ok(())
    }

    fn event_loop(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        session: &mut FormSession,
    ) -> Result<SessionOutcome, RatatuiError> {
        let mut state = WizardState::new(self.theme.clone(), self.title.clone(), session);

        loop {
            terminal.draw(|frame| draw_ui(frame, &state, session))?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            match state.handle_key(key, session) {
                Flow::Continue => {}
                Flow::Submit => {
                    state.submitting = true;
                    terminal.draw(|frame| draw_ui(frame, &state, session))?;
                    state.submit(session);
                }
                Flow::Abandon | Flow::Finish => return Ok(state.outcome()),
                Flow::Interrupt => return Err(RatatuiError::Cancelled),
            }
        }
    }
}

impl FormFrontend for RatatuiFrontend {
    type Error = RatatuiError;

    fn run(&self, session: &mut FormSession) -> Result<SessionOutcome, Self::Error> {
        let mut terminal = self.setup_terminal()?;
        let result = self.event_loop(&mut terminal, session);
        // Restore even when the loop failed, then report the first error.
        let restored = self.restore_terminal(&mut terminal);
        let outcome = result?;
        restored?;
        Ok(outcome)
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Submit,
    Abandon,
    Finish,
    Interrupt,
}

/// A focusable element of the review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewTarget {
    Edit(usize),
    Confirm,
    Submit,
}

/// UI state that is not part of the session.
struct WizardState {
    theme: Theme,
    title: Option<String>,
    /// Focused question (content step) or review target.
    focus: usize,
    /// Cursor position, in characters, within the focused text field.
    cursor: usize,
    /// Highlighted option within the focused choice field.
    option_cursor: usize,
    /// One-line status message, replaced on the next action.
    notice: Option<String>,
    /// A submission request is in flight.
    submitting: bool,
    /// Receipt of the most recent successful submission.
    last_receipt: Option<SubmissionReceipt>,
}

impl WizardState {
    fn new(theme: Theme, title: Option<String>, session: &FormSession) -> Self {
        let mut state = Self {
            theme,
            title,
            focus: 0,
            cursor: 0,
            option_cursor: 0,
            notice: None,
            submitting: false,
            last_receipt: None,
        };
        state.reset_view(session);
        state
    }

    fn outcome(&self) -> SessionOutcome {
        match &self.last_receipt {
            Some(receipt) => SessionOutcome::Submitted(receipt.clone()),
            None => SessionOutcome::Abandoned,
        }
    }

    /// Back to the top of the current step.
    fn reset_view(&mut self, session: &FormSession) {
        self.focus = 0;
        self.sync_focus(session);
    }

    /// Place the text and option cursors for the focused field.
    fn sync_focus(&mut self, session: &FormSession) {
        self.cursor = 0;
        self.option_cursor = 0;
        let Some(item) = focused_item(self.focus, session) else {
            return;
        };
        match session.value(&item.key()) {
            Some(FieldValue::Text(text)) if item.kind().is_single_select() => {
                self.option_cursor = item.options().iter().position(|o| o == text).unwrap_or(0);
            }
            Some(FieldValue::Text(text)) => self.cursor = text.chars().count(),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, session: &mut FormSession) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Flow::Interrupt;
        }
        if session.is_submitted() {
            return self.handle_success_key(key, session);
        }

        match key.code {
            KeyCode::Esc => return Flow::Abandon,
            KeyCode::PageDown => {
                self.next_step(session);
                return Flow::Continue;
            }
            KeyCode::Char('n') if ctrl => {
                self.next_step(session);
                return Flow::Continue;
            }
            KeyCode::PageUp => {
                self.previous_step(session);
                return Flow::Continue;
            }
            KeyCode::Char('p') if ctrl => {
                self.previous_step(session);
                return Flow::Continue;
            }
            _ => {}
        }

        if session.is_review() {
            self.handle_review_key(key, session)
        } else {
            self.handle_field_key(key, session);
            Flow::Continue
        }
    }

    fn next_step(&mut self, session: &mut FormSession) {
        self.notice = None;
        match session.go_next() {
            Navigation::Moved { .. } => self.reset_view(session),
            Navigation::Blocked { errors } => {
                self.notice = Some(format!(
                    "Please fix {errors} field{} before continuing",
                    if errors == 1 { "" } else { "s" }
                ));
                self.focus_first_error(session);
            }
            Navigation::Stayed => {}
        }
    }

    fn previous_step(&mut self, session: &mut FormSession) {
        self.notice = None;
        if session.go_previous().moved() {
            self.reset_view(session);
        }
    }

    fn focus_first_error(&mut self, session: &FormSession) {
        let Some(section) = session.current_section() else {
            return;
        };
        if let Some(index) = section
            .questions()
            .iter()
            .position(|item| session.error(&item.key()).is_some())
        {
            self.focus = index;
            self.sync_focus(session);
        }
    }

    fn focus_next(&mut self, count: usize, session: &FormSession) {
        if self.focus + 1 < count {
            self.focus += 1;
            self.sync_focus(session);
        }
    }

    fn focus_previous(&mut self, session: &FormSession) {
        if self.focus > 0 {
            self.focus -= 1;
            self.sync_focus(session);
        }
    }

    fn handle_field_key(&mut self, key: KeyEvent, session: &mut FormSession) {
        let Some(section) = session.current_section() else {
            return;
        };
        let count = section.questions().len();
        let Some(item) = section.questions().get(self.focus).cloned() else {
            return;
        };

        match key.code {
            KeyCode::Tab => return self.focus_next(count, session),
            KeyCode::BackTab => return self.focus_previous(session),
            _ => {}
        }

        if item.kind().needs_options() {
            self.handle_option_key(key.code, &item, count, session);
        } else {
            self.handle_text_key(key.code, &item, count, session);
        }
    }

    fn handle_option_key(
        &mut self,
        code: KeyCode,
        item: &FormItem,
        count: usize,
        session: &mut FormSession,
    ) {
        let options = item.options();
        match code {
            KeyCode::Up if self.option_cursor == 0 => self.focus_previous(session),
            KeyCode::Up => self.option_cursor -= 1,
            KeyCode::Down if self.option_cursor + 1 >= options.len() => {
                self.focus_next(count, session)
            }
            KeyCode::Down => self.option_cursor += 1,
            KeyCode::Char(' ') | KeyCode::Enter => {
                let Some(option) = options.get(self.option_cursor) else {
                    return;
                };
                let value = if item.kind().is_multi_select() {
                    let mut selected = session
                        .value(&item.key())
                        .and_then(FieldValue::as_list)
                        .map(<[String]>::to_vec)
                        .unwrap_or_default();
                    match selected.iter().position(|s| s == option) {
                        Some(i) => {
                            selected.remove(i);
                        }
                        // Keep selections in option order.
                        None => {
                            selected.push(option.clone());
                            selected.sort_by_key(|s| options.iter().position(|o| o == s));
                        }
                    }
                    FieldValue::List(selected)
                } else {
                    FieldValue::Text(option.clone())
                };
                self.store(session, item, value);
            }
            _ => {}
        }
    }

    fn handle_text_key(
        &mut self,
        code: KeyCode,
        item: &FormItem,
        count: usize,
        session: &mut FormSession,
    ) {
        let mut text = session
            .value(&item.key())
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
            .to_string();
        let len = text.chars().count();
        self.cursor = self.cursor.min(len);

        match code {
            KeyCode::Char(c) => {
                text.insert(byte_index(&text, self.cursor), c);
                self.cursor += 1;
            }
            KeyCode::Enter if item.kind().is_multiline() => {
                text.insert(byte_index(&text, self.cursor), '\n');
                self.cursor += 1;
            }
            KeyCode::Enter if self.focus + 1 >= count => return self.next_step(session),
            KeyCode::Enter | KeyCode::Down => return self.focus_next(count, session),
            KeyCode::Up => return self.focus_previous(session),
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                text.remove(byte_index(&text, self.cursor));
            }
            KeyCode::Delete if self.cursor < len => {
                text.remove(byte_index(&text, self.cursor));
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                return;
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(len);
                return;
            }
            KeyCode::Home => {
                self.cursor = 0;
                return;
            }
            KeyCode::End => {
                self.cursor = len;
                return;
            }
            _ => return,
        }
        self.store(session, item, FieldValue::Text(text));
    }

    fn store(&mut self, session: &mut FormSession, item: &FormItem, value: FieldValue) {
        self.notice = None;
        if let Err(err) = session.set_value(item.key(), value) {
            self.notice = Some(err.to_string());
        }
    }

    fn review_targets(session: &FormSession) -> Vec<ReviewTarget> {
        session
            .review()
            .iter()
            .map(|section| ReviewTarget::Edit(section.index))
            .chain([ReviewTarget::Confirm, ReviewTarget::Submit])
            .collect()
    }

    fn handle_review_key(&mut self, key: KeyEvent, session: &mut FormSession) -> Flow {
        let targets = Self::review_targets(session);
        self.focus = self.focus.min(targets.len().saturating_sub(1));
        match key.code {
            KeyCode::Up | KeyCode::BackTab => self.focus = self.focus.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => {
                self.focus = (self.focus + 1).min(targets.len().saturating_sub(1))
            }
            KeyCode::Enter | KeyCode::Char(' ') => match targets.get(self.focus) {
                Some(ReviewTarget::Edit(step)) => {
                    self.notice = None;
                    if session.jump_to(*step).is_ok() {
                        self.reset_view(session);
                    }
                }
                Some(ReviewTarget::Confirm) => self.toggle_confirm(session),
                Some(ReviewTarget::Submit) if session.state().is_confirmed() => {
                    return Flow::Submit;
                }
                Some(ReviewTarget::Submit) => {
                    self.notice = Some("Confirm your answers before submitting".to_string());
                }
                None => {}
            },
            _ => {}
        }
        Flow::Continue
    }

    fn toggle_confirm(&mut self, session: &mut FormSession) {
        self.notice = None;
        if session.state().is_confirmed() {
            session.withdraw_intent();
            return;
        }
        match session.confirm_intent() {
            Ok(()) => {}
            Err(SessionError::Incomplete { section, title }) => {
                if session.jump_to(section).is_ok() {
                    self.reset_view(session);
                    self.focus_first_error(session);
                }
                self.notice = Some(format!("Please complete \"{title}\" before submitting"));
            }
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn submit(&mut self, session: &mut FormSession) {
        self.submitting = false;
        self.notice = None;
        match session.submit() {
            Ok(receipt) => {
                self.last_receipt = Some(receipt);
                self.focus = 0;
            }
            // The session keeps the message in `last_error`.
            Err(SessionError::Submit(_)) => {}
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn handle_success_key(&mut self, key: KeyEvent, session: &mut FormSession) -> Flow {
        match key.code {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                if session.restart().is_ok() {
                    self.reset_view(session);
                }
                Flow::Continue
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => Flow::Finish,
            _ => Flow::Continue,
        }
    }
}

fn focused_item(focus: usize, session: &FormSession) -> Option<&FormItem> {
    session.current_section()?.questions().get(focus)
}

/// Byte offset of the `chars`-th character.
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

/// Rows of `(question index, column span)` packed onto a `columns`-wide grid.
fn grid_rows(section: &Section) -> Vec<Vec<(usize, u16)>> {
    let columns = section.columns().max(1);
    let mut rows: Vec<Vec<(usize, u16)>> = Vec::new();
    let mut used = columns;
    for (index, item) in section.questions().iter().enumerate() {
        let span = item.column_span().clamp(1, columns);
        if used + span > columns {
            rows.push(Vec::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push((index, span));
        }
        used += span;
    }
    rows
}

fn field_height(item: &FormItem) -> u16 {
    match item.kind() {
        kind if kind.needs_options() => item.options().len() as u16 + 2,
        FieldKind::Paragraph => 6,
        _ => 3,
    }
}

fn draw_ui(frame: &mut Frame, state: &WizardState, session: &FormSession) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(2), // Progress bar
            Constraint::Min(8),    // Content
            Constraint::Length(1), // Status
            Constraint::Length(3), // Help
        ])
        .split(area);

    let definition = session.definition();
    let title = state.title.as_deref().unwrap_or(definition.title());
    let subtitle = if session.is_submitted() {
        "Submitted".to_string()
    } else {
        match session.current_section() {
            Some(section) => section.title().to_string(),
            None => "Review your answers".to_string(),
        }
    };
    let header = Paragraph::new(vec![
        Line::from(title.to_string()).style(Style::default().fg(state.theme.primary).bold()),
        Line::from(subtitle).style(Style::default().fg(state.theme.secondary)),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(state.theme.border)),
    );
    frame.render_widget(header, chunks[0]);

    draw_progress(frame, chunks[1], state, session);

    if session.is_submitted() {
        draw_success(frame, chunks[2], state);
    } else if state.submitting {
        draw_centered(frame, chunks[2], "Submitting...", state.theme.highlight);
    } else if let Some(section) = session.current_section() {
        draw_section(frame, chunks[2], state, session, section);
    } else {
        draw_review(frame, chunks[2], state, session);
    }

    let status = match (&state.notice, session.draft_warning()) {
        (Some(notice), _) => Line::from(notice.clone()).style(Style::default().fg(state.theme.highlight)),
        (None, Some(warning)) => Line::from(format!("Draft not saved: {warning}"))
            .style(Style::default().fg(state.theme.error)),
        (None, None) => Line::default(),
    };
    frame.render_widget(
        Paragraph::new(status).alignment(Alignment::Center),
        chunks[3],
    );

    let help_text = if session.is_submitted() {
        "n: Submit another response  Enter/q: Finish"
    } else if session.is_review() {
        "↑/↓: Navigate  Enter: Select  PgUp: Back  Esc: Save draft & quit"
    } else {
        match focused_item(state.focus, session).map(FormItem::kind) {
            Some(FieldKind::Checkbox) => {
                "↑/↓: Navigate  Space: Toggle  Tab: Next field  PgDn: Next  PgUp: Back  Esc: Quit"
            }
            Some(kind) if kind.is_single_select() => {
                "↑/↓: Navigate  Enter: Select  Tab: Next field  PgDn: Next  PgUp: Back  Esc: Quit"
            }
            _ => "Tab/↓: Next field  Enter: Continue  PgDn: Next  PgUp: Back  Esc: Quit",
        }
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(state.theme.border))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(state.theme.border)),
        );
    frame.render_widget(help, chunks[4]);
}

fn draw_progress(frame: &mut Frame, area: Rect, state: &WizardState, session: &FormSession) {
    let current = session.current_step() + 1;
    let total = session.total_steps();
    let progress_text = format!(" Step {current} / {total} ");

    let bar_width = area.width.saturating_sub(2);
    let text_width = progress_text.chars().count() as u16;
    let ratio = current as f32 / total as f32;
    let filled_width = (ratio * bar_width as f32) as u16;
    let bar_x = area.x + 1;

    let track = "─".repeat(bar_width as usize);
    let track_widget = Paragraph::new(track).style(Style::default().fg(state.theme.border));
    frame.render_widget(track_widget, Rect::new(bar_x, area.y, bar_width, 1));

    if filled_width > 0 {
        let filled = "━".repeat(filled_width as usize);
        let filled_widget = Paragraph::new(filled).style(Style::default().fg(state.theme.primary));
        frame.render_widget(filled_widget, Rect::new(bar_x, area.y, filled_width, 1));
    }

    if area.height > 1 {
        let text_x = bar_x + (bar_width.saturating_sub(text_width)) / 2;
        let text_widget =
            Paragraph::new(progress_text).style(Style::default().fg(state.theme.secondary));
        frame.render_widget(
            text_widget,
            Rect::new(text_x, area.y + 1, text_width.min(area.width), 1),
        );
    }
}

fn draw_section(
    frame: &mut Frame,
    area: Rect,
    state: &WizardState,
    session: &FormSession,
    section: &Section,
) {
    let mut area = area;
    if let Some(description) = section.description() {
        let description = Paragraph::new(description.to_string())
            .style(Style::default().fg(state.theme.muted))
            .wrap(Wrap { trim: true });
        frame.render_widget(description, Rect { height: 1, ..area });
        area.y += 2;
        area.height = area.height.saturating_sub(2);
    }

    let questions = section.questions();
    let rows = grid_rows(section);
    let heights: Vec<u16> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(index, _)| field_height(&questions[*index]))
                .max()
                .unwrap_or(3)
        })
        .collect();

    // Start at the first row that still keeps the focused row on screen.
    let focus_row = rows
        .iter()
        .position(|row| row.iter().any(|(index, _)| *index == state.focus))
        .unwrap_or(0);
    let mut start = 0;
    while start < focus_row && heights[start..=focus_row].iter().sum::<u16>() > area.height {
        start += 1;
    }

    let columns = u32::from(section.columns().max(1));
    let mut y = area.y;
    for (row, height) in rows.iter().zip(&heights).skip(start) {
        if y >= area.bottom() {
            break;
        }
        let height = (*height).min(area.bottom() - y);
        let mut constraints: Vec<Constraint> = row
            .iter()
            .map(|(_, span)| Constraint::Ratio(u32::from(*span), columns))
            .collect();
        let used: u32 = row.iter().map(|(_, span)| u32::from(*span)).sum();
        if used < columns {
            constraints.push(Constraint::Ratio(columns - used, columns));
        }
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(Rect::new(area.x, y, area.width, height));

        for ((index, _), cell) in row.iter().zip(cells.iter()) {
            draw_field(frame, *cell, state, session, &questions[*index], *index == state.focus);
        }
        y += height;
    }
}

fn draw_field(
    frame: &mut Frame,
    area: Rect,
    state: &WizardState,
    session: &FormSession,
    item: &FormItem,
    focused: bool,
) {
    let key = item.key();
    let error = session.error(&key);
    let border = match (error.is_some(), focused) {
        (true, _) => state.theme.error,
        (false, true) => state.theme.primary,
        (false, false) => state.theme.border,
    };
    let mut title = vec![Span::raw(format!(" {}", item.title()))];
    if item.is_required() {
        title.push(Span::styled(" *", Style::default().fg(state.theme.error)));
    }
    title.push(Span::raw(" "));

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Line::from(title))
        .title_style(Style::default().fg(if focused {
            state.theme.highlight
        } else {
            state.theme.text
        }));
    if let Some(error) = error {
        block = block.title_bottom(
            Line::from(format!(" {error} ")).style(Style::default().fg(state.theme.error)),
        );
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value = session.value(&key);
    if item.kind().needs_options() {
        let lines = option_lines(state, item, value, focused);
        frame.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let text = value.and_then(FieldValue::as_text).unwrap_or_default();
    let paragraph = if text.is_empty() {
        Paragraph::new(item.placeholder_text().to_string())
            .style(Style::default().fg(state.theme.muted))
    } else {
        Paragraph::new(text.to_string()).style(Style::default().fg(state.theme.text))
    };
    frame.render_widget(paragraph, inner);

    if focused && inner.width > 0 && inner.height > 0 {
        let before: String = text.chars().take(state.cursor).collect();
        let row = before.matches('\n').count() as u16;
        let col = before.rsplit('\n').next().unwrap_or_default().chars().count() as u16;
        frame.set_cursor_position((
            inner.x + col.min(inner.width - 1),
            inner.y + row.min(inner.height - 1),
        ));
    }
}

fn option_lines<'a>(
    state: &WizardState,
    item: &'a FormItem,
    value: Option<&FieldValue>,
    focused: bool,
) -> Vec<Line<'a>> {
    let is_selected = |option: &str| match value {
        Some(FieldValue::Text(text)) => text == option,
        Some(FieldValue::List(items)) => items.iter().any(|s| s == option),
        None => false,
    };

    item.options()
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let selected = is_selected(option);
            let marker = match (item.kind().is_multi_select(), selected) {
                (true, true) => "[✓]",
                (true, false) => "[ ]",
                (false, true) => "(•)",
                (false, false) => "( )",
            };
            let label = if item.kind() == FieldKind::Rating {
                let rating = RatingOption::parse(option, i);
                format!("{marker} [{}] {}", rating.badge, rating.label)
            } else {
                format!("{marker} {option}")
            };
            let style = if focused && i == state.option_cursor {
                Style::default().fg(state.theme.highlight).bold()
            } else if selected {
                Style::default().fg(state.theme.secondary)
            } else {
                Style::default().fg(state.theme.text)
            };
            let pointer = if focused && i == state.option_cursor { "► " } else { "  " };
            Line::from(format!("{pointer}{label}")).style(style)
        })
        .collect()
}

fn draw_review(frame: &mut Frame, area: Rect, state: &WizardState, session: &FormSession) {
    let targets = WizardState::review_targets(session);
    let focused = targets.get(state.focus.min(targets.len().saturating_sub(1))).copied();
    let target_style = |target: ReviewTarget| {
        if focused == Some(target) {
            Style::default().fg(state.theme.highlight).add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(state.theme.secondary)
        }
    };

    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0;
    let review = session.review();
    if review.is_empty() {
        lines.push(Line::from("No answers yet.").style(Style::default().fg(state.theme.muted)));
    }
    for section in &review {
        let target = ReviewTarget::Edit(section.index);
        if focused == Some(target) {
            focus_line = lines.len();
        }
        lines.push(Line::from(vec![
            Span::styled(section.title.clone(), Style::default().fg(state.theme.primary).bold()),
            Span::raw("  "),
            Span::styled(" Edit ", target_style(target)),
        ]));
        for entry in &section.entries {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", entry.title), Style::default().fg(state.theme.muted)),
                Span::styled(entry.value.clone(), Style::default().fg(state.theme.text)),
            ]));
        }
        lines.push(Line::default());
    }

    if focused == Some(ReviewTarget::Confirm) {
        focus_line = lines.len();
    }
    let check = if session.state().is_confirmed() { "[✓]" } else { "[ ]" };
    lines.push(Line::from(Span::styled(
        format!("{check} I have reviewed my answers and want to submit"),
        target_style(ReviewTarget::Confirm),
    )));
    lines.push(Line::default());

    if focused == Some(ReviewTarget::Submit) {
        focus_line = lines.len();
    }
    let submit_style = if session.state().is_confirmed() {
        target_style(ReviewTarget::Submit)
    } else {
        target_style(ReviewTarget::Submit).fg(state.theme.muted)
    };
    lines.push(Line::from(Span::styled(" Submit ", submit_style)));

    if let Some(error) = session.last_error() {
        lines.push(Line::default());
        lines.push(
            Line::from(format!("Submission failed: {error}"))
                .style(Style::default().fg(state.theme.error).bold()),
        );
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.primary))
        .title(" Review ")
        .title_style(Style::default().fg(state.theme.highlight));
    let visible = block.inner(area).height as usize;
    let scroll = (focus_line + 1).saturating_sub(visible) as u16;
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn draw_success(frame: &mut Frame, area: Rect, state: &WizardState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.success))
        .title(" Complete ")
        .title_style(Style::default().fg(state.theme.success).bold());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let receipt = state.last_receipt.as_ref();
    let message = receipt
        .and_then(|r| r.message.clone())
        .unwrap_or_else(|| "Form submitted successfully".to_string());
    let mut lines = vec![
        Line::from(message).style(Style::default().fg(state.theme.success).bold()),
        Line::default(),
    ];
    if let Some(id) = receipt.and_then(|r| r.id) {
        lines.push(Line::from(format!("Reference #{id}")));
    }
    lines.push(Line::from("Press n to submit another response, Enter to finish."));

    let centered = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Min(4),
            Constraint::Percentage(35),
        ])
        .split(inner);
    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(state.theme.text))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, centered[1]);
}

fn draw_centered(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let centered = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Percentage(45),
        ])
        .split(area);
    let paragraph = Paragraph::new(text.to_string())
        .style(Style::default().fg(color).bold())
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, centered[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstep::{
        FormDefinition, MemoryDraftStore, RecordingSubmitter, SubmitState,
    };
    use ratatui::backend::TestBackend;

    fn definition() -> FormDefinition {
        FormDefinition::new(
            "Weekly Report",
            vec![
                Section::new(
                    "Week Overview",
                    vec![
                        FormItem::new("Your Name", FieldKind::Text).required(),
                        FormItem::new("Overall Status", FieldKind::Choice)
                            .with_options(["On Track", "Blocked"])
                            .required(),
                    ],
                ),
                Section::new(
                    "Details",
                    vec![
                        FormItem::new("Areas", FieldKind::Checkbox)
                            .with_options(["Frontend", "Backend"]),
                        FormItem::new("Energy", FieldKind::Rating)
                            .with_options(["1 - Low", "5 - High"])
                            .with_column_span(2),
                    ],
                ),
            ],
        )
        .unwrap()
    }

    fn session() -> FormSession {
        FormSession::new(definition(), MemoryDraftStore::new(), RecordingSubmitter::accepting())
    }

    fn press(state: &mut WizardState, session: &mut FormSession, code: KeyCode) -> Flow {
        state.handle_key(KeyEvent::new(code, KeyModifiers::NONE), session)
    }

    fn type_text(state: &mut WizardState, session: &mut FormSession, text: &str) {
        for c in text.chars() {
            press(state, session, KeyCode::Char(c));
        }
    }

    fn render(state: &WizardState, session: &FormSession) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| draw_ui(frame, state, session)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn frontend_creation() {
        let _frontend = RatatuiFrontend::new();
        let _with_title = RatatuiFrontend::new().with_title("Test");
        let _with_theme = RatatuiFrontend::new().with_theme(Theme::default());
    }

    #[test]
    fn error_types() {
        let err = RatatuiError::Cancelled;
        assert_eq!(err.to_string(), "Form cancelled by user");

        let err = RatatuiError::Terminal("test error".to_string());
        assert_eq!(err.to_string(), "Terminal error: test error");
    }

    #[test]
    fn typing_edits_the_focused_field() {
        let mut s = session();
        let mut state = WizardState::new(Theme::default(), None, &s);
        type_text(&mut state, &mut s, "Ada");
        press(&mut state, &mut s, KeyCode::Left);
        press(&mut state, &mut s, KeyCode::Backspace);
        assert_eq!(s.value(&"Your Name".into()), Some(&"Aa".into()));
    }

    #[test]
    fn blocked_navigation_shows_notice_and_focuses_error() {
        let mut s = session();
        let mut state = WizardState::new(Theme::default(), None, &s);
        type_text(&mut state, &mut s, "Ada");
        press(&mut state, &mut s, KeyCode::PageDown);

        assert_eq!(s.current_step(), 0);
        assert_eq!(state.focus, 1);
        assert_eq!(state.notice.as_deref(), Some("Please fix 1 field before continuing"));
        assert!(render(&state, &s).contains("This field is required"));
    }

    #[test]
    fn walk_to_submission() {
        let mut s = session();
        let mut state = WizardState::new(Theme::default(), None, &s);

        type_text(&mut state, &mut s, "Ada");
        press(&mut state, &mut s, KeyCode::Tab);
        press(&mut state, &mut s, KeyCode::Down);
        press(&mut state, &mut s, KeyCode::Enter);
        assert_eq!(s.value(&"Overall Status".into()), Some(&"Blocked".into()));

        press(&mut state, &mut s, KeyCode::PageDown);
        assert_eq!(s.current_step(), 1);
        assert_eq!(state.focus, 0);

        press(&mut state, &mut s, KeyCode::Char(' '));
        press(&mut state, &mut s, KeyCode::Down);
        press(&mut state, &mut s, KeyCode::Char(' '));
        assert_eq!(
            s.value(&"Areas".into()),
            Some(&vec!["Frontend", "Backend"].into())
        );

        press(&mut state, &mut s, KeyCode::PageDown);
        assert!(s.is_review());
        assert!(render(&state, &s).contains("Review your answers"));

        // Edit, Edit, Confirm, Submit
        press(&mut state, &mut s, KeyCode::Down);
        press(&mut state, &mut s, KeyCode::Down);
        assert_eq!(press(&mut state, &mut s, KeyCode::Enter), Flow::Continue);
        assert_eq!(*s.state(), SubmitState::ConfirmedIntent);
        press(&mut state, &mut s, KeyCode::Down);
        assert_eq!(press(&mut state, &mut s, KeyCode::Enter), Flow::Submit);

        state.submit(&mut s);
        assert!(s.is_submitted());
        assert!(render(&state, &s).contains("Form submitted successfully"));
        assert_eq!(press(&mut state, &mut s, KeyCode::Enter), Flow::Finish);
        assert!(matches!(state.outcome(), SessionOutcome::Submitted(_)));
    }

    #[test]
    fn submit_needs_confirmation() {
        let mut s = session();
        let mut state = WizardState::new(Theme::default(), None, &s);
        s.jump_to(2).unwrap();
        state.reset_view(&s);
        // No answers: only Confirm and Submit.
        press(&mut state, &mut s, KeyCode::Down);
        assert_eq!(press(&mut state, &mut s, KeyCode::Enter), Flow::Continue);
        assert_eq!(
            state.notice.as_deref(),
            Some("Confirm your answers before submitting")
        );
    }

    #[test]
    fn incomplete_confirm_jumps_to_section() {
        let mut s = session();
        let mut state = WizardState::new(Theme::default(), None, &s);
        s.jump_to(2).unwrap();
        state.reset_view(&s);
        press(&mut state, &mut s, KeyCode::Enter);
        assert_eq!(s.current_step(), 0);
        assert_eq!(
            state.notice.as_deref(),
            Some("Please complete \"Week Overview\" before submitting")
        );
    }

    #[test]
    fn escape_abandons() {
        let mut s = session();
        let mut state = WizardState::new(Theme::default(), None, &s);
        assert_eq!(press(&mut state, &mut s, KeyCode::Esc), Flow::Abandon);
        assert_eq!(state.outcome(), SessionOutcome::Abandoned);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(state.handle_key(ctrl_c, &mut s), Flow::Interrupt);
    }

    #[test]
    fn rating_badges_render() {
        let mut s = session();
        let state = WizardState::new(Theme::default(), None, &s);
        s.jump_to(1).unwrap();
        let screen = render(&state, &s);
        assert!(screen.contains("[5] High"));
        assert!(screen.contains("Step 2 / 3"));
    }

    #[test]
    fn grid_packs_by_span() {
        let section = Section::new(
            "S",
            vec![
                FormItem::new("a", FieldKind::Text),
                FormItem::new("b", FieldKind::Text),
                FormItem::new("c", FieldKind::Paragraph).with_column_span(2),
                FormItem::new("d", FieldKind::Text),
            ],
        );
        assert_eq!(
            grid_rows(&section),
            vec![vec![(0, 1), (1, 1)], vec![(2, 2)], vec![(3, 1)]]
        );
    }

    #[test]
    fn byte_index_handles_multibyte() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("abc", 10), 3);
    }
}
