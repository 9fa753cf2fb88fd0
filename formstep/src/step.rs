//! Position within a form: one step per section plus the review step.

/// Error type for explicit step changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("Step {requested} is out of range (0..={last})")]
    OutOfRange { requested: usize, last: usize },
}

/// Tracks the current step of a form with `sections` content sections.
///
/// Steps `0..sections` are content sections; step `sections` is the review
/// step. The current step is always in `0..=sections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepController {
    current: usize,
    sections: usize,
}

impl StepController {
    /// Start at the first section.
    pub fn new(sections: usize) -> Self {
        Self {
            current: 0,
            sections,
        }
    }

    /// The current step index.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Number of steps, including review.
    pub fn total_steps(&self) -> usize {
        self.sections + 1
    }

    /// Index of the review step.
    pub fn review_step(&self) -> usize {
        self.sections
    }

    pub fn is_review(&self) -> bool {
        self.current == self.sections
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    /// The current content section, or `None` on review.
    pub fn section_index(&self) -> Option<usize> {
        (!self.is_review()).then_some(self.current)
    }

    /// Advance one step, clamped to review. Returns whether the step changed.
    ///
    /// Validation is the caller's concern; the controller only moves.
    pub fn advance(&mut self) -> bool {
        let next = (self.current + 1).min(self.sections);
        let moved = next != self.current;
        self.current = next;
        moved
    }

    /// Go back one step, clamped to the first. Returns whether the step changed.
    pub fn retreat(&mut self) -> bool {
        let prev = self.current.saturating_sub(1);
        let moved = prev != self.current;
        self.current = prev;
        moved
    }

    /// Jump directly to `step` without validation.
    pub fn jump_to(&mut self, step: usize) -> Result<(), StepError> {
        if step > self.sections {
            return Err(StepError::OutOfRange {
                requested: step,
                last: self.sections,
            });
        }
        self.current = step;
        Ok(())
    }

    /// Return to the first section.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Completion ratio in `[0, 1]` for progress bars.
    pub fn progress(&self) -> f64 {
        if self.sections == 0 {
            return 1.0;
        }
        self.current as f64 / self.sections as f64
    }
}
