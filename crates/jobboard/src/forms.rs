//! Shared pieces for the multi-step posting and application forms.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

pub const REQUIRED: &str = "This field is required";

/// Field name to message, as shown next to each input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn require(&mut self, field: &'static str, value: &str) -> bool {
        if value.is_empty() {
            self.insert(field, REQUIRED);
            false
        } else {
            true
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// 1-based position in a wizard with a fixed number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepCursor {
    current: usize,
    total: usize,
}

impl StepCursor {
    pub fn new(total: usize) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    pub fn next(&mut self) -> usize {
        self.current = (self.current + 1).min(self.total);
        self.current
    }

    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1).max(1);
        self.current
    }
}

/// A form split into ordered steps, each validated on its own.
pub trait StepForm {
    type Step: Copy + 'static;

    fn steps() -> &'static [Self::Step];

    fn validate_step(&self, step: Self::Step) -> Result<(), FieldErrors>;
}

/// Walks a [`StepForm`] forward one validated step at a time.
#[derive(Debug, Clone)]
pub struct Wizard<F> {
    form: F,
    cursor: StepCursor,
}

impl<F: StepForm> Wizard<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            cursor: StepCursor::new(F::steps().len()),
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn cursor(&self) -> StepCursor {
        self.cursor
    }

    pub fn current_step(&self) -> F::Step {
        F::steps()[self.cursor.current() - 1]
    }

    /// Move forward only when the current step validates.
    pub fn advance(&mut self) -> Result<F::Step, FieldErrors> {
        self.form.validate_step(self.current_step())?;
        self.cursor.next();
        Ok(self.current_step())
    }

    pub fn back(&mut self) -> F::Step {
        self.cursor.previous();
        self.current_step()
    }

    /// Validate the final step and release the form.
    pub fn finish(self) -> Result<F, (Self, FieldErrors)> {
        if !self.cursor.is_last() {
            let mut errors = FieldErrors::new();
            errors.insert("step", "Complete the remaining steps first");
            return Err((self, errors));
        }
        match self.form.validate_step(self.current_step()) {
            Ok(()) => Ok(self.form),
            Err(errors) => Err((self, errors)),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{10}$").expect("phone pattern compiles"))
}

pub fn looks_like_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

pub fn is_ten_digit_phone(value: &str) -> bool {
    phone_pattern().is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut cursor = StepCursor::new(3);
        assert_eq!(cursor.previous(), 1);
        assert_eq!(cursor.next(), 2);
        assert_eq!(cursor.next(), 3);
        assert!(cursor.is_last());
        assert_eq!(cursor.next(), 3);
        assert_eq!(cursor.previous(), 2);
    }

    #[test]
    fn require_flags_empty_values_only() {
        let mut errors = FieldErrors::new();
        assert!(errors.require("jobTitle", "Engineer"));
        assert!(!errors.require("companyName", ""));
        assert_eq!(errors.get("companyName"), Some(REQUIRED));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.to_string(), "companyName: This field is required");
    }

    #[test]
    fn contact_patterns() {
        assert!(looks_like_email("ada@example.org"));
        assert!(!looks_like_email("ada@example"));
        assert!(is_ten_digit_phone("5155550123"));
        assert!(!is_ten_digit_phone("515-555-0123"));
        assert!(!is_ten_digit_phone("51555501234"));
    }
}
