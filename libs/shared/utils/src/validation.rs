// =====================================================================================
// DECLARATIVE FIELD VALIDATION
// =====================================================================================
//
// Every form-backed request (booking, rating, patient and doctor profiles) is
// checked against one of the rule sets in `rules`. All failing rules are
// reported, not only the first one.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Present and, for text, not blank.
    Required,
    MinLen(usize),
    MaxLen(usize),
    Email,
    /// Inclusive integer range.
    Range(i64, i64),
    Min(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: &'static str,
    pub constraint: Constraint,
    pub message: &'static str,
}

impl Rule {
    pub const fn new(field: &'static str, constraint: Constraint, message: &'static str) -> Self {
        Self { field, constraint, message }
    }
}

/// Value of one field as seen by the rules.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Int(Option<i64>),
    Number(Option<f64>),
    /// Whether a non-text selection (date, enum, id) was made.
    Selected(bool),
}

pub trait Validate {
    fn field(&self, name: &str) -> FieldValue<'_>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message).collect();
        write!(f, "{}", messages.join(" "))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN))
        .as_ref()
        .map_or(false, |re| re.is_match(email) && email.len() <= 254)
}

fn satisfies(constraint: Constraint, value: FieldValue<'_>) -> bool {
    match (constraint, value) {
        (Constraint::Required, FieldValue::Text(text)) => text.map_or(false, |t| !t.trim().is_empty()),
        (Constraint::Required, FieldValue::Int(n)) => n.is_some(),
        (Constraint::Required, FieldValue::Number(n)) => n.is_some(),
        (Constraint::Required, FieldValue::Selected(selected)) => selected,

        // Absent optional values are only caught by `Required`.
        (_, FieldValue::Text(None) | FieldValue::Int(None) | FieldValue::Number(None)) => true,

        (Constraint::MinLen(min), FieldValue::Text(Some(t))) => t.trim().chars().count() >= min,
        (Constraint::MaxLen(max), FieldValue::Text(Some(t))) => t.trim().chars().count() <= max,
        (Constraint::Email, FieldValue::Text(Some(t))) => is_valid_email(t),
        (Constraint::Range(lo, hi), FieldValue::Int(Some(n))) => (lo..=hi).contains(&n),
        (Constraint::Min(min), FieldValue::Number(Some(n))) => n >= min,

        // A rule applied to a field of the wrong kind never passes.
        _ => false,
    }
}

pub fn validate<T: Validate + ?Sized>(input: &T, rules: &[Rule]) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = rules
        .iter()
        .filter(|rule| !satisfies(rule.constraint, input.field(rule.field)))
        .map(|rule| FieldError { field: rule.field, message: rule.message })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

pub mod rules {
    use super::{Constraint::*, Rule};

    pub const RATING: &[Rule] = &[
        Rule::new("score", Required, "Please select a rating."),
        Rule::new("score", Range(1, 5), "Rating must be between 1 and 5."),
        Rule::new("feedback", MinLen(10), "Feedback must be at least 10 characters."),
        Rule::new("feedback", MaxLen(500), "Feedback must not exceed 500 characters."),
    ];

    pub const BOOKING: &[Rule] = &[
        Rule::new("doctor", Required, "Please select a doctor."),
        Rule::new("date", Required, "A date for the appointment is required."),
        Rule::new("time", Required, "A time for the appointment is required."),
        Rule::new("notes", MaxLen(500), "Notes must not exceed 500 characters."),
    ];

    pub const PATIENT_PROFILE: &[Rule] = &[
        Rule::new("name", MinLen(2), "Name must be at least 2 characters."),
        Rule::new("email", Email, "Please enter a valid email address."),
        Rule::new("phone", MinLen(10), "Please enter a valid phone number."),
        Rule::new("gender", MinLen(1), "Please select your gender."),
    ];

    /// Registration requires every profile field to be present.
    pub const PATIENT_REGISTRATION: &[Rule] = &[
        Rule::new("name", Required, "Name must be at least 2 characters."),
        Rule::new("email", Required, "Please enter a valid email address."),
        Rule::new("date_of_birth", Required, "Your date of birth is required."),
        Rule::new("gender", Required, "Please select your gender."),
        Rule::new("phone", Required, "Please enter a valid phone number."),
    ];

    /// Signup needs a name and a specialty; the fee may follow later.
    pub const DOCTOR_REGISTRATION: &[Rule] = &[
        Rule::new("name", Required, "Name must be at least 2 characters."),
        Rule::new("specialty", Required, "Please select a specialty."),
    ];

    pub const DOCTOR_PROFILE: &[Rule] = &[
        Rule::new("name", MinLen(2), "Name must be at least 2 characters."),
        Rule::new("specialty", MinLen(1), "Please select a specialty."),
        Rule::new("consultation_fee", Min(0.0), "Consultation fee cannot be negative."),
        Rule::new("bio", MaxLen(500), "Bio must not exceed 500 characters."),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RatingForm<'a> {
        score: Option<i64>,
        feedback: &'a str,
    }

    impl Validate for RatingForm<'_> {
        fn field(&self, name: &str) -> FieldValue<'_> {
            match name {
                "score" => FieldValue::Int(self.score),
                "feedback" => FieldValue::Text(Some(self.feedback)),
                _ => FieldValue::Text(None),
            }
        }
    }

    #[test]
    fn test_collects_every_failure() {
        let form = RatingForm { score: Some(6), feedback: "short" };
        let errors = validate(&form, rules::RATING).unwrap_err();

        assert!(errors.has_field("score"));
        assert!(errors.has_field("feedback"));
        assert_eq!(errors.0.len(), 2);
        assert!(errors.to_string().contains("Rating must be between 1 and 5."));
    }

    #[test]
    fn test_feedback_bounds_count_characters() {
        let ok = "é".repeat(500);
        assert!(validate(&RatingForm { score: Some(5), feedback: &ok }, rules::RATING).is_ok());

        let long = "a".repeat(501);
        let errors = validate(&RatingForm { score: Some(5), feedback: &long }, rules::RATING).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["feedback"]);
    }

    #[test]
    fn test_length_bounds_ignore_surrounding_whitespace() {
        let padded = format!("  {}\n\n", "a".repeat(500));
        assert!(validate(&RatingForm { score: Some(4), feedback: &padded }, rules::RATING).is_ok());

        let blank_padded = format!("{}short", " ".repeat(20));
        let errors = validate(&RatingForm { score: Some(4), feedback: &blank_padded }, rules::RATING).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["feedback"]);
    }

    #[test]
    fn test_missing_score_is_required() {
        let form = RatingForm { score: None, feedback: "Very attentive doctor." };
        let errors = validate(&form, rules::RATING).unwrap_err();
        assert_eq!(errors.0, vec![FieldError { field: "score", message: "Please select a rating." }]);
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("john.doe@example.com"));
        assert!(!is_valid_email("john.doe@"));
        assert!(!is_valid_email("not an email"));
    }
}
