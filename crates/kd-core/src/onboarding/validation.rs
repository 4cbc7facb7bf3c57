//! Step validation rules.

use chrono::{Datelike, Local, NaiveDate};

use super::draft::Draft;
use super::error::{ValidationError, ValidationFailure};
use super::field::FieldValue;

/// Validates the draft a step is about to save.
///
/// Runs against the draft *with* the screen's new fields merged in, and fails
/// closed: the first broken constraint is reported.
pub trait StepValidator: Send + Sync {
    fn validate(&self, draft: &Draft) -> Result<(), ValidationError>;
}

impl<F> StepValidator for F
where
    F: Fn(&Draft) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, draft: &Draft) -> Result<(), ValidationError> {
        self(draft)
    }
}

/// Accepts every draft. Used by informational screens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl StepValidator for NoValidation {
    fn validate(&self, _draft: &Draft) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A single declarative constraint on one field.
///
/// Every rule except [`FieldRule::Required`] is skipped when the field is absent,
/// so optional fields can still carry format constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    OneOf(Vec<String>),
    MinItems(usize),
    MaxItems(usize),
    MinAge(u32),
}

/// Declarative validator built from per-field rules, checked in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: Vec<(String, Vec<FieldRule>)>,
    reference_date: Option<NaiveDate>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rules: Vec<FieldRule>) -> Self {
        self.rules.push((name.into(), rules));
        self
    }

    /// Pin "today" for age checks. Defaults to the local date at validation time.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn check(&self, value: Option<&FieldValue>, rule: &FieldRule) -> Result<(), ValidationFailure> {
        let value = match (rule, value) {
            (FieldRule::Required, None) => return Err(ValidationFailure::Missing),
            (FieldRule::Required, Some(v)) if v.is_blank() => {
                return Err(ValidationFailure::Missing)
            }
            (_, None) => return Ok(()),
            (_, Some(v)) => v,
        };

        match rule {
            FieldRule::Required => Ok(()),
            FieldRule::MinLength(min) => {
                let text = expect_text(value)?;
                if text.trim().chars().count() < *min {
                    return Err(ValidationFailure::TooShort { min: *min });
                }
                Ok(())
            }
            FieldRule::MaxLength(max) => {
                let text = expect_text(value)?;
                if text.trim().chars().count() > *max {
                    return Err(ValidationFailure::TooLong { max: *max });
                }
                Ok(())
            }
            FieldRule::OneOf(allowed) => {
                let ok = match value {
                    FieldValue::List(items) => items.iter().all(|item| is_allowed(item, allowed)),
                    other => is_allowed(other, allowed),
                };
                if ok {
                    Ok(())
                } else {
                    Err(ValidationFailure::NotAllowed)
                }
            }
            FieldRule::MinItems(min) => {
                let items = expect_list(value)?;
                if items.len() < *min {
                    return Err(ValidationFailure::TooFewItems { min: *min });
                }
                Ok(())
            }
            FieldRule::MaxItems(max) => {
                let items = expect_list(value)?;
                if items.len() > *max {
                    return Err(ValidationFailure::TooManyItems { max: *max });
                }
                Ok(())
            }
            FieldRule::MinAge(min_age) => {
                let birthdate = value.as_date().ok_or_else(|| ValidationFailure::WrongType {
                    expected: "date".to_string(),
                })?;
                if age_on(birthdate, self.today()) < *min_age {
                    return Err(ValidationFailure::Underage { min_age: *min_age });
                }
                Ok(())
            }
        }
    }
}

impl StepValidator for FieldRules {
    fn validate(&self, draft: &Draft) -> Result<(), ValidationError> {
        for (name, rules) in &self.rules {
            let value = draft.get(name);
            for rule in rules {
                self.check(value, rule)
                    .map_err(|reason| ValidationError::new(name.clone(), reason))?;
            }
        }
        Ok(())
    }
}

fn expect_text(value: &FieldValue) -> Result<&str, ValidationFailure> {
    value.as_str().ok_or_else(|| ValidationFailure::WrongType {
        expected: "text".to_string(),
    })
}

fn expect_list(value: &FieldValue) -> Result<&[FieldValue], ValidationFailure> {
    value.as_list().ok_or_else(|| ValidationFailure::WrongType {
        expected: "list".to_string(),
    })
}

fn is_allowed(value: &FieldValue, allowed: &[String]) -> bool {
    value
        .as_str()
        .is_some_and(|s| allowed.iter().any(|a| a == s))
}

/// Whole years between `birthdate` and `today`.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> u32 {
    if birthdate > today {
        return 0;
    }
    let mut years = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}
