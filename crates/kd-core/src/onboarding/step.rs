use std::fmt;
use std::sync::Arc;

use super::draft::Draft;
use super::error::{StepSequenceError, ValidationError};
use super::field::FieldMap;
use super::validation::{NoValidation, StepValidator};

/// Immutable description of one wizard screen.
#[derive(Clone)]
pub struct StepDefinition {
    pub step_number: u32,
    /// Screen identifier, e.g. `"name"` or `"birthday"`.
    pub name: String,
    /// Fields this screen is allowed to write. Empty means "any".
    pub fields_produced: Vec<String>,
    /// Route the screen navigates to once the step is saved.
    pub next_route: String,
    validator: Arc<dyn StepValidator>,
}

impl StepDefinition {
    pub fn new(step_number: u32, name: impl Into<String>, next_route: impl Into<String>) -> Self {
        Self {
            step_number,
            name: name.into(),
            fields_produced: Vec::new(),
            next_route: next_route.into(),
            validator: Arc::new(NoValidation),
        }
    }

    pub fn produces<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields_produced = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn validated_by(mut self, validator: impl StepValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn validate(&self, draft: &Draft) -> Result<(), ValidationError> {
        self.validator.validate(draft)
    }

    /// Keep only the fields this step declares, in their stored form.
    pub fn extract(&self, submitted: &FieldMap) -> FieldMap {
        submitted
            .iter()
            .filter(|(name, _)| {
                self.fields_produced.is_empty() || self.fields_produced.iter().any(|f| f == *name)
            })
            .map(|(name, value)| (name.clone(), value.clone().normalized()))
            .collect()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("step_number", &self.step_number)
            .field("name", &self.name)
            .field("fields_produced", &self.fields_produced)
            .field("next_route", &self.next_route)
            .finish_non_exhaustive()
    }
}

/// Ordered step definitions, numbered contiguously from 0.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<StepDefinition>,
}

impl StepSequence {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, StepSequenceError> {
        if steps.is_empty() {
            return Err(StepSequenceError::Empty);
        }
        for (position, step) in (0u32..).zip(steps.iter()) {
            if step.step_number != position {
                return Err(StepSequenceError::NotContiguous {
                    position,
                    found: step.step_number,
                });
            }
        }
        Ok(Self { steps })
    }

    pub fn total_steps(&self) -> u32 {
        u32::try_from(self.steps.len()).unwrap_or(u32::MAX)
    }

    pub fn get(&self, step_number: u32) -> Option<&StepDefinition> {
        self.steps.get(usize::try_from(step_number).ok()?)
    }

    pub fn is_final(&self, step_number: u32) -> bool {
        step_number.saturating_add(1) == self.total_steps()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }
}
