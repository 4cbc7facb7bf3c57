use serde::{Deserialize, Serialize};

use super::error::InvalidStepError;
use super::field::{FieldMap, FieldValue};

/// The in-progress set of onboarding answers.
///
/// Fields accumulate monotonically: merging only adds or overwrites keys, never
/// removes unrelated ones. `current_step` never exceeds `total_steps`; reaching
/// `total_steps` means the terminal step has been saved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Draft {
    fields: FieldMap,
    current_step: u32,
    total_steps: u32,
}

impl Draft {
    /// Empty draft at step 0.
    pub fn new(total_steps: u32) -> Self {
        Self {
            fields: FieldMap::new(),
            current_step: 0,
            total_steps,
        }
    }

    /// Rebuild a draft from persisted parts. The step is clamped to `total_steps`.
    pub fn from_parts(fields: FieldMap, current_step: u32, total_steps: u32) -> Self {
        Self {
            fields,
            current_step: current_step.min(total_steps),
            total_steps,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.current_step == 0
    }

    /// True once the terminal step has been passed.
    pub fn is_complete(&self) -> bool {
        self.total_steps > 0 && self.current_step >= self.total_steps
    }

    /// Last-writer-wins merge, key by key.
    pub fn merge(&mut self, partial: FieldMap) {
        self.fields.extend(partial);
    }

    /// Copy of this draft with `partial` merged in. Used to validate a screen's
    /// input without touching the stored draft.
    pub fn merged_with(&self, partial: &FieldMap) -> Self {
        let mut next = self.clone();
        next.merge(partial.clone());
        next
    }

    /// Copy of this draft positioned at `step` (clamped to `total_steps`).
    pub fn at_step(&self, step: u32) -> Self {
        Self {
            fields: self.fields.clone(),
            current_step: step.min(self.total_steps),
            total_steps: self.total_steps,
        }
    }

    /// Move the step pointer.
    ///
    /// Backward moves are always allowed; forward moves may advance by at most one
    /// and never past `total_steps`.
    pub fn set_current_step(&mut self, step: u32) -> Result<(), InvalidStepError> {
        if step > self.total_steps {
            return Err(InvalidStepError::BeyondTotal {
                requested: step,
                total_steps: self.total_steps,
            });
        }
        if step > self.current_step.saturating_add(1) {
            return Err(InvalidStepError::SkipsAhead {
                current: self.current_step,
                requested: step,
            });
        }
        self.current_step = step;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.current_step = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::field::field_map;

    #[test]
    fn test_merge_is_last_write_wins_per_key() {
        let mut draft = Draft::new(5);
        draft.merge(field_map([("name", "Al"), ("gender", "woman")]));
        draft.merge(field_map([("name", "Alex")]));
        draft.merge(field_map([("occupation", "Engineer")]));

        let expected = field_map([
            ("name", "Alex"),
            ("gender", "woman"),
            ("occupation", "Engineer"),
        ]);
        assert_eq!(draft.fields(), &expected);
    }

    #[test]
    fn test_merge_of_disjoint_partials_commutes() {
        let a = field_map([("name", "Alex")]);
        let b = field_map([("occupation", "Engineer")]);

        let mut left = Draft::new(5);
        left.merge(a.clone());
        left.merge(b.clone());

        let mut right = Draft::new(5);
        right.merge(b);
        right.merge(a);

        assert_eq!(left, right);
    }

    #[test]
    fn test_set_current_step_rejects_skipping_ahead() {
        let mut draft = Draft::from_parts(FieldMap::new(), 2, 5);

        let err = draft.set_current_step(4).unwrap_err();
        assert_eq!(
            err,
            InvalidStepError::SkipsAhead {
                current: 2,
                requested: 4
            }
        );
        assert_eq!(draft.current_step(), 2);

        draft.set_current_step(3).unwrap();
        assert_eq!(draft.current_step(), 3);
    }

    #[test]
    fn test_set_current_step_rejects_past_total() {
        let mut draft = Draft::from_parts(FieldMap::new(), 5, 5);
        assert!(matches!(
            draft.set_current_step(6),
            Err(InvalidStepError::BeyondTotal { .. })
        ));
    }

    #[test]
    fn test_set_current_step_allows_going_back() {
        let mut draft = Draft::from_parts(FieldMap::new(), 4, 5);
        draft.set_current_step(1).unwrap();
        assert_eq!(draft.current_step(), 1);
    }

    #[test]
    fn test_from_parts_clamps_step() {
        let draft = Draft::from_parts(FieldMap::new(), 9, 5);
        assert_eq!(draft.current_step(), 5);
        assert!(draft.is_complete());
    }

    #[test]
    fn test_merged_with_leaves_original_untouched() {
        let draft = Draft::new(3);
        let next = draft.merged_with(&field_map([("name", "Alex")]));
        assert!(draft.fields().is_empty());
        assert!(next.contains("name"));
    }

    #[test]
    fn test_clear_resets_fields_and_step() {
        let mut draft = Draft::from_parts(field_map([("name", "Alex")]), 3, 5);
        draft.clear();
        assert!(draft.is_empty());
        assert_eq!(draft.total_steps(), 5);
    }
}
