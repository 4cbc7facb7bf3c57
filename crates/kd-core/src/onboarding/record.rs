use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::draft::Draft;
use super::field::{FieldMap, FieldValue};
use crate::ids::UserId;

/// Columns owned by the record itself rather than by any onboarding screen.
/// They are never written from, or hydrated into, a draft's field map.
pub const RESERVED_COLUMNS: &[&str] = &[
    "id",
    "onboarding_step",
    "onboarding_completed",
    "created_at",
    "updated_at",
];

fn is_reserved(column: &str) -> bool {
    RESERVED_COLUMNS.contains(&column)
}

/// Remote counterpart of a [`Draft`], one per user.
///
/// Unanswered columns are `null`. `onboarding_step` mirrors the step the user
/// resumes at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: UserId,
    #[serde(default)]
    pub onboarding_step: u32,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Option<FieldValue>>,
}

impl ProfileRecord {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            onboarding_step: 0,
            onboarding_completed: false,
            columns: BTreeMap::new(),
        }
    }

    /// Insert-or-update semantics shared by every record store: columns in the
    /// patch overwrite, all other columns are kept.
    pub fn apply(&mut self, patch: &ProfileRecordPatch) {
        for (name, value) in &patch.fields {
            if !is_reserved(name) {
                self.columns.insert(name.clone(), Some(value.clone()));
            }
        }
        self.onboarding_step = patch.onboarding_step;
        self.onboarding_completed = patch.onboarding_completed;
    }

    pub fn from_patch(id: UserId, patch: &ProfileRecordPatch) -> Self {
        let mut record = Self::new(id);
        record.apply(patch);
        record
    }

    /// Non-null, non-reserved columns.
    pub fn answered_fields(&self) -> FieldMap {
        self.columns
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub fn to_draft(&self, total_steps: u32) -> Draft {
        let step = if self.onboarding_completed {
            total_steps
        } else {
            self.onboarding_step
        };
        Draft::from_parts(self.answered_fields(), step, total_steps)
    }
}

/// Partial upsert payload derived from a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecordPatch {
    #[serde(flatten)]
    pub fields: FieldMap,
    pub onboarding_step: u32,
    pub onboarding_completed: bool,
}

impl ProfileRecordPatch {
    pub fn from_draft(draft: &Draft) -> Self {
        let fields = draft
            .fields()
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self {
            fields,
            onboarding_step: draft.current_step(),
            onboarding_completed: draft.is_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::field::field_map;

    #[test]
    fn test_apply_overwrites_only_patched_columns() {
        let mut record = ProfileRecord::new(UserId::new("u1"));
        record.columns.insert("bio".into(), Some("hi".into()));
        record.columns.insert("occupation".into(), None);

        let draft = Draft::from_parts(field_map([("name", "Alex")]), 3, 5);
        record.apply(&ProfileRecordPatch::from_draft(&draft));

        assert_eq!(record.onboarding_step, 3);
        assert!(!record.onboarding_completed);
        assert_eq!(record.columns["name"], Some(FieldValue::from("Alex")));
        assert_eq!(record.columns["bio"], Some(FieldValue::from("hi")));
        assert_eq!(record.columns["occupation"], None);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let draft = Draft::from_parts(field_map([("name", "Alex")]), 2, 5);
        let patch = ProfileRecordPatch::from_draft(&draft);

        let once = ProfileRecord::from_patch(UserId::new("u1"), &patch);
        let mut twice = once.clone();
        twice.apply(&patch);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_patch_marks_completion_at_terminal_step() {
        let draft = Draft::from_parts(field_map([("occupation", "Engineer")]), 5, 5);
        let patch = ProfileRecordPatch::from_draft(&draft);
        assert!(patch.onboarding_completed);
        assert_eq!(patch.onboarding_step, 5);
    }

    #[test]
    fn test_reserved_columns_never_leak_into_draft() {
        let record: ProfileRecord = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "onboarding_step": 3,
            "onboarding_completed": false,
            "created_at": "2024-01-01T00:00:00Z",
            "name": "Alex",
            "occupation": null,
        }))
        .unwrap();

        let draft = record.to_draft(5);
        assert_eq!(draft.current_step(), 3);
        assert_eq!(draft.fields(), &field_map([("name", "Alex")]));
    }

    #[test]
    fn test_record_json_shape_is_flat() {
        let draft = Draft::from_parts(field_map([("name", "Alex")]), 1, 5);
        let record = ProfileRecord::from_patch(
            UserId::new("u1"),
            &ProfileRecordPatch::from_draft(&draft),
        );
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "id": "u1",
                "onboarding_step": 1,
                "onboarding_completed": false,
                "name": "Alex",
            })
        );
    }
}
