//! Default dating-profile wizard.

use kd_core::onboarding::{FieldRule, FieldRules, StepDefinition, StepSequence, StepSequenceError};

pub const GENDERS: &[&str] = &["woman", "man", "non_binary"];
pub const LOOKING_FOR: &[&str] = &["women", "men", "everyone"];

/// Five-screen onboarding: basics, birthday, name, interests, occupation.
///
/// `min_age` is enforced on the birthday screen.
pub fn default_profile_steps(min_age: u32) -> Result<StepSequence, StepSequenceError> {
    let one_of = |values: &[&str]| FieldRule::OneOf(values.iter().map(|v| v.to_string()).collect());

    StepSequence::new(vec![
        StepDefinition::new(0, "basics", "/onboarding/birthday")
            .produces(["gender", "looking_for"])
            .validated_by(
                FieldRules::new()
                    .field("gender", vec![FieldRule::Required, one_of(GENDERS)])
                    .field("looking_for", vec![FieldRule::Required, one_of(LOOKING_FOR)]),
            ),
        StepDefinition::new(1, "birthday", "/onboarding/name")
            .produces(["birthdate"])
            .validated_by(FieldRules::new().field(
                "birthdate",
                vec![FieldRule::Required, FieldRule::MinAge(min_age)],
            )),
        StepDefinition::new(2, "name", "/onboarding/interests")
            .produces(["name"])
            .validated_by(FieldRules::new().field(
                "name",
                vec![
                    FieldRule::Required,
                    FieldRule::MinLength(2),
                    FieldRule::MaxLength(40),
                ],
            )),
        StepDefinition::new(3, "interests", "/onboarding/occupation")
            .produces(["interests"])
            .validated_by(FieldRules::new().field(
                "interests",
                vec![
                    FieldRule::Required,
                    FieldRule::MinItems(1),
                    FieldRule::MaxItems(10),
                ],
            )),
        StepDefinition::new(4, "occupation", "/home")
            .produces(["occupation", "bio"])
            .validated_by(
                FieldRules::new()
                    .field("occupation", vec![FieldRule::Required, FieldRule::MaxLength(80)])
                    .field("bio", vec![FieldRule::MaxLength(500)]),
            ),
    ])
}
