use serde::Deserialize;
use serde_json::{Map, Value};

use crate::accounts::serializer::{max_length_message, NULL};
use crate::errors::{AppError, FieldErrors};
use crate::models::assessment::{NewAssessment, SkillRatings};

const ASPIRATION_MAX_LEN: usize = 255;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct CreateAssessmentRequest {
    pub interests: Option<String>,
    pub career_aspiration: Option<String>,
    pub skill_ratings: Option<Value>,
    #[serde(default, deserialize_with = "crate::accounts::serializer::present")]
    pub answers_json: Option<Value>,
}

impl CreateAssessmentRequest {
    pub fn validate(self, user_id: i64) -> Result<NewAssessment, AppError> {
        let mut errors = FieldErrors::new();

        let career_aspiration = self.career_aspiration.unwrap_or_default().trim().to_string();
        if career_aspiration.chars().count() > ASPIRATION_MAX_LEN {
            errors.insert(
                "career_aspiration".to_string(),
                vec![max_length_message(ASPIRATION_MAX_LEN)],
            );
        }

        let skill_ratings = match self.skill_ratings {
            None | Some(Value::Null) => SkillRatings::new(),
            Some(value) => parse_skill_ratings(value).unwrap_or_else(|messages| {
                errors.insert("skill_ratings".to_string(), messages);
                SkillRatings::new()
            }),
        };

        let answers_json = match self.answers_json {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(Value::Null) => {
                errors.insert("answers_json".to_string(), vec![NULL.to_string()]);
                Map::new()
            }
            Some(_) => {
                errors.insert(
                    "answers_json".to_string(),
                    vec!["Expected a JSON object of answers.".to_string()],
                );
                Map::new()
            }
        };

        if !errors.is_empty() {
            return Err(AppError::FieldErrors(errors));
        }

        Ok(NewAssessment {
            user_id,
            interests: self.interests.unwrap_or_default(),
            career_aspiration,
            skill_ratings,
            answers_json,
        })
    }
}

/// Accepts `{"skill": rating}` with integer ratings in 1..=5. Skill names are
/// trimmed; blank names are rejected.
pub fn parse_skill_ratings(value: Value) -> Result<SkillRatings, Vec<String>> {
    let Value::Object(map) = value else {
        return Err(vec!["Expected a JSON object mapping skills to ratings.".to_string()]);
    };
    let mut ratings = SkillRatings::new();
    let mut messages = Vec::new();
    for (skill, rating) in map {
        let name = skill.trim();
        if name.is_empty() {
            messages.push("Skill names may not be blank.".to_string());
            continue;
        }
        match rating.as_i64() {
            Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => {
                // bounded by MAX_RATING, fits in i32
                ratings.insert(name.to_string(), r as i32);
            }
            _ => messages.push(format!(
                "Rating for '{name}' must be an integer between {MIN_RATING} and {MAX_RATING}."
            )),
        }
    }
    if messages.is_empty() {
        Ok(ratings)
    } else {
        Err(messages)
    }
}
