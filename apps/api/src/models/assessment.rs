use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

/// Self-rated skills, e.g. `{"python": 4}`.
pub type SkillRatings = BTreeMap<String, i32>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: i64,
    pub user_id: i64,
    pub interests: String,
    pub career_aspiration: String,
    pub skill_ratings: Json<SkillRatings>,
    pub answers_json: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// Human-readable label, e.g. `Assessment for ada@example.com on 2024-05-01`.
    pub fn label(&self, owner_email: &str) -> String {
        format!(
            "Assessment for {} on {}",
            owner_email,
            self.created_at.format("%Y-%m-%d")
        )
    }

    /// Looks up a skill rating ignoring key case, Unicode included.
    pub fn rating_for(&self, skill: &str) -> Option<i32> {
        let wanted = skill.to_lowercase();
        self.skill_ratings
            .0
            .iter()
            .find(|(k, _)| k.to_lowercase() == wanted)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub user_id: i64,
    pub interests: String,
    pub career_aspiration: String,
    pub skill_ratings: SkillRatings,
    pub answers_json: Map<String, Value>,
}
