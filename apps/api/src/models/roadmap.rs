use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

pub const DEFAULT_ROADMAP_TITLE: &str = "Personalized Career Roadmap";

/// One step of a roadmap, e.g. `{"milestone": "Learn SQL", "duration_months": 2}`.
pub type Milestone = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Roadmap {
    pub id: i64,
    pub career_id: Option<i64>,
    pub user_assessment_id: Option<i64>,
    pub title: String,
    pub milestones: Json<Vec<Milestone>>,
    pub total_duration_estimate_months: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Roadmap {
    /// Human-readable label. The assessment owner wins over the career title
    /// when both are known.
    pub fn label(&self, owner_email: Option<&str>, career_title: Option<&str>) -> String {
        match (self.user_assessment_id.and(owner_email), self.career_id.and(career_title)) {
            (Some(email), _) => format!("Roadmap for {} ({})", email, self.title),
            (None, Some(career)) => format!("Roadmap for {} ({})", career, self.title),
            (None, None) => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub career_id: Option<i64>,
    pub user_assessment_id: Option<i64>,
    pub title: String,
    pub milestones: Vec<Milestone>,
    pub total_duration_estimate_months: i32,
}
