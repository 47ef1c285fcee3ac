use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FutureTrend {
    Rising,
    #[default]
    Stable,
    Declining,
}

impl FutureTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            FutureTrend::Rising => "rising",
            FutureTrend::Stable => "stable",
            FutureTrend::Declining => "declining",
        }
    }
}

impl FromStr for FutureTrend {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(FutureTrend::Rising),
            "stable" => Ok(FutureTrend::Stable),
            "declining" => Ok(FutureTrend::Declining),
            other => Err(UnknownVariant {
                kind: "future trend",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for FutureTrend {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Career {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Estimated risk of automation, 0.0 to 1.0.
    pub automation_risk: f64,
    pub market_demand: i32,
    #[sqlx(try_from = "String")]
    pub future_trend: FutureTrend,
    /// Comma-separated list of suggested skills.
    pub suggested_skills_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Career {
    /// Splits `suggested_skills_text` into trimmed, non-empty skills,
    /// dropping case-insensitive duplicates while keeping first-seen order.
    pub fn suggested_skills(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut skills = Vec::new();
        for raw in self.suggested_skills_text.split(',') {
            let skill = raw.trim();
            if skill.is_empty() {
                continue;
            }
            let key = skill.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            skills.push(skill.to_string());
        }
        skills
    }
}

impl fmt::Display for Career {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct NewCareer {
    pub title: String,
    pub description: String,
    pub automation_risk: f64,
    pub market_demand: i32,
    pub future_trend: FutureTrend,
    pub suggested_skills_text: String,
}

#[cfg(test)]
pub(crate) fn sample_career(skills: &str) -> Career {
    Career {
        id: 3,
        title: "Data Engineer".to_string(),
        description: String::new(),
        automation_risk: 0.2,
        market_demand: 8,
        future_trend: FutureTrend::Rising,
        suggested_skills_text: skills.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
