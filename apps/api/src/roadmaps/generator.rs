//! Milestone generation from a career's suggested skills and an assessment's
//! self-ratings.
//!
//! Per suggested skill, the self-rating (matched case-insensitively) sets the
//! effort:
//! - unrated → 3 months
//! - rating 1–2 → 2 months
//! - rating 3 → 1 month
//! - rating ≥ 4 → skipped, already proficient
//!
//! Without a career, a non-blank career aspiration yields one exploratory
//! milestone.

use serde_json::{json, Value};

use crate::models::assessment::Assessment;
use crate::models::career::Career;
use crate::models::roadmap::Milestone;

pub const PROFICIENT_RATING: i32 = 4;
const EXPLORATION_MONTHS: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRoadmap {
    pub milestones: Vec<Milestone>,
    pub total_duration_estimate_months: i32,
}

pub fn months_for_rating(rating: Option<i32>) -> Option<i32> {
    match rating {
        None => Some(3),
        Some(r) if r <= 2 => Some(2),
        Some(r) if r < PROFICIENT_RATING => Some(1),
        Some(_) => None,
    }
}

pub fn generate(career: Option<&Career>, assessment: Option<&Assessment>) -> GeneratedRoadmap {
    let milestones = match career {
        Some(career) => skill_milestones(career, assessment),
        None => assessment
            .map(|a| a.career_aspiration.trim())
            .filter(|aspiration| !aspiration.is_empty())
            .map(|aspiration| {
                vec![milestone(
                    format!("Research the path to {aspiration}"),
                    None,
                    None,
                    EXPLORATION_MONTHS,
                )]
            })
            .unwrap_or_default(),
    };
    let total_duration_estimate_months = total_duration(&milestones);
    GeneratedRoadmap {
        milestones,
        total_duration_estimate_months,
    }
}

fn skill_milestones(career: &Career, assessment: Option<&Assessment>) -> Vec<Milestone> {
    career
        .suggested_skills()
        .into_iter()
        .filter_map(|skill| {
            let rating = assessment.and_then(|a| a.rating_for(&skill));
            let months = months_for_rating(rating)?;
            Some(milestone(
                format!("Learn {skill}"),
                Some(skill.as_str()),
                Some(rating),
                months,
            ))
        })
        .collect()
}

fn milestone(
    title: String,
    skill: Option<&str>,
    current_rating: Option<Option<i32>>,
    months: i32,
) -> Milestone {
    let mut m = Milestone::new();
    m.insert("milestone".to_string(), Value::String(title));
    if let Some(skill) = skill {
        m.insert("skill".to_string(), json!(skill));
    }
    if let Some(rating) = current_rating {
        m.insert("current_rating".to_string(), json!(rating));
    }
    m.insert("duration_months".to_string(), json!(months));
    m
}

/// Sums integer `duration_months` entries; anything else counts as zero.
pub fn total_duration(milestones: &[Milestone]) -> i32 {
    milestones
        .iter()
        .filter_map(|m| m.get("duration_months").and_then(Value::as_i64))
        .map(|months| i32::try_from(months.max(0)).unwrap_or(i32::MAX))
        .fold(0i32, |acc, months| acc.saturating_add(months))
}
