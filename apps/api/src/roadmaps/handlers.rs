use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::accounts::auth::AuthUser;
use crate::accounts::serializer::{max_length_message, REQUIRED};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::roadmap::{Milestone, NewRoadmap, Roadmap, DEFAULT_ROADMAP_TITLE};
use crate::roadmaps::generator::{generate, total_duration};
use crate::state::AppState;

const TITLE_MAX_LEN: usize = 255;

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoadmapRequest {
    pub assessment_id: Option<i64>,
    pub career_id: Option<i64>,
    pub title: Option<String>,
    /// Explicit milestones; generated when absent.
    pub milestones: Option<Vec<Value>>,
}

fn missing_object(field: &str, id: i64) -> AppError {
    AppError::field(field, format!("Invalid pk \"{id}\" - object does not exist."))
}

fn parse_milestones(items: Vec<Value>) -> Result<Vec<Milestone>, AppError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::field(
                "milestones",
                format!("Item {i} is not a JSON object."),
            )),
        })
        .collect()
}

fn parse_title(title: Option<String>) -> Result<String, AppError> {
    match title.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_ROADMAP_TITLE.to_string()),
        Some(t) if t.chars().count() > TITLE_MAX_LEN => {
            Err(AppError::field("title", max_length_message(TITLE_MAX_LEN)))
        }
        Some(t) => Ok(t.to_string()),
    }
}

/// POST /api/roadmaps/
///
/// Students build a roadmap from one of their own assessments, optionally
/// aimed at a catalog career. Staff may also create career-only templates.
pub async fn handle_create_roadmap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<CreateRoadmapRequest>,
) -> Result<(StatusCode, Json<Roadmap>), AppError> {
    let assessment = match req.assessment_id {
        Some(id) => Some(
            state
                .store
                .get_assessment(id)
                .await?
                .filter(|a| a.user_id == user.id || user.is_staff)
                .ok_or_else(|| missing_object("assessment_id", id))?,
        ),
        None if user.is_staff => None,
        None => return Err(AppError::field("assessment_id", REQUIRED)),
    };

    let career = match req.career_id {
        Some(id) => Some(
            state
                .store
                .get_career(id)
                .await?
                .ok_or_else(|| missing_object("career_id", id))?,
        ),
        None => None,
    };

    let title = parse_title(req.title)?;
    let (milestones, total_duration_estimate_months) = match req.milestones {
        Some(items) => {
            let milestones = parse_milestones(items)?;
            let total = total_duration(&milestones);
            (milestones, total)
        }
        None => {
            let generated = generate(career.as_ref(), assessment.as_ref());
            (generated.milestones, generated.total_duration_estimate_months)
        }
    };

    let roadmap = state
        .store
        .insert_roadmap(NewRoadmap {
            career_id: career.as_ref().map(|c| c.id),
            user_assessment_id: assessment.as_ref().map(|a| a.id),
            title,
            milestones,
            total_duration_estimate_months,
        })
        .await?;

    let owner_email = match &assessment {
        Some(a) if a.user_id == user.id => Some(user.email.clone()),
        Some(a) => state.store.get_user(a.user_id).await?.map(|u| u.email),
        None => None,
    };
    info!(
        "Created {} with {} milestones over {} months",
        roadmap.label(owner_email.as_deref(), career.as_ref().map(|c| c.title.as_str())),
        roadmap.milestones.0.len(),
        roadmap.total_duration_estimate_months
    );
    Ok((StatusCode::CREATED, Json(roadmap)))
}

/// GET /api/roadmaps/
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Roadmap>>, AppError> {
    Ok(Json(state.store.list_roadmaps_for_user(user.id).await?))
}

/// GET /api/roadmaps/:id/
///
/// Career-only roadmaps are readable by any signed-in user; personalized
/// ones only by the assessment owner and staff.
pub async fn handle_get_roadmap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Roadmap>, AppError> {
    let not_found = || AppError::NotFound(format!("Roadmap {id} not found"));
    let roadmap = state.store.get_roadmap(id).await?.ok_or_else(not_found)?;

    if let Some(assessment_id) = roadmap.user_assessment_id {
        let visible = user.is_staff
            || state
                .store
                .get_assessment(assessment_id)
                .await?
                .is_some_and(|a| a.user_id == user.id);
        if !visible {
            return Err(not_found());
        }
    }
    Ok(Json(roadmap))
}
