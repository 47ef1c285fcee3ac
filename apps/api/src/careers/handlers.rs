//! Career catalog: public reads, staff-only writes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::accounts::auth::AuthUser;
use crate::accounts::serializer::{max_length_message, BLANK, REQUIRED};
use crate::errors::{AppError, FieldErrors};
use crate::extract::AppJson;
use crate::models::career::{Career, FutureTrend, NewCareer};
use crate::state::AppState;

const TITLE_MAX_LEN: usize = 255;

#[derive(Debug, Deserialize)]
pub struct CareerListQuery {
    pub trend: Option<FutureTrend>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCareerRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub automation_risk: Option<f64>,
    pub market_demand: Option<i32>,
    pub future_trend: Option<String>,
    pub suggested_skills_text: Option<String>,
}

impl CreateCareerRequest {
    pub fn validate(self) -> Result<NewCareer, AppError> {
        let mut errors = FieldErrors::new();
        let mut fail = |field: &str, msg: String| {
            errors.entry(field.to_string()).or_default().push(msg);
        };

        let title = self.title.as_deref().map(str::trim).unwrap_or_default().to_string();
        if self.title.is_none() {
            fail("title", REQUIRED.to_string());
        } else if title.is_empty() {
            fail("title", BLANK.to_string());
        } else if title.chars().count() > TITLE_MAX_LEN {
            fail("title", max_length_message(TITLE_MAX_LEN));
        }

        let automation_risk = self.automation_risk.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&automation_risk) {
            fail(
                "automation_risk",
                "Ensure this value is between 0.0 and 1.0.".to_string(),
            );
        }

        let future_trend = match self.future_trend.as_deref() {
            None => FutureTrend::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                fail("future_trend", format!("\"{raw}\" is not a valid choice."));
                FutureTrend::default()
            }),
        };

        if !errors.is_empty() {
            return Err(AppError::FieldErrors(errors));
        }

        Ok(NewCareer {
            title,
            description: self.description.unwrap_or_default(),
            automation_risk,
            market_demand: self.market_demand.unwrap_or(0),
            future_trend,
            suggested_skills_text: self.suggested_skills_text.unwrap_or_default(),
        })
    }
}

/// GET /api/careers/
pub async fn handle_list_careers(
    State(state): State<AppState>,
    Query(params): Query<CareerListQuery>,
) -> Result<Json<Vec<Career>>, AppError> {
    Ok(Json(state.store.list_careers(params.trend).await?))
}

/// GET /api/careers/:id/
pub async fn handle_get_career(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Career>, AppError> {
    let career = state
        .store
        .get_career(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Career {id} not found")))?;
    Ok(Json(career))
}

/// POST /api/careers/
pub async fn handle_create_career(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateCareerRequest>,
) -> Result<(StatusCode, Json<Career>), AppError> {
    auth.require_staff()?;
    let career = state.store.insert_career(req.validate()?).await?;
    info!("Added career {} (id {})", career, career.id);
    Ok((StatusCode::CREATED, Json(career)))
}

/// DELETE /api/careers/:id/
pub async fn handle_delete_career(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_staff()?;
    if !state.store.delete_career(id).await? {
        return Err(AppError::NotFound(format!("Career {id} not found")));
    }
    info!("Deleted career {id}; dependent roadmaps keep a null career");
    Ok(StatusCode::NO_CONTENT)
}
