use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::accounts::auth::AuthUser;
use crate::assessments::validation::CreateAssessmentRequest;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::assessment::Assessment;
use crate::state::AppState;

/// POST /api/assessments/
pub async fn handle_create_assessment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<Assessment>), AppError> {
    let new_assessment = req.validate(user.id)?;
    let assessment = state.store.insert_assessment(new_assessment).await?;
    info!("Stored {}", assessment.label(&user.email));
    Ok((StatusCode::CREATED, Json(assessment)))
}

/// GET /api/assessments/
pub async fn handle_list_assessments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Assessment>>, AppError> {
    Ok(Json(state.store.list_assessments_for_user(user.id).await?))
}

/// GET /api/assessments/:id/
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Assessment>, AppError> {
    let assessment = state
        .store
        .get_assessment(id)
        .await?
        .filter(|a| a.user_id == user.id || user.is_staff)
        .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))?;
    Ok(Json(assessment))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{login, send, staff_token, TestApp};

    #[tokio::test]
    async fn test_create_and_list_own_assessments() {
        let app = TestApp::new();
        let token = login(&app, "s@example.com", "pw").await;
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/assessments/",
            Some(json!({
                "interests": "maths, robots",
                "career_aspiration": "Robotics engineer",
                "skill_ratings": {"python": 3},
                "answers_json": {"q1": 5, "q5": "Technology"}
            })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["skill_ratings"]["python"], 3);
        assert_eq!(created["answers_json"]["q5"], "Technology");

        let (status, list) = send(&app, Method::GET, "/api/assessments/", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assessments_are_private() {
        let app = TestApp::new();
        let owner = login(&app, "owner@example.com", "pw").await;
        let other = login(&app, "other@example.com", "pw").await;
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/assessments/",
            Some(json!({"interests": "art"})),
            Some(&owner),
        )
        .await;
        let uri = format!("/api/assessments/{}/", created["id"]);

        let (status, _) = send(&app, Method::GET, &uri, None, Some(&other)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &uri, None, Some(&owner)).await;
        assert_eq!(status, StatusCode::OK);

        let staff = staff_token(&app, "admin@example.com").await;
        let (status, _) = send(&app, Method::GET, &uri, None, Some(&staff)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, others_list) =
            send(&app, Method::GET, "/api/assessments/", None, Some(&other)).await;
        assert!(others_list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_ratings_rejected() {
        let app = TestApp::new();
        let token = login(&app, "s@example.com", "pw").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/assessments/",
            Some(json!({"skill_ratings": {"python": 10}})),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["skill_ratings"].is_array());
    }
}
