//! Axum route handlers for sign-up, token login and the current user's profile.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accounts::auth::AuthUser;
use crate::accounts::manager::authenticate;
use crate::accounts::serializer::{
    self, ProfileUpdateRequest, UserCreateRequest, UserResponse, BLANK, REQUIRED,
};
use crate::accounts::tokens::{TokenPair, TokenType};
use crate::errors::{AppError, FieldErrors};
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenObtainRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TokenObtainRequest {
    /// Both credentials are required and non-blank; missing ones are
    /// reported together.
    fn credentials(self) -> Result<(String, String), AppError> {
        let mut errors = FieldErrors::new();
        let email = required_field(&mut errors, "email", self.email);
        let password = required_field(&mut errors, "password", self.password);
        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(AppError::FieldErrors(errors)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: Option<String>,
}

fn required_field(
    errors: &mut FieldErrors,
    name: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        None => {
            errors.insert(name.to_string(), vec![REQUIRED.to_string()]);
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.insert(name.to_string(), vec![BLANK.to_string()]);
            None
        }
        Some(v) => Some(v),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
}

/// POST /api/register/
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<UserCreateRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let data = req.validate()?;
    let user = serializer::create(state.store.as_ref(), data).await?;
    info!("Registered {} <{}>", user.full_name(), user);
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /api/token/
pub async fn handle_token_obtain(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenObtainRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let (email, password) = req.credentials()?;
    let user = authenticate(state.store.as_ref(), &email, &password)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized(
                "No active account found with the given credentials".to_string(),
            )
        })?;
    info!("Issued tokens for user id {}", user.id);
    Ok(Json(state.tokens.issue_pair(user.id)?))
}

/// POST /api/token/refresh/
pub async fn handle_token_refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRefreshRequest>,
) -> Result<Json<TokenRefreshResponse>, AppError> {
    let mut errors = FieldErrors::new();
    let refresh = required_field(&mut errors, "refresh", req.refresh)
        .ok_or(AppError::FieldErrors(errors))?;
    let user_id = state.tokens.verify(&refresh, TokenType::Refresh)?;
    let active = state
        .store
        .get_user(user_id)
        .await?
        .is_some_and(|u| u.is_active);
    if !active {
        return Err(AppError::Unauthorized("User not found".to_string()));
    }
    Ok(Json(TokenRefreshResponse {
        access: state.tokens.issue(user_id, TokenType::Access)?,
    }))
}

/// GET /api/users/me/
pub async fn handle_get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// PATCH /api/users/me/
pub async fn handle_update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let update = req.validate()?;
    let updated = state
        .store
        .update_user_profile(user.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;
    Ok(Json(UserResponse::from(&updated)))
}

/// DELETE /api/users/me/
pub async fn handle_delete_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_user(user.id).await? {
        return Err(AppError::NotFound(format!("User {} not found", user.id)));
    }
    info!("Deleted user {} (id {}) and their assessments", user, user.id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::store::Store;
    use crate::test_support::{login, register, send, TestApp};

    #[tokio::test]
    async fn test_register_returns_fields_without_password() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/register/",
            Some(json!({
                "email": "Ada@Example.COM",
                "password": "analytical-engine",
                "first_name": "Ada",
                "last_name": "Lovelace"
            })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "Ada@example.com");
        assert_eq!(body["first_name"], "Ada");
        assert_eq!(body["last_name"], "Lovelace");
        assert_eq!(body["role"], "student");
        assert_eq!(body["location"], "");
        assert!(body["id"].is_i64());
        assert!(body.get("password").is_none());

        // the stored user authenticates with the posted password
        let (status, tokens) = send(
            &app,
            Method::POST,
            "/api/token/",
            Some(json!({"email": "Ada@example.com", "password": "analytical-engine"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(tokens["access"].is_string());
        assert!(tokens["refresh"].is_string());
    }

    #[tokio::test]
    async fn test_register_validation_errors_are_per_field() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/register/",
            Some(json!({"password": "pw", "role": "teacher"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["email"][0], "This field is required.");
        assert_eq!(body["role"][0], "\"teacher\" is not a valid choice.");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let app = TestApp::new();
        register(&app, "dup@example.com", "pw").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/register/",
            Some(json!({"email": "dup@EXAMPLE.com", "password": "pw"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["email"][0]
            .as_str()
            .unwrap()
            .contains("already exists"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = TestApp::new();
        register(&app, "a@example.com", "right").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/token/",
            Some(json!({"email": "a@example.com", "password": "wrong"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "No active account found with the given credentials");
    }

    #[tokio::test]
    async fn test_token_obtain_reports_missing_fields() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/token/",
            Some(json!({"email": "a@example.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["password"][0], "This field is required.");
        assert!(body.get("email").is_none());

        let (status, body) =
            send(&app, Method::POST, "/api/token/refresh/", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["refresh"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_wrongly_typed_body_is_json_error() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/register/",
            Some(json!({"email": 42, "password": "pw"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_BODY");
        assert!(body["detail"].is_string());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/token/",
            Some(json!({"email": 42, "password": "pw"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_BODY");
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let app = TestApp::new();
        register(&app, "a@example.com", "pw").await;
        let (_, tokens) = send(
            &app,
            Method::POST,
            "/api/token/",
            Some(json!({"email": "a@example.com", "password": "pw"})),
            None,
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/token/refresh/",
            Some(json!({"refresh": tokens["refresh"]})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["access"].as_str().unwrap();
        let (status, _) = send(&app, Method::GET, "/api/users/me/", None, Some(access)).await;
        assert_eq!(status, StatusCode::OK);

        // an access token cannot be used as a refresh token
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/token/refresh/",
            Some(json!({"refresh": tokens["access"]})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = TestApp::new();
        let (status, _) = send(&app, Method::GET, "/api/users/me/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, Method::GET, "/api/users/me/", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_update() {
        let app = TestApp::new();
        let token = login(&app, "p@example.com", "pw").await;
        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/users/me/",
            Some(json!({"role": "parent", "location": "Lagos", "email": "ignored@example.com"})),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "parent");
        assert_eq!(body["location"], "Lagos");
        assert_eq!(body["email"], "p@example.com");
    }

    #[tokio::test]
    async fn test_delete_me_removes_assessments() {
        let app = TestApp::new();
        let token = login(&app, "gone@example.com", "pw").await;
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/assessments/",
            Some(json!({"interests": "robots"})),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let assessment_id = created["id"].as_i64().unwrap();

        let (status, _) = send(&app, Method::DELETE, "/api/users/me/", None, Some(&token)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert!(app.store.get_assessment(assessment_id).await.unwrap().is_none());
        // the token now points at a missing user
        let (status, _) = send(&app, Method::GET, "/api/users/me/", None, Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
