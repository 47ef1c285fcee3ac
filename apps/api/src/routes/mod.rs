pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::assessments::handlers as assessments;
use crate::careers::handlers as careers;
use crate::roadmaps::handlers as roadmaps;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/register/", post(accounts::handle_register))
        .route("/api/token/", post(accounts::handle_token_obtain))
        .route("/api/token/refresh/", post(accounts::handle_token_refresh))
        .route(
            "/api/users/me/",
            get(accounts::handle_get_me)
                .patch(accounts::handle_update_me)
                .delete(accounts::handle_delete_me),
        )
        // Assessments
        .route(
            "/api/assessments/",
            get(assessments::handle_list_assessments).post(assessments::handle_create_assessment),
        )
        .route(
            "/api/assessments/:id/",
            get(assessments::handle_get_assessment),
        )
        // Career catalog
        .route(
            "/api/careers/",
            get(careers::handle_list_careers).post(careers::handle_create_career),
        )
        .route(
            "/api/careers/:id/",
            get(careers::handle_get_career).delete(careers::handle_delete_career),
        )
        // Roadmaps
        .route(
            "/api/roadmaps/",
            get(roadmaps::handle_list_roadmaps).post(roadmaps::handle_create_roadmap),
        )
        .route("/api/roadmaps/:id/", get(roadmaps::handle_get_roadmap))
        .with_state(state)
}
