use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::Store;
use crate::errors::AppError;
use crate::models::assessment::{Assessment, NewAssessment};
use crate::models::career::{Career, FutureTrend, NewCareer};
use crate::models::roadmap::{NewRoadmap, Roadmap};
use crate::models::user::{NewUser, ProfileUpdate, User};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps constraint violations onto client errors; everything else stays a
/// database error.
fn map_write_error(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        let constraint = db_err.constraint().unwrap_or("constraint").to_string();
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return AppError::Conflict(format!("A record violating {constraint} already exists"))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::Validation(format!(
                    "Referenced record does not exist ({constraint})"
                ))
            }
            _ => {}
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (email, password, first_name, last_name, role, location,
                 is_staff, is_superuser, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(&user.location)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_user_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                location = CASE WHEN $5 THEN $6 ELSE location END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.location.is_some())
        .bind(update.location.clone().flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        // assessments and their roadmaps go with the user via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Assessment, AppError> {
        sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments
                (user_id, interests, career_aspiration, skill_ratings, answers_json)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(assessment.user_id)
        .bind(&assessment.interests)
        .bind(&assessment.career_aspiration)
        .bind(Json(&assessment.skill_ratings))
        .bind(Json(&assessment.answers_json))
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        Ok(
            sqlx::query_as::<_, Assessment>("SELECT * FROM assessments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_assessments_for_user(&self, user_id: i64) -> Result<Vec<Assessment>, AppError> {
        Ok(sqlx::query_as::<_, Assessment>(
            "SELECT * FROM assessments WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_career(&self, career: NewCareer) -> Result<Career, AppError> {
        sqlx::query_as::<_, Career>(
            r#"
            INSERT INTO careers
                (title, description, automation_risk, market_demand,
                 future_trend, suggested_skills_text)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&career.title)
        .bind(&career.description)
        .bind(career.automation_risk)
        .bind(career.market_demand)
        .bind(career.future_trend.as_str())
        .bind(&career.suggested_skills_text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn get_career(&self, id: i64) -> Result<Option<Career>, AppError> {
        Ok(sqlx::query_as::<_, Career>("SELECT * FROM careers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_careers(&self, trend: Option<FutureTrend>) -> Result<Vec<Career>, AppError> {
        Ok(sqlx::query_as::<_, Career>(
            "SELECT * FROM careers WHERE ($1::text IS NULL OR future_trend = $1) ORDER BY title",
        )
        .bind(trend.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_career(&self, id: i64) -> Result<bool, AppError> {
        // roadmaps.career_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM careers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<Roadmap, AppError> {
        sqlx::query_as::<_, Roadmap>(
            r#"
            INSERT INTO roadmaps
                (career_id, user_assessment_id, title, milestones,
                 total_duration_estimate_months)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(roadmap.career_id)
        .bind(roadmap.user_assessment_id)
        .bind(&roadmap.title)
        .bind(Json(&roadmap.milestones))
        .bind(roadmap.total_duration_estimate_months)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn get_roadmap(&self, id: i64) -> Result<Option<Roadmap>, AppError> {
        Ok(sqlx::query_as::<_, Roadmap>("SELECT * FROM roadmaps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_roadmaps_for_user(&self, user_id: i64) -> Result<Vec<Roadmap>, AppError> {
        Ok(sqlx::query_as::<_, Roadmap>(
            r#"
            SELECT r.*
            FROM roadmaps r
            JOIN assessments a ON a.id = r.user_assessment_id
            WHERE a.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
