//! Persistence seam. `AppState` carries an `Arc<dyn Store>`; `PgStore` is the
//! production backend and `MemoryStore` keeps the same relational rules
//! (unique keys, cascades, set-null) in process for local runs and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::assessment::{Assessment, NewAssessment};
use crate::models::career::{Career, FutureTrend, NewCareer};
use crate::models::roadmap::{NewRoadmap, Roadmap};
use crate::models::user::{NewUser, ProfileUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_user_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError>;
    /// Removes the user, their assessments and those assessments' roadmaps.
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;

    // Assessments
    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Assessment, AppError>;
    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError>;
    /// Newest first.
    async fn list_assessments_for_user(&self, user_id: i64) -> Result<Vec<Assessment>, AppError>;

    // Careers
    async fn insert_career(&self, career: NewCareer) -> Result<Career, AppError>;
    async fn get_career(&self, id: i64) -> Result<Option<Career>, AppError>;
    /// Ordered by title.
    async fn list_careers(&self, trend: Option<FutureTrend>) -> Result<Vec<Career>, AppError>;
    /// Removes the career; roadmaps pointing at it keep existing with no career.
    async fn delete_career(&self, id: i64) -> Result<bool, AppError>;

    // Roadmaps
    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<Roadmap, AppError>;
    async fn get_roadmap(&self, id: i64) -> Result<Option<Roadmap>, AppError>;
    /// Roadmaps attached to the user's assessments, newest first.
    async fn list_roadmaps_for_user(&self, user_id: i64) -> Result<Vec<Roadmap>, AppError>;
}
