use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;

use super::Store;
use crate::errors::AppError;
use crate::models::assessment::{Assessment, NewAssessment};
use crate::models::career::{Career, FutureTrend, NewCareer};
use crate::models::roadmap::{NewRoadmap, Roadmap};
use crate::models::user::{NewUser, ProfileUpdate, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    assessments: BTreeMap<i64, Assessment>,
    careers: BTreeMap<i64, Career>,
    roadmaps: BTreeMap<i64, Roadmap>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-process store. The lock is never held across an await point.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "A user with this email address already exists".to_string(),
            ));
        }
        let id = t.next_id();
        let row = User {
            id,
            email: user.email,
            password: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            location: user.location,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            date_joined: Utc::now(),
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let mut t = self.tables()?;
        Ok(t.users.get_mut(&id).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.tables()?;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<i64> = t
            .assessments
            .values()
            .filter(|a| a.user_id == id)
            .map(|a| a.id)
            .collect();
        t.assessments.retain(|_, a| a.user_id != id);
        t.roadmaps.retain(|_, r| match r.user_assessment_id {
            Some(assessment_id) => !owned.contains(&assessment_id),
            None => true,
        });
        Ok(true)
    }

    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Assessment, AppError> {
        let mut t = self.tables()?;
        if !t.users.contains_key(&assessment.user_id) {
            return Err(AppError::Validation(format!(
                "Referenced user {} does not exist",
                assessment.user_id
            )));
        }
        let id = t.next_id();
        let now = Utc::now();
        let row = Assessment {
            id,
            user_id: assessment.user_id,
            interests: assessment.interests,
            career_aspiration: assessment.career_aspiration,
            skill_ratings: Json(assessment.skill_ratings),
            answers_json: Json(assessment.answers_json),
            created_at: now,
            updated_at: now,
        };
        t.assessments.insert(id, row.clone());
        Ok(row)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, AppError> {
        Ok(self.tables()?.assessments.get(&id).cloned())
    }

    async fn list_assessments_for_user(&self, user_id: i64) -> Result<Vec<Assessment>, AppError> {
        let t = self.tables()?;
        let mut rows: Vec<Assessment> = t
            .assessments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn insert_career(&self, career: NewCareer) -> Result<Career, AppError> {
        let mut t = self.tables()?;
        if t.careers.values().any(|c| c.title == career.title) {
            return Err(AppError::Conflict(
                "A career with this title already exists".to_string(),
            ));
        }
        let id = t.next_id();
        let now = Utc::now();
        let row = Career {
            id,
            title: career.title,
            description: career.description,
            automation_risk: career.automation_risk,
            market_demand: career.market_demand,
            future_trend: career.future_trend,
            suggested_skills_text: career.suggested_skills_text,
            created_at: now,
            updated_at: now,
        };
        t.careers.insert(id, row.clone());
        Ok(row)
    }

    async fn get_career(&self, id: i64) -> Result<Option<Career>, AppError> {
        Ok(self.tables()?.careers.get(&id).cloned())
    }

    async fn list_careers(&self, trend: Option<FutureTrend>) -> Result<Vec<Career>, AppError> {
        let t = self.tables()?;
        let mut rows: Vec<Career> = t
            .careers
            .values()
            .filter(|c| trend.map_or(true, |wanted| c.future_trend == wanted))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn delete_career(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.tables()?;
        if t.careers.remove(&id).is_none() {
            return Ok(false);
        }
        for roadmap in t.roadmaps.values_mut() {
            if roadmap.career_id == Some(id) {
                roadmap.career_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_roadmap(&self, roadmap: NewRoadmap) -> Result<Roadmap, AppError> {
        let mut t = self.tables()?;
        if let Some(career_id) = roadmap.career_id {
            if !t.careers.contains_key(&career_id) {
                return Err(AppError::Validation(format!(
                    "Referenced career {career_id} does not exist"
                )));
            }
        }
        if let Some(assessment_id) = roadmap.user_assessment_id {
            if !t.assessments.contains_key(&assessment_id) {
                return Err(AppError::Validation(format!(
                    "Referenced assessment {assessment_id} does not exist"
                )));
            }
            if t
                .roadmaps
                .values()
                .any(|r| r.user_assessment_id == Some(assessment_id))
            {
                return Err(AppError::Conflict(format!(
                    "Assessment {assessment_id} already has a roadmap"
                )));
            }
        }
        let id = t.next_id();
        let now = Utc::now();
        let row = Roadmap {
            id,
            career_id: roadmap.career_id,
            user_assessment_id: roadmap.user_assessment_id,
            title: roadmap.title,
            milestones: Json(roadmap.milestones),
            total_duration_estimate_months: roadmap.total_duration_estimate_months,
            created_at: now,
            updated_at: now,
        };
        t.roadmaps.insert(id, row.clone());
        Ok(row)
    }

    async fn get_roadmap(&self, id: i64) -> Result<Option<Roadmap>, AppError> {
        Ok(self.tables()?.roadmaps.get(&id).cloned())
    }

    async fn list_roadmaps_for_user(&self, user_id: i64) -> Result<Vec<Roadmap>, AppError> {
        let t = self.tables()?;
        let mut rows: Vec<Roadmap> = t
            .roadmaps
            .values()
            .filter(|r| {
                r.user_assessment_id
                    .and_then(|id| t.assessments.get(&id))
                    .is_some_and(|a| a.user_id == user_id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::roadmap::DEFAULT_ROADMAP_TITLE;
    use crate::models::user::Role;
    use serde_json::Map;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "!unusable".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Student,
            location: None,
            is_staff: false,
            is_superuser: false,
            is_active: true,
        }
    }

    fn new_assessment(user_id: i64) -> NewAssessment {
        NewAssessment {
            user_id,
            interests: "data".to_string(),
            career_aspiration: String::new(),
            skill_ratings: BTreeMap::new(),
            answers_json: Map::new(),
        }
    }

    fn new_career(title: &str) -> NewCareer {
        NewCareer {
            title: title.to_string(),
            description: String::new(),
            automation_risk: 0.1,
            market_demand: 5,
            future_trend: FutureTrend::Rising,
            suggested_skills_text: "SQL".to_string(),
        }
    }

    fn new_roadmap(career_id: Option<i64>, assessment_id: Option<i64>) -> NewRoadmap {
        NewRoadmap {
            career_id,
            user_assessment_id: assessment_id,
            title: DEFAULT_ROADMAP_TITLE.to_string(),
            milestones: vec![],
            total_duration_estimate_months: 0,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.insert_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_assessments_and_roadmaps() {
        let store = MemoryStore::new();
        let owner = store.insert_user(new_user("a@example.com")).await.unwrap();
        let other = store.insert_user(new_user("b@example.com")).await.unwrap();
        let mine = store.insert_assessment(new_assessment(owner.id)).await.unwrap();
        let theirs = store.insert_assessment(new_assessment(other.id)).await.unwrap();
        let roadmap = store
            .insert_roadmap(new_roadmap(None, Some(mine.id)))
            .await
            .unwrap();

        assert!(store.delete_user(owner.id).await.unwrap());

        assert!(store.get_assessment(mine.id).await.unwrap().is_none());
        assert!(store.get_roadmap(roadmap.id).await.unwrap().is_none());
        assert!(store.get_assessment(theirs.id).await.unwrap().is_some());
        assert!(!store.delete_user(owner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_career_nulls_roadmap_reference() {
        let store = MemoryStore::new();
        let career = store.insert_career(new_career("Data Engineer")).await.unwrap();
        let roadmap = store
            .insert_roadmap(new_roadmap(Some(career.id), None))
            .await
            .unwrap();

        assert!(store.delete_career(career.id).await.unwrap());

        let kept = store.get_roadmap(roadmap.id).await.unwrap().unwrap();
        assert_eq!(kept.career_id, None);
    }

    #[tokio::test]
    async fn test_one_roadmap_per_assessment() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();
        let assessment = store.insert_assessment(new_assessment(user.id)).await.unwrap();
        store
            .insert_roadmap(new_roadmap(None, Some(assessment.id)))
            .await
            .unwrap();
        let err = store
            .insert_roadmap(new_roadmap(None, Some(assessment.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_careers_filters_by_trend_and_sorts() {
        let store = MemoryStore::new();
        store.insert_career(new_career("Zookeeper")).await.unwrap();
        store.insert_career(new_career("Analyst")).await.unwrap();
        let mut declining = new_career("Clerk");
        declining.future_trend = FutureTrend::Declining;
        store.insert_career(declining).await.unwrap();

        let rising = store.list_careers(Some(FutureTrend::Rising)).await.unwrap();
        let titles: Vec<_> = rising.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Analyst", "Zookeeper"]);
        assert_eq!(store.list_careers(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_assessment_requires_existing_user() {
        let store = MemoryStore::new();
        let err = store.insert_assessment(new_assessment(99)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
