use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A stored account. `password` holds the encoded hash; the wire form is
/// `accounts::serializer::UserResponse`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub location: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => self.email.clone(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Insert payload produced by the user manager.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub location: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

/// Partial profile update. `location: Some(None)` clears the column.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub location: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(location) = &self.location {
            user.location = location.clone();
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(first_name: &str, last_name: &str) -> User {
    User {
        id: 1,
        email: "ada@example.com".to_string(),
        password: String::new(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role: Role::Student,
        location: None,
        is_staff: false,
        is_superuser: false,
        is_active: true,
        date_joined: Utc::now(),
    }
}
