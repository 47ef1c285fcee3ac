//! JSON representation of `User`: field validation for sign-up and profile
//! updates, and the read-side shape with the password left out.

use serde::{Deserialize, Deserializer, Serialize};

use crate::accounts::manager::{self, ExtraFields};
use crate::errors::{AppError, FieldErrors};
use crate::models::user::{ProfileUpdate, Role, User};
use crate::store::Store;

const EMAIL_MAX_LEN: usize = 254;
const NAME_MAX_LEN: usize = 150;
const LOCATION_MAX_LEN: usize = 100;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Sign-up body. Unknown keys, including a client-sent `id`, are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UserCreateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct ValidatedUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub location: Option<String>,
}

impl UserCreateRequest {
    /// Collects every field problem before failing.
    pub fn validate(self) -> Result<ValidatedUser, AppError> {
        let mut errors = FieldErrors::new();

        let email = match self.email.as_deref().map(str::trim) {
            None => push(&mut errors, "email", REQUIRED),
            Some("") => push(&mut errors, "email", BLANK),
            Some(e) if e.chars().count() > EMAIL_MAX_LEN => {
                push(&mut errors, "email", max_length_message(EMAIL_MAX_LEN))
            }
            Some(e) if !is_valid_email(e) => {
                push(&mut errors, "email", "Enter a valid email address.")
            }
            Some(e) => Some(e.to_string()),
        };

        let password = match self.password {
            None => push(&mut errors, "password", REQUIRED),
            Some(p) if p.trim().is_empty() => push(&mut errors, "password", BLANK),
            Some(p) => Some(p),
        };

        let first_name = validate_name(&mut errors, "first_name", self.first_name);
        let last_name = validate_name(&mut errors, "last_name", self.last_name);
        let role = validate_role(&mut errors, self.role.as_deref());

        let location = match self.location {
            None => Some(String::new()),
            Some(None) => None,
            Some(Some(loc)) => validate_location(&mut errors, loc),
        };

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(ValidatedUser {
                email,
                password,
                first_name,
                last_name,
                role: role.unwrap_or_default(),
                location,
            }),
            _ => Err(AppError::FieldErrors(errors)),
        }
    }
}

/// Persists a validated sign-up through the user manager.
pub async fn create(store: &dyn Store, data: ValidatedUser) -> Result<User, AppError> {
    let fields = ExtraFields {
        first_name: Some(data.first_name),
        last_name: Some(data.last_name),
        role: Some(data.role),
        location: data.location,
        ..Default::default()
    };
    match manager::create_user(store, &data.email, Some(&data.password), fields).await {
        Err(AppError::Conflict(_)) => Err(AppError::field(
            "email",
            "user with this email address already exists.",
        )),
        other => other,
    }
}

/// PATCH body for the current user's profile.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
}

impl ProfileUpdateRequest {
    pub fn validate(self) -> Result<ProfileUpdate, AppError> {
        let mut errors = FieldErrors::new();
        let mut update = ProfileUpdate::default();

        for (field, value, slot) in [
            ("first_name", self.first_name, &mut update.first_name),
            ("last_name", self.last_name, &mut update.last_name),
        ] {
            match value {
                None => {}
                Some(None) => {
                    push::<()>(&mut errors, field, NULL);
                }
                Some(Some(name)) => *slot = Some(validate_name(&mut errors, field, Some(name))),
            }
        }

        match self.role {
            None => {}
            Some(None) => {
                push::<()>(&mut errors, "role", NULL);
            }
            Some(Some(role)) => update.role = validate_role(&mut errors, Some(&role)),
        }

        match self.location {
            None => {}
            Some(None) => update.location = Some(None),
            Some(Some(loc)) => update.location = Some(validate_location(&mut errors, loc)),
        }

        if errors.is_empty() {
            Ok(update)
        } else {
            Err(AppError::FieldErrors(errors))
        }
    }
}

/// Read-side representation. Never carries the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub location: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            location: user.location.clone(),
        }
    }
}

fn push<T>(errors: &mut FieldErrors, field: &str, message: impl Into<String>) -> Option<T> {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
    None
}

fn validate_name(errors: &mut FieldErrors, field: &str, value: Option<String>) -> String {
    let name = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if name.chars().count() > NAME_MAX_LEN {
        push::<()>(errors, field, max_length_message(NAME_MAX_LEN));
    }
    name
}

fn validate_role(errors: &mut FieldErrors, value: Option<&str>) -> Option<Role> {
    let raw = value?;
    match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => push(errors, "role", format!("\"{raw}\" is not a valid choice.")),
    }
}

fn validate_location(errors: &mut FieldErrors, value: String) -> Option<String> {
    let loc = value.trim().to_string();
    if loc.chars().count() > LOCATION_MAX_LEN {
        return push(errors, "location", max_length_message(LOCATION_MAX_LEN));
    }
    Some(loc)
}

/// Structural address check: one local part, a dotted domain of
/// alphanumeric/hyphen labels (or `localhost`), no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}
