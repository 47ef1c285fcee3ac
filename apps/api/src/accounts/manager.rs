//! Account creation rules: email normalization, password hashing and the
//! staff/superuser flag invariants.

use anyhow::Context;
use thiserror::Error;
use tracing::{info, warn};

use crate::accounts::password;
use crate::errors::AppError;
use crate::models::user::{NewUser, Role, User};
use crate::store::Store;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserValidationError {
    #[error("The Email field must be set")]
    MissingEmail,

    #[error("Superuser must have is_staff=True.")]
    SuperuserNotStaff,

    #[error("Superuser must have is_superuser=True.")]
    SuperuserNotSuperuser,
}

/// Optional column values for a new user. `None` means "use the default".
#[derive(Debug, Clone, Default)]
pub struct ExtraFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub location: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

/// Lowercases the domain part of an address, leaving the local part alone.
/// Input without an `@` comes back trimmed but otherwise untouched.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Creates a regular account. `password: None` stores an unusable password.
pub async fn create_user(
    store: &dyn Store,
    email: &str,
    password: Option<&str>,
    mut fields: ExtraFields,
) -> Result<User, AppError> {
    fields.is_staff.get_or_insert(false);
    fields.is_superuser.get_or_insert(false);
    save_user(store, email, password, fields).await
}

/// Creates an account with staff and superuser rights. Explicitly passing
/// `false` for either flag is an error.
pub async fn create_superuser(
    store: &dyn Store,
    email: &str,
    password: Option<&str>,
    mut fields: ExtraFields,
) -> Result<User, AppError> {
    check_superuser_flags(&mut fields)?;
    save_user(store, email, password, fields).await
}

fn check_superuser_flags(fields: &mut ExtraFields) -> Result<(), UserValidationError> {
    if !*fields.is_staff.get_or_insert(true) {
        return Err(UserValidationError::SuperuserNotStaff);
    }
    if !*fields.is_superuser.get_or_insert(true) {
        return Err(UserValidationError::SuperuserNotSuperuser);
    }
    Ok(())
}

fn build_new_user(
    email: &str,
    password_hash: String,
    fields: ExtraFields,
) -> Result<NewUser, UserValidationError> {
    if email.trim().is_empty() {
        return Err(UserValidationError::MissingEmail);
    }
    Ok(NewUser {
        email: normalize_email(email),
        password_hash,
        first_name: fields.first_name.unwrap_or_default(),
        last_name: fields.last_name.unwrap_or_default(),
        role: fields.role.unwrap_or_default(),
        location: fields.location,
        is_staff: fields.is_staff.unwrap_or(false),
        is_superuser: fields.is_superuser.unwrap_or(false),
        is_active: fields.is_active.unwrap_or(true),
    })
}

async fn save_user(
    store: &dyn Store,
    email: &str,
    password: Option<&str>,
    fields: ExtraFields,
) -> Result<User, AppError> {
    // Reject before paying for a hash.
    if email.trim().is_empty() {
        return Err(UserValidationError::MissingEmail.into());
    }
    let password_hash = hash_off_thread(password).await?;
    let new_user = build_new_user(email, password_hash, fields)?;
    let user = store.insert_user(new_user).await?;
    info!(
        "Created user {} (id {}, role {}, staff {})",
        user,
        user.id,
        user.role.as_str(),
        user.is_staff
    );
    Ok(user)
}

async fn hash_off_thread(password: Option<&str>) -> Result<String, AppError> {
    let Some(raw) = password else {
        return Ok(password::make_unusable_password());
    };
    let raw = raw.to_owned();
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&raw))
        .await
        .context("password hashing task failed")??;
    Ok(hash)
}

/// Returns the active user matching the credentials, if any.
pub async fn authenticate(
    store: &dyn Store,
    email: &str,
    raw_password: &str,
) -> Result<Option<User>, AppError> {
    let email = normalize_email(email);
    let Some(user) = store.find_user_by_email(&email).await? else {
        let raw = raw_password.to_owned();
        tokio::task::spawn_blocking(move || password::verify_dummy_password(&raw))
            .await
            .context("password verification task failed")?;
        return Ok(None);
    };
    let encoded = user.password.clone();
    let raw = raw_password.to_owned();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&raw, &encoded))
        .await
        .context("password verification task failed")?;
    if !matches || !user.is_active {
        warn!("Rejected credentials for user id {}", user.id);
        return Ok(None);
    }
    Ok(Some(user))
}

/// Creates the configured superuser at startup unless the address is taken.
/// Returns whether a user was created.
pub async fn ensure_superuser(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<bool, AppError> {
    match store.find_user_by_email(&normalize_email(email)).await? {
        Some(existing) if existing.is_superuser => {
            info!("Superuser {email} already exists, skipping bootstrap");
            Ok(false)
        }
        Some(existing) => {
            warn!(
                "Bootstrap address {email} belongs to non-superuser id {}, leaving it unchanged",
                existing.id
            );
            Ok(false)
        }
        None => {
            create_superuser(store, email, Some(password), ExtraFields::default()).await?;
            Ok(true)
        }
    }
}
