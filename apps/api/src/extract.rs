use axum::extract::FromRequest;

use crate::errors::AppError;

/// `axum::Json` whose rejection is an `AppError`, so bodies that are not JSON
/// or carry a wrongly typed field get a 400 JSON error instead of plain text.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
