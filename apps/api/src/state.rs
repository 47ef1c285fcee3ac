use std::sync::Arc;

use crate::accounts::tokens::TokenIssuer;
use crate::config::Config;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, `MemoryStore` when `STORAGE_BACKEND=memory`.
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub config: Config,
}
