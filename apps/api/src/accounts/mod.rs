pub mod auth;
pub mod handlers;
pub mod manager;
pub mod password;
pub mod serializer;
pub mod tokens;
