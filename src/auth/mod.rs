use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
mod repo;
pub mod repo_types;
pub mod services;

pub use repo_types::UserAuth;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
