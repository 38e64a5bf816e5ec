mod dto;
pub mod handlers;
mod repo;
pub mod repo_types;

pub use repo_types::Article;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::article_routes()
}
