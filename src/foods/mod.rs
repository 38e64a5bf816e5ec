mod dto;
pub mod handlers;
mod repo;
pub mod repo_types;
pub mod seed;

pub use repo_types::Food;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::food_routes()
}
