mod dto;
pub mod handlers;
mod repo;
pub mod repo_types;
pub mod services;

pub use dto::{DailyNutrition, LogEntry};
pub use repo_types::UserLog;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::log_routes()
}
