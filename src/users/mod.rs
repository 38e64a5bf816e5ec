mod dto;
pub mod handlers;
mod repo;
pub mod repo_types;

pub use dto::PublicUser;
pub use repo_types::User;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::me_routes()
}
