pub mod app;
pub mod articles;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod entity;
pub mod error;
pub mod foods;
pub mod images;
pub mod logs;
pub mod response;
pub mod state;
pub mod storage;
pub mod store;
pub mod users;
pub mod validation;

/// `RUST_LOG` filter with a crate default; `LOG_FORMAT=json` for JSON lines.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "sahabat_gula=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
