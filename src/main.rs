use sahabat_gula::{app, init_tracing, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    let router = app::build_app(state.clone());
    app::serve(router, state).await
}
