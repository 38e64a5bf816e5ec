use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use sahabat_gula::{
    foods::{seed::parse_catalog, Food},
    init_tracing,
    store::{DocumentStore, PgDocumentStore, RetryPolicy, RetryingStore},
};

#[derive(Parser)]
#[command(about = "Load the food catalog into the document store")]
struct Args {
    /// JSON array of {image_name, glucose, karbohidrat, protein, lemak}
    #[arg(long, default_value = "dev/foods.json")]
    catalog: PathBuf,

    /// Postgres URL; falls back to DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Parse and validate only
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.catalog)
        .with_context(|| format!("read {}", args.catalog.display()))?;
    let entries: Vec<Value> = parse_catalog(&raw)
        .context("parse catalog")?
        .iter()
        .map(|row| row.to_food_data())
        .collect();

    if args.dry_run {
        let valid = entries.iter().filter(|e| Food::create(e).is_ok()).count();
        tracing::info!(valid, total = entries.len(), "dry run");
        return Ok(());
    }

    let url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL")?,
    };
    let pg = PgDocumentStore::connect(&url, 2).await?;
    pg.migrate().await?;
    let store = RetryingStore::new(Arc::new(pg), RetryPolicy::default());

    let saved = Food::seed(&store, &entries).await?;
    tracing::info!(saved, total = entries.len(), "catalog loaded");
    store.close().await;
    Ok(())
}
