use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use time::UtcOffset;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Prefix for URLs handed back to clients, e.g. a CDN or public bucket
    /// host. Falls back to `{endpoint}/{bucket}`.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    /// Whole hours east of UTC used for "today" and for rendering log times.
    pub display_offset_hours: i8,
    pub host: String,
    pub port: u16,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Offsets in use around the world run from UTC-12 to UTC+14.
fn parse_offset_hours(raw: &str) -> anyhow::Result<i8> {
    let hours: i8 = raw
        .trim()
        .parse()
        .with_context(|| format!("DISPLAY_UTC_OFFSET_HOURS {raw:?} is not a whole number"))?;
    if !(-12..=14).contains(&hours) {
        anyhow::bail!("DISPLAY_UTC_OFFSET_HOURS {hours} is outside -12..=14");
    }
    Ok(hours)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend: StoreBackend = env_or("STORE_BACKEND", "postgres").parse()?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORE_BACKEND=postgres");
        }
        let store = StoreConfig {
            backend,
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
            timeout_ms: env_parse("STORE_TIMEOUT_MS", 10_000),
            max_retries: env_parse("STORE_MAX_RETRIES", 3),
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "sahabat-gula"),
            audience: env_or("JWT_AUDIENCE", "sahabat-gula-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        let endpoint = env_or("MINIO_ENDPOINT", "http://localhost:9000");
        let bucket = env_or("MINIO_BUCKET", "sahabat-gula");
        let public_base_url = std::env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let storage = StorageConfig {
            access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
            region: env_or("MINIO_REGION", "us-east-1"),
            endpoint,
            bucket,
            public_base_url,
        };

        let classifier = ClassifierConfig {
            url: std::env::var("PREDICT_URL").context("PREDICT_URL")?,
            timeout_secs: env_parse("PREDICT_TIMEOUT_SECS", 30),
        };

        let display_offset_hours = parse_offset_hours(&env_or("DISPLAY_UTC_OFFSET_HOURS", "7"))?;
        let port = env_or("APP_PORT", "8080");
        let port = port
            .parse()
            .with_context(|| format!("APP_PORT {port:?} is not a port number"))?;

        Ok(Self {
            store,
            jwt,
            storage,
            classifier,
            display_offset_hours,
            host: env_or("APP_HOST", "0.0.0.0"),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn display_offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.display_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_aliases() {
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn display_offset_must_be_a_real_zone() {
        assert_eq!(parse_offset_hours("7").unwrap(), 7);
        assert_eq!(parse_offset_hours(" -5 ").unwrap(), -5);
        assert_eq!(parse_offset_hours("14").unwrap(), 14);

        let err = parse_offset_hours("100").unwrap_err();
        assert!(err.to_string().contains("DISPLAY_UTC_OFFSET_HOURS"));
        assert!(parse_offset_hours("15").is_err());
        assert!(parse_offset_hours("-13").is_err());
        assert!(parse_offset_hours("+7h").is_err());
    }
}
