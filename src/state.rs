use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::classifier::{HttpClassifier, ImageClassifier};
use crate::config::{AppConfig, StoreBackend};
use crate::storage::{Storage, StorageClient};
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore, RetryPolicy, RetryingStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub classifier: Arc<dyn ImageClassifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let backend: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Postgres => {
                let url = config.store.database_url.as_deref().unwrap_or_default();
                let pg = PgDocumentStore::connect(url, config.store.max_connections).await?;
                pg.migrate().await?;
                Arc::new(pg)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        let policy = RetryPolicy {
            max_retries: config.store.max_retries,
            call_timeout: config.store_timeout(),
            ..RetryPolicy::default()
        };
        let store = Arc::new(RetryingStore::new(backend, policy)) as Arc<dyn DocumentStore>;
        info!(backend = store.backend_tag(), "document store ready");

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        let classifier = Arc::new(HttpClassifier::new(
            config.classifier.url.clone(),
            Duration::from_secs(config.classifier.timeout_secs),
        )?) as Arc<dyn ImageClassifier>;

        Ok(Self {
            store,
            config,
            storage,
            classifier,
        })
    }

    pub fn from_parts(
        store: Arc<dyn DocumentStore>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        classifier: Arc<dyn ImageClassifier>,
    ) -> Self {
        Self {
            store,
            config,
            storage,
            classifier,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
pub mod fakes {
    use std::sync::Mutex;

    use axum::async_trait;
    use bytes::Bytes;

    use crate::classifier::{ImageClassifier, Prediction};
    use crate::storage::{public_url, StorageClient};

    pub const FAKE_BASE_URL: &str = "https://fake.local/bucket";

    #[derive(Default)]
    pub struct FakeStorage {
        pub puts: Mutex<Vec<String>>,
        pub deletes: Mutex<Vec<String>>,
        pub fail_puts: bool,
    }

    #[async_trait]
    impl StorageClient for FakeStorage {
        async fn put_object(&self, key: &str, _body: Bytes, _ct: &str) -> anyhow::Result<String> {
            if self.fail_puts {
                anyhow::bail!("storage unavailable");
            }
            self.puts.lock().unwrap().push(key.to_string());
            Ok(public_url(FAKE_BASE_URL, key))
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.deletes.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeClassifier {
        pub predictions: Vec<Prediction>,
    }

    #[async_trait]
    impl ImageClassifier for FakeClassifier {
        async fn classify(&self, _image: Bytes, _f: &str, _ct: &str) -> anyhow::Result<Vec<Prediction>> {
            Ok(self.predictions.clone())
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake_config() -> AppConfig {
        use crate::config::{ClassifierConfig, JwtConfig, StorageConfig, StoreConfig};

        AppConfig {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 1,
                timeout_ms: 1_000,
                max_retries: 0,
            },
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            storage: StorageConfig {
                endpoint: "fake".into(),
                bucket: "bucket".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                region: "us-east-1".into(),
                public_base_url: fakes::FAKE_BASE_URL.into(),
            },
            classifier: ClassifierConfig {
                url: "http://fake.local/predict".into(),
                timeout_secs: 1,
            },
            display_offset_hours: 7,
            host: "127.0.0.1".into(),
            port: 0,
        }
    }

    /// In-memory store, recording storage and an empty classifier.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(Self::fake_config()),
            Arc::new(fakes::FakeStorage::default()),
            Arc::new(fakes::FakeClassifier::default()),
        )
    }
}
