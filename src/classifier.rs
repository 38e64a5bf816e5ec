use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use reqwest::{
    multipart::{Form, Part},
    Client as HttpClient,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One label the classifier believes is in the picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    data: Vec<Prediction>,
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn classify(
        &self,
        image: Bytes,
        filename: &str,
        content_type: &str,
    ) -> anyhow::Result<Vec<Prediction>>;
}

/// Classifier reached over HTTP: the image goes out as the multipart field
/// `image`, predictions come back as `{"data": [{label, confidence}]}`.
pub struct HttpClassifier {
    http: HttpClient,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build classifier http client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ImageClassifier for HttpClassifier {
    #[instrument(skip(self, image), fields(size = image.len()))]
    async fn classify(
        &self,
        image: Bytes,
        filename: &str,
        content_type: &str,
    ) -> anyhow::Result<Vec<Prediction>> {
        let part = Part::stream(image)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .context("classifier content type")?;
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .context("classifier request")?
            .error_for_status()
            .context("classifier status")?;

        let body: PredictResponse = response.json().await.context("classifier body")?;
        debug!(predictions = body.data.len(), "image classified");
        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prediction_payload() {
        let raw = r#"{"data":[{"label":"Energen-Cokelat-34g","confidence":0.91}]}"#;
        let body: PredictResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            body.data,
            vec![Prediction {
                label: "Energen-Cokelat-34g".into(),
                confidence: 0.91
            }]
        );
    }
}
