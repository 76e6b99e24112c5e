use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    features::FeatureExtractor,
    inference::PhishingModel,
    types::CheckResponse,
};

/// Immutable per-process context. Built once at startup and shared by every
/// request; nothing in it changes after construction.
pub struct PhishingEngine {
    extractor: FeatureExtractor,
    model: PhishingModel,
}

impl PhishingEngine {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        info!("Initializing PhishLens engine...");

        let model = PhishingModel::load(&config.model_path, &config.tld_encoder_path, &config.scaler_path)?;
        let extractor = FeatureExtractor::new(config)?;

        info!("PhishLens engine initialized successfully");
        Ok(Self::from_parts(extractor, model))
    }

    pub fn from_parts(extractor: FeatureExtractor, model: PhishingModel) -> Self {
        Self { extractor, model }
    }

    pub async fn classify(&self, url: &str) -> Result<CheckResponse, AppError> {
        let start = Instant::now();
        metrics::counter!("requests_total").increment(1);

        let extraction = self.extractor.extract(url).await?;
        if !extraction.content_available {
            metrics::counter!("content_unavailable_total").increment(1);
        }

        let prediction = self.model.predict(&extraction.record);
        let decision_id = Uuid::new_v4();

        let latency = start.elapsed().as_millis() as f64;
        metrics::histogram!("request_duration_ms").record(latency);

        info!(
            "Decision {} for {}: probability {:.3}, phishing {} ({:.0}ms)",
            decision_id, extraction.url.raw, prediction.probability, prediction.is_phishing, latency
        );

        Ok(CheckResponse {
            is_phishing: prediction.is_phishing,
            probability: prediction.probability,
            decision_id,
            content_available: extraction.content_available,
            features: extraction.record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DEFAULT_REPUTATION_BASE_URL,
        features::tests::{extractor, site},
        inference::tests::stump_model,
    };

    #[tokio::test]
    async fn long_unreachable_url_is_flagged() {
        let engine = PhishingEngine::from_parts(extractor(DEFAULT_REPUTATION_BASE_URL, None), stump_model(0.9));

        let response = engine
            .classify("http://127.0.0.1:1/secure/account/verify/login")
            .await
            .unwrap();

        assert!(response.is_phishing);
        assert!((response.probability - 0.9).abs() < 1e-12);
        assert!(!response.content_available);
        assert_eq!(response.features.tld_legitimate_prob, 0.0);
    }

    #[tokio::test]
    async fn short_url_is_not_flagged() {
        let addr = site().await;
        let engine = PhishingEngine::from_parts(
            extractor(&format!("http://{}/domains", addr), Some("key")),
            stump_model(0.9),
        );

        let response = engine.classify(&format!("http://{}/", addr)).await.unwrap();

        assert!(!response.is_phishing);
        assert!((response.probability - 0.1).abs() < 1e-12);
        assert!(response.content_available);
        assert!(response.features.content.has_title);
    }

    #[tokio::test]
    async fn each_decision_gets_a_fresh_id() {
        let engine = PhishingEngine::from_parts(extractor(DEFAULT_REPUTATION_BASE_URL, None), stump_model(0.9));

        let first = engine.classify("http://127.0.0.1:1/").await.unwrap();
        let second = engine.classify("http://127.0.0.1:1/").await.unwrap();

        assert_ne!(first.decision_id, second.decision_id);
        assert_eq!(first.probability, second.probability);
        assert_eq!(first.features, second.features);
    }

    #[tokio::test]
    async fn unparseable_url_is_invalid_input() {
        let engine = PhishingEngine::from_parts(extractor(DEFAULT_REPUTATION_BASE_URL, None), stump_model(0.9));

        let err = engine.classify("not a url").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
