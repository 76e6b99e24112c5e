use serde::Deserialize;
use std::{env, time::Duration};

use crate::error::AppError;

pub const DEFAULT_REPUTATION_BASE_URL: &str = "https://www.virustotal.com/api/v3/domains";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub fetch_timeout_secs: u64,
    pub reputation_base_url: String,
    #[serde(default)]
    pub reputation_api_key: Option<String>,
    pub model_path: String,
    pub tld_encoder_path: String,
    pub scaler_path: String,
    /// Full public suffix list on disk. The bundled list is used when unset.
    #[serde(default)]
    pub suffix_list_path: Option<String>,
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

impl Config {
    /// Defaults, then `phishlens.toml` if present, then `PHISHLENS_*`
    /// environment variables.
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .set_default("port", 5000_i64)?
            .set_default("fetch_timeout_secs", 5_i64)?
            .set_default("reputation_base_url", DEFAULT_REPUTATION_BASE_URL)?
            .set_default("model_path", "models/rf_model.json")?
            .set_default("tld_encoder_path", "models/tld_encoder.json")?
            .set_default("scaler_path", "models/scaler.json")?
            .add_source(config::File::with_name("phishlens").required(false))
            .add_source(config::Environment::with_prefix("PHISHLENS").try_parsing(true))
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        // Older deployments keep the credential in `.env` as `api_key`.
        if config.reputation_api_key.as_deref().map_or(true, str::is_empty) {
            config.reputation_api_key = env::var("api_key").ok().filter(|key| !key.is_empty());
        }

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn redacted(&self) -> Self {
        Self {
            reputation_api_key: self.reputation_api_key.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        }
    }
}
