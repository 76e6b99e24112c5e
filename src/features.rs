use tracing::{debug, info};

use crate::{
    config::Config,
    domain::DomainParser,
    error::AppError,
    fetcher::{build_http_client, FetchOutcome, PageFetcher},
    lexical::extract_lexical_features,
    reputation::ReputationClient,
    structure::StructuralAnalyzer,
    types::{ContentFeatures, FeatureRecord, UrlReference},
};

#[derive(Debug, Clone)]
pub struct Extraction {
    pub url: UrlReference,
    pub record: FeatureRecord,
    pub content_available: bool,
}

/// Runs every analyzer for a URL and merges their output into one
/// fixed-shape `FeatureRecord`.
pub struct FeatureExtractor {
    domains: DomainParser,
    fetcher: PageFetcher,
    reputation: ReputationClient,
    structure: StructuralAnalyzer,
}

impl FeatureExtractor {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config.fetch_timeout())?;
        let domains = DomainParser::load(config.suffix_list_path.as_deref())?;
        let reputation = ReputationClient::new(
            client.clone(),
            &config.reputation_base_url,
            config.reputation_api_key.clone(),
        );

        if config.reputation_api_key.is_none() {
            info!("No reputation API key configured; TLDLegitimateProb will be 0");
        }

        Ok(Self::from_parts(
            domains,
            PageFetcher::new(client),
            reputation,
            StructuralAnalyzer::new()?,
        ))
    }

    pub fn from_parts(
        domains: DomainParser,
        fetcher: PageFetcher,
        reputation: ReputationClient,
        structure: StructuralAnalyzer,
    ) -> Self {
        Self {
            domains,
            fetcher,
            reputation,
            structure,
        }
    }

    pub async fn extract(&self, raw_url: &str) -> Result<Extraction, AppError> {
        if raw_url.trim().is_empty() {
            return Err(AppError::InvalidInput("Missing URL parameter".to_string()));
        }

        let url = self.domains.parse_url(raw_url)?;
        let lexical = extract_lexical_features(&url)?;

        // Independent lookups; both finish before anything is merged.
        let (tld_legitimate_prob, page) = tokio::join!(
            self.reputation.legitimacy(&url.netloc),
            self.fetcher.fetch(&url)
        );

        let (content, content_available) = match page {
            FetchOutcome::Fetched { html, robots, .. } => {
                (self.structure.analyze(html, &url, robots), true)
            }
            FetchOutcome::Unavailable { .. } => (ContentFeatures::default(), false),
        };

        let record = FeatureRecord {
            lexical,
            tld_legitimate_prob,
            content,
        };
        debug!("Feature record for {}: {:?}", url.raw, record);

        Ok(Extraction {
            url,
            record,
            content_available,
        })
    }
}
