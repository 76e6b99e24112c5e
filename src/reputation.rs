use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct VotesResponse {
    #[serde(default)]
    data: Vec<Vote>,
}

#[derive(Debug, Deserialize)]
struct Vote {
    attributes: VoteAttributes,
}

#[derive(Debug, Deserialize)]
struct VoteAttributes {
    verdict: String,
}

/// Domain reputation from VirusTotal community votes.
pub struct ReputationClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReputationClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Share of `harmless` votes for `host`. Every failure maps to 0.
    ///
    /// `host` is the full authority (subdomains included), so the resulting
    /// `TLDLegitimateProb` describes the host rather than its suffix.
    pub async fn legitimacy(&self, host: &str) -> f64 {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No reputation API key configured, skipping lookup for {}", host);
            return 0.0;
        };

        let endpoint = format!("{}/{}/votes", self.base_url, host);
        let response = match self.client.get(&endpoint).header("x-apikey", api_key).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Reputation lookup for {} failed: {}", host, e);
                return 0.0;
            }
        };

        if response.status() != StatusCode::OK {
            warn!("Reputation lookup for {} returned {}", host, response.status());
            return 0.0;
        }

        match response.json::<VotesResponse>().await {
            Ok(votes) => {
                let verdicts: Vec<&str> = votes
                    .data
                    .iter()
                    .map(|vote| vote.attributes.verdict.as_str())
                    .collect();
                let ratio = harmless_ratio(&verdicts);
                debug!("Reputation for {}: {} votes, harmless ratio {:.3}", host, verdicts.len(), ratio);
                ratio
            }
            Err(e) => {
                warn!("Malformed reputation response for {}: {}", host, e);
                0.0
            }
        }
    }
}

/// Harmless verdicts over all verdicts, 0 when there are none.
pub fn harmless_ratio(verdicts: &[&str]) -> f64 {
    if verdicts.is_empty() {
        return 0.0;
    }
    let harmless = verdicts.iter().filter(|v| **v == "harmless").count();
    harmless as f64 / verdicts.len() as f64
}
