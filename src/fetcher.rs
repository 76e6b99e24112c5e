use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{error::AppError, types::UrlReference};

pub fn build_http_client(timeout: Duration) -> Result<Client, AppError> {
    let client = Client::builder()
        .timeout(timeout)
        .redirect(Policy::limited(10))
        .build()?;
    Ok(client)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched {
        html: String,
        status: u16,
        robots: bool,
    },
    Unavailable { reason: String },
}

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches the page and its `robots.txt` concurrently. Any HTTP status
    /// on the page counts as content; only transport errors do not.
    pub async fn fetch(&self, url: &UrlReference) -> FetchOutcome {
        let (page, robots) = tokio::join!(self.fetch_page(&url.raw), self.has_robots(url));

        match page {
            Ok((status, html)) => {
                debug!("Fetched {} ({}, {} bytes, robots: {})", url.raw, status, html.len(), robots);
                FetchOutcome::Fetched { html, status, robots }
            }
            Err(e) => {
                warn!("Content unavailable for {}: {}", url.raw, e);
                FetchOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<(u16, String), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let html = response.text().await?;
        Ok((status, html))
    }

    async fn has_robots(&self, url: &UrlReference) -> bool {
        match self.client.get(url.robots_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("robots.txt fetch for {} failed: {}", url.netloc, e);
                false
            }
        }
    }
}
