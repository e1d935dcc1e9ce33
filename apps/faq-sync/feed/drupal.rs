use super::FaqSource;
use super::models::FaqFeedResponse;
use crate::types::FaqRecord;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_FEED_URL: &str = "https://allbooks-help.press.jhu.edu/jsonapi/node/faq";

/// Client for the Drupal JSON:API FAQ listing
pub struct DrupalFaqFeed {
    client: ClientWithMiddleware,
    url: String,
}

impl DrupalFaqFeed {
    pub fn new(url: String, max_retries: u32, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("faq-sync/1.0 reqwest/0.12"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.api+json, application/json"),
        );

        let inner = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build FAQ feed HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FaqSource for DrupalFaqFeed {
    #[instrument(name = "fetch_faqs", skip(self), fields(url = %self.url))]
    async fn fetch_faqs(&self) -> Result<Vec<FaqRecord>> {
        debug!("Fetching FAQ feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to request FAQ feed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("FAQ feed error: status={}, body={}", status, body);
        }

        let body = response
            .text()
            .await
            .context("Failed to read FAQ feed response")?;
        let parsed: FaqFeedResponse =
            serde_json::from_str(&body).context("Failed to parse FAQ feed response")?;

        let faqs: Vec<FaqRecord> = parsed.data.into_iter().map(FaqRecord::from).collect();
        info!(count = faqs.len(), "Fetched FAQs");
        Ok(faqs)
    }
}
