use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, ClientBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::Scraper;
use crate::core::spider::{SpiderConfig, DEFAULT_USER_AGENT};
use crate::http::{HttpRequest, HttpResponse};
use crate::{ScraperError, ScraperResult, StatsTracker};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HttpScraperError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] header::InvalidHeaderName),
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}

#[derive(Clone)]
pub struct HttpScraper {
    client: Client,
    timeout: Duration,
    stats: Arc<StatsTracker>,
}

impl HttpScraper {
    pub fn new() -> Result<Self, HttpScraperError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpScraperError> {
        let client = ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            timeout,
            stats: Arc::new(StatsTracker::new()),
        })
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Result<Self, HttpScraperError> {
        let mut header_map = header::HeaderMap::new();
        header_map.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(DEFAULT_USER_AGENT),
        );

        for (key, value) in headers {
            let name = header::HeaderName::from_bytes(key.as_bytes())?;
            let value = header::HeaderValue::from_str(value)?;
            header_map.insert(name, value);
        }

        self.client = ClientBuilder::new()
            .default_headers(header_map)
            .timeout(self.timeout)
            .build()?;

        Ok(self)
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        let mut req = self
            .client
            .request(request.method.clone(), request.url.clone());

        if config.user_agent != DEFAULT_USER_AGENT {
            req = req.header(header::USER_AGENT, config.user_agent.as_str());
        }

        // Apply spider config headers
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        // Apply request-specific headers
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let timestamp = Utc::now();
        let response = req.send().await.map_err(ScraperError::HttpError)?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = Self::extract_headers(&response);
        // Undecodable bytes become U+FFFD instead of failing the page.
        let body = response.text().await?;

        Ok(HttpResponse {
            url: final_url,
            status,
            headers,
            body,
            timestamp,
            retry_count: 0,
            retry_history: HashMap::new(),
            from_request: Box::new(request),
        })
    }

    fn box_clone(&self) -> Box<dyn Scraper> {
        Box::new(self.clone())
    }

    fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    fn set_stats(&mut self, stats: Arc<StatsTracker>) {
        self.stats = stats;
    }
}
