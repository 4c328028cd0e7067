use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::core::retry::RetryConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::ScraperResult;

pub const DEFAULT_USER_AGENT: &str = concat!("pricecrawl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiderCallback {
    Bootstrap,
    ParsePagination,
    Custom(String),
}

#[derive(Debug)]
pub enum ParseResult {
    Continue(Vec<HttpRequest>),
    Skip,
    Stop,
}

#[derive(Debug, Clone)]
pub struct SpiderResponse {
    pub response: HttpResponse,
    pub callback: SpiderCallback,
}

/// Crawl settings handed to the crawler and the scraper.
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// Simultaneous fetches.
    pub max_concurrency: usize,
    /// Minimum spacing between the start of two requests.
    pub request_delay: Duration,
    /// Skip URLs disallowed by the site's robots.txt.
    pub obey_robots: bool,
    /// Requests at or beyond this depth are dropped. Each followed page is one level deeper.
    pub max_depth: Option<usize>,
    /// Upper bound on pages fetched in one run.
    pub max_pages: Option<usize>,
    /// When false, a URL is fetched at most once per run.
    pub allow_url_revisit: bool,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub retry_config: RetryConfig,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            request_delay: Duration::from_secs(1),
            obey_robots: true,
            max_depth: None,
            max_pages: None,
            allow_url_revisit: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            retry_config: RetryConfig::default(),
        }
    }
}

impl SpiderConfig {
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_obey_robots(mut self, obey: bool) -> Self {
        self.obey_robots = obey;
        self
    }

    pub fn with_allow_url_revisit(mut self, allow: bool) -> Self {
        self.allow_url_revisit = allow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }
}

#[async_trait]
pub trait Spider {
    fn name(&self) -> String;
    fn start_urls(&self) -> Vec<Url>;
    fn config(&self) -> &SpiderConfig;
    fn set_config(&mut self, config: SpiderConfig);

    fn with_config(mut self, config: SpiderConfig) -> Self
    where
        Self: Sized,
    {
        self.set_config(config);
        self
    }

    fn start_requests(&self) -> Vec<HttpRequest> {
        self.start_urls()
            .into_iter()
            .map(|url| HttpRequest::new(url, SpiderCallback::Bootstrap, 0))
            .collect()
    }

    async fn parse(&self, response: SpiderResponse) -> ScraperResult<ParseResult>;

    /// Called once after the crawl loop drains.
    async fn close(&self) -> ScraperResult<()> {
        Ok(())
    }
}
