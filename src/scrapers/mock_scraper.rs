use crate::core::spider::SpiderConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::{ScraperResult, StatsTracker};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use url::Url;

use super::Scraper;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<std::time::Duration>,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: None,
        }
    }
}

/// Offline [`Scraper`] serving canned responses.
///
/// Built with [`MockScraper::new`] it replays `responses` in order (cycling
/// at the end) whatever the URL. Built with [`MockScraper::routed`] it
/// answers per URL and returns 404 for anything unknown. Clones share the
/// log of fetched URLs.
#[derive(Clone)]
pub struct MockScraper {
    responses: Arc<Vec<MockResponse>>,
    routes: Arc<HashMap<String, MockResponse>>,
    current_response: Arc<AtomicUsize>,
    fetched: Arc<Mutex<Vec<Url>>>,
    stats: Arc<StatsTracker>,
}

impl MockScraper {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(responses),
            routes: Arc::new(HashMap::new()),
            current_response: Arc::new(AtomicUsize::new(0)),
            fetched: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(StatsTracker::new()),
        }
    }

    pub fn routed<S: AsRef<str>>(routes: Vec<(S, MockResponse)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(url, response)| {
                let key = Url::parse(url.as_ref())
                    .map(String::from)
                    .unwrap_or_else(|_| url.as_ref().to_string());
                (key, response)
            })
            .collect();

        Self {
            routes: Arc::new(routes),
            ..Self::new(Vec::new())
        }
    }

    pub fn fetched_urls(&self) -> Vec<Url> {
        self.fetched.lock().clone()
    }

    fn next_response(&self, url: &Url) -> MockResponse {
        if !self.routes.is_empty() || self.responses.is_empty() {
            return self
                .routes
                .get(url.as_str())
                .cloned()
                .unwrap_or_else(|| MockResponse {
                    status: 404,
                    body: "Not Found".to_string(),
                    delay: None,
                });
        }

        let index = self.current_response.fetch_add(1, Ordering::SeqCst);
        self.responses[index % self.responses.len()].clone()
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        _config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        self.fetched.lock().push(request.url.clone());
        let response = self.next_response(&request.url);

        if let Some(delay) = response.delay {
            sleep(delay).await;
        }

        Ok(HttpResponse {
            url: request.url.clone(),
            status: response.status,
            headers: HashMap::new(),
            body: response.body,
            timestamp: Utc::now(),
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
