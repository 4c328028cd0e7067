use crate::core::robots::RobotsCache;
use crate::core::spider::{ParseResult, SpiderConfig, SpiderResponse};
use crate::core::throttle::Throttle;
use crate::http::HttpRequest;
use crate::stats::StatsTracker;
use crate::{Scraper, ScraperError};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, trace, warn};
use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::spawn;
use tokio::task::JoinHandle;
use url::Url;

use crate::{ScraperResult, Spider};

type TaskOutput = (HttpRequest, ScraperResult<ParseResult>);

/// A URL that could not be processed. Other URLs are unaffected.
#[derive(Debug)]
pub struct CrawlFailure {
    pub url: Url,
    pub error: ScraperError,
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    pub pages_fetched: usize,
    pub failures: Vec<CrawlFailure>,
    /// Set when [`Spider::close`] failed, e.g. the output could not be flushed.
    pub close_error: Option<ScraperError>,
}

pub struct Crawler {
    scraper: Box<dyn Scraper>,
    visited_urls: Arc<RwLock<HashSet<String>>>,
    robots: RobotsCache,
    stats: Arc<StatsTracker>,
}

impl Crawler {
    pub fn new(scraper: Box<dyn Scraper>) -> Self {
        info!("Initializing crawler");
        let stats = Arc::new(StatsTracker::new());
        let mut scraper = scraper;
        scraper.set_stats(Arc::clone(&stats));

        Self {
            scraper,
            visited_urls: Arc::new(RwLock::new(HashSet::new())),
            robots: RobotsCache::new(),
            stats,
        }
    }

    pub fn stats(&self) -> Arc<StatsTracker> {
        Arc::clone(&self.stats)
    }

    /// Runs `spider` until no requests remain, the page bound is hit, or
    /// the spider asks to stop.
    ///
    /// A page's follow-up requests are only known once that page has been
    /// fetched and parsed. Per-URL failures, and a failure to close the
    /// spider, are collected in the report.
    pub async fn run<S: Spider + Send + Sync + 'static>(&self, spider: S) -> CrawlReport {
        let spider = Arc::new(spider);
        let config = spider.config().clone();
        let throttle = Arc::new(Throttle::new(config.request_delay));
        let max_concurrency = config.max_concurrency.max(1);

        let mut report = CrawlReport::default();
        let mut pending = VecDeque::new();
        let mut futures: FuturesUnordered<JoinHandle<TaskOutput>> = FuturesUnordered::new();

        info!("Starting spider: {}", spider.name());
        debug!(
            "Max depth: {:?}, max pages: {:?}, concurrency: {}",
            config.max_depth, config.max_pages, max_concurrency
        );

        self.enqueue(spider.start_requests(), &config, &mut pending)
            .await;

        loop {
            while futures.len() < max_concurrency {
                let Some(request) = pending.pop_front() else {
                    break;
                };
                if config
                    .max_pages
                    .is_some_and(|max| report.pages_fetched >= max)
                {
                    info!(
                        "Page limit reached, dropping {} queued URLs",
                        pending.len() + 1
                    );
                    pending.clear();
                    break;
                }

                report.pages_fetched += 1;
                futures.push(self.spawn_request(
                    request,
                    Arc::clone(&spider),
                    Arc::clone(&throttle),
                    &config,
                ));
            }

            let Some(result) = futures.next().await else {
                break;
            };

            match result {
                Ok((_, Ok(ParseResult::Continue(new_requests)))) => {
                    debug!("Found {} new URLs to process", new_requests.len());
                    self.enqueue(new_requests, &config, &mut pending).await;
                }
                Ok((_, Ok(ParseResult::Skip))) => {
                    debug!("Skipping current URL");
                }
                Ok((_, Ok(ParseResult::Stop))) => {
                    info!("Spider requested stop");
                    break;
                }
                Ok((request, Err(error))) => {
                    self.record_failure(&error);
                    warn!("Error processing {}: {}", request.url, error);
                    report.failures.push(CrawlFailure {
                        url: request.url,
                        error,
                    });
                }
                Err(e) => warn!("Task error: {}", e),
            }
        }

        // a stop request can leave tasks in flight
        for handle in futures.iter() {
            handle.abort();
        }

        if let Err(e) = spider.close().await {
            error!("Closing spider {} failed: {}", spider.name(), e);
            self.record_failure(&e);
            report.close_error = Some(e);
        }
        self.stats.finish();
        info!(
            "Spider {} completed. Total URLs processed: {}, failures: {}",
            spider.name(),
            report.pages_fetched,
            report.failures.len()
        );
        report
    }

    async fn enqueue(
        &self,
        requests: Vec<HttpRequest>,
        config: &SpiderConfig,
        pending: &mut VecDeque<HttpRequest>,
    ) {
        for request in requests {
            if self.admit(&request, config).await {
                pending.push_back(request);
            }
        }
    }

    async fn admit(&self, request: &HttpRequest, config: &SpiderConfig) -> bool {
        if config.max_depth.is_some_and(|max| request.depth >= max) {
            debug!("Skipping URL {} - max depth reached", request.url);
            return false;
        }

        let url_str = request.url.to_string();
        if !config.allow_url_revisit && self.visited_urls.read().contains(&url_str) {
            debug!("Skipping URL {} - already visited", url_str);
            return false;
        }

        if config.obey_robots
            && !self
                .robots
                .allowed(self.scraper.as_ref(), &request.url, config)
                .await
        {
            info!("Skipping URL {} - disallowed by robots.txt", url_str);
            self.stats.increment_robots_skipped();
            return false;
        }

        info!("Queueing URL: {} at depth {}", url_str, request.depth);
        if let Some(meta) = &request.meta {
            trace!("Request metadata: {:?}", meta);
        }

        self.visited_urls.write().insert(url_str);
        true
    }

    fn spawn_request<S: Spider + Send + Sync + 'static>(
        &self,
        request: HttpRequest,
        spider: Arc<S>,
        throttle: Arc<Throttle>,
        config: &SpiderConfig,
    ) -> JoinHandle<TaskOutput> {
        let scraper = self.scraper.box_clone();
        let config = config.clone();

        spawn(async move {
            throttle.wait().await;
            let result = match scraper.fetch(request.clone(), &config).await {
                Ok(response) if response.is_success() => {
                    let spider_response = SpiderResponse {
                        callback: request.callback.clone(),
                        response,
                    };
                    spider.parse(spider_response).await
                }
                Ok(response) => Err(ScraperError::FetchFailure {
                    url: response.url,
                    status: response.status,
                }),
                Err(e) => Err(e),
            };
            (request, result)
        })
    }

    fn record_failure(&self, error: &ScraperError) {
        match error {
            ScraperError::FetchFailure { .. } | ScraperError::HttpError(_) => {
                self.stats.increment_fetch_failures()
            }
            ScraperError::StorageError(_) => self.stats.increment_storage_errors(),
            _ => {}
        }
    }
}
