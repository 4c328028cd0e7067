use crate::core::spider::{ParseResult, SpiderCallback, SpiderConfig, SpiderResponse};
use crate::extract::{PageExtraction, PageExtractor};
use crate::http::{HttpRequest, HttpResponse};
use crate::parser::HtmlDocument;
use crate::storage::{Storage, StorageBackend, StorageItem};
use crate::{ScraperResult, Spider, StatsTracker};
use async_trait::async_trait;
use log::{debug, error, warn};
use std::sync::Arc;
use url::Url;

/// Walks shop listing pages, storing one record per product block and
/// following the next-page link until there is none.
pub struct PriceSpider {
    name: String,
    start_urls: Vec<Url>,
    extractor: PageExtractor,
    storage: Storage,
    stats: Arc<StatsTracker>,
    config: SpiderConfig,
}

impl PriceSpider {
    pub fn new(start_urls: Vec<Url>, storage: Storage) -> Self {
        Self {
            name: "prices".to_string(),
            start_urls,
            extractor: PageExtractor::default(),
            storage,
            stats: Arc::new(StatsTracker::new()),
            config: SpiderConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_extractor(mut self, extractor: PageExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Page and product counters are recorded here, usually the crawler's.
    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    fn extract_page(&self, response: &HttpResponse) -> ScraperResult<PageExtraction> {
        let document = HtmlDocument::parse(&response.body);
        Ok(self.extractor.extract(&document, &response.url)?)
    }

    async fn parse_listing(&self, response: HttpResponse) -> ScraperResult<ParseResult> {
        let depth = response.from_request.depth;
        let extraction = self.extract_page(&response)?;

        let total = extraction.products.len();
        let mut without_price = 0;
        let mut failures = 0;

        for product in extraction.products {
            match product {
                Ok(record) => {
                    if !record.has_price() {
                        without_price += 1;
                    }
                    let item = StorageItem::new(response.url.clone(), record);
                    if let Err(e) = self.storage.store_serialized(item.erase()).await {
                        self.stats.increment_storage_errors();
                        warn!("Failed to store product from {}: {}", response.url, e);
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!("Skipping product block on {}: {}", response.url, e);
                }
            }
        }
        self.stats.record_page(total - failures, without_price, failures);
        debug!(
            "Parsed {} at depth {}: {} products, {} without price, {} failed",
            response.url,
            depth,
            total - failures,
            without_price,
            failures
        );

        let requests = extraction
            .next_page
            .map(|next| HttpRequest::new(next, SpiderCallback::ParsePagination, depth + 1))
            .into_iter()
            .collect();
        Ok(ParseResult::Continue(requests))
    }
}

#[async_trait]
impl Spider for PriceSpider {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn start_urls(&self) -> Vec<Url> {
        self.start_urls.clone()
    }

    fn config(&self) -> &SpiderConfig {
        &self.config
    }

    fn set_config(&mut self, config: SpiderConfig) {
        self.config = config;
    }

    async fn parse(&self, spider_response: SpiderResponse) -> ScraperResult<ParseResult> {
        match spider_response.callback {
            SpiderCallback::Bootstrap | SpiderCallback::ParsePagination => {
                self.parse_listing(spider_response.response).await
            }
            SpiderCallback::Custom(ref name) => {
                error!("Unhandled custom callback: {}", name);
                Ok(ParseResult::Skip)
            }
        }
    }

    async fn close(&self) -> ScraperResult<()> {
        self.storage.finish().await?;
        Ok(())
    }
}
