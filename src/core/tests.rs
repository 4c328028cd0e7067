use crate::core::spider::{ParseResult, SpiderConfig, SpiderResponse};
use crate::scrapers::{MockResponse, MockScraper};
use crate::spiders::PriceSpider;
use crate::storage::{
    create_storage, MemoryStorage, StorageBackend, StorageError, StorageItem, StorageType,
};
use crate::{Crawler, ProductRecord, ScraperError, ScraperResult, Spider};
use async_trait::async_trait;
use erased_serde::Serialize as ErasedSerialize;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn listing(products: &[(&str, &str)], next: Option<&str>) -> String {
    let mut html = String::from("<html><body>");
    for (name, price) in products {
        html.push_str(&format!(
            r#"<div class="product"><h2 class="product-title">{name}</h2><span class="product-price">{price}</span><a href="/p/{name}">więcej</a></div>"#
        ));
    }
    if let Some(next) = next {
        html.push_str(&format!(r#"<a class="next-page" href="{next}">Następna</a>"#));
    }
    html.push_str("</body></html>");
    html
}

fn shop() -> Vec<(&'static str, MockResponse)> {
    vec![
        (
            "https://shop.test/sklep",
            MockResponse::ok(listing(
                &[("czajnik", "149,99 zł"), ("toster", "89 zł")],
                Some("/sklep?page=2"),
            )),
        ),
        (
            "https://shop.test/sklep?page=2",
            MockResponse::ok(listing(&[("mikser", "brak")], Some("/wyprzedaz"))),
        ),
        (
            "https://shop.test/wyprzedaz",
            MockResponse::ok(listing(&[("blender", "1 299,00 PLN")], None)),
        ),
    ]
}

fn fast_config() -> SpiderConfig {
    SpiderConfig::default()
        .with_request_delay(Duration::ZERO)
        .with_concurrency(4)
}

fn price_spider(start: &[&str], memory: &MemoryStorage, crawler: &Crawler) -> PriceSpider {
    let storage = create_storage(StorageType::Memory(memory.clone())).unwrap();
    PriceSpider::new(start.iter().map(|s| url(s)).collect(), storage)
        .with_stats(crawler.stats())
}

#[tokio::test]
async fn test_follows_pagination_to_the_last_page() {
    let scraper = MockScraper::routed(shop());
    let crawler = Crawler::new(Box::new(scraper.clone()));
    let memory = MemoryStorage::new();
    let spider =
        price_spider(&["https://shop.test/sklep"], &memory, &crawler).with_config(fast_config());

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 3);
    assert!(report.failures.is_empty());

    let records: Vec<ProductRecord> = memory.data().unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["czajnik", "toster", "mikser", "blender"]);
    assert_eq!(records[0].price, Some(149.99));
    assert_eq!(records[2].price, None);
    assert_eq!(records[3].price, Some(1299.0));
    assert_eq!(records[1].source_url, url("https://shop.test/p/toster"));

    let stats = crawler.stats().get_stats();
    assert_eq!(stats.pages_parsed, 3);
    assert_eq!(stats.products_extracted, 4);
    assert_eq!(stats.products_without_price, 1);
    assert!(stats.end_time.is_some());

    // robots.txt once, then each page once
    let fetched = scraper.fetched_urls();
    assert_eq!(fetched.len(), 4);
    assert_eq!(fetched[0].path(), "/robots.txt");
}

#[tokio::test]
async fn test_pagination_cycle_visits_each_page_once() {
    let scraper = MockScraper::routed(vec![
        (
            "https://shop.test/a",
            MockResponse::ok(listing(&[("a", "1 zł")], Some("/b"))),
        ),
        (
            "https://shop.test/b",
            MockResponse::ok(listing(&[("b", "2 zł")], Some("/a"))),
        ),
    ]);
    let crawler = Crawler::new(Box::new(scraper));
    let memory = MemoryStorage::new();
    let spider =
        price_spider(&["https://shop.test/a"], &memory, &crawler).with_config(fast_config());

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(memory.len(), 2);
}

#[tokio::test]
async fn test_max_pages_bounds_the_run() {
    let crawler = Crawler::new(Box::new(MockScraper::routed(shop())));
    let memory = MemoryStorage::new();
    let spider = price_spider(&["https://shop.test/sklep"], &memory, &crawler)
        .with_config(fast_config().with_max_pages(2));

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(memory.len(), 3);
}

#[tokio::test]
async fn test_max_depth_bounds_the_run() {
    let crawler = Crawler::new(Box::new(MockScraper::routed(shop())));
    let memory = MemoryStorage::new();
    let spider = price_spider(&["https://shop.test/sklep"], &memory, &crawler)
        .with_config(fast_config().with_depth(1));

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(memory.len(), 2);
}

#[tokio::test]
async fn test_robots_disallowed_page_is_skipped() {
    let mut routes = shop();
    routes.push((
        "https://shop.test/robots.txt",
        MockResponse::ok("User-agent: *\nDisallow: /wyprzedaz\n"),
    ));
    let crawler = Crawler::new(Box::new(MockScraper::routed(routes)));
    let memory = MemoryStorage::new();
    let spider =
        price_spider(&["https://shop.test/sklep"], &memory, &crawler).with_config(fast_config());

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(memory.len(), 3);
    assert_eq!(crawler.stats().get_stats().robots_skipped, 1);
}

#[tokio::test]
async fn test_ignoring_robots_fetches_everything() {
    let mut routes = shop();
    routes.push((
        "https://shop.test/robots.txt",
        MockResponse::ok("User-agent: *\nDisallow: /\n"),
    ));
    let scraper = MockScraper::routed(routes);
    let crawler = Crawler::new(Box::new(scraper.clone()));
    let memory = MemoryStorage::new();
    let spider = price_spider(&["https://shop.test/sklep"], &memory, &crawler)
        .with_config(fast_config().with_obey_robots(false));

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 3);
    assert!(scraper
        .fetched_urls()
        .iter()
        .all(|u| u.path() != "/robots.txt"));
}

#[tokio::test]
async fn test_failed_start_url_does_not_stop_the_others() {
    let crawler = Crawler::new(Box::new(MockScraper::routed(shop())));
    let memory = MemoryStorage::new();
    let spider = price_spider(
        &["https://shop.test/zniknal", "https://shop.test/sklep"],
        &memory,
        &crawler,
    )
    .with_config(fast_config());

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 4);
    assert_eq!(memory.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, url("https://shop.test/zniknal"));
    assert!(matches!(
        report.failures[0].error,
        ScraperError::FetchFailure { status: 404, .. }
    ));
    assert_eq!(crawler.stats().get_stats().fetch_failures, 1);
}

struct StoppingSpider {
    config: SpiderConfig,
    parsed: Arc<Mutex<Vec<Url>>>,
}

#[async_trait]
impl Spider for StoppingSpider {
    fn name(&self) -> String {
        "stopping".to_string()
    }

    fn start_urls(&self) -> Vec<Url> {
        vec![url("https://shop.test/sklep")]
    }

    fn config(&self) -> &SpiderConfig {
        &self.config
    }

    fn set_config(&mut self, config: SpiderConfig) {
        self.config = config;
    }

    async fn parse(&self, response: SpiderResponse) -> ScraperResult<ParseResult> {
        self.parsed.lock().push(response.response.url);
        Ok(ParseResult::Stop)
    }
}

#[tokio::test]
async fn test_stop_ends_the_run() {
    let crawler = Crawler::new(Box::new(MockScraper::routed(shop())));
    let parsed = Arc::new(Mutex::new(Vec::new()));
    let spider = StoppingSpider {
        config: fast_config(),
        parsed: Arc::clone(&parsed),
    };

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(parsed.lock().len(), 1);
}

struct FullDisk;

#[async_trait]
impl StorageBackend for FullDisk {
    async fn store_serialized(
        &self,
        _item: StorageItem<Box<dyn ErasedSerialize + Send + Sync>>,
    ) -> Result<(), StorageError> {
        Err(StorageError::OperationError("No space left on device".to_string()))
    }

    async fn finish(&self) -> Result<(), StorageError> {
        Err(StorageError::OperationError("No space left on device".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failures_do_not_stop_pagination() {
    let scraper = MockScraper::routed(shop());
    let crawler = Crawler::new(Box::new(scraper.clone()));
    let storage = create_storage(StorageType::Custom(Arc::new(FullDisk))).unwrap();
    let spider = PriceSpider::new(vec![url("https://shop.test/sklep")], storage)
        .with_stats(crawler.stats())
        .with_config(fast_config());

    let report = crawler.run(spider).await;

    assert_eq!(report.pages_fetched, 3);
    assert!(report.failures.is_empty());
    assert!(matches!(
        report.close_error,
        Some(ScraperError::StorageError(StorageError::OperationError(_)))
    ));
    assert!(scraper
        .fetched_urls()
        .contains(&url("https://shop.test/wyprzedaz")));

    let stats = crawler.stats().get_stats();
    assert_eq!(stats.pages_parsed, 3);
    // four records, then the final flush
    assert_eq!(stats.storage_errors, 5);
}
