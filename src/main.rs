use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use url::Url;

use pricecrawl::core::retry::RetryConfig;
use pricecrawl::core::spider::{SpiderConfig, DEFAULT_USER_AGENT};
use pricecrawl::scrapers::HttpScraper;
use pricecrawl::spiders::{fetch_product_price, write_price_check, PriceSpider};
use pricecrawl::storage::{create_storage, FeedFormat, StorageType};
use pricecrawl::{Crawler, PageExtractor, Spider};

#[derive(Parser)]
#[command(name = "pricecrawl", version, about = "Product price scraper for shop listing pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl listing pages, following next-page links, and emit one record per product
    Crawl {
        /// Listing pages to start from
        #[arg(required = true)]
        urls: Vec<Url>,
        #[command(flatten)]
        options: CrawlOptions,
    },
    /// Fetch single product pages and print their price
    Price {
        #[arg(required = true)]
        urls: Vec<Url>,
        #[arg(long, env = "PRICECRAWL_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
        user_agent: String,
    },
}

#[derive(Args)]
struct CrawlOptions {
    /// Simultaneous requests
    #[arg(long, env = "PRICECRAWL_MAX_CONCURRENCY", default_value_t = 8)]
    max_concurrency: usize,
    /// Seconds between the start of two requests
    #[arg(long, env = "PRICECRAWL_DELAY", default_value = "1.0", value_parser = parse_delay)]
    delay: Duration,
    /// Fetch pages even when robots.txt disallows them
    #[arg(long, env = "PRICECRAWL_IGNORE_ROBOTS")]
    ignore_robots: bool,
    /// Stop after this many pages
    #[arg(long, env = "PRICECRAWL_MAX_PAGES")]
    max_pages: Option<usize>,
    /// Follow at most this many next-page links from a start URL
    #[arg(long, env = "PRICECRAWL_MAX_DEPTH")]
    max_depth: Option<usize>,
    /// Feed file to write; records go to stdout when omitted
    #[arg(short, long, env = "PRICECRAWL_OUTPUT")]
    output: Option<PathBuf>,
    /// Feed format: json or jsonl
    #[arg(long, env = "PRICECRAWL_FORMAT", default_value_t = FeedFormat::Json)]
    format: FeedFormat,
    #[arg(long, env = "PRICECRAWL_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn parse_delay(s: &str) -> Result<Duration, String> {
    let seconds: f64 = s.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("delay must be a non-negative number of seconds, got {s}"))
}

impl CrawlOptions {
    fn spider_config(&self) -> SpiderConfig {
        let mut config = SpiderConfig::default()
            .with_retry(RetryConfig::standard())
            .with_concurrency(self.max_concurrency)
            .with_request_delay(self.delay)
            .with_obey_robots(!self.ignore_robots)
            .with_user_agent(&self.user_agent);
        if let Some(max_pages) = self.max_pages {
            config = config.with_max_pages(max_pages);
        }
        // depth counts pages, so N followed links means N + 1 levels
        if let Some(max_depth) = self.max_depth {
            config = config.with_depth(max_depth.saturating_add(1));
        }
        config
    }

    fn storage_type(&self) -> StorageType {
        match &self.output {
            Some(path) => StorageType::Feed {
                path: path.clone(),
                format: self.format,
            },
            None => StorageType::Console,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl { urls, options } => crawl(urls, options).await,
        Commands::Price { urls, user_agent } => price(urls, user_agent).await,
    }
}

async fn crawl(urls: Vec<Url>, options: CrawlOptions) -> anyhow::Result<()> {
    let storage = create_storage(options.storage_type()).context("Failed to open output")?;
    let scraper = HttpScraper::new().context("Failed to build HTTP client")?;
    let crawler = Crawler::new(Box::new(scraper));

    let spider = PriceSpider::new(urls, storage)
        .with_stats(crawler.stats())
        .with_config(options.spider_config());
    let report = crawler.run(spider).await;

    crawler.stats().print_summary();
    for failure in &report.failures {
        eprintln!("Failed: {} ({})", failure.url, failure.error);
    }
    if let Some(e) = report.close_error {
        bail!("Output is incomplete: {e}");
    }
    if report.pages_fetched > 0 && report.failures.len() == report.pages_fetched {
        bail!("All {} fetched pages failed", report.pages_fetched);
    }
    Ok(())
}

async fn price(urls: Vec<Url>, user_agent: String) -> anyhow::Result<()> {
    let scraper = HttpScraper::new().context("Failed to build HTTP client")?;
    let extractor = PageExtractor::default();
    let config = SpiderConfig::default()
        .with_retry(RetryConfig::standard())
        .with_user_agent(&user_agent);

    let mut stdout = std::io::stdout();
    for url in urls {
        let result = fetch_product_price(&scraper, &extractor, url.clone(), &config).await;
        write_price_check(&mut stdout, &url, &result)?;
    }
    Ok(())
}
