pub mod core;
pub mod extract;
pub mod http;
pub mod parser;
pub mod price;
pub mod scrapers;
pub mod spiders;
pub mod stats;
pub mod storage;

pub use crate::core::Crawler;
pub use crate::core::{ScraperError, ScraperResult, Spider};
pub use extract::{PageExtraction, PageExtractor, ProductRecord};
pub use http::{HttpRequest, HttpResponse};
pub use parser::{Document, Element, HtmlDocument};
pub use price::{normalize_price, PriceNormalizer, PriceParseError};
pub use scrapers::Scraper;
pub use stats::StatsTracker;
