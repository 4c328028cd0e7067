mod crawler;
mod errors;
pub mod retry;
pub mod robots;
pub mod spider;
pub mod throttle;

pub use crawler::{CrawlFailure, CrawlReport, Crawler};
pub use errors::{ScraperError, ScraperResult};
pub use spider::{ParseResult, Spider, SpiderCallback, SpiderConfig, SpiderResponse};

#[cfg(test)]
mod tests;
