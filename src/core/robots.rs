use crate::core::spider::{SpiderCallback, SpiderConfig};
use crate::http::HttpRequest;
use crate::Scraper;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use texting_robots::Robot;
use url::Url;

/// robots.txt rules per origin, fetched on first use.
///
/// A missing, unreachable or malformed robots.txt allows everything.
#[derive(Default)]
pub struct RobotsCache {
    robots: RwLock<HashMap<String, Option<Arc<Robot>>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn allowed(&self, scraper: &dyn Scraper, url: &Url, config: &SpiderConfig) -> bool {
        let origin = url.origin().ascii_serialization();

        let cached = self.robots.read().get(&origin).cloned();
        let robot = match cached {
            Some(robot) => robot,
            None => {
                let robot = Self::fetch(scraper, url, config).await;
                self.robots.write().insert(origin, robot.clone());
                robot
            }
        };

        robot.map_or(true, |robot| robot.allowed(url.as_str()))
    }

    async fn fetch(scraper: &dyn Scraper, url: &Url, config: &SpiderConfig) -> Option<Arc<Robot>> {
        let robots_url = url.join("/robots.txt").ok()?;
        let request = HttpRequest::new(
            robots_url.clone(),
            SpiderCallback::Custom("robots".to_string()),
            0,
        );

        let response = match scraper.fetch_single(request, config).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not fetch {}: {}", robots_url, e);
                return None;
            }
        };

        if !response.is_success() {
            debug!("No robots.txt at {} (HTTP {})", robots_url, response.status);
            return None;
        }

        match Robot::new(agent_token(&config.user_agent), response.body.as_bytes()) {
            Ok(robot) => {
                info!("Loaded robots.txt from {}", robots_url);
                Some(Arc::new(robot))
            }
            Err(e) => {
                warn!("Ignoring unparsable {}: {}", robots_url, e);
                None
            }
        }
    }
}

/// `"PriceBot/2.0 (+info)"` -> `"PriceBot"`
fn agent_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|token| !token.is_empty())
        .unwrap_or(user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{MockResponse, MockScraper};

    const ROBOTS: &str = "User-agent: *\nDisallow: /koszyk\n\nUser-agent: pricecrawl\nDisallow: /admin\n";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_disallowed_paths() {
        let scraper = MockScraper::routed(vec![(
            "http://example-shop.com/robots.txt",
            MockResponse::ok(ROBOTS),
        )]);
        let cache = RobotsCache::new();
        let config = SpiderConfig::default();

        assert!(cache.allowed(&scraper, &url("http://example-shop.com/sklep"), &config).await);
        assert!(!cache.allowed(&scraper, &url("http://example-shop.com/admin/x"), &config).await);

        // fetched once per origin
        assert_eq!(scraper.fetched_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_everything() {
        let scraper = MockScraper::routed(Vec::<(&str, MockResponse)>::new());
        let cache = RobotsCache::new();
        let config = SpiderConfig::default();

        assert!(cache.allowed(&scraper, &url("http://example-shop.com/admin"), &config).await);
        assert!(cache.allowed(&scraper, &url("http://example-shop.com/koszyk"), &config).await);
        assert_eq!(scraper.fetched_urls().len(), 1);
    }

    #[test]
    fn test_agent_token() {
        assert_eq!(agent_token("pricecrawl/0.1.0"), "pricecrawl");
        assert_eq!(agent_token("PriceBot (+http://x)"), "PriceBot");
        assert_eq!(agent_token(""), "");
    }
}
