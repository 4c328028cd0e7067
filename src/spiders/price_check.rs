use crate::core::spider::{SpiderCallback, SpiderConfig};
use crate::extract::PageExtractor;
use crate::http::HttpRequest;
use crate::parser::HtmlDocument;
use crate::{Scraper, ScraperError, ScraperResult};
use std::io::{self, Write};
use url::Url;

/// Fetches a single product page and reads its price.
///
/// # Errors
///
/// Fails on network errors, non-success statuses, a page without a price
/// element, or a price that does not parse.
pub async fn fetch_product_price(
    scraper: &dyn Scraper,
    extractor: &PageExtractor,
    url: Url,
    config: &SpiderConfig,
) -> ScraperResult<f64> {
    let request = HttpRequest::new(url, SpiderCallback::Bootstrap, 0);
    let response = scraper.fetch(request, config).await?;
    if !response.is_success() {
        return Err(ScraperError::FetchFailure {
            url: response.url,
            status: response.status,
        });
    }

    let document = HtmlDocument::parse(&response.body);
    Ok(extractor.extract_price(&document)?)
}

/// Prints one price check as `URL: <url>` followed by either
/// `→ Cena: <price> zł` with two decimals or `→ Błąd: <error>`.
pub fn write_price_check<W: Write>(
    out: &mut W,
    url: &Url,
    result: &ScraperResult<f64>,
) -> io::Result<()> {
    writeln!(out, "URL: {url}")?;
    match result {
        Ok(price) => writeln!(out, "→ Cena: {price:.2} zł"),
        Err(e) => writeln!(out, "→ Błąd: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractError;
    use crate::scrapers::{MockResponse, MockScraper};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn scraper() -> MockScraper {
        MockScraper::routed(vec![
            (
                "https://example-shop.com/product/123",
                MockResponse::ok(
                    r#"<h1>Czajnik</h1><span class="product-price">149,99 zł</span>"#,
                ),
            ),
            (
                "https://example-shop.com/product/456",
                MockResponse::ok(r#"<h1>Toster</h1><p>Produkt niedostępny</p>"#),
            ),
            (
                "https://example-shop.com/product/789",
                MockResponse::ok(r#"<span class="product-price">zapytaj</span>"#),
            ),
        ])
    }

    #[tokio::test]
    async fn test_price_found() {
        let price = fetch_product_price(
            &scraper(),
            &PageExtractor::default(),
            url("https://example-shop.com/product/123"),
            &SpiderConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(price, 149.99);
    }

    #[tokio::test]
    async fn test_missing_price_element() {
        let err = fetch_product_price(
            &scraper(),
            &PageExtractor::default(),
            url("https://example-shop.com/product/456"),
            &SpiderConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ScraperError::ExtractionError(ExtractError::MissingRequiredElement { .. })
        ));
    }

    #[tokio::test]
    async fn test_unparsable_price_names_the_text() {
        let err = fetch_product_price(
            &scraper(),
            &PageExtractor::default(),
            url("https://example-shop.com/product/789"),
            &SpiderConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("zapytaj"), "{err}");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let err = fetch_product_price(
            &scraper(),
            &PageExtractor::default(),
            url("https://example-shop.com/product/000"),
            &SpiderConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ScraperError::FetchFailure { status: 404, .. }
        ));
    }

    #[test]
    fn test_price_check_lines() {
        let page = url("https://example-shop.com/product/123");
        let mut out = Vec::new();

        write_price_check(&mut out, &page, &Ok(149.9)).unwrap();
        write_price_check(
            &mut out,
            &page,
            &Err(ScraperError::FetchFailure {
                url: page.clone(),
                status: 503,
            }),
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "URL: https://example-shop.com/product/123\n\
             → Cena: 149.90 zł\n\
             URL: https://example-shop.com/product/123\n\
             → Błąd: Fetch failed for https://example-shop.com/product/123: HTTP 503\n"
        );
    }
}
