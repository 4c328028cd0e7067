use crate::extract::{ProductRecord, ProductSelectors};
use crate::parser::{Document, Element, SelectorError};
use crate::price::{PriceNormalizer, PriceParseError};
use log::{debug, trace};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The element is absent, or present without any text.
    #[error("missing required element {selector:?}")]
    MissingRequiredElement { selector: String },

    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    #[error(transparent)]
    Price(#[from] PriceParseError),
}

/// Everything found on one listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageExtraction {
    /// One entry per product block, in document order.
    pub products: Vec<Result<ProductRecord, ExtractError>>,
    pub next_page: Option<Url>,
}

impl PageExtraction {
    pub fn records(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.iter().filter_map(|p| p.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExtractError> {
        self.products.iter().filter_map(|p| p.as_ref().err())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageExtractor {
    selectors: ProductSelectors,
    normalizer: PriceNormalizer,
}

impl PageExtractor {
    pub fn new(selectors: ProductSelectors) -> Self {
        Self {
            selectors,
            normalizer: PriceNormalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: PriceNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn selectors(&self) -> &ProductSelectors {
        &self.selectors
    }

    /// Extracts product records and the next-page link from `document`.
    ///
    /// Relative links are resolved against `base_url`, which is also the
    /// record URL for product blocks without a link of their own. A block
    /// without a title fails on its own; its siblings and the next-page link
    /// are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSelector`] if a configured selector
    /// does not compile.
    pub fn extract<D: Document>(
        &self,
        document: &D,
        base_url: &Url,
    ) -> Result<PageExtraction, ExtractError> {
        let containers = document.find_all(&self.selectors.product)?;
        debug!("Found {} product blocks on {}", containers.len(), base_url);

        let mut products = Vec::with_capacity(containers.len());
        for container in &containers {
            let product = match self.extract_product(container, base_url) {
                Err(ExtractError::InvalidSelector(e)) => return Err(e.into()),
                other => other,
            };
            products.push(product);
        }

        let next_page = self.extract_next_page(document, base_url)?;
        if let Some(next) = &next_page {
            debug!("Next page of {}: {}", base_url, next);
        }

        Ok(PageExtraction {
            products,
            next_page,
        })
    }

    /// Reads the first price on a single product page.
    ///
    /// # Errors
    ///
    /// [`ExtractError::MissingRequiredElement`] when the page has no price
    /// element, [`ExtractError::Price`] when its text is not a number.
    pub fn extract_price<D: Document>(&self, document: &D) -> Result<f64, ExtractError> {
        let element = document.find_first(&self.selectors.price)?.ok_or_else(|| {
            ExtractError::MissingRequiredElement {
                selector: self.selectors.price.clone(),
            }
        })?;
        Ok(self.normalizer.normalize(element.text().trim())?)
    }

    fn extract_product<E: Element>(
        &self,
        container: &E,
        base_url: &Url,
    ) -> Result<ProductRecord, ExtractError> {
        let name = container
            .find_first(&self.selectors.title)?
            .map(|title| title.text().trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ExtractError::MissingRequiredElement {
                selector: self.selectors.title.clone(),
            })?;

        let price = match container.find_first(&self.selectors.price)? {
            Some(element) => match self.normalizer.normalize(element.text().trim()) {
                Ok(price) => Some(price),
                Err(e) => {
                    debug!("No price for {:?}: {}", name, e);
                    None
                }
            },
            None => None,
        };

        let source_url = first_href(container.find_all(&self.selectors.link)?)
            .and_then(|href| resolve(base_url, &href))
            .unwrap_or_else(|| base_url.clone());

        trace!("Extracted {:?} at {:?} from {}", name, price, source_url);
        Ok(ProductRecord {
            name,
            price,
            source_url,
        })
    }

    fn extract_next_page<D: Document>(
        &self,
        document: &D,
        base_url: &Url,
    ) -> Result<Option<Url>, ExtractError> {
        let anchors = document.find_all(&self.selectors.next_page)?;
        Ok(first_href(anchors).and_then(|href| resolve(base_url, &href)))
    }
}

fn first_href<E: Element>(anchors: Vec<E>) -> Option<String> {
    anchors
        .iter()
        .filter_map(|a| a.attribute("href"))
        .map(|href| href.trim().to_string())
        .find(|href| !href.is_empty())
}

fn resolve(base_url: &Url, href: &str) -> Option<Url> {
    match base_url.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!("Ignoring unresolvable href {:?} on {}: {}", href, base_url, e);
            None
        }
    }
}
