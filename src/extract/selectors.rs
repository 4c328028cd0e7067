/// CSS selectors describing a shop's listing markup.
///
/// Defaults match pages shaped like:
///
/// ```html
/// <div class="product">
///   <h2 class="product-title">Nazwa produktu</h2>
///   <span class="product-price">123,45 zł</span>
/// </div>
/// <a class="next-page" href="/sklep?page=2">Następna</a>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSelectors {
    pub product: String,
    pub title: String,
    pub price: String,
    /// Searched inside each product block.
    pub link: String,
    /// Searched in the whole document.
    pub next_page: String,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            product: "div.product".to_string(),
            title: "h2.product-title".to_string(),
            price: "span.product-price".to_string(),
            link: "a".to_string(),
            next_page: "a.next-page".to_string(),
        }
    }
}

impl ProductSelectors {
    pub fn with_product(mut self, selector: impl Into<String>) -> Self {
        self.product = selector.into();
        self
    }

    pub fn with_title(mut self, selector: impl Into<String>) -> Self {
        self.title = selector.into();
        self
    }

    pub fn with_price(mut self, selector: impl Into<String>) -> Self {
        self.price = selector.into();
        self
    }

    pub fn with_link(mut self, selector: impl Into<String>) -> Self {
        self.link = selector.into();
        self
    }

    pub fn with_next_page(mut self, selector: impl Into<String>) -> Self {
        self.next_page = selector.into();
        self
    }
}
