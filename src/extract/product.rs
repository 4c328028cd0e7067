use serde::{Deserialize, Serialize};
use url::Url;

/// One product block found on a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    /// `None` when the page shows no parsable price. Never defaulted to zero.
    pub price: Option<f64>,
    #[serde(rename = "url")]
    pub source_url: Url,
}

impl ProductRecord {
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}
