pub mod price_check;
pub mod price_spider;

pub use price_check::{fetch_product_price, write_price_check};
pub use price_spider::PriceSpider;
