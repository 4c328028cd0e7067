mod extractor;
mod product;
mod selectors;

pub use extractor::{ExtractError, PageExtraction, PageExtractor};
pub use product::ProductRecord;
pub use selectors::ProductSelectors;
