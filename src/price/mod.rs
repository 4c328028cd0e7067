mod normalizer;

pub use normalizer::{normalize_price, PriceNormalizer, PriceParseError, DEFAULT_CURRENCY_MARKERS};
