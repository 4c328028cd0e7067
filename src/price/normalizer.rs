//! Normalization of localized price strings such as `"123,45 zł"` into `f64`.
//!
//! Cleaning is literal: whitespace is stripped, currency markers are removed,
//! every decimal comma becomes a dot, and whatever remains must parse as a
//! finite number. Thousands separators are not understood, so `"1.234,56"`
//! turns into `"1.234.56"` and is rejected rather than guessed at.

use thiserror::Error;

/// Currency markers removed by [`PriceNormalizer::default`].
pub const DEFAULT_CURRENCY_MARKERS: [&str; 2] = ["zł", "PLN"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    /// `raw` is the text as it was handed in, before any cleaning.
    #[error("unparsable price: {raw:?}")]
    UnparsableNumber { raw: String },
}

impl PriceParseError {
    pub fn raw(&self) -> &str {
        match self {
            PriceParseError::UnparsableNumber { raw } => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceNormalizer {
    currency_markers: Vec<String>,
}

impl Default for PriceNormalizer {
    fn default() -> Self {
        Self::with_markers(DEFAULT_CURRENCY_MARKERS)
    }
}

impl PriceNormalizer {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            currency_markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn currency_markers(&self) -> &[String] {
        &self.currency_markers
    }

    /// Parses `raw` into a price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceParseError::UnparsableNumber`] when nothing numeric is
    /// left after cleaning, or when the result is not a finite number.
    pub fn normalize(&self, raw: &str) -> Result<f64, PriceParseError> {
        let mut cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        for marker in &self.currency_markers {
            cleaned = cleaned.replace(marker.as_str(), "");
        }
        let cleaned = cleaned.replace(',', ".");

        match cleaned.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(PriceParseError::UnparsableNumber {
                raw: raw.to_string(),
            }),
        }
    }
}

/// [`PriceNormalizer::normalize`] with the default `zł`/`PLN` markers.
pub fn normalize_price(raw: &str) -> Result<f64, PriceParseError> {
    PriceNormalizer::default().normalize(raw)
}
