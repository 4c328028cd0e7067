use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Minimal read-only view of an element in a parsed document.
///
/// Queries take CSS selector strings so extraction code stays independent of
/// the HTML library underneath.
pub trait Element: Sized {
    /// Descendants matching `selector`, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError>;

    fn find_first(&self, selector: &str) -> Result<Option<Self>, SelectorError> {
        Ok(self.find_all(selector)?.into_iter().next())
    }

    fn attribute(&self, name: &str) -> Option<String>;

    /// Concatenated text of the element and all its descendants, untrimmed.
    fn text(&self) -> String;
}

pub trait Document {
    type Element<'a>: Element
    where
        Self: 'a;

    fn find_all(&self, selector: &str) -> Result<Vec<Self::Element<'_>>, SelectorError>;

    fn find_first(&self, selector: &str) -> Result<Option<Self::Element<'_>>, SelectorError> {
        Ok(self.find_all(selector)?.into_iter().next())
    }
}
