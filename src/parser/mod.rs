pub mod base;
pub mod html;

pub use base::{Document, Element, SelectorError};
pub use html::{HtmlDocument, HtmlElement};
