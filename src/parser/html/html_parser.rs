use crate::parser::{Document, Element, SelectorError};
use log::trace;
use scraper::{ElementRef, Html, Selector};

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// An HTML page parsed with `scraper`.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(body: &str) -> Self {
        trace!("Parsing HTML document ({} bytes)", body.len());
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn parse_fragment(fragment: &str) -> Self {
        Self {
            html: Html::parse_fragment(fragment),
        }
    }
}

impl Document for HtmlDocument {
    type Element<'a> = HtmlElement<'a>;

    fn find_all(&self, selector: &str) -> Result<Vec<HtmlElement<'_>>, SelectorError> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).map(HtmlElement).collect())
    }

    fn find_first(&self, selector: &str) -> Result<Option<HtmlElement<'_>>, SelectorError> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).next().map(HtmlElement))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HtmlElement<'a>(ElementRef<'a>);

impl<'a> HtmlElement<'a> {
    pub fn tag_name(&self) -> &'a str {
        self.0.value().name()
    }
}

impl Element for HtmlElement<'_> {
    fn find_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError> {
        let selector = compile(selector)?;
        Ok(self.0.select(&selector).map(HtmlElement).collect())
    }

    fn find_first(&self, selector: &str) -> Result<Option<Self>, SelectorError> {
        let selector = compile(selector)?;
        Ok(self.0.select(&selector).next().map(HtmlElement))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }

    fn text(&self) -> String {
        self.0.text().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul id="menu">
            <li><a href="/a" class="item">First</a></li>
            <li><a href="/b" class="item">Second <b>bold</b></a></li>
            <li><a class="item">No link</a></li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_find_all_in_document_order() {
        let doc = HtmlDocument::parse(PAGE);
        let items = doc.find_all("a.item").unwrap();
        let texts: Vec<String> = items.iter().map(Element::text).collect();
        assert_eq!(texts, vec!["First", "Second bold", "No link"]);
    }

    #[test]
    fn test_attribute_and_missing_attribute() {
        let doc = HtmlDocument::parse(PAGE);
        let items = doc.find_all("a.item").unwrap();
        assert_eq!(items[0].attribute("href").as_deref(), Some("/a"));
        assert_eq!(items[2].attribute("href"), None);
        assert_eq!(items[0].tag_name(), "a");
    }

    #[test]
    fn test_nested_queries_are_scoped() {
        let doc = HtmlDocument::parse(PAGE);
        let second = doc.find_all("li").unwrap()[1];
        let bold = second.find_first("b").unwrap().unwrap();
        assert_eq!(bold.text(), "bold");
        assert!(second.find_first("ul").unwrap().is_none());
    }

    #[test]
    fn test_find_first_none_when_absent() {
        let doc = HtmlDocument::parse(PAGE);
        assert!(doc.find_first("a.next-page").unwrap().is_none());
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let doc = HtmlDocument::parse(PAGE);
        let err = doc.find_all("a[").unwrap_err();
        assert_eq!(err.selector, "a[");
    }

    #[test]
    fn test_fragment_parsing() {
        let doc = HtmlDocument::parse_fragment(r#"<span class="product-price">9,99 zł</span>"#);
        let price = doc.find_first("span.product-price").unwrap().unwrap();
        assert_eq!(price.text(), "9,99 zł");
    }
}
