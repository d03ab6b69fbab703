use log::debug;
use scraper::{ElementRef, Selector};

/// Minimal document-query capability used by the extractors
pub trait Node: Sized {
    /// Descendants matching a CSS selector, in document order
    fn query(&self, selector: &str) -> Vec<Self>;

    /// Value of an attribute, if present
    fn attribute(&self, name: &str) -> Option<String>;

    /// Concatenated text content
    fn text_content(&self) -> String;

    /// Class names of the element
    fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// First descendant matching a CSS selector
    fn query_first(&self, selector: &str) -> Option<Self> {
        self.query(selector).into_iter().next()
    }
}

/// Parse a selector, an invalid one matches nothing
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!("Invalid selector `{css}`: {e:?}");
            None
        }
    }
}

impl Node for ElementRef<'_> {
    fn query(&self, css: &str) -> Vec<Self> {
        selector(css)
            .map(|sel| self.select(&sel).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_owned)
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }
}
