use reqwest::StatusCode;
use scraper::Html;
use url::Url;

/// A fetched webpage
#[derive(Clone, Debug)]
pub struct Page {
    /// Final URL, after redirections
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

impl Page {
    /// Parse document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}
