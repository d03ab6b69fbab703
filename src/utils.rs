use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Response};

use crate::error::{Error, Result};
use crate::utils::models::Page;

pub mod models;

/// User-Agent sent to the portal
pub fn user_agent() -> String {
    format!("instructor-tools/{}", env!("CARGO_PKG_VERSION"))
}

/// Client keeping the session cookies
pub fn build_client(user_agent: &str) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .cookie_store(true)
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Read a response into a page
pub async fn into_page(response: Response) -> Result<Page> {
    let url = response.url().clone();
    let status = response.status();
    let body = response.text().await?;

    Ok(Page { url, status, body })
}

/// Error if the page wasn't served successfully
pub fn check_status(page: Page) -> Result<Page> {
    if page.status.is_success() {
        Ok(page)
    } else {
        Err(Error::Status {
            url: page.url.to_string(),
            status: page.status,
        })
    }
}

/// Error unless the response is a successful PDF download
pub fn check_pdf(response: &Response) -> Result<()> {
    let url = response.url().to_string();
    if !response.status().is_success() {
        return Err(Error::Status {
            url,
            status: response.status(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    match content_type.as_deref() {
        Some("application/pdf") => Ok(()),
        _ => Err(Error::NotPdf { url, content_type }),
    }
}

/// Name of a downloaded certificate, i.e.: `2024-03-05 First aid.pdf`
pub fn certificate_filename(date: chrono::NaiveDate, name: &str) -> String {
    // Course names may contain slashes
    format!("{date} {}.pdf", name.replace(['/', '\\'], "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use url::Url;

    fn page(status: StatusCode) -> Page {
        Page {
            url: Url::parse("https://lms.example.com/user/").unwrap(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn status_check() {
        assert!(check_status(page(StatusCode::OK)).is_ok());
        assert!(check_status(page(StatusCode::NO_CONTENT)).is_ok());

        let err = check_status(page(StatusCode::FOUND)).unwrap_err();
        assert!(matches!(
            err,
            Error::Status {
                status: StatusCode::FOUND,
                ..
            }
        ));
        assert!(check_status(page(StatusCode::INTERNAL_SERVER_ERROR)).is_err());
    }

    #[test]
    fn filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            certificate_filename(date, "First aid"),
            "2024-03-05 First aid.pdf"
        );
        assert_eq!(
            certificate_filename(date, "GDPR/EU"),
            "2024-03-05 GDPR-EU.pdf"
        );
    }
}
