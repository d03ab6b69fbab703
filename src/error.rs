use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL: {url} • status {status}")]
    Status { url: String, status: StatusCode },

    #[error("URL: {url} • expected application/pdf, got {content_type:?}")]
    NotPdf {
        url: String,
        content_type: Option<String>,
    },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("No form matching `{selector}` on {url}")]
    FormNotFound { selector: String, url: String },

    #[error("Unexpected page {0}, the quiz runner was expected")]
    UnexpectedFlow(String),

    #[error("Unsupported course.")]
    UnsupportedCourse,

    #[error("Course `{0}` has neither a play nor a certificate link")]
    MissingCourseId(String),

    #[error("Malformed play link: {0}")]
    MalformedPlayLink(String),

    #[error("Invalid date `{0}`, DD.MM.YYYY was expected")]
    InvalidDate(String),

    #[error("Password command failed: {0}")]
    PasswordCommand(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("pdftotext failed: {0}")]
    TextLayout(String),

    #[error("No signature placeholder (..........) on the certificate")]
    PlaceholderNotFound,

    #[error("Page has no usable {0}")]
    MissingPageBox(&'static str),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
