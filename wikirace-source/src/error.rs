use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Link source returned HTTP {status} for '{title}'")]
    Status { status: u16, title: String },

    #[error("Link source API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;
