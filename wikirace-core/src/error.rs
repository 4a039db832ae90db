use thiserror::Error;
use wikirace_source::SourceError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored links could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown article: {0}")]
    NodeUnknown(String),

    #[error("No path from '{from}' to '{to}'")]
    NoPath { from: String, to: String },
}

/// Why a query endpoint was rejected by the link source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFault {
    NotFound,
    Ambiguous,
}

impl EndpointFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointFault::NotFound => "not found",
            EndpointFault::Ambiguous => "ambiguous",
        }
    }
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Invalid article '{title}': {}", reason.as_str())]
    InvalidEndpoint { title: String, reason: EndpointFault },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not validate endpoints: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, PathError>;
