pub mod error;
pub mod limiter;
pub mod result;
pub mod source;
pub mod wikipedia;

pub use error::SourceError;
pub use limiter::RateLimiter;
pub use result::{FetchOutcome, normalize_links};
pub use source::LinkSource;
pub use wikipedia::{SourceConfig, WikipediaSource};
