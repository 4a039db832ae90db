use crate::error::Result;
use crate::result::FetchOutcome;
use std::future::Future;
use std::sync::Arc;

/// Anything that can tell which articles a title links to.
///
/// Implementations return at most `cap` distinct titles with the self-link
/// removed, or one of the negative outcomes. Transport faults are `Err`.
pub trait LinkSource {
    fn fetch(&self, title: &str, cap: usize) -> impl Future<Output = Result<FetchOutcome>> + Send;
}

impl<T: LinkSource + Sync> LinkSource for &T {
    fn fetch(&self, title: &str, cap: usize) -> impl Future<Output = Result<FetchOutcome>> + Send {
        (**self).fetch(title, cap)
    }
}

impl<T: LinkSource + Send + Sync> LinkSource for Arc<T> {
    fn fetch(&self, title: &str, cap: usize) -> impl Future<Output = Result<FetchOutcome>> + Send {
        (**self).fetch(title, cap)
    }
}
