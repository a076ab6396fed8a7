//! The scrape function seam between resources and proxy list sites.

use crate::error::ScrapeError;
use crate::proxy::Proxy;

use async_trait::async_trait;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Fetches and parses the proxy listing of one source.
#[async_trait]
pub trait Scrape: Send + Sync {
    /// Scrape the source, using `url` in place of the built-in address when given.
    async fn scrape(&self, url: Option<&Url>) -> Result<HashSet<Proxy>, ScrapeError>;
}

/// Shared handle to a scrape function.
pub type Scraper = Arc<dyn Scrape>;

/// A scrape function built from a closure. See [`from_fn`].
pub struct FnScraper<F> {
    f: F,
}

/// Wrap an async closure as a [`Scraper`].
///
/// ```ignore
/// let scraper = from_fn(|_url| async { Ok(HashSet::new()) });
/// ```
pub fn from_fn<F, Fut>(f: F) -> Scraper
where
    F: Fn(Option<Url>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HashSet<Proxy>, ScrapeError>> + Send + 'static,
{
    Arc::new(FnScraper { f })
}

#[async_trait]
impl<F, Fut> Scrape for FnScraper<F>
where
    F: Fn(Option<Url>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HashSet<Proxy>, ScrapeError>> + Send + 'static,
{
    async fn scrape(&self, url: Option<&Url>) -> Result<HashSet<Proxy>, ScrapeError> {
        (self.f)(url.cloned()).await
    }
}
