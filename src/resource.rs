//! A scrape function with refresh throttling.

use crate::error::{Error, Result};
use crate::proxy::Proxy;
use crate::scrape::Scraper;

use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Outcome of [`Resource::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The scrape ran and returned these proxies.
    Updated(HashSet<Proxy>),
    /// Nothing was scraped: too soon since the last refresh, or the site failed.
    Skipped,
}

impl Refresh {
    pub fn is_updated(&self) -> bool {
        matches!(self, Refresh::Updated(_))
    }

    pub fn into_proxies(self) -> Option<HashSet<Proxy>> {
        match self {
            Refresh::Updated(proxies) => Some(proxies),
            Refresh::Skipped => None,
        }
    }
}

/// A named proxy source that is scraped at most once per refresh interval.
pub struct Resource {
    name: String,
    scraper: Scraper,
    refresh_interval: Duration,
    external_url: Option<Url>,
    /// Reference point for `last_refresh`.
    epoch: Instant,
    /// Milliseconds since `epoch` plus one at the last successful dispatch; 0 is never.
    last_refresh: AtomicU64,
    /// Held for the whole check-and-scrape on the slow path.
    lock: Mutex<()>,
}

impl Resource {
    /// Create a resource. The interval must be positive.
    pub fn new(name: impl Into<String>, scraper: Scraper, refresh_interval: Duration) -> Result<Self> {
        if refresh_interval.is_zero() {
            return Err(Error::InvalidRefreshInterval);
        }
        Ok(Self {
            name: name.into(),
            scraper,
            refresh_interval,
            external_url: None,
            epoch: Instant::now(),
            last_refresh: AtomicU64::new(0),
            lock: Mutex::new(()),
        })
    }

    /// Pass `url` to the scrape function instead of its built-in address.
    pub fn with_external_url(mut self, url: Url) -> Self {
        self.external_url = Some(url);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn external_url(&self) -> Option<&Url> {
        self.external_url.as_ref()
    }

    /// When the last successful scrape was dispatched, if ever.
    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_dispatch().map(|offset| self.epoch + offset)
    }

    fn last_dispatch(&self) -> Option<Duration> {
        match self.last_refresh.load(Ordering::Acquire) {
            0 => None,
            stamp => Some(Duration::from_millis(stamp - 1)),
        }
    }

    fn is_due(&self) -> bool {
        match self.last_dispatch() {
            None => true,
            Some(last) => self.epoch.elapsed() >= last + self.refresh_interval,
        }
    }

    /// Scrape the source if the refresh interval has passed, or always when `force` is set.
    ///
    /// Site failures (bad page, bad status, failed request) are logged and
    /// reported as [`Refresh::Skipped`] without touching the refresh time, so
    /// the next call tries again. Any other scrape error is returned.
    ///
    /// Calls overlapping an in-flight scrape wait for it and then see the new
    /// refresh time instead of scraping again.
    pub async fn refresh(&self, force: bool) -> Result<Refresh> {
        if !force && !self.is_due() {
            debug!("{}: refreshed less than {:?} ago, skipping", self.name, self.refresh_interval);
            return Ok(Refresh::Skipped);
        }

        let _guard = self.lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if !force && !self.is_due() {
            debug!("{}: refreshed by a concurrent caller, skipping", self.name);
            return Ok(Refresh::Skipped);
        }

        let dispatched = self.epoch.elapsed();
        match self.scraper.scrape(self.external_url.as_ref()).await {
            Ok(proxies) => {
                let stamp = u64::try_from(dispatched.as_millis()).unwrap_or(u64::MAX - 1) + 1;
                self.last_refresh.fetch_max(stamp, Ordering::AcqRel);
                info!("{}: refreshed {} proxies", self.name, proxies.len());
                Ok(Refresh::Updated(proxies))
            }
            Err(e) if e.is_recoverable() => {
                warn!("{}: refresh failed: {}", self.name, e);
                Ok(Refresh::Skipped)
            }
            Err(source) => Err(Error::Scrape {
                resource: self.name.clone(),
                source,
            }),
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("refresh_interval", &self.refresh_interval)
            .field("external_url", &self.external_url)
            .field("last_refresh", &self.last_refresh())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::proxy::Protocol;
    use crate::scrape::from_fn;
    use reqwest::StatusCode;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn sample() -> HashSet<Proxy> {
        [Proxy::new("1.2.3.4", 8080, Protocol::Http, "test")].into_iter().collect()
    }

    fn counting(calls: Arc<AtomicUsize>) -> Scraper {
        from_fn(move |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(sample())
            }
        })
    }

    #[test]
    fn test_zero_interval_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = Resource::new("test", counting(calls), Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::InvalidRefreshInterval));
    }

    #[tokio::test]
    async fn test_second_refresh_within_interval_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resource = Resource::new("test", counting(calls.clone()), Duration::from_secs(60)).unwrap();
        assert!(resource.last_refresh().is_none());

        let first = resource.refresh(false).await.unwrap();
        assert_eq!(first, Refresh::Updated(sample()));
        assert!(resource.last_refresh().is_some());

        let second = resource.refresh(false).await.unwrap();
        assert_eq!(second, Refresh::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_always_scrapes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resource = Resource::new("test", counting(calls.clone()), Duration::from_secs(60)).unwrap();

        for _ in 0..3 {
            assert!(resource.refresh(true).await.unwrap().is_updated());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_refreshes_again_after_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resource = Resource::new("test", counting(calls.clone()), Duration::from_millis(20)).unwrap();

        assert!(resource.refresh(false).await.unwrap().is_updated());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(resource.refresh(false).await.unwrap().is_updated());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_site_failure_is_swallowed_and_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let scraper = from_fn(move |_| {
            let counter = counter.clone();
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(ScrapeError::InvalidHtml("no table".into())),
                    1 => Err(ScrapeError::RequestNotOk(StatusCode::SERVICE_UNAVAILABLE)),
                    _ => Ok(sample()),
                }
            }
        });
        let resource = Resource::new("flaky", scraper, Duration::from_secs(60)).unwrap();

        assert_eq!(resource.refresh(false).await.unwrap(), Refresh::Skipped);
        assert!(resource.last_refresh().is_none());
        assert_eq!(resource.refresh(false).await.unwrap(), Refresh::Skipped);
        assert!(resource.last_refresh().is_none());
        assert!(resource.refresh(false).await.unwrap().is_updated());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unrecognized_failure_propagates() {
        let scraper = from_fn(|_| async { Err(ScrapeError::Other(anyhow::anyhow!("parser bug"))) });
        let resource = Resource::new("broken", scraper, Duration::from_secs(60)).unwrap();

        match resource.refresh(false).await {
            Err(Error::Scrape { resource, source }) => {
                assert_eq!(resource, "broken");
                assert!(!source.is_recoverable());
            }
            other => panic!("expected scrape error, got {:?}", other),
        }
        assert!(resource.last_refresh().is_none());
    }

    #[tokio::test]
    async fn test_external_url_is_passed() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = seen.clone();
        let scraper = from_fn(move |url: Option<Url>| {
            let sink = sink.clone();
            async move {
                *sink.lock() = url;
                Ok(HashSet::new())
            }
        });
        let url = Url::parse("https://api.example.com/list?key=abc").unwrap();
        let resource = Resource::new("didsoft", scraper, Duration::from_secs(60))
            .unwrap()
            .with_external_url(url.clone());

        assert_eq!(resource.external_url(), Some(&url));
        resource.refresh(false).await.unwrap();
        assert_eq!(*seen.lock(), Some(url));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refresh_scrapes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let scraper = from_fn(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(sample())
            }
        });
        let resource = Arc::new(Resource::new("slow", scraper, Duration::from_secs(60)).unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let resource = resource.clone();
                tokio::spawn(async move { resource.refresh(false).await })
            })
            .collect();

        let mut updated = 0;
        for task in tasks {
            match task.await.unwrap().unwrap() {
                Refresh::Updated(proxies) => {
                    assert_eq!(proxies, sample());
                    updated += 1;
                }
                Refresh::Skipped => {}
            }
        }
        assert_eq!(updated, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
