//! # proxy-scrape
//!
//! Scrape free proxy lists from public websites.
//!
//! Each site is a *resource*: a scrape function registered by name in a
//! [`Registry`] and grouped into *resource types* such as `http` or `socks5`.
//! A [`Resource`] wraps one scrape function and refreshes it at most once per
//! refresh interval; a [`Collector`] does that for a whole group of resources
//! and serves the proxies they found.

pub mod collector;
pub mod config;
pub mod country;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod resource;
pub mod scrape;
pub mod sources;
mod utils;

pub use collector::{Collector, ProxyFilter};
pub use config::{CollectorConfig, CollectorConfigBuilder, ScrapeConfig, ScrapeConfigBuilder};
pub use error::{Error, Result, ScrapeError};
pub use proxy::{Protocol, Proxy};
pub use registry::Registry;
pub use resource::{Refresh, Resource};
pub use scrape::{from_fn, Scrape, Scraper};
