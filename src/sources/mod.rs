//! Built-in scrapers for public proxy list sites.

pub mod didsoft;
pub mod proxy_daily;
pub mod proxy_list;

pub use didsoft::Didsoft;
pub use proxy_daily::ProxyDaily;
pub use proxy_list::{ProtocolColumn, ProxyListTable, TableLayout};

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::scrape::Scraper;
use std::sync::Arc;

/// Resource types registered by default, with their member resources.
pub const BUILTIN_TYPES: &[(&str, &[&str])] = &[
    ("http", &["us-proxy", "uk-proxy", "free-proxy-list", "proxy-daily-http", "anonymous-proxy"]),
    ("https", &["us-proxy", "uk-proxy", "free-proxy-list", "ssl-proxy", "anonymous-proxy"]),
    ("socks4", &["socks-proxy", "proxy-daily-socks4"]),
    ("socks5", &["socks-proxy", "proxy-daily-socks5"]),
];

/// The scrapers registered by default, keyed by resource name.
///
/// Didsoft is not among them; it needs a customer URL and is registered by
/// callers that have one.
pub fn builtin(config: &ScrapeConfig) -> Result<Vec<(&'static str, Scraper)>> {
    let client = config.client()?;

    let tables = [
        ProxyListTable::anonymous(client.clone()),
        ProxyListTable::free_proxy_list(client.clone()),
        ProxyListTable::socks(client.clone()),
        ProxyListTable::ssl(client.clone()),
        ProxyListTable::uk(client.clone()),
        ProxyListTable::us(client.clone()),
    ];
    let daily = [
        ProxyDaily::http(client.clone()),
        ProxyDaily::socks4(client.clone()),
        ProxyDaily::socks5(client),
    ];

    let mut scrapers: Vec<(&'static str, Scraper)> = Vec::new();
    for table in tables {
        scrapers.push((table.source(), Arc::new(table)));
    }
    for list in daily {
        scrapers.push((list.source(), Arc::new(list)));
    }
    Ok(scrapers)
}
