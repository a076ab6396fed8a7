//! Scraper for proxy-daily.com, which lists plain `host:port` lines in three
//! blocks: http, socks4 and socks5.

use crate::error::ScrapeError;
use crate::proxy::{Protocol, Proxy};
use crate::scrape::Scrape;
use crate::utils;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const PROXY_DAILY_URL: &str = "http://www.proxy-daily.com";

static LIST: Lazy<Selector> = Lazy::new(|| Selector::parse("div#free-proxy-list").expect("valid selector"));
static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse(".freeProxyStyle").expect("valid selector"));

/// One of the three proxy-daily lists.
pub struct ProxyDaily {
    client: Client,
    protocol: Protocol,
}

impl ProxyDaily {
    pub fn http(client: Client) -> Self {
        Self {
            client,
            protocol: Protocol::Http,
        }
    }

    pub fn socks4(client: Client) -> Self {
        Self {
            client,
            protocol: Protocol::Socks4,
        }
    }

    pub fn socks5(client: Client) -> Self {
        Self {
            client,
            protocol: Protocol::Socks5,
        }
    }

    /// Name of the resource this scraper is registered under.
    pub fn source(&self) -> &'static str {
        match self.protocol {
            Protocol::Socks4 => "proxy-daily-socks4",
            Protocol::Socks5 => "proxy-daily-socks5",
            _ => "proxy-daily-http",
        }
    }
}

#[async_trait]
impl Scrape for ProxyDaily {
    async fn scrape(&self, url: Option<&Url>) -> Result<HashSet<Proxy>, ScrapeError> {
        let url = url.map(Url::as_str).unwrap_or(PROXY_DAILY_URL);
        let body = utils::fetch_text(&self.client, url).await?;
        parse_block(&body, self.protocol, self.source())
    }
}

/// Parse the block for `protocol` out of a proxy-daily page.
pub fn parse_block(html: &str, protocol: Protocol, source: &str) -> Result<HashSet<Proxy>, ScrapeError> {
    let index = match protocol {
        Protocol::Http => 0,
        Protocol::Socks4 => 1,
        Protocol::Socks5 => 2,
        Protocol::Https => return Err(ScrapeError::InvalidHtml(format!("{source}: no https list"))),
    };

    let doc = Html::parse_document(html);
    let list = doc
        .select(&LIST)
        .next()
        .ok_or_else(|| ScrapeError::InvalidHtml(format!("{source}: proxy list not found")))?;
    let block = list
        .select(&BLOCK)
        .nth(index)
        .ok_or_else(|| ScrapeError::InvalidHtml(format!("{source}: {protocol} block not found")))?;

    let text = block.text().collect::<String>();
    Ok(text
        .lines()
        .filter_map(utils::parse_host_port)
        .map(|(host, port)| Proxy::new(host, port, protocol, source))
        .collect())
}
