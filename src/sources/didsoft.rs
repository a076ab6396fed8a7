//! Scraper for the didsoft proxy API, a JSON document of `host:port#CC`
//! entries. The API is per-customer, so it only works with an external URL.

use crate::country;
use crate::error::ScrapeError;
use crate::proxy::{Protocol, Proxy};
use crate::scrape::Scrape;
use crate::utils;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use url::Url;

const SOURCE: &str = "didsoft-proxy-list";

#[derive(Debug, Deserialize)]
struct Listing {
    result: Vec<String>,
}

pub struct Didsoft {
    client: Client,
    default_country: String,
}

impl Didsoft {
    pub fn new(client: Client, default_country: impl Into<String>) -> Self {
        Self {
            client,
            default_country: default_country.into(),
        }
    }
}

#[async_trait]
impl Scrape for Didsoft {
    async fn scrape(&self, url: Option<&Url>) -> Result<HashSet<Proxy>, ScrapeError> {
        let url = url.ok_or_else(|| anyhow!("{SOURCE} needs an external url"))?;
        let body = utils::fetch_text(&self.client, url.as_str()).await?;
        parse_listing(&body, &self.default_country)
    }
}

/// Parse a didsoft JSON listing.
pub fn parse_listing(body: &str, default_country: &str) -> Result<HashSet<Proxy>, ScrapeError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| ScrapeError::InvalidHtml(format!("{SOURCE}: {e}")))?;

    Ok(listing
        .result
        .iter()
        .filter_map(|entry| {
            let (addr, code) = entry.split_once('#')?;
            if code.contains('#') {
                return None;
            }
            let (host, port) = utils::parse_host_port(addr)?;
            let country = country::name_or(Some(code), default_country);
            Some(
                Proxy::new(host, port, Protocol::Http, SOURCE)
                    .with_country(code, country)
                    .with_anonymous(true),
            )
        })
        .collect())
}
