//! Scraper for the free-proxy-list.net family of sites.
//!
//! All of them render the same table: host, port, code, country, anonymity,
//! then a few site specific columns. Only the way the protocol is listed
//! differs between them.

use crate::error::ScrapeError;
use crate::proxy::{Protocol, Proxy};
use crate::scrape::Scrape;
use crate::utils;

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

static LIST_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table#proxylisttable").expect("valid selector"));
static ANY_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static TBODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));

/// Where a table lists the protocol of a proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtocolColumn {
    /// A yes/no "Https" column; "yes" means https, anything else http.
    HttpsFlag(usize),
    /// Every proxy on the site uses this protocol.
    Fixed(Protocol),
    /// A column holding the protocol name, e.g. "Socks4".
    Version(usize),
}

/// Column layout of one site's table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableLayout {
    pub anonymity: usize,
    pub protocol: ProtocolColumn,
}

impl TableLayout {
    /// Layout of free-proxy-list.net, us-proxy.org and friends.
    pub const HTTPS_FLAG: TableLayout = TableLayout {
        anonymity: 4,
        protocol: ProtocolColumn::HttpsFlag(6),
    };

    /// Layout of sslproxies.org.
    pub const SSL: TableLayout = TableLayout {
        anonymity: 4,
        protocol: ProtocolColumn::Fixed(Protocol::Https),
    };

    /// Layout of socks-proxy.net, which lists the version before anonymity.
    pub const SOCKS: TableLayout = TableLayout {
        anonymity: 5,
        protocol: ProtocolColumn::Version(4),
    };

    fn min_cells(&self) -> usize {
        let protocol = match self.protocol {
            ProtocolColumn::HttpsFlag(i) | ProtocolColumn::Version(i) => i,
            ProtocolColumn::Fixed(_) => 0,
        };
        protocol.max(self.anonymity).max(3) + 1
    }
}

/// A site rendering its proxies in a free-proxy-list.net style table.
pub struct ProxyListTable {
    client: Client,
    source: &'static str,
    url: &'static str,
    layout: TableLayout,
}

impl ProxyListTable {
    pub fn new(client: Client, source: &'static str, url: &'static str, layout: TableLayout) -> Self {
        Self {
            client,
            source,
            url,
            layout,
        }
    }

    pub fn anonymous(client: Client) -> Self {
        Self::new(
            client,
            "anonymous-proxy",
            "https://free-proxy-list.net/anonymous-proxy.html",
            TableLayout::HTTPS_FLAG,
        )
    }

    pub fn free_proxy_list(client: Client) -> Self {
        Self::new(client, "free-proxy-list", "https://free-proxy-list.net/", TableLayout::HTTPS_FLAG)
    }

    pub fn uk(client: Client) -> Self {
        Self::new(client, "uk-proxy", "https://free-proxy-list.net/uk-proxy.html", TableLayout::HTTPS_FLAG)
    }

    pub fn us(client: Client) -> Self {
        Self::new(client, "us-proxy", "https://www.us-proxy.org/", TableLayout::HTTPS_FLAG)
    }

    pub fn ssl(client: Client) -> Self {
        Self::new(client, "ssl-proxy", "https://www.sslproxies.org/", TableLayout::SSL)
    }

    pub fn socks(client: Client) -> Self {
        Self::new(client, "socks-proxy", "https://www.socks-proxy.net/", TableLayout::SOCKS)
    }

    /// Name of the resource this scraper is registered under.
    pub fn source(&self) -> &'static str {
        self.source
    }
}

#[async_trait]
impl Scrape for ProxyListTable {
    async fn scrape(&self, url: Option<&Url>) -> Result<HashSet<Proxy>, ScrapeError> {
        let url = url.map(Url::as_str).unwrap_or(self.url);
        let body = utils::fetch_text(&self.client, url).await?;
        parse_table(&body, self.layout, self.source)
    }
}

/// Parse the proxy table out of a page.
pub fn parse_table(html: &str, layout: TableLayout, source: &str) -> Result<HashSet<Proxy>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table = doc
        .select(&LIST_TABLE)
        .next()
        .or_else(|| doc.select(&ANY_TABLE).next())
        .ok_or_else(|| ScrapeError::InvalidHtml(format!("{source}: proxy table not found")))?;
    let body = table
        .select(&TBODY)
        .next()
        .ok_or_else(|| ScrapeError::InvalidHtml(format!("{source}: proxy table has no body")))?;

    let mut proxies = HashSet::new();
    for row in body.select(&ROW) {
        let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
        match parse_row(&cells, layout, source) {
            Some(proxy) => {
                proxies.insert(proxy);
            }
            None => debug!("{}: skipping row {:?}", source, cells),
        }
    }
    Ok(proxies)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_row(cells: &[String], layout: TableLayout, source: &str) -> Option<Proxy> {
    if cells.len() < layout.min_cells() {
        return None;
    }
    let port = cells[1].parse::<u16>().ok()?;
    let anonymity = cells[layout.anonymity].to_lowercase();
    let anonymous = anonymity == "anonymous" || anonymity == "elite proxy";
    let protocol = match layout.protocol {
        ProtocolColumn::HttpsFlag(i) if cells[i].eq_ignore_ascii_case("yes") => Protocol::Https,
        ProtocolColumn::HttpsFlag(_) => Protocol::Http,
        ProtocolColumn::Fixed(protocol) => protocol,
        ProtocolColumn::Version(i) => cells[i].parse().ok()?,
    };

    Some(
        Proxy::new(cells[0].clone(), port, protocol, source)
            .with_country(cells[2].to_lowercase(), cells[3].to_lowercase())
            .with_anonymous(anonymous),
    )
}
