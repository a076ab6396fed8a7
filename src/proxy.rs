//! Proxy record and protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol spoken by a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
            Protocol::Socks4 => write!(f, "socks4"),
            Protocol::Socks5 => write!(f, "socks5"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            "socks4" => Ok(Protocol::Socks4),
            "socks5" => Ok(Protocol::Socks5),
            other => Err(format!("unknown protocol: {other}")),
        }
    }
}

/// A proxy found on one of the scraped sites.
///
/// Two records are the same proxy only if every field matches, so the same
/// host seen by two resources is kept twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
    /// IP address or hostname.
    pub host: String,
    /// Port the proxy listens on.
    pub port: u16,
    /// Two letter country code, as listed by the source.
    pub code: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Whether the source lists the proxy as anonymous or elite.
    pub anonymous: bool,
    /// Protocol of the proxy.
    pub protocol: Protocol,
    /// Name of the resource that produced this record.
    pub source: String,
}

impl Proxy {
    /// Create a record without country information.
    pub fn new(host: impl Into<String>, port: u16, protocol: Protocol, source: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            code: None,
            country: None,
            anonymous: false,
            protocol,
            source: source.into(),
        }
    }

    /// Set the country code and name.
    pub fn with_country(mut self, code: impl Into<String>, country: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self.country = Some(country.into());
        self
    }

    /// Set the anonymity flag.
    pub fn with_anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }

    /// `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Proxy URL usable with `reqwest::Proxy::all`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}
