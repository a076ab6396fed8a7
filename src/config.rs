//! Configuration for scrapers and collectors.

use crate::country::DEFAULT_COUNTRY;
use crate::error::{Error, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Default user agent sent to the proxy list sites.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Configuration shared by the built-in scrapers.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Timeout for a single request to a proxy list site.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Country name used when a source has no usable country code.
    pub default_country: String,
}

impl ScrapeConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::new()
    }

    /// Build the HTTP client the scrapers share.
    pub fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(Error::Client)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfigBuilder::new().build()
    }
}

/// Builder for `ScrapeConfig`.
#[derive(Default)]
pub struct ScrapeConfigBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    default_country: Option<String>,
}

impl ScrapeConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the fallback country name.
    pub fn default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = Some(country.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ScrapeConfig {
        ScrapeConfig {
            timeout: self.timeout.unwrap_or(Duration::from_secs(10)),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            default_country: self.default_country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }
}

/// Configuration for a collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Resource types whose resources the collector uses.
    pub resource_types: Vec<String>,
    /// Extra resources the collector uses.
    pub resources: Vec<String>,
    /// Minimum time between two refreshes of the same resource.
    pub refresh_interval: Duration,
    /// Addresses handed to individual resources in place of their built-in ones.
    pub external_urls: HashMap<String, Url>,
}

impl CollectorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CollectorConfigBuilder {
        CollectorConfigBuilder::new()
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfigBuilder::new().build()
    }
}

/// Builder for `CollectorConfig`.
#[derive(Default)]
pub struct CollectorConfigBuilder {
    resource_types: Vec<String>,
    resources: Vec<String>,
    refresh_interval: Option<Duration>,
    external_urls: HashMap<String, Url>,
}

impl CollectorConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource types to collect from.
    pub fn resource_types(mut self, types: Vec<impl Into<String>>) -> Self {
        self.resource_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the individual resources to collect from.
    pub fn resources(mut self, resources: Vec<impl Into<String>>) -> Self {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Set the minimum time between refreshes.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Scrape `resource` from `url` instead of its built-in address.
    pub fn external_url(mut self, resource: impl Into<String>, url: Url) -> Self {
        self.external_urls.insert(resource.into(), url);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CollectorConfig {
        CollectorConfig {
            resource_types: self.resource_types,
            resources: self.resources,
            refresh_interval: self.refresh_interval.unwrap_or(Duration::from_secs(600)),
            external_urls: self.external_urls,
        }
    }
}
