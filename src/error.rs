//! Error types for the proxy-scrape crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure reported by a scrape function.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page did not have the expected structure.
    #[error("unexpected page layout: {0}")]
    InvalidHtml(String),
    /// The site answered with a non-success status.
    #[error("request returned status {0}")]
    RequestNotOk(StatusCode),
    /// The request never completed (connect, DNS, timeout, body read).
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// Anything else; treated as a bug rather than a site outage.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrapeError {
    /// Whether a refresh may absorb this failure and report "not refreshed".
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScrapeError::Other(_))
    }
}

/// Errors surfaced by the registry, resources and collectors.
#[derive(Debug, Error)]
pub enum Error {
    /// A resource with this name is already registered.
    #[error("{0} is already defined as a resource")]
    ResourceAlreadyDefined(String),
    /// A resource type with this name is already registered.
    #[error("{0} is already defined as a resource type")]
    ResourceTypeAlreadyDefined(String),
    /// The name does not refer to a registered resource.
    #[error("{0} is an invalid resource")]
    InvalidResource(String),
    /// The name does not refer to a registered resource type.
    #[error("{0} is not a defined resource type")]
    InvalidResourceType(String),
    /// Resources must wait a positive amount of time between refreshes.
    #[error("refresh interval must be greater than zero")]
    InvalidRefreshInterval,
    /// A scrape failed in a way a refresh does not recover from.
    #[error("resource {resource} failed: {source}")]
    Scrape {
        resource: String,
        #[source]
        source: ScrapeError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
