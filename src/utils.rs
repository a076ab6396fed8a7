//! Utility functions for the scrapers.

use crate::error::ScrapeError;
use reqwest::Client;

/// Fetch a page, turning a non-success status into `RequestNotOk`.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::RequestNotOk(status));
    }
    Ok(response.text().await?)
}

/// Parse a `host:port` entry. Quotes and surrounding whitespace are ignored.
pub(crate) fn parse_host_port(line: &str) -> Option<(String, u16)> {
    let line = line.trim().trim_matches(|c| c == '"' || c == '\'');
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (host, port) = line.rsplit_once(':')?;
    let port = port.trim().parse::<u16>().ok()?;
    let host = host.trim();
    if host.is_empty() || port == 0 {
        return None;
    }
    Some((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        assert_eq!(parse_host_port(" 10.0.0.1:3128 "), Some(("10.0.0.1".to_string(), 3128)));
        assert_eq!(parse_host_port("\"10.0.0.1:80\""), Some(("10.0.0.1".to_string(), 80)));
        assert_eq!(parse_host_port("# comment"), None);
        assert_eq!(parse_host_port("10.0.0.1"), None);
        assert_eq!(parse_host_port("10.0.0.1:port"), None);
        assert_eq!(parse_host_port("10.0.0.1:0"), None);
        assert_eq!(parse_host_port(""), None);
    }
}
