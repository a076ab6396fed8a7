//! Simple example of using proxy-scrape.

use proxy_scrape::sources::Didsoft;
use proxy_scrape::{Collector, CollectorConfig, Protocol, ProxyFilter, Registry, ScrapeConfig};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let scrape_config = ScrapeConfig::builder().timeout(Duration::from_secs(15)).build();
    let registry = Registry::with_defaults(&scrape_config)?;

    println!("Resource types: {:?}", registry.resource_types());

    let mut config = CollectorConfig::builder()
        .resource_types(vec!["http", "https"])
        .refresh_interval(Duration::from_secs(300));

    // didsoft lists are per customer, so only use it when a url is given
    if let Ok(url) = std::env::var("DIDSOFT_URL") {
        let didsoft = Didsoft::new(scrape_config.client()?, scrape_config.default_country.clone());
        registry.add_resource("didsoft-proxy-list", Arc::new(didsoft), Some(&["http"]))?;
        config = config.external_url("didsoft-proxy-list", Url::parse(&url)?);
    }

    let config = config.build();
    let collector = Collector::new(&registry, config)?;

    println!("Scraping {} resources...", collector.resource_names().len());
    let updated = collector.refresh_proxies(true).await?;
    let (total, available) = collector.get_stats();
    println!("{updated} resources updated, {available}/{total} proxies available");

    let filter = ProxyFilter::new().protocols([Protocol::Https]).anonymous(true);
    match collector.get_proxy(&filter).await? {
        Some(proxy) => println!("Anonymous https proxy: {} (from {})", proxy, proxy.source),
        None => println!("No anonymous https proxy found"),
    }

    Ok(())
}
