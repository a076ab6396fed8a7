use proxy_scrape::{
    from_fn, Collector, CollectorConfig, Error, Protocol, Proxy, ProxyFilter, Registry, Resource, Scrape, ScrapeError,
    Scraper,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn listing(source: &'static str, protocol: Protocol, hosts: &'static [&'static str]) -> Scraper {
    from_fn(move |_| async move {
        Ok(hosts
            .iter()
            .map(|host| Proxy::new(*host, 8080, protocol, source).with_country("us", "united states"))
            .collect())
    })
}

fn counted(calls: Arc<AtomicUsize>, inner: Scraper) -> Scraper {
    from_fn(move |url: Option<Url>| {
        let calls = calls.clone();
        let inner = inner.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            inner.scrape(url.as_ref()).await
        }
    })
}

fn registry() -> Registry {
    let registry = Registry::new();
    registry.add_resource_type("http", None).unwrap();
    registry.add_resource_type("socks5", None).unwrap();
    registry
        .add_resource("web", listing("web", Protocol::Http, &["1.1.1.1", "2.2.2.2"]), Some(&["http"]))
        .unwrap();
    registry
        .add_resource("socks", listing("socks", Protocol::Socks5, &["3.3.3.3"]), Some(&["socks5"]))
        .unwrap();
    registry
}

#[tokio::test]
async fn test_resources_resolved_from_registry_refresh_independently() {
    let registry = registry();
    let mut names: Vec<String> = registry.resources_of_type("http").unwrap().into_iter().collect();
    names.extend(registry.resources_of_type("socks5").unwrap());
    names.sort();
    assert_eq!(names, vec!["socks", "web"]);

    let resources: Vec<Resource> = names
        .iter()
        .map(|name| Resource::new(name.as_str(), registry.scraper(name).unwrap(), Duration::from_secs(60)).unwrap())
        .collect();

    assert!(resources[0].refresh(false).await.unwrap().is_updated());
    // a fresh refresh on one resource does not throttle the other
    let web = resources[1].refresh(false).await.unwrap().into_proxies().unwrap();
    assert_eq!(web.len(), 2);
    assert!(!resources[0].refresh(false).await.unwrap().is_updated());
}

#[tokio::test]
async fn test_collector_by_type() {
    let registry = registry();
    let config = CollectorConfig::builder().resource_types(vec!["socks5"]).build();
    let collector = Collector::new(&registry, config).unwrap();
    assert_eq!(collector.resource_names(), vec!["socks"]);

    let proxies = collector.get_proxies(&ProxyFilter::new()).await.unwrap();
    assert_eq!(proxies.len(), 1);
    assert_eq!(proxies[0].protocol, Protocol::Socks5);
}

#[tokio::test]
async fn test_collector_defaults_to_all_resources() {
    let registry = registry();
    let collector = Collector::new(&registry, CollectorConfig::default()).unwrap();
    assert_eq!(collector.resource_names(), vec!["socks", "web"]);

    assert_eq!(collector.refresh_proxies(false).await.unwrap(), 2);
    assert_eq!(collector.get_stats(), (3, 3));
}

#[tokio::test]
async fn test_collector_rejects_unknown_names() {
    let registry = registry();

    let config = CollectorConfig::builder().resource_types(vec!["socks4"]).build();
    assert!(matches!(Collector::new(&registry, config), Err(Error::InvalidResourceType(ref t)) if t == "socks4"));

    let config = CollectorConfig::builder().resources(vec!["missing"]).build();
    assert!(matches!(Collector::new(&registry, config), Err(Error::InvalidResource(ref r)) if r == "missing"));
}

#[tokio::test]
async fn test_get_proxy_is_throttled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new();
    registry
        .add_resource("web", counted(calls.clone(), listing("web", Protocol::Http, &["1.1.1.1"])), None)
        .unwrap();

    let collector = Collector::new(&registry, CollectorConfig::default()).unwrap();
    for _ in 0..5 {
        let proxy = collector.get_proxy(&ProxyFilter::new()).await.unwrap().unwrap();
        assert_eq!(proxy.host, "1.1.1.1");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    collector.refresh_proxies(true).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_filter_and_blacklist() {
    let registry = registry();
    let collector = Collector::new(&registry, CollectorConfig::default()).unwrap();

    let http = ProxyFilter::new().protocols([Protocol::Http]);
    let proxies = collector.get_proxies(&http).await.unwrap();
    assert_eq!(proxies.len(), 2);

    let banned = proxies.iter().find(|p| p.host == "1.1.1.1").unwrap().clone();
    collector.blacklist_proxy(&banned);
    for _ in 0..10 {
        let proxy = collector.get_proxy(&http).await.unwrap().unwrap();
        assert_eq!(proxy.host, "2.2.2.2");
    }
    assert_eq!(collector.get_stats(), (3, 2));

    collector.clear_blacklist();
    assert_eq!(collector.get_proxies(&http).await.unwrap().len(), 2);

    collector.remove_proxy(&banned);
    assert_eq!(collector.get_stats(), (2, 2));
    // a forced refresh brings it back
    collector.refresh_proxies(true).await.unwrap();
    assert_eq!(collector.get_stats(), (3, 3));

    let nothing = ProxyFilter::new().codes(["de"]);
    assert!(collector.get_proxy(&nothing).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failing_site_keeps_previous_proxies() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let flaky = from_fn(move |_| {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok([Proxy::new("1.1.1.1", 80, Protocol::Http, "flaky")].into_iter().collect())
            } else {
                Err(ScrapeError::InvalidHtml("table moved".into()))
            }
        }
    });
    let registry = Registry::new();
    registry.add_resource("flaky", flaky, None).unwrap();

    let config = CollectorConfig::builder().refresh_interval(Duration::from_millis(10)).build();
    let collector = Collector::new(&registry, config).unwrap();

    assert_eq!(collector.refresh_proxies(false).await.unwrap(), 1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(collector.refresh_proxies(false).await.unwrap(), 0);
    // the failure did not move the refresh time, so the next call scrapes again
    assert_eq!(collector.refresh_proxies(false).await.unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(collector.get_stats(), (1, 1));
}

#[tokio::test]
async fn test_unrecoverable_error_surfaces_but_keeps_other_results() {
    let registry = registry();
    registry
        .add_resource(
            "broken",
            from_fn(|_| async { Err(ScrapeError::Other(anyhow::anyhow!("unexpected layout code path"))) }),
            None,
        )
        .unwrap();

    let collector = Collector::new(&registry, CollectorConfig::default()).unwrap();
    match collector.refresh_proxies(false).await {
        Err(Error::Scrape { resource, .. }) => assert_eq!(resource, "broken"),
        other => panic!("expected scrape error, got {:?}", other),
    }
    assert_eq!(collector.get_stats(), (3, 3));
}

#[tokio::test]
async fn test_external_url_reaches_scraper() {
    let seen = Arc::new(parking_lot::Mutex::new(HashSet::new()));
    let sink = seen.clone();
    let registry = Registry::new();
    registry
        .add_resource(
            "didsoft-proxy-list",
            from_fn(move |url: Option<Url>| {
                let sink = sink.clone();
                async move {
                    if let Some(url) = url {
                        sink.lock().insert(url.to_string());
                    }
                    Ok(HashSet::new())
                }
            }),
            None,
        )
        .unwrap();

    let url = Url::parse("https://api.example.com/proxies?key=k").unwrap();
    let config = CollectorConfig::builder()
        .resources(vec!["didsoft-proxy-list"])
        .external_url("didsoft-proxy-list", url.clone())
        .build();
    let collector = Collector::new(&registry, config).unwrap();
    collector.refresh_proxies(false).await.unwrap();

    assert!(seen.lock().contains(url.as_str()));
}
