//! Collector: a group of resources whose proxies are served together.

use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::proxy::{Protocol, Proxy};
use crate::registry::Registry;
use crate::resource::{Refresh, Resource};

use futures::future;
use log::{info, warn};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Criteria a proxy must meet to be handed out. An empty filter matches
/// every proxy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyFilter {
    codes: HashSet<String>,
    countries: HashSet<String>,
    protocols: HashSet<Protocol>,
    anonymous: Option<bool>,
}

impl ProxyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only proxies with one of these country codes (case-insensitive).
    pub fn codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.codes = codes.into_iter().map(|c| c.as_ref().to_lowercase()).collect();
        self
    }

    /// Only proxies in one of these countries (case-insensitive).
    pub fn countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.countries = countries.into_iter().map(|c| c.as_ref().to_lowercase()).collect();
        self
    }

    /// Only proxies speaking one of these protocols.
    pub fn protocols(mut self, protocols: impl IntoIterator<Item = Protocol>) -> Self {
        self.protocols = protocols.into_iter().collect();
        self
    }

    /// Only anonymous (or only non-anonymous) proxies.
    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = Some(anonymous);
        self
    }

    pub fn matches(&self, proxy: &Proxy) -> bool {
        fn listed(set: &HashSet<String>, value: Option<&str>) -> bool {
            set.is_empty() || value.is_some_and(|v| set.contains(&v.to_lowercase()))
        }

        listed(&self.codes, proxy.code.as_deref())
            && listed(&self.countries, proxy.country.as_deref())
            && (self.protocols.is_empty() || self.protocols.contains(&proxy.protocol))
            && self.anonymous.map_or(true, |anonymous| anonymous == proxy.anonymous)
    }
}

/// Owns one [`Resource`] per source and keeps the latest proxies each of
/// them returned.
pub struct Collector {
    resources: Vec<Resource>,
    /// Latest proxies, by resource name.
    proxies: RwLock<HashMap<String, HashSet<Proxy>>>,
    blacklist: RwLock<HashSet<Proxy>>,
}

impl Collector {
    /// Create a collector for the resources and resource types named in
    /// `config`. When neither is given, every registered resource is used.
    pub fn new(registry: &Registry, config: CollectorConfig) -> Result<Self> {
        let mut names = HashSet::new();
        for resource_type in &config.resource_types {
            let members = registry
                .resources_of_type(resource_type)
                .ok_or_else(|| Error::InvalidResourceType(resource_type.clone()))?;
            names.extend(members);
        }
        for resource in &config.resources {
            if registry.scraper(resource).is_none() {
                return Err(Error::InvalidResource(resource.clone()));
            }
            names.insert(resource.clone());
        }
        if config.resource_types.is_empty() && config.resources.is_empty() {
            names = registry.resources();
        }

        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();

        let mut resources = Vec::with_capacity(names.len());
        for name in names {
            let scraper = registry
                .scraper(&name)
                .ok_or_else(|| Error::InvalidResource(name.clone()))?;
            let mut resource = Resource::new(name.as_str(), scraper, config.refresh_interval)?;
            if let Some(url) = config.external_urls.get(&name) {
                resource = resource.with_external_url(url.clone());
            }
            resources.push(resource);
        }

        info!("Collector created with {} resources", resources.len());

        Ok(Self {
            resources,
            proxies: RwLock::new(HashMap::new()),
            blacklist: RwLock::new(HashSet::new()),
        })
    }

    /// Names of the resources this collector draws from.
    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().map(Resource::name).collect()
    }

    /// Refresh every resource concurrently and keep what they return.
    ///
    /// Returns how many resources produced a new proxy set. If a resource
    /// fails with an unrecoverable error the other results are still kept
    /// and the first such error is returned.
    pub async fn refresh_proxies(&self, force: bool) -> Result<usize> {
        let results = future::join_all(
            self.resources
                .iter()
                .map(|resource| async move { (resource.name(), resource.refresh(force).await) }),
        )
        .await;

        let mut updated = 0;
        let mut first_error = None;
        {
            let mut proxies = self.proxies.write();
            for (name, result) in results {
                match result {
                    Ok(Refresh::Updated(fresh)) => {
                        proxies.insert(name.to_string(), fresh);
                        updated += 1;
                    }
                    Ok(Refresh::Skipped) => {}
                    Err(e) => {
                        warn!("Failed to refresh {}: {}", name, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        if updated > 0 {
            let (total, available) = self.get_stats();
            info!(
                "Collector refreshed {} resources: {}/{} proxies available",
                updated, available, total
            );
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(updated),
        }
    }

    /// A random proxy matching `filter`, refreshing stale resources first.
    pub async fn get_proxy(&self, filter: &ProxyFilter) -> Result<Option<Proxy>> {
        let mut candidates = self.get_proxies(filter).await?;
        if candidates.is_empty() {
            return Ok(None);
        }
        let idx = rand::rng().random_range(0..candidates.len());
        Ok(Some(candidates.swap_remove(idx)))
    }

    /// Every proxy matching `filter`, refreshing stale resources first.
    pub async fn get_proxies(&self, filter: &ProxyFilter) -> Result<Vec<Proxy>> {
        self.refresh_proxies(false).await?;
        Ok(self.matching(filter))
    }

    fn matching(&self, filter: &ProxyFilter) -> Vec<Proxy> {
        let proxies = self.proxies.read();
        let blacklist = self.blacklist.read();
        let unique: HashSet<&Proxy> = proxies
            .values()
            .flatten()
            .filter(|p| !blacklist.contains(*p) && filter.matches(p))
            .collect();
        unique.into_iter().cloned().collect()
    }

    /// Never hand out `proxy` again, even if a source lists it later.
    pub fn blacklist_proxy(&self, proxy: &Proxy) {
        self.blacklist.write().insert(proxy.clone());
    }

    pub fn clear_blacklist(&self) {
        self.blacklist.write().clear();
    }

    /// Drop `proxy` from the stored sets; it comes back if a source lists it
    /// again on a later refresh.
    pub fn remove_proxy(&self, proxy: &Proxy) {
        let mut proxies = self.proxies.write();
        for set in proxies.values_mut() {
            set.remove(proxy);
        }
    }

    /// Get statistics about the collector: (stored, not blacklisted).
    pub fn get_stats(&self) -> (usize, usize) {
        let proxies = self.proxies.read();
        let blacklist = self.blacklist.read();
        let stored: HashSet<&Proxy> = proxies.values().flatten().collect();
        let available = stored.iter().filter(|p| !blacklist.contains(**p)).count();
        (stored.len(), available)
    }
}
