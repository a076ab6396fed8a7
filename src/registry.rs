//! Registry of resources and resource types.

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::scrape::Scraper;
use crate::sources;

use log::{debug, info};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Maps resource names to scrape functions and resource type names to
/// groups of resources.
///
/// Entries are never removed or replaced. The two maps have independent
/// locks and no operation holds both at once, so adding a resource and
/// adding a type that refers to it are not atomic with respect to each other.
#[derive(Default)]
pub struct Registry {
    resources: RwLock<HashMap<String, Scraper>>,
    resource_types: RwLock<HashMap<String, HashSet<String>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in resources and the `http`,
    /// `https`, `socks4` and `socks5` resource types.
    pub fn with_defaults(config: &ScrapeConfig) -> Result<Self> {
        let registry = Self::new();
        for (name, scraper) in sources::builtin(config)? {
            registry.add_resource(name, scraper, None)?;
        }
        for (name, members) in sources::BUILTIN_TYPES {
            registry.add_resource_type(name, Some(*members))?;
        }
        info!(
            "Registry initialized with {} resources and {} resource types",
            registry.resources.read().len(),
            registry.resource_types.read().len()
        );
        Ok(registry)
    }

    /// Register a scrape function under `name`, optionally adding it to
    /// existing resource types.
    pub fn add_resource(&self, name: &str, scraper: Scraper, resource_types: Option<&[&str]>) -> Result<()> {
        if self.resources.read().contains_key(name) {
            return Err(Error::ResourceAlreadyDefined(name.to_string()));
        }

        let resource_types = resource_types.unwrap_or_default();
        {
            let types = self.resource_types.read();
            if let Some(missing) = resource_types.iter().find(|t| !types.contains_key(**t)) {
                return Err(Error::InvalidResourceType(missing.to_string()));
            }
        }

        {
            let mut resources = self.resources.write();
            // Ensure not added while we were waiting for the lock
            if resources.contains_key(name) {
                return Err(Error::ResourceAlreadyDefined(name.to_string()));
            }
            resources.insert(name.to_string(), scraper);
        }

        if !resource_types.is_empty() {
            let mut types = self.resource_types.write();
            for resource_type in resource_types {
                if let Some(members) = types.get_mut(*resource_type) {
                    members.insert(name.to_string());
                }
            }
        }

        debug!("Added resource {} (types: {:?})", name, resource_types);
        Ok(())
    }

    /// Register a resource type grouping existing resources.
    pub fn add_resource_type(&self, name: &str, resources: Option<&[&str]>) -> Result<()> {
        if self.resource_types.read().contains_key(name) {
            return Err(Error::ResourceTypeAlreadyDefined(name.to_string()));
        }

        let members: HashSet<String> = {
            let known = self.resources.read();
            let requested = resources.unwrap_or_default();
            if let Some(missing) = requested.iter().find(|r| !known.contains_key(**r)) {
                return Err(Error::InvalidResource(missing.to_string()));
            }
            requested.iter().map(|r| r.to_string()).collect()
        };

        let mut types = self.resource_types.write();
        // Ensure not added while we were waiting for the lock
        if types.contains_key(name) {
            return Err(Error::ResourceTypeAlreadyDefined(name.to_string()));
        }
        debug!("Added resource type {} with {} resources", name, members.len());
        types.insert(name.to_string(), members);
        Ok(())
    }

    /// Names of all registered resources.
    pub fn resources(&self) -> HashSet<String> {
        self.resources.read().keys().cloned().collect()
    }

    /// Names of all registered resource types.
    pub fn resource_types(&self) -> HashSet<String> {
        self.resource_types.read().keys().cloned().collect()
    }

    /// The scrape function registered under `name`.
    pub fn scraper(&self, name: &str) -> Option<Scraper> {
        self.resources.read().get(name).cloned()
    }

    /// The resources grouped under `resource_type`.
    pub fn resources_of_type(&self, resource_type: &str) -> Option<HashSet<String>> {
        self.resource_types.read().get(resource_type).cloned()
    }
}
