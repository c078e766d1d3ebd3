//! Ordered catalog table and per-request resolution

use depot_config::CatalogSection;
use depot_core::CATALOG_KEY_HEADER;
use indexmap::IndexMap;
use tracing::debug;

use crate::matcher::{substitute, CatalogMatcher};
use crate::ResolverResult;

/// One configured catalog, immutable after startup
#[derive(Debug, Clone)]
pub struct CatalogDescriptor {
    /// How requested names are matched
    pub matcher: CatalogMatcher,
    /// Upstream URI, possibly containing `$1`..`$3`
    pub uri_template: Option<String>,
    /// Shared secret clients must present
    pub credential: Option<String>,
    /// Extra headers sent upstream, excluding the shared secret
    pub headers: IndexMap<String, String>,
}

/// A descriptor specialised for one requested name
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCatalog {
    /// Name as requested by the client
    pub name: String,
    /// Configuration key that matched
    pub key: String,
    /// Upstream URI with captures substituted
    pub uri: Option<String>,
    /// Shared secret clients must present
    pub credential: Option<String>,
    /// Extra headers sent upstream
    pub headers: IndexMap<String, String>,
}

/// Catalog descriptors in configuration order
#[derive(Debug, Clone, Default)]
pub struct CatalogTable {
    descriptors: Vec<CatalogDescriptor>,
}

impl CatalogDescriptor {
    /// Build a descriptor from its configuration key and section
    pub fn from_section(key: &str, section: &CatalogSection) -> ResolverResult<Self> {
        let headers = section
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CATALOG_KEY_HEADER))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            matcher: CatalogMatcher::parse(key)?,
            uri_template: section.uri.clone().filter(|uri| !uri.is_empty()),
            credential: section.credential().map(str::to_string),
            headers,
        })
    }

    /// Resolve `name` against this descriptor
    pub fn resolve(&self, name: &str) -> Option<ResolvedCatalog> {
        let groups = self.matcher.captures(name)?;
        Some(ResolvedCatalog {
            name: name.to_string(),
            key: self.matcher.to_string(),
            uri: self
                .uri_template
                .as_deref()
                .map(|template| substitute(template, &groups)),
            credential: self.credential.clone(),
            headers: self.headers.clone(),
        })
    }
}

impl CatalogTable {
    /// Compile the configured catalogs, preserving their order
    pub fn from_config(catalogs: &IndexMap<String, CatalogSection>) -> ResolverResult<Self> {
        let descriptors = catalogs
            .iter()
            .map(|(key, section)| CatalogDescriptor::from_section(key, section))
            .collect::<ResolverResult<Vec<_>>>()?;

        Ok(Self { descriptors })
    }

    /// First descriptor matching `name`, specialised for it
    pub fn resolve(&self, name: &str) -> Option<ResolvedCatalog> {
        let resolved = self.descriptors.iter().find_map(|d| d.resolve(name));
        match &resolved {
            Some(catalog) => debug!("Catalog '{}' matched key '{}'", name, catalog.key),
            None => debug!("Catalog '{}' matched no configured key", name),
        }
        resolved
    }

    /// Configured descriptors
    pub fn descriptors(&self) -> &[CatalogDescriptor] {
        &self.descriptors
    }

    /// Number of configured descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no catalogs are configured
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests;
