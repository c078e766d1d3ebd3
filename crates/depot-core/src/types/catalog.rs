//! Catalog document types.
//!
//! A catalog is the JSON index served by an upstream source. Only the fields
//! the proxy relies on are typed; everything else is carried through
//! untouched so the rewritten document matches the upstream one apart from
//! the aspect URLs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{DepotError, DepotResult};

/// Parsed upstream catalog document.
///
/// Serializes from the document as received, so key order and untyped
/// fields come back out exactly as upstream wrote them.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    /// Catalog name
    pub name: String,
    /// Stable catalog identifier
    pub uuid: String,
    /// Content revision of this document
    pub revision: String,
    /// Packages keyed by package id
    pub packages: IndexMap<String, Package>,
    raw: Map<String, Value>,
}

/// Fields a catalog document must carry
#[derive(Deserialize)]
struct RequiredFields {
    name: String,
    uuid: String,
    revision: String,
    packages: IndexMap<String, Package>,
}

/// A single package entry in a catalog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Package {
    /// Downloadable artifacts keyed by aspect name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspects: Option<IndexMap<String, String>>,
    /// Fields the proxy does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Location of one aspect URL inside a catalog document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectRef {
    pub package: String,
    pub aspect: String,
    pub url: String,
}

impl Serialize for CatalogDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl CatalogDocument {
    /// Parse a catalog document, reporting schema failures against `path`
    pub fn from_slice(bytes: &[u8], path: &str) -> DepotResult<Self> {
        let malformed = |reason: String| DepotError::MalformedCatalogDocument {
            path: path.to_string(),
            reason,
        };

        let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let fields =
            RequiredFields::deserialize(&value).map_err(|e| malformed(e.to_string()))?;
        let Value::Object(raw) = value else {
            return Err(malformed("catalog document is not an object".to_string()));
        };

        Ok(Self {
            name: fields.name,
            uuid: fields.uuid,
            revision: fields.revision,
            packages: fields.packages,
            raw,
        })
    }

    /// Serialize with four-space indentation
    pub fn to_pretty_json(&self) -> DepotResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)
            .map_err(|e| DepotError::MalformedCatalogDocument {
                path: self.name.clone(),
                reason: e.to_string(),
            })?;

        // serde_json only ever emits valid UTF-8
        String::from_utf8(buf).map_err(|e| DepotError::MalformedCatalogDocument {
            path: self.name.clone(),
            reason: e.to_string(),
        })
    }

    /// All aspect URLs in document order
    pub fn aspects(&self) -> Vec<AspectRef> {
        self.packages
            .iter()
            .flat_map(|(package_id, package)| {
                package.aspects.iter().flat_map(move |aspects| {
                    aspects.iter().map(move |(aspect, url)| AspectRef {
                        package: package_id.clone(),
                        aspect: aspect.clone(),
                        url: url.clone(),
                    })
                })
            })
            .collect()
    }

    /// Number of aspect URLs across all packages
    pub fn aspect_count(&self) -> usize {
        self.packages
            .values()
            .filter_map(|package| package.aspects.as_ref())
            .map(|aspects| aspects.len())
            .sum()
    }

    /// Replace one aspect URL. Returns false if the aspect does not exist.
    pub fn set_aspect_url(&mut self, package: &str, aspect: &str, url: String) -> bool {
        match self
            .packages
            .get_mut(package)
            .and_then(|p| p.aspects.as_mut())
            .and_then(|a| a.get_mut(aspect))
        {
            Some(slot) => slot.clone_from(&url),
            None => return false,
        }

        if let Some(slot) = self
            .raw
            .get_mut("packages")
            .and_then(|p| p.get_mut(package))
            .and_then(|p| p.get_mut("aspects"))
            .and_then(|a| a.get_mut(aspect))
        {
            *slot = Value::String(url);
        }
        true
    }
}
