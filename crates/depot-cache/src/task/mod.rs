//! Fetch requests and their results

use std::path::PathBuf;
use std::time::Duration;

/// Headers never forwarded upstream. Hop-by-hop headers belong to the
/// inbound connection; `accept-encoding` is negotiated by the HTTP client so
/// the cached body is always decoded.
pub const STRIPPED_HEADERS: [&str; 10] = [
    "host",
    "connection",
    "etag",
    "keep-alive",
    "transfer-encoding",
    "te",
    "upgrade",
    "content-length",
    "accept-encoding",
    "proxy-connection",
];

/// An immutable request to fetch one URL into the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    /// Upstream URL
    pub url: String,
    /// Request headers as (name, value) pairs
    pub headers: Vec<(String, String)>,
    /// Where the body is stored
    pub cache_path: PathBuf,
    /// Freshness window; `None` keeps a cached copy forever
    pub ttl: Option<Duration>,
}

/// Outcome of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    /// Path of the cached body
    pub cache_path: PathBuf,
    /// Served from disk without contacting upstream
    pub from_cache: bool,
    /// Upstream failed and an older copy was used instead
    pub stale: bool,
}

impl FetchTask {
    /// Create a task with no headers and no expiry
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            cache_path: cache_path.into(),
            ttl: None,
        }
    }

    /// Set the freshness window
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set request headers, dropping the ones that must not be forwarded
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !is_stripped_header(k))
            .collect();
        self
    }
}

/// Whether a header is dropped before forwarding
pub fn is_stripped_header(name: &str) -> bool {
    STRIPPED_HEADERS
        .iter()
        .any(|stripped| stripped.eq_ignore_ascii_case(name))
}
