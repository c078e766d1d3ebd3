//! Path utilities for the cache layout and safe file serving.
//!
//! Catalog documents live at `<cache_root>/catalog/<name>`; their assets live
//! in a sibling directory `<name>~assets/`, keyed only by the basename of the
//! upstream asset URL. A revision token (`~<token>` appended to a catalog
//! name) is stripped first so every revision of a catalog shares one asset
//! directory.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::error::{DepotError, DepotResult};
use crate::ASSETS_SUFFIX;

/// Bytes escaped when a name becomes one URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // Keep a leading .. so callers can still detect the escape
                if components.is_empty() {
                    components.push(component);
                } else {
                    components.pop();
                }
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Check if a path is safe (relative, never climbs above its base)
pub fn is_safe_path(path: &Path) -> bool {
    if path.is_absolute() {
        return false;
    }

    let mut depth = 0i32;

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            },
            Component::Normal(_) => depth += 1,
            _ => return false,
        }
    }

    true
}

/// Safely join paths, preventing directory traversal
pub fn safe_join(base: &Path, path: &Path) -> DepotResult<PathBuf> {
    if !is_safe_path(path) {
        return Err(DepotError::PermissionDenied {
            permission: "path traversal".to_string(),
            resource: path.display().to_string(),
        });
    }

    Ok(base.join(normalize_path(path)))
}

/// Remove a `~<token>` revision suffix from the last path component.
///
/// Works on bare catalog names (`stable~r17` -> `stable`) as well as on
/// cache paths (`/cache/catalog/stable~r17` -> `/cache/catalog/stable`).
pub fn strip_revision_token(name: &str) -> &str {
    let last_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[last_start..].find('~') {
        Some(offset) => &name[..last_start + offset],
        None => name,
    }
}

/// Last non-empty segment of a URL's path, percent-decoded.
///
/// The decoded name is used as a file name, so it must not contain a path
/// separator or NUL once decoded.
pub fn url_basename(url: &str) -> DepotResult<String> {
    let invalid = |reason: &str| DepotError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| invalid("URL path has no file name"))?;

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| invalid(&e.to_string()))?;
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return Err(invalid("URL path has no file name"));
    }
    if decoded.contains(['/', '\\', '\0']) {
        return Err(invalid("file name contains a path separator"));
    }

    Ok(decoded.into_owned())
}

/// Cache path for an asset of the catalog cached at `document_path`.
///
/// Assets with the same basename under one catalog share this path.
pub fn asset_cache_path(document_path: &Path, basename: &str) -> PathBuf {
    let file_name = document_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir_name = format!("{}{}", strip_revision_token(&file_name), ASSETS_SUFFIX);
    document_path.with_file_name(dir_name).join(basename)
}

/// Public URL under which the proxy serves a cached asset
pub fn asset_public_url(host: &str, catalog_name: &str, basename: &str) -> String {
    let dir = format!("{}{}", strip_revision_token(catalog_name), ASSETS_SUFFIX);
    format!(
        "http://{}/catalog/{}/{}",
        host,
        utf8_percent_encode(&dir, PATH_SEGMENT),
        utf8_percent_encode(basename, PATH_SEGMENT)
    )
}
