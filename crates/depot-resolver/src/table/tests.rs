//! Unit tests for the catalog table

use super::*;
use depot_core::error::DepotError;

fn section(uri: Option<&str>, key: Option<&str>) -> CatalogSection {
    let mut headers = IndexMap::new();
    if let Some(key) = key {
        headers.insert(CATALOG_KEY_HEADER.to_string(), key.to_string());
    }
    CatalogSection {
        uri: uri.map(str::to_string),
        headers,
    }
}

fn table(entries: &[(&str, CatalogSection)]) -> CatalogTable {
    let catalogs: IndexMap<String, CatalogSection> = entries
        .iter()
        .map(|(key, section)| (key.to_string(), section.clone()))
        .collect();
    CatalogTable::from_config(&catalogs).unwrap()
}

#[test]
fn test_literal_resolves() {
    let table = table(&[("foo", section(Some("https://u/foo.json"), Some("k")))]);

    let resolved = table.resolve("foo").unwrap();
    assert_eq!(resolved.name, "foo");
    assert_eq!(resolved.key, "foo");
    assert_eq!(resolved.uri.as_deref(), Some("https://u/foo.json"));
    assert_eq!(resolved.credential.as_deref(), Some("k"));

    assert!(table.resolve("bar").is_none());
}

#[test]
fn test_pattern_substitutes_every_capture_occurrence() {
    let table = table(&[(
        r"/^release-(\d+)$/",
        section(Some("https://u/releases/$1/catalog-$1.json"), Some("k")),
    )]);

    let resolved = table.resolve("release-42").unwrap();
    assert_eq!(
        resolved.uri.as_deref(),
        Some("https://u/releases/42/catalog-42.json")
    );
    assert_eq!(resolved.name, "release-42");
}

#[test]
fn test_first_match_wins_in_config_order() {
    let table = table(&[
        ("/^rel/", section(Some("https://first/$1"), Some("a"))),
        (r"/^release-(\d+)$/", section(Some("https://second/$1"), Some("b"))),
    ]);

    let resolved = table.resolve("release-7").unwrap();
    assert_eq!(resolved.uri.as_deref(), Some("https://first/$1"));
    assert_eq!(resolved.credential.as_deref(), Some("a"));
}

#[test]
fn test_resolution_never_mutates_the_table() {
    let table = table(&[(r"/^(\w+)$/", section(Some("https://u/$1.json"), Some("k")))]);

    assert_eq!(table.resolve("one").unwrap().uri.as_deref(), Some("https://u/one.json"));
    assert_eq!(table.resolve("two").unwrap().uri.as_deref(), Some("https://u/two.json"));
    assert_eq!(
        table.descriptors()[0].uri_template.as_deref(),
        Some("https://u/$1.json")
    );
}

#[test]
fn test_misconfigured_descriptor_still_resolves() {
    let table = table(&[
        ("no-key", section(Some("https://u/a.json"), None)),
        ("no-uri", section(None, Some("k"))),
        ("empty-uri", section(Some(""), Some("k"))),
    ]);

    let no_key = table.resolve("no-key").unwrap();
    assert!(no_key.credential.is_none());

    let no_uri = table.resolve("no-uri").unwrap();
    assert!(no_uri.uri.is_none());

    assert!(table.resolve("empty-uri").unwrap().uri.is_none());
}

#[test]
fn test_secret_header_not_forwarded_as_extra_header() {
    let mut s = section(Some("https://u/a.json"), Some("k"));
    s.headers.insert("accept".to_string(), "application/json".to_string());
    let table = table(&[("a", s)]);

    let resolved = table.resolve("a").unwrap();
    assert_eq!(resolved.headers.len(), 1);
    assert_eq!(resolved.headers["accept"], "application/json");
}

#[test]
fn test_invalid_pattern_fails_at_load() {
    let catalogs = IndexMap::from([("/(/".to_string(), section(Some("u"), Some("k")))]);
    assert!(matches!(
        CatalogTable::from_config(&catalogs),
        Err(DepotError::InvalidPattern { .. })
    ));
}

#[test]
fn test_empty_table() {
    let table = CatalogTable::default();
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
    assert!(table.resolve("anything").is_none());
}

#[test]
fn test_mixed_case_secret_header_is_the_credential() {
    let s = CatalogSection {
        uri: Some("https://u/a.json".to_string()),
        headers: IndexMap::from([
            ("X-Pio.Catalog-Key".to_string(), "k".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]),
    };
    let table = table(&[("a", s)]);

    let resolved = table.resolve("a").unwrap();
    assert_eq!(resolved.credential.as_deref(), Some("k"));
    assert_eq!(resolved.headers.len(), 1);
    assert_eq!(resolved.headers["Accept"], "application/json");
}
