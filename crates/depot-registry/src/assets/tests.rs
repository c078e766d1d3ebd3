//! Unit tests for the asset join

use super::*;

use crate::limiter::AdmissionLimiter;
use crate::retry::RetryConfig;
use depot_cache::{ProxyCacheConfig, UrlProxyCache};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "depot.local:8080";

fn fetcher() -> Arc<RetryingFetcher> {
    let cache = UrlProxyCache::new(ProxyCacheConfig::default()).unwrap();
    Arc::new(RetryingFetcher::new(
        Arc::new(cache),
        AdmissionLimiter::new(6),
        RetryConfig {
            max_attempts: 2,
            delay: Duration::from_millis(10),
        },
    ))
}

fn document(aspects: &[(&str, &str, String)]) -> CatalogDocument {
    let mut packages = serde_json::Map::new();
    for (package, aspect, url) in aspects {
        let entry = packages
            .entry(package.to_string())
            .or_insert_with(|| serde_json::json!({ "aspects": {} }));
        entry["aspects"][*aspect] = serde_json::Value::String(url.clone());
    }

    let json = serde_json::json!({
        "name": "stable",
        "uuid": "6f1c1c39-1f0b-4b6a-8f77-1d2b2a0a9e10",
        "revision": "r2",
        "packages": packages,
    });
    CatalogDocument::from_slice(json.to_string().as_bytes(), "test").unwrap()
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_all_aspects_rewritten() {
    let server = MockServer::start().await;
    serve(&server, "/dl/alpha-1.0.tgz", 200, b"alpha").await;
    serve(&server, "/dl/beta-2.0.tgz", 200, b"beta").await;

    let dir = TempDir::new().unwrap();
    let document_path = dir.path().join("catalog").join("stable");
    let doc = document(&[
        ("alpha", "source", format!("{}/dl/alpha-1.0.tgz", server.uri())),
        ("beta", "source", format!("{}/dl/beta-2.0.tgz", server.uri())),
    ]);

    let join = AssetJoin::new(fetcher(), HOST, None);
    let rewritten = join.ensure_assets(&document_path, "stable", doc).await.unwrap();

    let aspects = rewritten.aspects();
    assert_eq!(
        aspects[0].url,
        "http://depot.local:8080/catalog/stable~assets/alpha-1.0.tgz"
    );
    assert_eq!(
        aspects[1].url,
        "http://depot.local:8080/catalog/stable~assets/beta-2.0.tgz"
    );

    let assets_dir = dir.path().join("catalog").join("stable~assets");
    assert_eq!(std::fs::read(assets_dir.join("alpha-1.0.tgz")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(assets_dir.join("beta-2.0.tgz")).unwrap(), b"beta");
}

#[tokio::test]
async fn test_one_permanent_failure_fails_the_join() {
    let server = MockServer::start().await;
    serve(&server, "/dl/alpha.tgz", 200, b"alpha").await;
    serve(&server, "/dl/beta.tgz", 404, b"").await;

    let dir = TempDir::new().unwrap();
    let document_path = dir.path().join("catalog").join("stable");
    let doc = document(&[
        ("alpha", "source", format!("{}/dl/alpha.tgz", server.uri())),
        ("beta", "source", format!("{}/dl/beta.tgz", server.uri())),
    ]);

    let join = AssetJoin::new(fetcher(), HOST, None);
    let err = join.ensure_assets(&document_path, "stable", doc).await.unwrap_err();

    match err {
        DepotError::AssetFetchFailed {
            package,
            aspect,
            source,
            ..
        } => {
            assert_eq!(package, "beta");
            assert_eq!(aspect, "source");
            assert!(matches!(
                *source,
                DepotError::UpstreamFetchFailed { attempts: 2, .. }
            ));
        },
        other => panic!("Expected AssetFetchFailed, got {other:?}"),
    }

    // The sibling was not cancelled
    let sibling = dir.path().join("catalog").join("stable~assets").join("alpha.tgz");
    assert_eq!(std::fs::read(sibling).unwrap(), b"alpha");
}

#[tokio::test]
async fn test_first_error_in_document_order_is_reported() {
    let server = MockServer::start().await;
    serve(&server, "/dl/a.tgz", 500, b"").await;
    serve(&server, "/dl/b.tgz", 500, b"").await;

    let dir = TempDir::new().unwrap();
    let doc = document(&[
        ("first", "source", format!("{}/dl/a.tgz", server.uri())),
        ("second", "source", format!("{}/dl/b.tgz", server.uri())),
    ]);

    let join = AssetJoin::new(fetcher(), HOST, None);
    let err = join
        .ensure_assets(&dir.path().join("catalog").join("stable"), "stable", doc)
        .await
        .unwrap_err();

    assert!(matches!(err, DepotError::AssetFetchFailed { ref package, .. } if package == "first"));
}

#[tokio::test]
async fn test_invalid_aspect_url() {
    let dir = TempDir::new().unwrap();
    let doc = document(&[("alpha", "source", "no scheme here".to_string())]);

    let join = AssetJoin::new(fetcher(), HOST, None);
    let err = join
        .ensure_assets(&dir.path().join("catalog").join("stable"), "stable", doc)
        .await
        .unwrap_err();

    match err {
        DepotError::AssetFetchFailed { source, .. } => {
            assert!(matches!(*source, DepotError::InvalidUrl { .. }));
        },
        other => panic!("Expected AssetFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_aspects_returns_document_unchanged() {
    let dir = TempDir::new().unwrap();
    let doc = document(&[]);

    let join = AssetJoin::new(fetcher(), HOST, None);
    let rewritten = join
        .ensure_assets(&dir.path().join("catalog").join("stable"), "stable", doc.clone())
        .await
        .unwrap();

    assert_eq!(rewritten, doc);
}

#[tokio::test]
async fn test_revision_token_shares_asset_directory() {
    let server = MockServer::start().await;
    serve(&server, "/dl/alpha.tgz", 200, b"alpha").await;

    let dir = TempDir::new().unwrap();
    let document_path = dir.path().join("catalog").join("stable~r2");
    let doc = document(&[("alpha", "source", format!("{}/dl/alpha.tgz", server.uri()))]);

    let join = AssetJoin::new(fetcher(), HOST, None);
    let rewritten = join.ensure_assets(&document_path, "stable~r2", doc).await.unwrap();

    assert_eq!(
        rewritten.aspects()[0].url,
        "http://depot.local:8080/catalog/stable~assets/alpha.tgz"
    );
    assert!(dir.path().join("catalog/stable~assets/alpha.tgz").exists());
}
