//! Unit tests for the URL proxy cache

use super::*;

use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cache() -> UrlProxyCache {
    UrlProxyCache::new(ProxyCacheConfig::default()).unwrap()
}

#[tokio::test]
async fn test_fetch_writes_body_to_cache_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/alpha.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"alpha-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("catalog").join("stable~assets").join("alpha.tgz");
    let task = FetchTask::new(format!("{}/assets/alpha.tgz", server.uri()), &target);

    let cached = cache().fetch(&task).await.unwrap();
    assert_eq!(cached.cache_path, target);
    assert!(!cached.from_cache);
    assert!(!cached.stale);
    assert_eq!(tokio::fs::read(&target).await.unwrap(), b"alpha-bytes");

    // No partial files are left behind
    let leftovers = std::fs::read_dir(target.parent().unwrap()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[tokio::test]
async fn test_fresh_copy_skips_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let task = FetchTask::new(format!("{}/catalog.json", server.uri()), dir.path().join("c"))
        .with_ttl(Some(Duration::from_secs(60)));

    let cache = cache();
    assert!(!cache.fetch(&task).await.unwrap().from_cache);
    assert!(cache.fetch(&task).await.unwrap().from_cache);
}

#[tokio::test]
async fn test_expired_copy_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v2"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("c");
    let task = FetchTask::new(format!("{}/catalog.json", server.uri()), &target)
        .with_ttl(Some(Duration::from_millis(1)));

    let cache = cache();
    cache.fetch(&task).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cached = cache.fetch(&task).await.unwrap();
    assert!(!cached.from_cache);
    assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), "v2");
}

#[tokio::test]
async fn test_existing_copy_used_on_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("good"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("c");
    let task = FetchTask::new(format!("{}/catalog.json", server.uri()), &target)
        .with_ttl(Some(Duration::from_millis(1)));

    let cache = cache();
    cache.fetch(&task).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cached = cache.fetch(&task).await.unwrap();
    assert!(cached.stale);
    assert!(cached.from_cache);
    assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), "good");
}

#[tokio::test]
async fn test_error_without_existing_copy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.tgz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("missing.tgz");
    let task = FetchTask::new(format!("{}/missing.tgz", server.uri()), &target);

    match cache().fetch(&task).await.unwrap_err() {
        DepotError::Network { message, .. } => assert!(message.contains("404")),
        other => panic!("Expected Network error, got {other:?}"),
    }
    assert!(!target.exists());
}

#[tokio::test]
async fn test_forwards_task_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .and(header("x-pio.catalog-key", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let task = FetchTask::new(format!("{}/catalog.json", server.uri()), dir.path().join("c"))
        .with_headers([("x-pio.catalog-key", "s3cret"), ("host", "depot.local")]);

    cache().fetch(&task).await.unwrap();
}

#[test]
fn test_build_headers_skips_invalid() {
    let headers = build_headers(&[
        ("accept".to_string(), "application/json".to_string()),
        ("bad header".to_string(), "x".to_string()),
    ]);
    assert_eq!(headers.len(), 1);
    assert_eq!(headers["accept"], "application/json");
}

#[test]
fn test_part_path_is_sibling() {
    let target = Path::new("/cache/catalog/stable");
    let part = part_path(target);
    assert_eq!(part.parent(), target.parent());
    assert!(part
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("stable.part-"));
}
