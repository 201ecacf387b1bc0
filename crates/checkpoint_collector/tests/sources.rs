use std::sync::Arc;
use std::time::Duration;

use checkpoint_collector::net::{ContentSource, HttpGateway, IpfsSource, SiteDir, SourceError};
use checkpoint_collector::seeds::{SeedListError, fetch_seed_list};
use checkpoint_collector::{CollectorConfig, start_collection};
use reqwest::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn gateway_fetches_site_file() {
    let server = MockServer::start().await;
    serve(&server, "/1Checkpoints/index.html", 200, "100:abc123").await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let body = gateway
        .fetch_named_file("1Checkpoints", "index.html")
        .await
        .unwrap();
    assert_eq!(body, b"100:abc123");
}

#[tokio::test]
async fn gateway_maps_error_statuses() {
    let server = MockServer::start().await;
    serve(&server, "/1Broken/index.html", 500, "boom").await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();

    let missing = gateway.fetch_named_file("1Missing", "index.html").await;
    assert!(matches!(
        missing,
        Err(SourceError::NotFound { ref address, ref filename })
            if address == "1Missing" && filename == "index.html"
    ));

    let broken = gateway.fetch_named_file("1Broken", "index.html").await;
    assert!(matches!(
        broken,
        Err(SourceError::Status(StatusCode::INTERNAL_SERVER_ERROR))
    ));

    let traversal = gateway.fetch_named_file("..", "index.html").await;
    assert!(matches!(traversal, Err(SourceError::InvalidName(_))));
}

#[tokio::test]
async fn gateway_unreachable_is_http_error() {
    // Nothing listens on the discard port.
    let gateway = HttpGateway::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let res = gateway.fetch_named_file("1Site", "index.html").await;
    assert!(matches!(res, Err(SourceError::Http(_))));
}

#[tokio::test]
async fn gateway_fetches_ipfs_object() {
    let server = MockServer::start().await;
    serve(&server, "/ipfs/QmSeeds", 200, "[]").await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    assert_eq!(gateway.fetch_ipfs("QmSeeds").await.unwrap(), b"[]");
}

#[tokio::test]
async fn seed_list_over_gateways() {
    let server = MockServer::start().await;
    serve(&server, "/1Seeds/ipfs.hash", 200, "QmSeeds\n").await;
    serve(&server, "/ipfs/QmSeeds", 200, r#"["node1.example:11080","node2.example:11080"]"#).await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let seeds = fetch_seed_list(&gateway, &gateway, "1Seeds").await.unwrap();
    assert_eq!(seeds, vec!["node1.example:11080", "node2.example:11080"]);

    let err = fetch_seed_list(&gateway, &gateway, "1NoSeeds").await.unwrap_err();
    assert!(matches!(err, SeedListError::Site(SourceError::NotFound { .. })));
}

#[tokio::test]
async fn collection_over_gateway() {
    let server = MockServer::start().await;
    serve(&server, "/1Checkpoints/index.html", 200, "2000000:0000000001a2b3c4").await;

    let gateway = Arc::new(HttpGateway::new(&server.uri()).unwrap());
    let config = CollectorConfig {
        interval: Duration::from_millis(10),
        ..CollectorConfig::default()
    };
    let handle = start_collection(gateway, config, "1Checkpoints").unwrap();
    let lookup = handle.lookup();

    tokio::time::timeout(Duration::from_secs(10), async {
        while lookup.checkpoint_at(2_000_000).is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("checkpoint never cached");

    assert_eq!(lookup.checkpoint_at_or_empty(2_000_000), "0000000001a2b3c4");
    handle.stop().await;
    assert_eq!(lookup.len(), 1);
}

#[tokio::test]
async fn site_dir_reads_synced_files() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("zn-checkpoints");
    let site = SiteDir::open(&root).unwrap();
    assert!(root.is_dir());

    std::fs::create_dir_all(root.join("1Checkpoints")).unwrap();
    std::fs::write(root.join("1Checkpoints").join("index.html"), "105:def456").unwrap();

    let body = site.fetch_named_file("1Checkpoints", "index.html").await.unwrap();
    assert_eq!(body, b"105:def456");

    let missing = site.fetch_named_file("1Checkpoints", "ipfs.hash").await;
    assert!(matches!(missing, Err(SourceError::NotFound { .. })));

    let escape = site.fetch_named_file("1Checkpoints", "../../etc").await;
    assert!(matches!(escape, Err(SourceError::InvalidName(_))));
}

#[tokio::test]
async fn site_dir_uses_storage_path_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CollectorConfig::with_storage_path(tmp.path());
    let site = SiteDir::open(&config.data_path).unwrap();
    assert_eq!(
        site.path_for("1Site", "index.html").unwrap(),
        tmp.path().join("zn-checkpoints").join("1Site").join("index.html")
    );
}
