use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpResponse, HttpServer};
use dupecheck_core::hashing::{self, DigestAlgorithm};
use providers::http::{HttpMetadataProvider, HttpProviderConfig};
use providers::{MetadataProvider, ProviderError, RemoteMetadata, UploadFile};
use server::{cors_headers, routes, AppData};
use std::path::Path;
use std::time::Duration;

fn provider_for(base_url: &str) -> HttpMetadataProvider {
    HttpMetadataProvider::new(HttpProviderConfig {
        base_url: base_url.to_string(),
        timeout: Some(Duration::from_secs(10)),
    })
    .unwrap()
}

fn upload(name: &str, content_type: &str, bytes: &[u8]) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        content_type: Some(content_type.to_string()),
        bytes: bytes.to_vec(),
    }
}

async fn start_metadata_server(upload_dir: &Path) -> (String, ServerHandle) {
    let data = web::Data::new(AppData {
        upload_dir: upload_dir.to_path_buf(),
        digest: DigestAlgorithm::Sha256,
        max_files: 2,
    });
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(cors_headers())
            .configure(routes)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{}", addr), handle)
}

#[actix_web::test]
async fn provider_round_trip_matches_local_digest() {
    let dir = tempfile::tempdir().unwrap();
    let (url, handle) = start_metadata_server(dir.path()).await;

    let records = provider_for(&url)
        .describe(vec![
            upload("hello.txt", "text/plain", b"hello"),
            upload("pixel.png", "image/png", b"\x89PNG\r\n\x1a\n"),
        ])
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name.as_deref(), Some("hello.txt"));
    assert_eq!(records[0].size, 5);
    assert_eq!(records[0].content_type, "text/plain");
    assert_eq!(
        records[0].hash,
        hashing::digest(b"hello", DigestAlgorithm::Sha256)
    );
    assert_eq!(records[1].content_type, "image/png");
    assert_eq!(
        records[1].hash,
        hashing::digest(b"\x89PNG\r\n\x1a\n", DigestAlgorithm::Sha256)
    );
    assert!(records[0].modified.is_some());
    assert!(
        std::fs::read_dir(dir.path()).unwrap().next().is_none(),
        "uploads must not be retained"
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn rejected_upload_maps_to_status_error() {
    let dir = tempfile::tempdir().unwrap();
    let (url, handle) = start_metadata_server(dir.path()).await;

    let err = provider_for(&url)
        .describe(vec![
            upload("a.txt", "text/plain", b"a"),
            upload("b.txt", "text/plain", b"b"),
            upload("c.txt", "text/plain", b"c"),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Status(400)), "got {err:?}");

    handle.stop(true).await;
}

#[actix_web::test]
async fn short_response_is_invalid() {
    let server = HttpServer::new(|| {
        App::new().route(
            "/upload",
            web::post().to(|_body: web::Bytes| async {
                HttpResponse::Ok().json(vec![RemoteMetadata {
                    name: None,
                    size: 1,
                    content_type: "text/plain".into(),
                    created: None,
                    modified: None,
                    hash: "00".into(),
                }])
            }),
        )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let url = format!("http://{}", server.addrs()[0]);
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let err = provider_for(&url)
        .describe(vec![
            upload("a.txt", "text/plain", b"a"),
            upload("b.txt", "text/plain", b"b"),
        ])
        .await
        .unwrap_err();
    assert!(
        matches!(err, ProviderError::InvalidResponse(ref msg) if msg.contains("expected 2")),
        "got {err:?}"
    );

    handle.stop(true).await;
}
