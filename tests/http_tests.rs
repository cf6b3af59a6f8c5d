//! Tests for HTTP module functionality against a local mock server.

use futures::TryStreamExt;
use httpmock::prelude::*;
use packfetch::cache::CacheSidecar;
use packfetch::download::DownloadTask;
use packfetch::http::{FetchRequest, HttpClientConfig, NativeTransport, PooledTransport, Transport};
use packfetch::progress::NoProgress;
use packfetch::{CancellationToken, Error, Outcome, ValidationSpec};
use reqwest::StatusCode;
use std::sync::Arc;

mod common;
use common::helpers::*;

fn transports() -> Vec<(&'static str, Arc<dyn Transport>)> {
    let config = HttpClientConfig {
        retries: 0,
        ..HttpClientConfig::default()
    };
    vec![
        ("native", Arc::new(NativeTransport::new(&config).unwrap())),
        ("pooled", Arc::new(PooledTransport::new(config).unwrap())),
    ]
}

async fn body_of(transport: &dyn Transport, request: &FetchRequest) -> (StatusCode, u64, Option<u64>, Vec<u8>) {
    let response = transport.fetch(request).await.unwrap();
    let status = response.status;
    let offset = response.body_offset;
    let total = response.total_length;
    let body: Vec<u8> = response
        .body
        .try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .unwrap();
    (status, offset, total, body)
}

#[tokio::test]
async fn test_plain_get() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/objects/client.jar")
                .header_exists("user-agent");
            then.status(200)
                .header("content-length", "16")
                .header("etag", "\"abc\"")
                .body(PAYLOAD_16);
        })
        .await;

    for (name, transport) in transports() {
        let request = FetchRequest::new(server.url("/objects/client.jar"));
        let (status, offset, total, body) = body_of(transport.as_ref(), &request).await;
        assert_eq!(status, StatusCode::OK, "{}", name);
        assert_eq!(offset, 0, "{}", name);
        assert_eq!(total, Some(16), "{}", name);
        assert_eq!(body, PAYLOAD_16, "{}", name);
    }
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_range_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/objects/client.jar")
                .header("range", "bytes=10-");
            then.status(206)
                .header("content-range", "bytes 10-15/16")
                .header("content-length", "6")
                .body(&PAYLOAD_16[10..]);
        })
        .await;

    for (name, transport) in transports() {
        let request = FetchRequest::new(server.url("/objects/client.jar")).range_from(10);
        let (status, offset, total, body) = body_of(transport.as_ref(), &request).await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT, "{}", name);
        assert_eq!(offset, 10, "{}", name);
        assert_eq!(total, Some(16), "{}", name);
        assert_eq!(body, &PAYLOAD_16[10..], "{}", name);
    }
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_transports_map_responses_alike() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/libraries/lwjgl.jar");
            then.status(206)
                .header("content-range", "bytes 4-15/16")
                .header("etag", "\"lwjgl\"")
                .header("last-modified", "Sun, 06 Nov 1994 08:49:37 GMT")
                .body(&PAYLOAD_16[4..]);
        })
        .await;

    let mut heads = Vec::new();
    for (name, transport) in transports() {
        let request = FetchRequest::new(server.url("/libraries/lwjgl.jar")).range_from(4);
        let response = transport.fetch(&request).await.unwrap();
        assert!(response.is_partial(), "{}", name);
        heads.push((
            response.etag.clone(),
            response.last_modified.clone(),
            response.total_length,
            response.body_offset,
        ));
    }
    assert_eq!(heads[0], heads[1]);
    assert_eq!(
        heads[0],
        (
            Some("\"lwjgl\"".to_string()),
            Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            Some(16),
            4
        )
    );
}

#[tokio::test]
async fn test_conditional_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/version_manifest_v2.json")
                .header("if-none-match", "\"v1\"");
            then.status(304);
        })
        .await;

    for (name, transport) in transports() {
        let mut request = FetchRequest::new(server.url("/version_manifest_v2.json"));
        request.if_none_match = Some("\"v1\"".to_string());
        let response = transport.fetch(&request).await.unwrap();
        assert!(response.is_not_modified(), "{}", name);
    }
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_task_over_http_records_etag() {
    init_tracing();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/objects/abc/client.jar");
            then.status(200)
                .header("content-length", "16")
                .header("etag", "\"abc\"")
                .body(PAYLOAD_16);
        })
        .await;

    for (name, transport) in transports() {
        let dir = create_temp_dir();
        let dest = dir.path().join("client.jar");
        let mut task = DownloadTask::builder(server.url("/v1/objects/abc/client.jar"), &dest)
            .transport(transport)
            .validation(strict_spec(PAYLOAD_16))
            .build()
            .unwrap();

        let outcome = task.execute(&CancellationToken::new(), &NoProgress).await.unwrap();
        assert!(outcome.is_installed(), "{}", name);
        assert_file_content(&dest, PAYLOAD_16);
        let sidecar = CacheSidecar::load(&dest).await.unwrap();
        assert_eq!(sidecar.etag.as_deref(), Some("\"abc\""), "{}", name);
    }
}

#[tokio::test]
async fn test_task_over_http_not_modified() {
    let server = MockServer::start_async().await;
    let not_modified = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/index.json")
                .header("if-none-match", "\"v1\"");
            then.status(304);
        })
        .await;

    let dir = create_temp_dir();
    let dest = create_temp_file(dir.path(), "index.json", b"{}");
    CacheSidecar::from_headers(Some("\"v1\""), None)
        .store(&dest, packfetch::SidecarFormat::Json)
        .await
        .unwrap();

    let config = HttpClientConfig::default();
    let mut task = DownloadTask::builder(server.url("/index.json"), &dest)
        .transport(Arc::new(NativeTransport::new(&config).unwrap()))
        .validation(ValidationSpec::builder().use_etag(true).build())
        .build()
        .unwrap();
    let outcome = task.execute(&CancellationToken::new(), &NoProgress).await.unwrap();

    assert_eq!(outcome, Outcome::NotModified);
    not_modified.assert_async().await;
    assert_file_content(&dest, b"{}");
}

#[tokio::test]
async fn test_task_over_http_resumes() {
    let data = random_payload(2_000);
    let dir = create_temp_dir();
    let dest = dir.path().join("installer.jar");
    std::fs::write(packfetch::download::task::part_path(&dest), &data[..500]).unwrap();

    let server = MockServer::start_async().await;
    let ranged = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/installer.jar")
                .header("range", "bytes=500-");
            then.status(206)
                .header("content-range", "bytes 500-1999/2000")
                .body(&data[500..]);
        })
        .await;

    let config = HttpClientConfig::default();
    let mut task = DownloadTask::builder(server.url("/installer.jar"), &dest)
        .transport(Arc::new(NativeTransport::new(&config).unwrap()))
        .validation(strict_spec(&data))
        .build()
        .unwrap();
    let outcome = task.execute(&CancellationToken::new(), &NoProgress).await.unwrap();

    ranged.assert_async().await;
    assert_eq!(
        outcome,
        Outcome::Downloaded {
            bytes: 1_500,
            resumed_from: 500
        }
    );
    assert_file_content(&dest, &data);
}

#[tokio::test]
async fn test_task_over_http_exhausts_mirrors() {
    let server = MockServer::start_async().await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/primary/client.jar");
            then.status(404);
        })
        .await;
    let mirror = server
        .mock_async(|when, then| {
            when.method(GET).path("/mirror/client.jar");
            then.status(403);
        })
        .await;

    let dir = create_temp_dir();
    let dest = dir.path().join("client.jar");
    let config = HttpClientConfig::default();
    let mut task = DownloadTask::builder(server.url("/primary/client.jar"), &dest)
        .mirror(server.url("/mirror/client.jar"))
        .transport(Arc::new(NativeTransport::new(&config).unwrap()))
        .build()
        .unwrap();
    let result = task.execute(&CancellationToken::new(), &NoProgress).await;

    assert!(matches!(result, Err(Error::ExhaustedMirrors { attempts: 2, .. })));
    missing.assert_async().await;
    mirror.assert_async().await;
    assert!(!dest.exists());
}
