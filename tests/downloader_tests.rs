//! Tests for the downloader module functionality.
//!
//! Covers batches run through a [`Downloader`]: concurrency, mirror rules,
//! completion callbacks, cancellation and the shared bandwidth budget.

use packfetch::downloader::{DownloadSettings, DownloaderBuilder, MirrorRule, TransportKind};
use packfetch::{Outcome, SidecarFormat};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;
use common::helpers::*;

fn asset_url(i: usize) -> String {
    format!("https://resources.download.minecraft.net/{:02x}/object{}", i, i)
}

#[tokio::test]
async fn test_batch_download() {
    init_tracing();
    let payloads: Vec<Vec<u8>> = (0..8).map(|i| random_payload(500 + i * 97)).collect();
    let mut transport = MockTransport::new();
    for (i, data) in payloads.iter().enumerate() {
        transport = transport.route(&asset_url(i), Reply::ok(data).chunk_size(64));
    }
    let transport = Arc::new(transport);

    let completed = Arc::new(AtomicUsize::new(0));
    let counter = completed.clone();
    let downloader = DownloaderBuilder::hidden()
        .threads(3)
        .transport(transport.clone())
        .on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let dir = create_temp_dir();
    let tasks = payloads
        .iter()
        .enumerate()
        .map(|(i, data)| {
            downloader
                .task(asset_url(i), dir.path().join(format!("objects/{}", i)))
                .validation(strict_spec(data))
                .build()
                .unwrap()
        })
        .collect();

    let summaries = downloader.download(tasks).await;

    assert_eq!(summaries.len(), 8);
    assert!(summaries.iter().all(|summary| summary.is_success()));
    assert_eq!(completed.load(Ordering::SeqCst), 8);
    for (i, data) in payloads.iter().enumerate() {
        assert_file_content(&dir.path().join(format!("objects/{}", i)), data);
    }

    let snapshot = downloader.progress().snapshot();
    let total: usize = payloads.iter().map(Vec::len).sum();
    assert_eq!(snapshot.transferred, total as u64);
    assert_eq!(snapshot.finished, 8);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_batch() {
    let transport = Arc::new(
        MockTransport::new()
            .route(&asset_url(0), Reply::ok(PAYLOAD_16))
            .route(&asset_url(1), Reply::Status(500)),
    );
    let downloader = DownloaderBuilder::hidden()
        .transport(transport)
        .build()
        .unwrap();

    let dir = create_temp_dir();
    let tasks = vec![
        downloader
            .task(asset_url(0), dir.path().join("ok"))
            .build()
            .unwrap(),
        downloader
            .task(asset_url(1), dir.path().join("broken"))
            .build()
            .unwrap(),
    ];
    let summaries = downloader.download(tasks).await;

    let failed: Vec<_> = summaries.iter().filter(|s| !s.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].dest(), dir.path().join("broken"));
    assert!(failed[0].error().is_some());
    assert_file_content(&dir.path().join("ok"), PAYLOAD_16);
}

#[tokio::test]
async fn test_mirror_rules_fill_mirrors() {
    let transport = Arc::new(
        MockTransport::new()
            .route(MOJANG_URL, Reply::Refused)
            .route(MIRROR_URL, Reply::ok(PAYLOAD_16)),
    );
    let downloader = DownloaderBuilder::hidden()
        .transport(transport.clone())
        .mirror_rule(MirrorRule::new(
            "https://piston-data.mojang.com/",
            "https://bmclapi2.bangbang93.com/",
        ))
        .build()
        .unwrap();

    let dir = create_temp_dir();
    let task = downloader
        .task(MOJANG_URL, dir.path().join("client.jar"))
        .validation(strict_spec(PAYLOAD_16))
        .build()
        .unwrap();
    let summaries = downloader.download(vec![task]).await;

    assert_eq!(summaries[0].url(), MIRROR_URL);
    assert_eq!(summaries[0].attempts(), 2);
    assert_eq!(transport.requests_for(MIRROR_URL).len(), 1);
}

#[tokio::test]
async fn test_explicit_mirrors_win_over_rules() {
    let own_mirror = "https://mirror.example.com/client.jar";
    let transport = Arc::new(
        MockTransport::new()
            .route(MOJANG_URL, Reply::Refused)
            .route(own_mirror, Reply::ok(PAYLOAD_16)),
    );
    let downloader = DownloaderBuilder::hidden()
        .transport(transport.clone())
        .mirror_rules(MirrorRule::bmclapi())
        .build()
        .unwrap();

    let dir = create_temp_dir();
    let task = downloader
        .task(MOJANG_URL, dir.path().join("client.jar"))
        .mirror(own_mirror)
        .build()
        .unwrap();
    let summaries = downloader.download(vec![task]).await;

    assert_eq!(summaries[0].url(), own_mirror);
    assert!(transport.requests_for(MIRROR_URL).is_empty());
}

#[tokio::test]
async fn test_cancelled_batch() {
    let transport = Arc::new(MockTransport::new().route(MOJANG_URL, Reply::ok(PAYLOAD_16)));
    let downloader = DownloaderBuilder::hidden()
        .transport(transport.clone())
        .build()
        .unwrap();
    let dir = create_temp_dir();
    let tasks = (0..3)
        .map(|i| {
            downloader
                .task(MOJANG_URL, dir.path().join(format!("{}.jar", i)))
                .build()
                .unwrap()
        })
        .collect();

    downloader.cancel();
    let summaries = downloader.download(tasks).await;

    assert!(summaries
        .iter()
        .all(|summary| summary.outcome() == Some(&Outcome::Cancelled)));
    assert!(transport.requests().is_empty());
    assert!(downloader.cancel_token().is_cancelled());
}

#[tokio::test]
async fn test_shared_speed_limit() {
    let first = random_payload(4_000);
    let second = random_payload(4_000);
    let transport = Arc::new(
        MockTransport::new()
            .route(&asset_url(0), Reply::ok(&first).chunk_size(500))
            .route(&asset_url(1), Reply::ok(&second).chunk_size(500)),
    );
    let downloader = DownloaderBuilder::hidden()
        .threads(2)
        .max_speed(4_000)
        .transport(transport)
        .build()
        .unwrap();
    assert!(downloader.throttle().is_limited());

    let dir = create_temp_dir();
    let tasks = vec![
        downloader.task(asset_url(0), dir.path().join("a")).build().unwrap(),
        downloader.task(asset_url(1), dir.path().join("b")).build().unwrap(),
    ];

    let started = Instant::now();
    let summaries = downloader.download(tasks).await;
    let elapsed = started.elapsed();

    assert!(summaries.iter().all(|summary| summary.is_success()));
    // 8000 bytes at 4000 B/s with a one second burst take about one second.
    assert!(elapsed >= Duration::from_millis(800), "took {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_speed_limit_can_be_lifted() {
    let downloader = DownloaderBuilder::hidden().max_speed(1).build().unwrap();
    assert_eq!(downloader.throttle().rate(), 1);
    downloader.set_max_speed(0);
    assert!(!downloader.throttle().is_limited());
}

#[tokio::test]
async fn test_task_in_dir_uses_url_name() {
    let url = "https://cdn.modrinth.com/data/AANobbMI/versions/1/sodium%20fabric.jar";
    let transport = Arc::new(MockTransport::new().route(url, Reply::ok(PAYLOAD_16)));
    let downloader = DownloaderBuilder::hidden()
        .transport(transport)
        .build()
        .unwrap();
    let dir = create_temp_dir();

    let task = downloader
        .task_in_dir(url, dir.path().join("mods"))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(task.dest(), dir.path().join("mods/sodium fabric.jar"));

    let summaries = downloader.download(vec![task]).await;
    assert!(summaries[0].is_success());
    assert_file_content(&dir.path().join("mods/sodium fabric.jar"), PAYLOAD_16);
}

#[test]
fn test_settings_from_json() {
    let settings: DownloadSettings = serde_json::from_str(
        r#"{
            "threads": 4,
            "max_speed": 1048576,
            "transport": "pooled",
            "sidecar_format": "text",
            "mirror_rules": [
                { "prefix": "https://libraries.minecraft.net/", "replacement": "https://bmclapi2.bangbang93.com/maven/" }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(settings.threads, 4);
    assert_eq!(settings.max_speed, 1_048_576);
    assert_eq!(settings.transport, TransportKind::Pooled);
    assert_eq!(settings.sidecar_format, SidecarFormat::Text);
    assert!(settings.resume);

    let downloader = DownloaderBuilder::hidden().settings(settings).build().unwrap();
    assert_eq!(downloader.threads(), 4);
    assert_eq!(downloader.throttle().rate(), 1_048_576);
}
