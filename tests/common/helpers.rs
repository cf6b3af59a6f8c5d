use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use packfetch::download::{HashAlgorithm, LocalSource, LocalSourceLocator, ValidationSpec};
use packfetch::http::{FetchRequest, FetchResponse, Transport};
use packfetch::{Error, ProgressEvent, ProgressListener, Result};
use rand::RngCore;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

pub const PAYLOAD_16: &[u8] = b"0123456789ABCDEF";
pub const MOJANG_URL: &str = "https://piston-data.mojang.com/v1/objects/abc/client.jar";
pub const MIRROR_URL: &str = "https://bmclapi2.bangbang93.com/v1/objects/abc/client.jar";

/// Turn on engine logs with `RUST_LOG=packfetch=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Random bytes of the given length.
pub fn random_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    data
}

/// A spec requiring the exact size and SHA-256 of `data`.
pub fn strict_spec(data: &[u8]) -> ValidationSpec {
    ValidationSpec::builder()
        .size(data.len() as u64)
        .hash(HashAlgorithm::Sha256, HashAlgorithm::Sha256.digest(data))
        .build()
}

/// Asserts that a file holds exactly `expected`.
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let actual = fs::read(path).unwrap_or_else(|e| panic!("cannot read {:?}: {}", path, e));
    assert_eq!(actual.len(), expected.len(), "size mismatch at {:?}", path);
    assert!(actual == expected, "content mismatch at {:?}", path);
}

/// What the mock server answers for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A 200, or a 206 when the request carries a range and ranges are honored.
    Body {
        data: Vec<u8>,
        etag: Option<String>,
        last_modified: Option<String>,
        honor_range: bool,
        /// Break the connection after this many body bytes.
        cut_after: Option<usize>,
        chunk_size: usize,
    },
    NotModified,
    Status(u16),
    /// The connection cannot be established.
    Refused,
}

impl Reply {
    pub fn ok(data: &[u8]) -> Self {
        Reply::Body {
            data: data.to_vec(),
            etag: None,
            last_modified: None,
            honor_range: true,
            cut_after: None,
            chunk_size: 4,
        }
    }

    pub fn text(body: &str) -> Self {
        Reply::ok(body.as_bytes())
    }

    pub fn with_etag(mut self, value: &str) -> Self {
        if let Reply::Body { etag, .. } = &mut self {
            *etag = Some(value.to_string());
        }
        self
    }

    pub fn with_last_modified(mut self, value: &str) -> Self {
        if let Reply::Body { last_modified, .. } = &mut self {
            *last_modified = Some(value.to_string());
        }
        self
    }

    pub fn cut_after(mut self, bytes: usize) -> Self {
        if let Reply::Body { cut_after, .. } = &mut self {
            *cut_after = Some(bytes);
        }
        self
    }

    pub fn ignoring_range(mut self) -> Self {
        if let Reply::Body { honor_range, .. } = &mut self {
            *honor_range = false;
        }
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        if let Reply::Body { chunk_size, .. } = &mut self {
            *chunk_size = size.max(1);
        }
        self
    }
}

/// In-memory scripted [`Transport`].
///
/// Each URL has a queue of one-shot replies and an optional fallback reply.
/// Unknown URLs answer 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request for `url` with `reply`.
    pub fn route(self, url: &str, reply: Reply) -> Self {
        self.fallback.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    /// Answer the next request for `url` with `reply`, before any fallback.
    pub fn once(self, url: &str, reply: Reply) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> Vec<FetchRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }

    fn next_reply(&self, url: &str) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.fallback
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Reply::Status(404))
    }
}

fn empty_response(status: StatusCode) -> FetchResponse {
    FetchResponse {
        status,
        etag: None,
        last_modified: None,
        total_length: None,
        body_offset: 0,
        body: stream::empty().boxed(),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(request.clone());

        match self.next_reply(&request.url) {
            Reply::Refused => Err(Error::transport(&request.url, "connection refused")),
            Reply::NotModified => Ok(empty_response(StatusCode::NOT_MODIFIED)),
            Reply::Status(code) => Ok(empty_response(
                StatusCode::from_u16(code).expect("valid status code"),
            )),
            Reply::Body {
                data,
                etag,
                last_modified,
                honor_range,
                cut_after,
                chunk_size,
            } => {
                let offset = match request.range_start {
                    Some(start) if honor_range && (start as usize) < data.len() => start as usize,
                    _ => 0,
                };
                let status = if offset > 0 {
                    StatusCode::PARTIAL_CONTENT
                } else {
                    StatusCode::OK
                };

                let mut body = data[offset..].to_vec();
                let broken = cut_after.is_some_and(|cut| cut < body.len());
                if let Some(cut) = cut_after {
                    body.truncate(cut);
                }

                let mut items: Vec<Result<Bytes>> = body
                    .chunks(chunk_size)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect();
                if broken {
                    items.push(Err(Error::transport(&request.url, "connection reset")));
                }

                Ok(FetchResponse {
                    status,
                    etag,
                    last_modified,
                    total_length: Some(data.len() as u64),
                    body_offset: offset as u64,
                    body: stream::iter(items).boxed(),
                })
            }
        }
    }
}

/// Listener recording every event.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressListener for RecordingListener {
    fn on_progress(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Locator serving fixed bytes for one destination and counting completion hooks.
#[derive(Debug)]
pub struct BytesLocator {
    pub dest: PathBuf,
    pub data: Vec<u8>,
    pub supplied: AtomicUsize,
}

impl BytesLocator {
    pub fn new(dest: &Path, data: &[u8]) -> Self {
        Self {
            dest: dest.to_path_buf(),
            data: data.to_vec(),
            supplied: AtomicUsize::new(0),
        }
    }

    pub fn supplied(&self) -> usize {
        self.supplied.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalSourceLocator for BytesLocator {
    async fn locate(&self, dest: &Path) -> Result<Option<LocalSource>> {
        Ok((dest == self.dest).then(|| LocalSource::Bytes(self.data.clone())))
    }

    async fn on_supplied(&self, _dest: &Path) -> Result<()> {
        self.supplied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
