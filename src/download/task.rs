//! A single resumable, validated file transfer.
//!
//! [`DownloadTask::execute`] runs these steps in order:
//!
//! 1. Redundancy check: a destination that already satisfies the
//!    [`ValidationSpec`] is left alone.
//! 2. Local source: an attached [`LocalSourceLocator`] may supply the bytes.
//! 3. Companion hashes: `<url>.sha1` and friends fill in a missing digest.
//! 4. Fetch, per location (primary URL, then each mirror): conditional and
//!    range headers, streaming hash, throttling, write to `<dest>.part`.
//! 5. Verification of the finished part file, atomic rename over the
//!    destination and sidecar update.
//!
//! Transport and validation failures move on to the next location. Local I/O
//! failures end the task immediately.
//!
//! # Examples
//!
//! ```rust,no_run
//! use packfetch::download::{DownloadTask, Outcome, ValidationSpec};
//! use packfetch::progress::NoProgress;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> packfetch::Result<()> {
//! let spec = ValidationSpec::builder()
//!     .size(16)
//!     .sha1("ce27cb141098feb00714e758646be3e99c185b71")?
//!     .build();
//!
//! let mut task = DownloadTask::builder(
//!     "https://piston-data.mojang.com/v1/objects/abc/client.jar",
//!     "instances/demo/client.jar",
//! )
//! .mirror("https://bmclapi2.bangbang93.com/v1/objects/abc/client.jar")
//! .validation(spec)
//! .build()?;
//!
//! match task.execute(&CancellationToken::new(), &NoProgress).await? {
//!     Outcome::Cancelled => println!("cancelled"),
//!     outcome => println!("{}", outcome),
//! }
//! # Ok(())
//! # }
//! ```

use super::companion;
use super::hash::{hash_into, HashingTransform};
use super::locator::{LocalSource, LocalSourceLocator};
use super::summary::{Outcome, Summary, TaskState};
use super::validation::ValidationSpec;
use crate::cache::{CacheSidecar, SidecarFormat};
use crate::error::{Error, Result};
use crate::http::{FetchRequest, FetchResponse, HttpClientConfig, NativeTransport, Transport};
use crate::progress::{ProgressEvent, ProgressListener};
use crate::throttle::Throttle;

use futures::StreamExt;
use reqwest::{StatusCode, Url};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, fs::OpenOptions, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const PART_SUFFIX: &str = ".part";
const LOCAL_SUFFIX: &str = ".local";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Path of the partial file a transfer to `dest` writes into.
pub fn part_path(dest: &Path) -> PathBuf {
    with_suffix(dest, PART_SUFFIX)
}

/// File name of the last path segment of `url`, percent-decoded.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .map(|(key, val)| [key, val].concat())
                .collect::<String>()
        })
        .ok_or_else(|| Error::InvalidUrl(format!("the url \"{}\" does not contain a filename", url)))
}

async fn len_if_exists(path: &Path) -> Result<Option<u64>> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::local_io(path, e)),
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::local_io(path, e)),
    }
}

/// One logical download: a URL with its mirrors, a destination and what the
/// destination must look like afterwards.
///
/// A task is executed once. Build a new one to fetch again.
pub struct DownloadTask {
    url: String,
    mirrors: Vec<String>,
    dest: PathBuf,
    validation: ValidationSpec,
    locator: Option<Arc<dyn LocalSourceLocator>>,
    resume: bool,
    max_speed: u64,
    companion_hashes: bool,
    accepted_statuses: Vec<StatusCode>,
    sidecar_format: SidecarFormat,
    transport: Arc<dyn Transport>,
    throttle: Arc<Throttle>,
    speed_limit: Option<Throttle>,
    state: TaskState,
    attempts: usize,
    source_url: Option<String>,
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTask")
            .field("url", &self.url)
            .field("mirrors", &self.mirrors)
            .field("dest", &self.dest)
            .field("validation", &self.validation)
            .field("locator", &self.locator)
            .field("resume", &self.resume)
            .field("max_speed", &self.max_speed)
            .field("companion_hashes", &self.companion_hashes)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DownloadTask {
    /// Start building a task fetching `url` into `dest`.
    pub fn builder(url: impl Into<String>, dest: impl Into<PathBuf>) -> DownloadTaskBuilder {
        DownloadTaskBuilder::new(url.into(), dest.into())
    }

    /// Start building a task fetching `url` into `dir`, named after the URL's
    /// last path segment.
    pub fn builder_in_dir(url: impl Into<String>, dir: impl AsRef<Path>) -> Result<DownloadTaskBuilder> {
        let url = url.into();
        let name = file_name_from_url(&url)?;
        Ok(DownloadTaskBuilder::new(url, dir.as_ref().join(name)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn validation(&self) -> &ValidationSpec {
        &self.validation
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Number of locations tried so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Use `mirrors` unless the task declared mirrors of its own.
    pub(crate) fn fill_mirrors(&mut self, mirrors: Vec<String>) {
        if self.mirrors.is_empty() {
            self.mirrors = mirrors;
        }
    }

    /// Whether the destination already satisfies the validation spec.
    pub async fn is_redundant(&self) -> Result<bool> {
        self.validation.is_redundant(&self.dest).await
    }

    /// Summarize the result of [`execute`](Self::execute).
    pub fn summary(&self, result: &Result<Outcome>) -> Summary {
        let summary = Summary::new(self.source_url.as_deref().unwrap_or(&self.url), &self.dest)
            .with_attempts(self.attempts);
        match result {
            Ok(outcome) => summary.with_outcome(outcome.clone()),
            Err(e) => summary.fail(e),
        }
    }

    fn transition(&mut self, next: TaskState) {
        debug!("{:?}: {} -> {}", self.dest, self.state, next);
        self.state = next;
    }

    fn finish(&mut self, outcome: Outcome) -> Result<Outcome> {
        let state = match outcome {
            Outcome::Cancelled => TaskState::Cancelled,
            Outcome::Skipped(_) => TaskState::Skipped,
            _ => TaskState::Installed,
        };
        self.transition(state);
        Ok(outcome)
    }

    fn fail(&mut self, error: Error) -> Result<Outcome> {
        self.transition(TaskState::Failed);
        Err(error)
    }

    /// Run the task to completion.
    ///
    /// Returns the [`Outcome`] on success or cancellation. Failures of
    /// individual locations are logged; once every location failed a single
    /// [`Error::ExhaustedMirrors`] is returned. Local I/O errors are returned
    /// as they happen.
    pub async fn execute(
        &mut self,
        cancel: &CancellationToken,
        listener: &dyn ProgressListener,
    ) -> Result<Outcome> {
        if self.state != TaskState::Pending {
            return Err(Error::Internal(format!(
                "task for {:?} was already executed ({})",
                self.dest, self.state
            )));
        }
        if cancel.is_cancelled() {
            return self.finish(Outcome::Cancelled);
        }

        match self.prepare(cancel).await {
            Ok(Some(outcome)) => return self.finish(outcome),
            Ok(None) => {}
            Err(e) => return self.fail(e),
        }

        let locations: Vec<String> = std::iter::once(self.url.clone())
            .chain(self.mirrors.iter().cloned())
            .collect();

        let validation = self.effective_validation(&locations, cancel).await;
        if cancel.is_cancelled() {
            return self.finish(Outcome::Cancelled);
        }
        if validation != self.validation {
            match validation.is_redundant(&self.dest).await {
                Ok(true) => {
                    info!("{:?} matches its companion hash, skipping", self.dest);
                    self.transition(TaskState::Redundant);
                    return self.finish(Outcome::Redundant);
                }
                Ok(false) => {}
                Err(e) => return self.fail(e),
            }
        }

        for (index, location) in locations.iter().enumerate() {
            if cancel.is_cancelled() {
                return self.finish(Outcome::Cancelled);
            }
            // Partial bytes are only resumed against the location that wrote them.
            if index > 0 {
                if let Err(e) = remove_if_exists(&part_path(&self.dest)).await {
                    return self.fail(e);
                }
            }
            self.transition(TaskState::Fetching(index));
            self.attempts += 1;

            match self.attempt(location, &validation, cancel, listener).await {
                Ok(outcome) => {
                    self.source_url = Some(location.clone());
                    return self.finish(outcome);
                }
                Err(e) if e.is_mirror_retryable() => {
                    warn!("Attempt {} for {:?} failed: {}", self.attempts, self.dest, e);
                }
                Err(e) => return self.fail(e),
            }
        }

        let error = Error::ExhaustedMirrors {
            url: self.url.clone(),
            attempts: self.attempts,
        };
        self.fail(error)
    }

    /// Redundancy check and local source. Returns an outcome when no fetch is needed.
    async fn prepare(&mut self, cancel: &CancellationToken) -> Result<Option<Outcome>> {
        if self.validation.is_redundant(&self.dest).await? {
            debug!("{:?} already satisfies its validation spec", self.dest);
            self.transition(TaskState::Redundant);
            return Ok(Some(Outcome::Redundant));
        }

        if let Some(parent) = self.dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::local_io(parent, e))?;
        }

        if cancel.is_cancelled() {
            return Ok(Some(Outcome::Cancelled));
        }

        if let Some(locator) = self.locator.clone() {
            if let Some(source) = locator.locate(&self.dest).await? {
                self.transition(TaskState::LocalCopy);
                if self.install_local(source).await? {
                    locator.on_supplied(&self.dest).await?;
                    return Ok(Some(Outcome::LocalCopy));
                }
            }
        }
        Ok(None)
    }

    /// Copy a local source into place. Returns `false` when it fails validation.
    async fn install_local(&mut self, source: LocalSource) -> Result<bool> {
        let staging = with_suffix(&self.dest, LOCAL_SUFFIX);
        match source {
            LocalSource::File(path) => {
                fs::copy(&path, &staging)
                    .await
                    .map_err(|e| Error::local_io(&path, e))?;
            }
            LocalSource::Bytes(bytes) => {
                fs::write(&staging, bytes)
                    .await
                    .map_err(|e| Error::local_io(&staging, e))?;
            }
        }

        self.transition(TaskState::Verifying);
        match self.validation.verify_file(&staging).await {
            Ok(()) => {
                fs::rename(&staging, &self.dest)
                    .await
                    .map_err(|e| Error::local_io(&self.dest, e))?;
                debug!("Installed {:?} from a local source", self.dest);
                Ok(true)
            }
            Err(Error::Validation { reason, .. }) => {
                warn!("Local source for {:?} rejected: {}", self.dest, reason);
                remove_if_exists(&staging).await?;
                Ok(false)
            }
            Err(e) => {
                remove_if_exists(&staging).await?;
                Err(e)
            }
        }
    }

    /// The validation spec for this run, with a companion digest folded in
    /// when the task asks for one and has none.
    async fn effective_validation(
        &self,
        locations: &[String],
        cancel: &CancellationToken,
    ) -> ValidationSpec {
        if !self.companion_hashes || !self.validation.expected_hashes().is_empty() {
            return self.validation.clone();
        }
        match companion::discover(self.transport.as_ref(), locations, cancel).await {
            Some((algorithm, digest)) => self.validation.with_discovered_hash(algorithm, digest),
            None => self.validation.clone(),
        }
    }

    /// Headers for a conditional request, when the destination and a sidecar exist.
    ///
    /// A spec with a size or digest never sends them: an existing destination
    /// that got this far has already failed that check.
    async fn conditional_request(&self, url: &str, validation: &ValidationSpec) -> Result<FetchRequest> {
        let mut request = FetchRequest::new(url);
        if !validation.uses_conditional_requests()
            || validation.has_integrity()
            || len_if_exists(&self.dest).await?.is_none()
        {
            return Ok(request);
        }
        if let Some(sidecar) = CacheSidecar::load(&self.dest).await {
            if validation.use_etag() {
                request.if_none_match = sidecar.etag.clone();
            }
            if validation.use_only_if_newer() {
                request.if_modified_since = sidecar.if_modified_since();
            }
        }
        Ok(request)
    }

    /// Offset to resume from, discarding partial files that cannot be resumed.
    async fn resume_offset(&self, part: &Path, validation: &ValidationSpec) -> Result<u64> {
        let Some(existing) = len_if_exists(part).await? else {
            return Ok(0);
        };
        if !self.resume || existing == 0 {
            remove_if_exists(part).await?;
            return Ok(0);
        }
        if validation.expected_size().is_some_and(|size| existing > size) {
            debug!("Discarding oversized partial file {:?}", part);
            remove_if_exists(part).await?;
            return Ok(0);
        }
        Ok(existing)
    }

    /// Move a verified part file over the destination and record the cache headers.
    async fn install(&self, part: &Path, etag: Option<&str>, last_modified: Option<&str>) -> Result<()> {
        fs::rename(part, &self.dest)
            .await
            .map_err(|e| Error::local_io(&self.dest, e))?;

        let sidecar = CacheSidecar::from_headers(etag, last_modified);
        let stored = if sidecar.is_empty() {
            CacheSidecar::remove(&self.dest).await
        } else {
            sidecar.store(&self.dest, self.sidecar_format).await
        };
        if let Err(e) = stored {
            warn!("Could not update cache metadata of {:?}: {}", self.dest, e);
        }
        Ok(())
    }

    /// One fetch from one location.
    async fn attempt(
        &mut self,
        url: &str,
        validation: &ValidationSpec,
        cancel: &CancellationToken,
        listener: &dyn ProgressListener,
    ) -> Result<Outcome> {
        let part = part_path(&self.dest);
        let conditional = self.conditional_request(url, validation).await?;
        let is_conditional =
            conditional.if_none_match.is_some() || conditional.if_modified_since.is_some();
        let offset = self.resume_offset(&part, validation).await?;

        // A complete part file from an interrupted install needs no request.
        if offset > 0 && validation.expected_size() == Some(offset) {
            self.transition(TaskState::Verifying);
            if validation.verify_file(&part).await.is_ok() {
                debug!("Partial file {:?} is already complete", part);
                self.install(&part, None, None).await?;
                return Ok(Outcome::Downloaded {
                    bytes: 0,
                    resumed_from: offset,
                });
            }
            remove_if_exists(&part).await?;
            return self.fetch(url, conditional, 0, validation, cancel, listener).await;
        }

        if offset > 0 {
            debug!("Resuming {:?} at byte {}", self.dest, offset);
        }
        let outcome = self
            .fetch(url, conditional, offset, validation, cancel, listener)
            .await;
        if is_conditional && matches!(outcome, Ok(Outcome::NotModified)) {
            remove_if_exists(&part).await?;
        }
        outcome
    }

    async fn fetch(
        &mut self,
        url: &str,
        request: FetchRequest,
        offset: u64,
        validation: &ValidationSpec,
        cancel: &CancellationToken,
        listener: &dyn ProgressListener,
    ) -> Result<Outcome> {
        let part = part_path(&self.dest);
        let is_conditional = request.if_none_match.is_some() || request.if_modified_since.is_some();
        let request = request.range_from(offset);

        debug!("Fetching {} into {:?}", url, part);
        let FetchResponse {
            status,
            etag,
            last_modified,
            total_length,
            body_offset,
            mut body,
        } = self.transport.fetch(&request).await?;

        if status == StatusCode::NOT_MODIFIED {
            if is_conditional {
                info!("{:?} is not modified on the server", self.dest);
                return Ok(Outcome::NotModified);
            }
            return Err(Error::transport(url, "unexpected 304 for an unconditional request"));
        }
        if !status.is_success() {
            if self.accepted_statuses.contains(&status) {
                info!("Skipping {:?}: server answered {}", self.dest, status);
                return Ok(Outcome::Skipped(format!("HTTP {}", status)));
            }
            return Err(Error::transport(url, format!("HTTP {}", status)));
        }

        let resumed_from = match (status == StatusCode::PARTIAL_CONTENT, body_offset) {
            (true, start) if start == offset => offset,
            (true, start) => {
                return Err(Error::transport(
                    url,
                    format!("asked for bytes from {} but got bytes from {}", offset, start),
                ))
            }
            (false, _) => {
                if offset > 0 {
                    debug!("Server ignored the range request, restarting {:?}", self.dest);
                }
                0
            }
        };

        let mut hashing = HashingTransform::new(validation.expected_hashes().keys().copied());
        if resumed_from > 0 && !hashing.is_empty() {
            hash_into(&part, &mut hashing).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(resumed_from > 0)
            .truncate(resumed_from == 0)
            .open(&part)
            .await
            .map_err(|e| Error::local_io(&part, e))?;

        let total = total_length.or(validation.expected_size());
        let mut position = resumed_from;
        let mut received: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                chunk = body.next() => Some(chunk),
            };
            let Some(next) = next else {
                file.flush().await.map_err(|e| Error::local_io(&part, e))?;
                info!("Download of {:?} cancelled at byte {}", self.dest, position);
                return Ok(Outcome::Cancelled);
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    file.flush().await.map_err(|e| Error::local_io(&part, e))?;
                    return Err(e);
                }
            };

            let len = chunk.len() as u64;
            hashing.update(&chunk);
            self.throttle.acquire(len).await;
            if let Some(limit) = &self.speed_limit {
                limit.acquire(len).await;
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::local_io(&part, e))?;

            position += len;
            received += len;
            listener.on_progress(ProgressEvent::chunk(position, len, total));

            if let Some(expected) = validation.expected_size() {
                if position > expected {
                    drop(file);
                    remove_if_exists(&part).await?;
                    return Err(Error::Validation {
                        path: self.dest.clone(),
                        reason: format!("received more than the expected {} bytes", expected),
                    });
                }
            }
        }

        file.flush().await.map_err(|e| Error::local_io(&part, e))?;
        drop(file);
        listener.on_progress(ProgressEvent::finished(position, total));

        self.transition(TaskState::Verifying);
        if let Some(reason) = validation.mismatch(position, &hashing.finish()) {
            remove_if_exists(&part).await?;
            return Err(Error::Validation {
                path: self.dest.clone(),
                reason,
            });
        }

        self.install(&part, etag.as_deref(), last_modified.as_deref())
            .await?;
        info!("Downloaded {:?} ({} bytes)", self.dest, position);
        Ok(Outcome::Downloaded {
            bytes: received,
            resumed_from,
        })
    }
}

/// Fluent builder for [`DownloadTask`].
pub struct DownloadTaskBuilder {
    url: String,
    mirrors: Vec<String>,
    dest: PathBuf,
    validation: ValidationSpec,
    locator: Option<Arc<dyn LocalSourceLocator>>,
    resume: bool,
    max_speed: u64,
    companion_hashes: bool,
    accepted_statuses: Vec<StatusCode>,
    sidecar_format: SidecarFormat,
    transport: Option<Arc<dyn Transport>>,
    throttle: Option<Arc<Throttle>>,
}

impl DownloadTaskBuilder {
    fn new(url: String, dest: PathBuf) -> Self {
        Self {
            url,
            mirrors: Vec::new(),
            dest,
            validation: ValidationSpec::default(),
            locator: None,
            resume: true,
            max_speed: 0,
            companion_hashes: false,
            accepted_statuses: Vec::new(),
            sidecar_format: SidecarFormat::default(),
            transport: None,
            throttle: None,
        }
    }

    /// Add a fallback location. Mirrors are tried in the order they were added.
    pub fn mirror(mut self, url: impl Into<String>) -> Self {
        self.mirrors.push(url.into());
        self
    }

    pub fn mirrors<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn validation(mut self, validation: ValidationSpec) -> Self {
        self.validation = validation;
        self
    }

    pub fn locator(mut self, locator: Arc<dyn LocalSourceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Continue from a `<dest>.part` file left by an interrupted attempt. On by default.
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Per-task speed cap in bytes per second, 0 for none.
    pub fn max_speed(mut self, bytes_per_sec: u64) -> Self {
        self.max_speed = bytes_per_sec;
        self
    }

    /// Look for `<url>.sha1`, `<url>.md5`, ... when no digest was given.
    pub fn companion_hashes(mut self, enabled: bool) -> Self {
        self.companion_hashes = enabled;
        self
    }

    /// Treat `status` as "nothing to fetch" instead of a failure.
    pub fn accept_status(mut self, status: StatusCode) -> Self {
        self.accepted_statuses.push(status);
        self
    }

    pub fn sidecar_format(mut self, format: SidecarFormat) -> Self {
        self.sidecar_format = format;
        self
    }

    /// Transport to fetch with. Defaults to a [`NativeTransport`] with default settings.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Bandwidth budget shared with other tasks.
    pub fn throttle(mut self, throttle: Arc<Throttle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Create the [`DownloadTask`], checking every URL.
    pub fn build(self) -> Result<DownloadTask> {
        for url in std::iter::once(&self.url).chain(&self.mirrors) {
            Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(NativeTransport::new(&HttpClientConfig::default())?),
        };

        Ok(DownloadTask {
            url: self.url,
            mirrors: self.mirrors,
            dest: self.dest,
            validation: self.validation,
            locator: self.locator,
            resume: self.resume,
            max_speed: self.max_speed,
            companion_hashes: self.companion_hashes,
            accepted_statuses: self.accepted_statuses,
            sidecar_format: self.sidecar_format,
            transport,
            throttle: self.throttle.unwrap_or_default(),
            speed_limit: (self.max_speed > 0).then(|| Throttle::new(self.max_speed)),
            state: TaskState::Pending,
            attempts: 0,
            source_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://cdn.modrinth.com/data/AANobbMI/versions/1/sodium-fabric.jar")
                .unwrap(),
            "sodium-fabric.jar"
        );
        assert_eq!(
            file_name_from_url("https://example.com/files/Just%20Enough%20Items.jar").unwrap(),
            "Just Enough Items.jar"
        );
        assert!(matches!(
            file_name_from_url("https://example.com/"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(file_name_from_url("not a url").is_err());
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("mods/sodium.jar")),
            PathBuf::from("mods/sodium.jar.part")
        );
    }

    #[test]
    fn test_builder_in_dir() {
        let task = DownloadTask::builder_in_dir("https://example.com/a/b/fabric.jar", "mods")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(task.dest(), Path::new("mods/fabric.jar"));
        assert_eq!(task.state(), TaskState::Pending);
    }

    #[test]
    fn test_builder_rejects_bad_mirror() {
        let result = DownloadTask::builder("https://example.com/a.jar", "a.jar")
            .mirror("::nope::")
            .build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_mirror_order() {
        let task = DownloadTask::builder("https://a.example/x.jar", "x.jar")
            .mirror("https://b.example/x.jar")
            .mirrors(["https://c.example/x.jar"])
            .build()
            .unwrap();
        assert_eq!(
            task.mirrors(),
            &["https://b.example/x.jar".to_string(), "https://c.example/x.jar".to_string()]
        );
    }
}
