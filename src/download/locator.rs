//! Local sources that can stand in for a network fetch.
//!
//! Installers often download an archive that already contains files the
//! next step would otherwise fetch again (the Forge installer ships its
//! universal jar, a modpack zip ships its overrides). A
//! [`LocalSourceLocator`] attached to a task supplies those bytes instead.
//! The engine still validates whatever a locator hands over.

use crate::archive::ZipArchive;
use crate::error::{Error, Result};

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Bytes supplied by a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSource {
    /// Copy this file.
    File(PathBuf),
    /// Write these bytes.
    Bytes(Vec<u8>),
}

/// Supplies destination files from somewhere other than the network.
#[async_trait]
pub trait LocalSourceLocator: Send + Sync + fmt::Debug {
    /// The source for `dest`, or `None` when this locator cannot provide it.
    async fn locate(&self, dest: &Path) -> Result<Option<LocalSource>>;

    /// Called once `dest` was written from this locator and validated.
    async fn on_supplied(&self, _dest: &Path) -> Result<()> {
        Ok(())
    }
}

/// `dest` relative to `base`, as a `/` separated archive entry name.
fn relative_entry(base: &Path, dest: &Path) -> Option<String> {
    let relative = dest.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Serves destinations below `base` from the same relative path below `source`.
///
/// Useful to reuse an existing installation, for example another launcher's
/// `libraries` directory.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    base: PathBuf,
    source: PathBuf,
}

impl DirectoryLocator {
    pub fn new(base: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            source: source.into(),
        }
    }
}

#[async_trait]
impl LocalSourceLocator for DirectoryLocator {
    async fn locate(&self, dest: &Path) -> Result<Option<LocalSource>> {
        let Some(entry) = relative_entry(&self.base, dest) else {
            return Ok(None);
        };
        let candidate = self.source.join(entry);
        match tokio::fs::metadata(&candidate).await {
            Ok(metadata) if metadata.is_file() => {
                debug!("Found {:?} locally at {:?}", dest, candidate);
                Ok(Some(LocalSource::File(candidate)))
            }
            _ => Ok(None),
        }
    }
}

/// Serves destinations from entries of a local ZIP archive.
///
/// Entries are resolved either from explicit `dest -> entry` mappings or, for
/// destinations below a base directory, by joining a prefix with the relative
/// path.
///
/// ```rust
/// use packfetch::download::ArchiveLocator;
///
/// let locator = ArchiveLocator::new("cache/forge-installer.jar")
///     .entry("libraries/forge-universal.jar", "maven/net/minecraftforge/forge/forge-universal.jar")
///     .prefix("libraries", "maven");
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveLocator {
    archive: PathBuf,
    entries: HashMap<PathBuf, String>,
    prefix: Option<(PathBuf, String)>,
}

impl ArchiveLocator {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            entries: HashMap::new(),
            prefix: None,
        }
    }

    /// Serve `dest` from the entry `name`.
    pub fn entry(mut self, dest: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        self.entries.insert(dest.into(), name.into());
        self
    }

    /// Serve destinations below `base` from entries below `prefix`.
    pub fn prefix(mut self, base: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.prefix = Some((base.into(), prefix.into().trim_end_matches('/').to_owned()));
        self
    }

    fn entry_name(&self, dest: &Path) -> Option<String> {
        if let Some(name) = self.entries.get(dest) {
            return Some(name.clone());
        }
        let (base, prefix) = self.prefix.as_ref()?;
        let relative = relative_entry(base, dest)?;
        Some(if prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", prefix, relative)
        })
    }
}

#[async_trait]
impl LocalSourceLocator for ArchiveLocator {
    async fn locate(&self, dest: &Path) -> Result<Option<LocalSource>> {
        let Some(name) = self.entry_name(dest) else {
            return Ok(None);
        };
        if !tokio::fs::try_exists(&self.archive)
            .await
            .map_err(|e| Error::local_io(&self.archive, e))?
        {
            return Ok(None);
        }

        let archive = self.archive.clone();
        let entry = name.clone();
        let data = tokio::task::spawn_blocking(move || ZipArchive::open(&archive)?.read(&entry))
            .await
            .map_err(|e| Error::Internal(format!("archive reader failed: {}", e)))??;

        if data.is_some() {
            debug!("Found {:?} in {:?} as '{}'", dest, self.archive, name);
        }
        Ok(data.map(LocalSource::Bytes))
    }
}
