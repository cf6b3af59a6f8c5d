//! Minimal reader for local ZIP archives.
//!
//! Installer jars and modpack archives are plain ZIP files. Reading a single
//! entry only needs the End of Central Directory record, the central
//! directory and the entry's local header, so nothing else is parsed.
//! Stored and deflated entries are supported, ZIP64 archives are not.

use crate::error::{Error, Result};

use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const EOCD_SIGNATURE: &[u8] = &[0x50, 0x4b, 0x05, 0x06];
const CENTRAL_DIR_SIGNATURE: &[u8] = &[0x50, 0x4b, 0x01, 0x02];
const LOCAL_HEADER_SIGNATURE: &[u8] = &[0x50, 0x4b, 0x03, 0x04];
const EOCD_MIN_SIZE: usize = 22;
// EOCD plus the largest possible archive comment.
const EOCD_SEARCH_SIZE: u64 = EOCD_MIN_SIZE as u64 + u16::MAX as u64;
const CENTRAL_DIR_ENTRY_MIN_SIZE: usize = 46;
const LOCAL_HEADER_MIN_SIZE: usize = 30;
const COMPRESSION_STORED: u16 = 0;
const COMPRESSION_DEFLATE: u16 = 8;

/// Information about a file in a ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileInfo {
    pub name: String,
    pub compression_method: u16,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
}

fn archive_error(message: impl Into<String>) -> Error {
    Error::Archive {
        message: message.into(),
    }
}

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// An opened archive with its parsed central directory.
#[derive(Debug)]
pub struct ZipArchive {
    file: File,
    entries: Vec<ZipFileInfo>,
}

impl ZipArchive {
    /// Open `path` and read its central directory.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| Error::local_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| Error::local_io(path, e))?
            .len();
        if size < EOCD_MIN_SIZE as u64 {
            return Err(archive_error(format!("{} is too small to be a ZIP", path.display())));
        }

        let tail_size = EOCD_SEARCH_SIZE.min(size);
        let tail = read_at(&mut file, size - tail_size, tail_size as usize)
            .map_err(|e| Error::local_io(path, e))?;

        let eocd_offset = tail
            .windows(4)
            .rposition(|window| window == EOCD_SIGNATURE)
            .ok_or_else(|| archive_error("Could not find End of Central Directory Record"))?;
        let eocd = &tail[eocd_offset..];
        if eocd.len() < EOCD_MIN_SIZE {
            return Err(archive_error("Invalid EOCD record"));
        }

        let cd_size = u32_at(eocd, 12) as u64;
        let cd_offset = u32_at(eocd, 16) as u64;
        if cd_offset == u32::MAX as u64 || cd_size == u32::MAX as u64 {
            return Err(archive_error("ZIP64 archives are not supported"));
        }
        if cd_offset + cd_size > size {
            return Err(archive_error("Central directory lies outside the archive"));
        }

        let cd_data = read_at(&mut file, cd_offset, cd_size as usize)
            .map_err(|e| Error::local_io(path, e))?;
        let entries = parse_central_directory(&cd_data);

        Ok(Self { file, entries })
    }

    /// All entries of the archive.
    pub fn entries(&self) -> &[ZipFileInfo] {
        &self.entries
    }

    /// Look up an entry by its exact name.
    pub fn entry(&self, name: &str) -> Option<&ZipFileInfo> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Read and decompress an entry. Returns `None` if there is no such entry.
    pub fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(info) = self.entry(name).cloned() else {
            return Ok(None);
        };

        let header = read_at(&mut self.file, info.local_header_offset, LOCAL_HEADER_MIN_SIZE)
            .map_err(|_| archive_error("Failed to read local file header"))?;
        if &header[0..4] != LOCAL_HEADER_SIGNATURE {
            return Err(archive_error(format!("Invalid local file header for '{}'", name)));
        }

        let filename_length = u16_at(&header, 26) as u64;
        let extra_field_length = u16_at(&header, 28) as u64;
        let data_start = info.local_header_offset
            + LOCAL_HEADER_MIN_SIZE as u64
            + filename_length
            + extra_field_length;

        let compressed = read_at(&mut self.file, data_start, info.compressed_size as usize)
            .map_err(|_| archive_error(format!("Failed to read data of '{}'", name)))?;

        let data = match info.compression_method {
            COMPRESSION_STORED => compressed,
            COMPRESSION_DEFLATE => {
                let mut decoder = DeflateDecoder::new(&compressed[..]);
                // The declared size is untrusted, so it only sizes the first allocation.
                let capacity = (info.uncompressed_size as usize).min(compressed.len().saturating_mul(8));
                let mut decompressed = Vec::with_capacity(capacity);
                decoder
                    .read_to_end(&mut decompressed)
                    .map_err(|e| archive_error(format!("Deflate decompression failed: {}", e)))?;
                decompressed
            }
            method => {
                return Err(archive_error(format!(
                    "Unsupported compression method {} for '{}'",
                    method, name
                )))
            }
        };
        Ok(Some(data))
    }
}

fn read_at(file: &mut File, offset: u64, len: usize) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Parse every entry of a central directory, stopping at the first malformed one.
fn parse_central_directory(cd_data: &[u8]) -> Vec<ZipFileInfo> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset + CENTRAL_DIR_ENTRY_MIN_SIZE <= cd_data.len() {
        if &cd_data[offset..offset + 4] != CENTRAL_DIR_SIGNATURE {
            break;
        }

        let compression_method = u16_at(cd_data, offset + 10);
        let compressed_size = u32_at(cd_data, offset + 20) as u64;
        let uncompressed_size = u32_at(cd_data, offset + 24) as u64;
        let filename_length = u16_at(cd_data, offset + 28) as usize;
        let extra_field_length = u16_at(cd_data, offset + 30) as usize;
        let comment_length = u16_at(cd_data, offset + 32) as usize;
        let local_header_offset = u32_at(cd_data, offset + 42) as u64;

        let filename_start = offset + CENTRAL_DIR_ENTRY_MIN_SIZE;
        if filename_start + filename_length > cd_data.len() {
            break;
        }
        let name =
            String::from_utf8_lossy(&cd_data[filename_start..filename_start + filename_length])
                .into_owned();

        entries.push(ZipFileInfo {
            name,
            compression_method,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        });

        offset += CENTRAL_DIR_ENTRY_MIN_SIZE + filename_length + extra_field_length + comment_length;
    }

    entries
}
