//! Reading `desc` metadata blocks out of repository snapshot archives.
//!
//! A snapshot is a tar archive, usually compressed, holding one directory
//! per package build (`<name>-<version>/`) with a `desc` file inside.
//! Other entries (signatures, `files` lists, directories) are skipped.

use std::{
    fmt,
    io::{Cursor, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use tar::{Archive, Entries, EntryType};
use tracing::{debug, trace};
use xz2::read::XzDecoder;

use crate::error::{RegistryError, Result};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

/// File name that marks a package metadata entry.
pub const DESC_FILE_NAME: &str = "desc";

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Xz,
    Zstd,
    None,
}

impl Compression {
    /// Detects the compression from the leading magic bytes of `blob`.
    /// Anything unrecognised is treated as a plain tar stream.
    pub fn detect(blob: &[u8]) -> Self {
        if blob.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if blob.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else if blob.starts_with(ZSTD_MAGIC) {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::Gzip => "gzip",
            Compression::Xz => "xz",
            Compression::Zstd => "zstd",
            Compression::None => "none",
        };
        f.write_str(name)
    }
}

/// Raw bytes of one `desc` entry; decoded when the block is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescBlock {
    /// Path of the entry inside the archive, e.g. `foo-1.0-1/desc`.
    pub path: String,
    pub content: Vec<u8>,
}

/// A snapshot archive opened over a borrowed byte blob.
pub struct SnapshotArchive<'a> {
    archive: Archive<Box<dyn Read + 'a>>,
    compression: Compression,
}

impl<'a> SnapshotArchive<'a> {
    /// Opens `blob` as a snapshot archive.
    ///
    /// Decompression is streamed, so a corrupt body is reported by the
    /// block iterator rather than here.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ArchiveFormat`] if the blob is empty or the
    /// decompressor rejects its header.
    pub fn open(blob: &'a [u8]) -> Result<Self> {
        if blob.is_empty() {
            return Err(RegistryError::ArchiveFormat("snapshot is empty".into()));
        }

        let compression = Compression::detect(blob);
        debug!(compression = %compression, size = blob.len(), "opening snapshot archive");

        let reader: Box<dyn Read + 'a> = match compression {
            Compression::Gzip => Box::new(GzDecoder::new(blob)),
            Compression::Xz => Box::new(XzDecoder::new(blob)),
            Compression::Zstd => {
                Box::new(zstd::stream::read::Decoder::new(blob).map_err(|err| {
                    RegistryError::ArchiveFormat(format!("invalid zstd stream: {err}"))
                })?)
            }
            Compression::None => Box::new(Cursor::new(blob)),
        };

        Ok(Self {
            archive: Archive::new(reader),
            compression,
        })
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Lazily iterates over the `desc` entries of the archive.
    ///
    /// The iterator stops after the first error.
    pub fn desc_blocks(&mut self) -> Result<DescBlocks<'_, 'a>> {
        let entries = self
            .archive
            .entries()
            .map_err(|err| RegistryError::ArchiveFormat(err.to_string()))?;

        Ok(DescBlocks {
            entries,
            done: false,
        })
    }
}

/// Iterator over the `desc` entries of a [`SnapshotArchive`].
pub struct DescBlocks<'s, 'a> {
    entries: Entries<'s, Box<dyn Read + 'a>>,
    done: bool,
}

impl Iterator for DescBlocks<'_, '_> {
    type Item = Result<DescBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let mut entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    self.done = true;
                    return Some(Err(RegistryError::ArchiveFormat(err.to_string())));
                }
            };

            let path = match entry.path() {
                Ok(path) => path.to_string_lossy().into_owned(),
                Err(err) => {
                    self.done = true;
                    return Some(Err(RegistryError::ArchiveFormat(err.to_string())));
                }
            };

            if !is_desc_entry(entry.header().entry_type(), Path::new(&path)) {
                trace!(path, "skipping archive entry");
                continue;
            }

            let mut content = Vec::new();
            if let Err(err) = entry.read_to_end(&mut content) {
                self.done = true;
                return Some(Err(RegistryError::ArchiveFormat(format!(
                    "failed to read {path}: {err}"
                ))));
            }

            return Some(Ok(DescBlock { path, content }));
        }
    }
}

fn is_desc_entry(entry_type: EntryType, path: &Path) -> bool {
    entry_type.is_file()
        && path.file_name().is_some_and(|name| name == DESC_FILE_NAME)
        && path.components().count() > 1
}

/// Reads every `desc` block of `blob` into memory.
pub fn read_desc_blocks(blob: &[u8]) -> Result<Vec<DescBlock>> {
    let mut archive = SnapshotArchive::open(blob)?;
    let blocks = archive.desc_blocks()?.collect::<Result<Vec<_>>>()?;
    debug!(count = blocks.len(), "read desc blocks from snapshot");
    Ok(blocks)
}
