//! Locating the database bytes and choosing a backing store.
//!
//! Opening never fails. A missing resource degrades to
//! [`BackingStore::Unavailable`]; a mapping that cannot be set up falls back
//! to loading the bytes into memory. Each degradation reports exactly one
//! warning through [`Diagnostics`].

use crate::database::access::AndroidApiDataAccess;
use crate::database::backing::BackingStore;
use crate::database::format;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use bytes::Bytes;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::{CompressionMethod, ZipArchive};

/// Where the serialized database comes from.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// The database is not part of this distribution.
    Missing,
    /// A plain file.
    File(PathBuf),
    /// An entry inside a zip archive.
    ArchiveEntry {
        /// Path of the archive file.
        archive: PathBuf,
        /// Name of the entry holding the database.
        entry: String,
    },
    /// Bytes already in memory (e.g. embedded at build time).
    Bytes(Bytes),
}

impl ByteSource {
    /// A plain file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ByteSource::File(path.into())
    }

    /// An archive entry source.
    pub fn archive_entry(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        ByteSource::ArchiveEntry { archive: archive.into(), entry: entry.into() }
    }

    fn describe(&self) -> String {
        match self {
            ByteSource::Missing => "<missing>".to_string(),
            ByteSource::File(path) => path.display().to_string(),
            ByteSource::ArchiveEntry { archive, entry } => {
                format!("{}!/{}", archive.display(), entry)
            }
            ByteSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

/// Why the preferred backing could not be used.
enum OpenFailure {
    /// The resource does not exist.
    Missing(String),
    /// Mapping failed; the caller should load into memory instead.
    MapFailed(String),
    /// The resource exists but could not be read.
    Unreadable(Error),
}

impl From<Error> for OpenFailure {
    fn from(err: Error) -> Self {
        OpenFailure::Unreadable(err)
    }
}

impl From<std::io::Error> for OpenFailure {
    fn from(err: std::io::Error) -> Self {
        OpenFailure::Unreadable(err.into())
    }
}

impl From<zip::result::ZipError> for OpenFailure {
    fn from(err: zip::result::ZipError) -> Self {
        OpenFailure::Unreadable(err.into())
    }
}

/// Opens the lookup engine for `source`.
///
/// With `use_memory_mapping` set, files and stored (uncompressed) archive
/// entries are mapped; anything that cannot be mapped is copied into memory
/// after a warning.
pub fn open_data_access(
    source: &ByteSource,
    use_memory_mapping: bool,
    diagnostics: &dyn Diagnostics,
) -> AndroidApiDataAccess {
    let store = match select_store(source, use_memory_mapping) {
        Ok(store) => store,
        Err(OpenFailure::Missing(what)) => {
            diagnostics.warning(&format!(
                "Android API database not found ({}); API levels of library references are unknown",
                what
            ));
            return AndroidApiDataAccess::unavailable();
        }
        Err(OpenFailure::MapFailed(reason)) => {
            diagnostics.warning(&format!(
                "Could not memory-map the Android API database ({}); loading it into memory",
                reason
            ));
            match load_in_memory(source) {
                Ok(store) => store,
                Err(err) => {
                    log::error!("Fallback load of {} failed: {}", source.describe(), err);
                    return AndroidApiDataAccess::unavailable();
                }
            }
        }
        Err(OpenFailure::Unreadable(err)) => {
            diagnostics.warning(&format!(
                "Could not read the Android API database {}: {}",
                source.describe(),
                err
            ));
            return AndroidApiDataAccess::unavailable();
        }
    };

    if let Err(err) = validate_layout(&store) {
        diagnostics.warning(&format!(
            "Ignoring the Android API database {}: {}",
            source.describe(),
            err
        ));
        return AndroidApiDataAccess::unavailable();
    }

    log::debug!(
        "Opened Android API database {} ({}, {} bytes)",
        source.describe(),
        store.kind_name(),
        store.len()
    );
    AndroidApiDataAccess::new(store)
}

fn select_store(
    source: &ByteSource,
    use_memory_mapping: bool,
) -> std::result::Result<BackingStore, OpenFailure> {
    match source {
        ByteSource::Missing => Err(OpenFailure::Missing("no database in this distribution".into())),
        ByteSource::Bytes(bytes) => Ok(BackingStore::InMemory(bytes.clone())),
        ByteSource::File(path) => {
            if !path.is_file() {
                return Err(OpenFailure::Missing(path.display().to_string()));
            }
            if !use_memory_mapping {
                return Ok(BackingStore::InMemory(Bytes::from(std::fs::read(path)?)));
            }
            let file = File::open(path)?;
            map_region(&file, 0, None).map(BackingStore::Mapped)
        }
        ByteSource::ArchiveEntry { archive, entry } => {
            if !archive.is_file() {
                return Err(OpenFailure::Missing(archive.display().to_string()));
            }
            let (data_start, size, compression) = locate_entry(archive, entry)?;
            if !use_memory_mapping {
                return load_in_memory(source).map_err(OpenFailure::Unreadable);
            }
            if compression != CompressionMethod::Stored {
                return Err(OpenFailure::MapFailed(format!(
                    "entry {} is compressed with {:?}",
                    entry, compression
                )));
            }
            let file = File::open(archive)?;
            map_region(&file, data_start, Some(size)).map(BackingStore::Mapped)
        }
    }
}

/// Finds `entry` in `archive` and returns its absolute data offset, its
/// uncompressed size, and its compression method.
fn locate_entry(
    archive: &Path,
    entry: &str,
) -> std::result::Result<(u64, u64, CompressionMethod), OpenFailure> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    let found = match zip.by_name(entry) {
        Ok(found) => found,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(OpenFailure::Missing(format!("{}!/{}", archive.display(), entry)));
        }
        Err(err) => return Err(err.into()),
    };
    Ok((found.data_start(), found.size(), found.compression()))
}

fn map_region(
    file: &File,
    offset: u64,
    len: Option<u64>,
) -> std::result::Result<Mmap, OpenFailure> {
    let mut options = MmapOptions::new();
    options.offset(offset);
    if let Some(len) = len {
        let len = usize::try_from(len)
            .map_err(|_| OpenFailure::MapFailed(format!("region of {} bytes too large", len)))?;
        options.len(len);
    }
    // SAFETY: the database is read-only input; it is not modified while the
    // compiler runs.
    unsafe { options.map(file) }.map_err(|err| OpenFailure::MapFailed(err.to_string()))
}

fn load_in_memory(source: &ByteSource) -> Result<BackingStore> {
    let bytes = match source {
        ByteSource::Missing => return Ok(BackingStore::Unavailable),
        ByteSource::Bytes(bytes) => bytes.clone(),
        ByteSource::File(path) => Bytes::from(std::fs::read(path)?),
        ByteSource::ArchiveEntry { archive, entry } => {
            let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
            let mut found = zip.by_name(entry)?;
            let mut buf = Vec::with_capacity(found.size() as usize);
            found.read_to_end(&mut buf)?;
            Bytes::from(buf)
        }
    };
    Ok(BackingStore::InMemory(bytes))
}

fn validate_layout(store: &BackingStore) -> Result<()> {
    if store.is_unavailable() {
        return Ok(());
    }
    let size = store
        .read_i32(0)
        .ok_or_else(|| Error::corruption("database shorter than its header"))?;
    let size = usize::try_from(size)
        .map_err(|_| Error::corruption(format!("negative constant pool size {}", size)))?;
    let required = format::payload_offset(size);
    if store.len() < required {
        return Err(Error::corruption(format!(
            "database has {} bytes, layout needs at least {}",
            store.len(),
            required
        )));
    }
    Ok(())
}
