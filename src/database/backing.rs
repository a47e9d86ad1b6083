//! Backing stores: where the database bytes live.
//!
//! Selection happens once, when the database is opened. Reads then go
//! through a single `match` on [`BackingStore`] instead of a trait object.

use bytes::Bytes;
use memmap2::Mmap;

/// Bytes of an opened level database.
#[derive(Debug)]
pub enum BackingStore {
    /// The whole database copied into memory.
    InMemory(Bytes),
    /// The database mapped from a file; pages are loaded on first touch.
    Mapped(Mmap),
    /// The database could not be found. Every read is an internal fault;
    /// callers must check [`BackingStore::is_unavailable`] first.
    Unavailable,
}

impl BackingStore {
    /// Returns true if no database bytes are available.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackingStore::Unavailable)
    }

    /// Total number of bytes.
    pub fn len(&self) -> usize {
        match self {
            BackingStore::Unavailable => 0,
            _ => self.bytes().len(),
        }
    }

    /// Returns true if the store holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name used in log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            BackingStore::InMemory(_) => "in-memory",
            BackingStore::Mapped(_) => "memory-mapped",
            BackingStore::Unavailable => "unavailable",
        }
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        match self {
            BackingStore::InMemory(bytes) => bytes,
            BackingStore::Mapped(mmap) => mmap,
            BackingStore::Unavailable => {
                panic!("read from an unavailable API database; check is_unavailable() first")
            }
        }
    }

    #[inline]
    fn read_array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.bytes().get(offset..end)?.try_into().ok()
    }

    /// Reads a big-endian `i32`, or `None` past the end.
    #[inline]
    pub fn read_i32(&self, offset: usize) -> Option<i32> {
        self.read_array::<4>(offset).map(i32::from_be_bytes)
    }

    /// Reads a big-endian `u16`, or `None` past the end.
    #[inline]
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        self.read_array::<2>(offset).map(u16::from_be_bytes)
    }

    /// Reads one byte, or `None` past the end.
    #[inline]
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.bytes().get(offset).copied()
    }

    /// Returns true if the `length` bytes at `offset` equal `expected`.
    ///
    /// A range that runs past the end never matches.
    #[inline]
    pub fn read_bytes_equal(&self, offset: usize, length: usize, expected: &[u8]) -> bool {
        if length != expected.len() {
            return false;
        }
        match offset.checked_add(length) {
            Some(end) => self.bytes().get(offset..end) == Some(expected),
            None => false,
        }
    }
}
