//! Format-aware lookups over a [`BackingStore`].
//!
//! ## Constant-Pool Resolution
//!
//! ```text
//! key ──hash──► cp hash map entry
//!                 ├─ empty      → None
//!                 ├─ unique(i)  → verify pool[i] == key → Some(i)
//!                 └─ range      → [u16 candidate]* → first pool[c] == key
//! ```
//!
//! ## Level Resolution
//!
//! The API-level hash map entry points at a chain of
//! `[u16 length][key bytes][u8 level]` triples. The chain is scanned until
//! a key matches exactly.

use crate::database::backing::BackingStore;
use crate::database::format::{
    self, EntryHandle, EntryKind, CONSTANT_POOL_OFFSET, ENTRY_SIZE,
};
use std::sync::atomic::{AtomicI64, Ordering};

const SIZE_NOT_READ: i64 = -1;

/// Lookup engine over the serialized level database.
///
/// The engine is immutable apart from the cached constant-pool size, which
/// is idempotent to recompute, so it can be shared freely across threads.
#[derive(Debug)]
pub struct AndroidApiDataAccess {
    store: BackingStore,
    constant_pool_size: AtomicI64,
}

impl AndroidApiDataAccess {
    /// Wraps a backing store.
    pub fn new(store: BackingStore) -> Self {
        Self { store, constant_pool_size: AtomicI64::new(SIZE_NOT_READ) }
    }

    /// An engine with no database behind it.
    pub fn unavailable() -> Self {
        Self::new(BackingStore::Unavailable)
    }

    /// Returns true if there is no database to query.
    pub fn is_unavailable(&self) -> bool {
        self.store.is_unavailable()
    }

    /// The backing store.
    pub fn store(&self) -> &BackingStore {
        &self.store
    }

    /// Number of constant-pool entries, read from the header on first use.
    pub fn constant_pool_size(&self) -> usize {
        let cached = self.constant_pool_size.load(Ordering::Relaxed);
        if cached >= 0 {
            return cached as usize;
        }
        let size = match self.store.read_i32(0) {
            Some(size) if size >= 0 => i64::from(size),
            other => {
                debug_assert!(false, "invalid constant pool size: {:?}", other);
                0
            }
        };
        self.constant_pool_size.store(size, Ordering::Relaxed);
        size as usize
    }

    fn payload_offset(&self) -> usize {
        format::payload_offset(self.constant_pool_size())
    }

    fn read_entry(&self, offset: usize) -> Option<EntryHandle> {
        Some(EntryHandle::new(self.store.read_i32(offset)?, self.store.read_u16(offset + 4)?))
    }

    /// Resolves a hash map entry to a payload range, treating malformed
    /// entries as absent.
    fn payload_range(&self, kind: EntryKind) -> Option<(usize, usize)> {
        match kind {
            EntryKind::Range(position, length) => Some((self.payload_offset() + position, length)),
            EntryKind::Malformed => {
                debug_assert!(false, "malformed hash map entry");
                None
            }
            EntryKind::Empty | EntryKind::Unique(_) => None,
        }
    }

    /// Finds the constant-pool index whose bytes equal `key`.
    pub fn resolve_constant_pool_index(&self, key: &[u8]) -> Option<u32> {
        let size = self.constant_pool_size();
        let bucket = format::constant_pool_hash(key);
        let entry =
            self.read_entry(format::constant_pool_hash_map_offset(size) + bucket * ENTRY_SIZE)?;
        match entry.kind() {
            EntryKind::Empty => None,
            EntryKind::Unique(index) => {
                // The bucket may belong to a different key with the same hash.
                self.constant_pool_entry_matches(index, key).then_some(index)
            }
            kind => {
                let (start, length) = self.payload_range(kind)?;
                (start..start + length)
                    .step_by(2)
                    .filter_map(|offset| self.store.read_u16(offset))
                    .map(u32::from)
                    .find(|&candidate| self.constant_pool_entry_matches(candidate, key))
            }
        }
    }

    /// Returns true if constant-pool entry `index` holds exactly `value`.
    pub fn constant_pool_entry_matches(&self, index: u32, value: &[u8]) -> bool {
        let index = index as usize;
        if index >= self.constant_pool_size() {
            return false;
        }
        let Some(entry) = self.read_entry(CONSTANT_POOL_OFFSET + index * ENTRY_SIZE) else {
            return false;
        };
        if usize::from(entry.length) != value.len() || entry.position < 0 {
            return false;
        }
        let start = self.payload_offset() + entry.position as usize;
        self.store.read_bytes_equal(start, value.len(), value)
    }

    /// Returns the raw stored level byte for a serialized reference.
    pub fn resolve_level(&self, serialized_reference: &[u8]) -> Option<u8> {
        let bucket = format::api_level_hash(serialized_reference);
        let entry = self.read_entry(
            format::api_level_hash_map_offset(self.constant_pool_size()) + bucket * ENTRY_SIZE,
        )?;
        let (mut offset, length) = match entry.kind() {
            EntryKind::Empty => return None,
            EntryKind::Unique(_) => {
                debug_assert!(false, "unique entry in the API level hash map");
                return None;
            }
            kind => self.payload_range(kind)?,
        };
        let end = offset + length;
        while offset < end {
            let key_length = usize::from(self.store.read_u16(offset)?);
            if self.store.read_bytes_equal(offset + 2, key_length, serialized_reference) {
                return self.store.read_byte(offset + 2 + key_length);
            }
            offset += 2 + key_length + 1;
        }
        None
    }
}
