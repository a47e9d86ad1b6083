//! Layout constants, hash functions, and entry decoding.
//!
//! Every table entry is 6 bytes: a big-endian `i32` position followed by a
//! big-endian `u16` length. Positions are relative to the payload offset.

use crate::error::{Error, Result};

/// Size of the header (constant-pool size, `i32`).
pub const HEADER_SIZE: usize = 4;

/// Size of one table entry (position + length).
pub const ENTRY_SIZE: usize = 6;

/// Offset of the constant-pool table.
pub const CONSTANT_POOL_OFFSET: usize = HEADER_SIZE;

/// Address bits of the constant-pool hash map.
pub const CONSTANT_POOL_HASH_MAP_BITS: u32 = 17;

/// Address bits of the API-level hash map.
pub const API_HASH_MAP_BITS: u32 = 18;

/// Number of entries in the constant-pool hash map.
pub const CONSTANT_POOL_HASH_MAP_ENTRIES: usize = 1 << CONSTANT_POOL_HASH_MAP_BITS;

/// Number of entries in the API-level hash map.
pub const API_HASH_MAP_ENTRIES: usize = 1 << API_HASH_MAP_BITS;

/// Tag bit marking a unique constant-pool hash map entry.
pub const UNIQUE_ENTRY_TAG: u32 = 0x8000_0000;

/// Mask applied to raw hashes before bucketing.
const HASH_MASK: u32 = 0x7FFF_FFFF;

/// Byte offset of the constant-pool hash map.
pub fn constant_pool_hash_map_offset(constant_pool_size: usize) -> usize {
    constant_pool_size * ENTRY_SIZE + CONSTANT_POOL_OFFSET
}

/// Byte offset of the API-level hash map.
pub fn api_level_hash_map_offset(constant_pool_size: usize) -> usize {
    constant_pool_hash_map_offset(constant_pool_size) + CONSTANT_POOL_HASH_MAP_ENTRIES * ENTRY_SIZE
}

/// Byte offset of the payload region.
pub fn payload_offset(constant_pool_size: usize) -> usize {
    api_level_hash_map_offset(constant_pool_size) + API_HASH_MAP_ENTRIES * ENTRY_SIZE
}

/// Places `raw_hash` in the upper half of a `2^bits` table.
///
/// Only indices `[2^(bits-1), 2^bits)` are ever produced. The lower half of
/// each table is never written; readers and writers must agree on this.
fn bucket(raw_hash: u32, bits: u32) -> usize {
    let size = 1u32 << (bits - 1);
    ((raw_hash & HASH_MASK) % size + size) as usize
}

/// Bucket of `key` in the constant-pool hash map.
pub fn constant_pool_hash(key: &[u8]) -> usize {
    let raw = key.iter().fold(0u32, |h, &b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    bucket(raw, CONSTANT_POOL_HASH_MAP_BITS)
}

/// Bucket of a serialized reference in the API-level hash map.
pub fn api_level_hash(serialized_reference: &[u8]) -> usize {
    const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
    const FNV_PRIME: u32 = 0x0100_0193;
    let raw = serialized_reference
        .iter()
        .fold(FNV_OFFSET_BASIS, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME));
    bucket(raw, API_HASH_MAP_BITS)
}

/// A decoded 6-byte table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHandle {
    /// Raw position field.
    pub position: i32,
    /// Raw length field.
    pub length: u16,
}

/// What a hash map entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Nothing hashes to this bucket.
    Empty,
    /// Exactly one constant-pool index hashes here.
    Unique(u32),
    /// A payload range (relative offset, byte length).
    Range(usize, usize),
    /// The position/length pair is inconsistent.
    Malformed,
}

impl EntryHandle {
    /// Creates an entry.
    pub fn new(position: i32, length: u16) -> Self {
        Self { position, length }
    }

    /// The empty entry.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    /// A unique constant-pool entry pointing at `index`.
    pub fn unique(index: u32) -> Self {
        debug_assert!(index & UNIQUE_ENTRY_TAG == 0, "constant pool index out of range");
        Self::new((index | UNIQUE_ENTRY_TAG) as i32, 0)
    }

    /// Encodes the entry (6 bytes, big-endian).
    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let mut buf = [0u8; ENTRY_SIZE];
        buf[0..4].copy_from_slice(&self.position.to_be_bytes());
        buf[4..6].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Decodes an entry from at least 6 bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < ENTRY_SIZE {
            return Err(Error::corruption("Entry too short"));
        }
        let position = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let length = u16::from_be_bytes([data[4], data[5]]);
        Ok(Self { position, length })
    }

    /// Classifies the entry.
    pub fn kind(&self) -> EntryKind {
        match (self.position, self.length) {
            (0, 0) => EntryKind::Empty,
            (p, 0) if p < 0 => EntryKind::Unique(p as u32 & !UNIQUE_ENTRY_TAG),
            (p, _) if p < 0 => EntryKind::Malformed,
            (_, 0) => EntryKind::Malformed,
            (p, l) => EntryKind::Range(p as usize, usize::from(l)),
        }
    }
}
