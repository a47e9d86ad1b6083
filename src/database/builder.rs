//! Serializes level databases.
//!
//! The builder takes already-computed data (class descriptors for the
//! constant pool and serialized references with their level bytes) and lays
//! it out in the format the reader expects. It does not know anything about
//! platform API descriptions.
//!
//! ## Payload Order
//!
//! ```text
//! [constant-pool strings]
//! [ambiguous candidate lists: u16*]
//! [level chains: (u16 len, key, u8 level)*]
//! ```

use crate::database::format::{
    self, EntryHandle, API_HASH_MAP_ENTRIES, CONSTANT_POOL_HASH_MAP_ENTRIES,
};
use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Builds a serialized level database.
///
/// Usage:
/// ```
/// use apidb::database::DatabaseBuilder;
///
/// let mut builder = DatabaseBuilder::new();
/// builder.add_constant(b"Landroid/app/Activity;").unwrap();
/// builder.add_level(b"Landroid/app/Activity;", 1).unwrap();
/// let bytes = builder.build().unwrap();
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    constants: Vec<Vec<u8>>,
    constant_index: HashMap<Vec<u8>, u32>,
    levels: Vec<(Vec<u8>, u8)>,
    level_keys: HashMap<Vec<u8>, usize>,
}

impl DatabaseBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constant-pool string and returns its index. Adding the same
    /// bytes twice returns the existing index.
    pub fn add_constant(&mut self, value: &[u8]) -> Result<u32> {
        if let Some(index) = self.constant_index.get(value) {
            return Ok(*index);
        }
        if value.len() > usize::from(u16::MAX) {
            return Err(Error::invalid_argument("Constant longer than 65535 bytes"));
        }
        if self.constants.len() >= usize::from(u16::MAX) {
            return Err(Error::invalid_argument("Constant pool full"));
        }
        let index = self.constants.len() as u32;
        self.constants.push(value.to_vec());
        self.constant_index.insert(value.to_vec(), index);
        Ok(index)
    }

    /// Records the level byte for a serialized reference. A later call for
    /// the same key replaces the level.
    pub fn add_level(&mut self, serialized_reference: &[u8], level: u8) -> Result<()> {
        if serialized_reference.len() > usize::from(u16::MAX) {
            return Err(Error::invalid_argument("Reference longer than 65535 bytes"));
        }
        match self.level_keys.get(serialized_reference) {
            Some(&slot) => self.levels[slot].1 = level,
            None => {
                self.level_keys.insert(serialized_reference.to_vec(), self.levels.len());
                self.levels.push((serialized_reference.to_vec(), level));
            }
        }
        Ok(())
    }

    /// Number of constant-pool entries.
    pub fn num_constants(&self) -> usize {
        self.constants.len()
    }

    /// Number of stored levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Lays out the database.
    pub fn build(&self) -> Result<Bytes> {
        let n = self.constants.len();
        let mut payload = BytesMut::new();

        let mut constant_entries = Vec::with_capacity(n);
        for value in &self.constants {
            constant_entries.push(EntryHandle::new(position(&payload)?, value.len() as u16));
            payload.put_slice(value);
        }

        let mut constant_buckets: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for (index, value) in self.constants.iter().enumerate() {
            constant_buckets.entry(format::constant_pool_hash(value)).or_default().push(index as u32);
        }
        let mut constant_hash_map = vec![EntryHandle::empty(); CONSTANT_POOL_HASH_MAP_ENTRIES];
        for (bucket, indices) in constant_buckets {
            constant_hash_map[bucket] = match indices.as_slice() {
                [index] => EntryHandle::unique(*index),
                _ => {
                    let start = position(&payload)?;
                    for index in &indices {
                        payload.put_u16(*index as u16);
                    }
                    EntryHandle::new(start, range_length(indices.len() * 2)?)
                }
            };
        }

        let mut level_buckets: BTreeMap<usize, Vec<&(Vec<u8>, u8)>> = BTreeMap::new();
        for entry in &self.levels {
            level_buckets.entry(format::api_level_hash(&entry.0)).or_default().push(entry);
        }
        let mut level_hash_map = vec![EntryHandle::empty(); API_HASH_MAP_ENTRIES];
        for (bucket, chain) in level_buckets {
            let start = position(&payload)?;
            let before = payload.len();
            for (key, level) in chain {
                payload.put_u16(key.len() as u16);
                payload.put_slice(key);
                payload.put_u8(*level);
            }
            level_hash_map[bucket] = EntryHandle::new(start, range_length(payload.len() - before)?);
        }

        let mut out = BytesMut::with_capacity(format::payload_offset(n) + payload.len());
        out.put_i32(n as i32);
        for entry in constant_entries.iter().chain(&constant_hash_map).chain(&level_hash_map) {
            out.put_slice(&entry.encode());
        }
        debug_assert_eq!(out.len(), format::payload_offset(n));
        out.put_slice(&payload);
        Ok(out.freeze())
    }

    /// Builds the database and writes it to `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.build()?;
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        Ok(())
    }
}

fn position(payload: &BytesMut) -> Result<i32> {
    i32::try_from(payload.len()).map_err(|_| Error::invalid_argument("Payload exceeds 2 GiB"))
}

fn range_length(length: usize) -> Result<u16> {
    u16::try_from(length)
        .map_err(|_| Error::invalid_argument(format!("Bucket of {} bytes does not fit", length)))
}
