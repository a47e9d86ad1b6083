//! Hashed lookups of symbol references.

use crate::database::access::AndroidApiDataAccess;
use crate::database::AndroidApiLevelDatabase;
use crate::graph::{DexField, DexMethod, DexReference, DexType};
use crate::level::AndroidApiLevel;

/// [`AndroidApiLevelDatabase`] backed by the serialized hash-indexed format.
///
/// A reference is looked up in two steps: its holder (or the type itself)
/// must be a constant-pool entry, then the serialized reference is searched
/// in the API level hash map.
#[derive(Debug)]
pub struct AndroidApiLevelHashingDatabase {
    access: AndroidApiDataAccess,
}

impl AndroidApiLevelHashingDatabase {
    /// Wraps a lookup engine.
    pub fn new(access: AndroidApiDataAccess) -> Self {
        Self { access }
    }

    /// The underlying lookup engine.
    pub fn access(&self) -> &AndroidApiDataAccess {
        &self.access
    }

    /// Returns true if the database has no bytes behind it.
    pub fn is_unavailable(&self) -> bool {
        self.access.is_unavailable()
    }

    fn lookup(&self, reference: &DexReference) -> Option<AndroidApiLevel> {
        if self.access.is_unavailable() {
            return None;
        }
        let holder = reference.context_type().descriptor().as_bytes();
        self.access.resolve_constant_pool_index(holder)?;
        let key = reference.to_key_string();
        self.access.resolve_level(key.as_bytes()).map(AndroidApiLevel::from_stored_byte)
    }
}

impl AndroidApiLevelDatabase for AndroidApiLevelHashingDatabase {
    fn get_type_api_level(&self, ty: &DexType) -> Option<AndroidApiLevel> {
        self.lookup(&DexReference::Type(ty.clone()))
    }

    fn get_method_api_level(&self, method: &DexMethod) -> Option<AndroidApiLevel> {
        self.lookup(&DexReference::Method(method.clone()))
    }

    fn get_field_api_level(&self, field: &DexField) -> Option<AndroidApiLevel> {
        self.lookup(&DexReference::Field(field.clone()))
    }
}
