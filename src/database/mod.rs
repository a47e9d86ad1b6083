//! The Android API level database.
//!
//! ## File Format
//!
//! ```text
//! [constant pool size N: i32]
//! [constant pool table: N × (i32 position, u16 length)]
//! [constant pool hash map: 2^17 × (i32 position, u16 length)]
//! [API level hash map: 2^18 × (i32 position, u16 length)]
//! [payload]
//! ```
//!
//! The constant pool holds the descriptors of every class the database
//! knows. The API level hash map chains `(u16 length, key, u8 level)`
//! triples for every serialized reference that hashes to a bucket.
//!
//! ## Backends
//!
//! - [`AndroidApiLevelHashingDatabase`]: O(1) hashed lookups over the
//!   serialized format.
//! - [`AndroidApiLevelClassTraversalDatabase`]: per-class descriptors that
//!   enumerate their own members. Slower, but needs no serialized data.

pub mod access;
pub mod backing;
pub mod builder;
pub mod format;
pub mod hashing;
pub mod source;
pub mod traversal;

pub use access::AndroidApiDataAccess;
pub use backing::BackingStore;
pub use builder::DatabaseBuilder;
pub use hashing::AndroidApiLevelHashingDatabase;
pub use source::{open_data_access, ByteSource};
pub use traversal::{
    AndroidApiClass, AndroidApiLevelClassTraversalDatabase, ClassDescriptorProvider,
};

use crate::graph::{DexField, DexMethod, DexType};
use crate::level::AndroidApiLevel;

/// Source of "introduced at" levels for platform symbols.
///
/// `None` means the database has no information about the symbol.
pub trait AndroidApiLevelDatabase: Send + Sync {
    /// Level at which `ty` was introduced.
    fn get_type_api_level(&self, ty: &DexType) -> Option<AndroidApiLevel>;

    /// Level at which `method` was introduced.
    fn get_method_api_level(&self, method: &DexMethod) -> Option<AndroidApiLevel>;

    /// Level at which `field` was introduced.
    fn get_field_api_level(&self, field: &DexField) -> Option<AndroidApiLevel>;
}
