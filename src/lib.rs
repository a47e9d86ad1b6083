//! # apidb - Android API Level Database
//!
//! apidb answers "from which Android API level on does this class, field or
//! method exist?" for a compiler targeting Android. Answers come from a
//! compact, hash-indexed database that is either memory-mapped or loaded
//! into memory, and are combined into per-reference and per-definition
//! levels on a small `{NotSet, Unknown, Known}` lattice.
//!
//! ## Architecture
//!
//! - **Database**: the serialized format, its backing stores and the lookup
//!   engine ([`database`])
//! - **Levels**: the platform level scale and the computed-level lattice
//!   ([`level`])
//! - **Compute**: the concurrent resolver the rest of a compiler consults
//!   ([`compute`])
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use apidb::graph::{ClassOrigin, ClassTable, DexField, DexReference, DexType};
//! use apidb::{
//!     create_api_level_compute, ApiModelingOptions, AndroidApiLevel, ByteSource,
//!     DesugaredLibrarySpecification, LogDiagnostics,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), apidb::Error> {
//! let activity = DexType::from_class_name("android.app.Activity");
//! let app = ClassTable::new().with(activity.clone(), ClassOrigin::Library);
//!
//! let compute = create_api_level_compute(
//!     &ByteSource::file("api_database.ser"),
//!     ApiModelingOptions::new().min_api_level(AndroidApiLevel::L),
//!     Arc::new(app),
//!     DesugaredLibrarySpecification::empty(),
//!     &LogDiagnostics,
//! )?;
//!
//! let field = DexField::new(activity, "RESULT_OK", DexType::int());
//! let level = compute.compute_level_for_library_reference(&DexReference::Field(field));
//! println!("RESULT_OK needs {}", level);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod compute;
pub mod config;
pub mod database;
pub mod desugar;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod level;

// Re-exports
pub use compute::{
    AndroidApiLevelCompute, AndroidApiReferenceLevelCache, DefaultAndroidApiLevelCompute,
    NoAndroidApiLevelCompute,
};
pub use config::ApiModelingOptions;
pub use database::{
    open_data_access, AndroidApiLevelDatabase, AndroidApiLevelHashingDatabase, ByteSource,
};
pub use desugar::DesugaredLibrarySpecification;
pub use diagnostics::{Diagnostics, LogDiagnostics};
pub use error::{Error, Result};
pub use level::{AndroidApiLevel, ComputedApiLevel, OptionalBool};

use database::AndroidApiDataAccess;
use graph::AppInfo;
use std::sync::Arc;

/// Opens the level database at `source` and builds the resolver for one
/// compilation.
///
/// Problems with the database itself are reported through `diagnostics` and
/// never fail the call; only invalid `options` are an error. When API caller
/// identification is disabled the database is not opened at all.
pub fn create_api_level_compute(
    source: &ByteSource,
    options: ApiModelingOptions,
    app: Arc<dyn AppInfo>,
    desugared_library: DesugaredLibrarySpecification,
    diagnostics: &dyn Diagnostics,
) -> Result<Box<dyn AndroidApiLevelCompute>> {
    options.validate()?;
    let access = if options.enable_api_caller_identification {
        open_data_access(source, options.use_memory_mapped_database, diagnostics)
    } else {
        AndroidApiDataAccess::unavailable()
    };
    let database = AndroidApiLevelHashingDatabase::new(access);
    compute::create_compute(options, app, Box::new(database), desugared_library)
}
