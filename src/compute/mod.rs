//! API level computation for references and definitions.
//!
//! [`AndroidApiLevelCompute`] is what the rest of a compiler consults. Two
//! policies exist:
//!
//! - [`DefaultAndroidApiLevelCompute`]: resolves references through an
//!   [`AndroidApiReferenceLevelCache`].
//! - [`NoAndroidApiLevelCompute`]: used when API modeling is disabled; every
//!   reference is available at the lowest level.

mod cache;
mod striped;

pub use cache::AndroidApiReferenceLevelCache;
pub use striped::{MemoStats, StripedMemo};

use crate::config::ApiModelingOptions;
use crate::database::AndroidApiLevelDatabase;
use crate::desugar::DesugaredLibrarySpecification;
use crate::error::Result;
use crate::graph::{AppInfo, DexMethod, DexReference, DexType};
use crate::level::{AndroidApiLevel, ComputedApiLevel};
use std::sync::Arc;

/// Computes the API level needed to reference library symbols.
pub trait AndroidApiLevelCompute: Send + Sync {
    /// Level required to reference `reference`.
    fn compute_level_for_library_reference(&self, reference: &DexReference) -> ComputedApiLevel;

    /// Level required to reference `reference` on a platform without the
    /// desugared library. Bridged symbols answer with their platform level.
    fn compute_level_for_library_reference_ignoring_desugared_library(
        &self,
        reference: &DexReference,
    ) -> ComputedApiLevel;

    /// Returns true if levels are actually computed.
    fn is_api_caller_identification_enabled(&self) -> bool;

    /// Starting point for folds over a definition.
    fn compute_initial_min_api_level(&self) -> ComputedApiLevel;

    /// `max(level(reference), floor)`.
    fn lookup_max(&self, reference: &DexReference, floor: ComputedApiLevel) -> ComputedApiLevel {
        self.compute_level_for_library_reference(reference).max(floor)
    }

    /// Level at which every type in `types` can be referenced, never below
    /// the build minimum.
    fn compute_level_for_definition(&self, types: &[DexType]) -> ComputedApiLevel {
        types.iter().fold(self.compute_initial_min_api_level(), |level, ty| {
            self.lookup_max(&DexReference::Type(ty.clone()), level)
        })
    }

    /// Level at which a definition of `method` can exist: the holder, the
    /// return type and every parameter type must all be referenceable.
    fn compute_level_for_method_definition(&self, method: &DexMethod) -> ComputedApiLevel {
        std::iter::once(&method.holder)
            .chain(method.proto.types())
            .fold(self.compute_initial_min_api_level(), |level, ty| {
                self.lookup_max(&DexReference::Type(ty.clone()), level)
            })
    }
}

/// Policy used when API modeling is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAndroidApiLevelCompute;

impl AndroidApiLevelCompute for NoAndroidApiLevelCompute {
    fn compute_level_for_library_reference(&self, _reference: &DexReference) -> ComputedApiLevel {
        ComputedApiLevel::Known(AndroidApiLevel::lowest())
    }

    fn compute_level_for_library_reference_ignoring_desugared_library(
        &self,
        _reference: &DexReference,
    ) -> ComputedApiLevel {
        ComputedApiLevel::Known(AndroidApiLevel::lowest())
    }

    fn is_api_caller_identification_enabled(&self) -> bool {
        false
    }

    fn compute_initial_min_api_level(&self) -> ComputedApiLevel {
        ComputedApiLevel::Known(AndroidApiLevel::lowest())
    }
}

/// Policy that resolves references through the level database.
#[derive(Debug)]
pub struct DefaultAndroidApiLevelCompute {
    cache: AndroidApiReferenceLevelCache,
}

impl DefaultAndroidApiLevelCompute {
    /// Wraps a reference cache.
    pub fn new(cache: AndroidApiReferenceLevelCache) -> Self {
        Self { cache }
    }

    /// The underlying reference cache.
    pub fn cache(&self) -> &AndroidApiReferenceLevelCache {
        &self.cache
    }
}

impl AndroidApiLevelCompute for DefaultAndroidApiLevelCompute {
    fn compute_level_for_library_reference(&self, reference: &DexReference) -> ComputedApiLevel {
        self.cache.lookup(reference)
    }

    fn compute_level_for_library_reference_ignoring_desugared_library(
        &self,
        reference: &DexReference,
    ) -> ComputedApiLevel {
        self.cache.lookup_ignoring_desugared_library(reference)
    }

    fn is_api_caller_identification_enabled(&self) -> bool {
        true
    }

    fn compute_initial_min_api_level(&self) -> ComputedApiLevel {
        self.cache.min_api_level()
    }
}

/// Picks the policy for `options`.
///
/// The database is only consulted when API caller identification is
/// enabled.
pub fn create_compute(
    options: ApiModelingOptions,
    app: Arc<dyn AppInfo>,
    database: Box<dyn AndroidApiLevelDatabase>,
    desugared_library: DesugaredLibrarySpecification,
) -> Result<Box<dyn AndroidApiLevelCompute>> {
    options.validate()?;
    if !options.enable_api_caller_identification {
        log::debug!("API caller identification disabled");
        return Ok(Box::new(NoAndroidApiLevelCompute));
    }
    let cache = AndroidApiReferenceLevelCache::new(options, app, database, desugared_library);
    Ok(Box::new(DefaultAndroidApiLevelCompute::new(cache)))
}
