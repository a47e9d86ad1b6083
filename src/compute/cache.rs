//! Per-reference API level resolution with memoization.

use crate::compute::striped::{MemoStats, StripedMemo};
use crate::config::ApiModelingOptions;
use crate::database::AndroidApiLevelDatabase;
use crate::desugar::DesugaredLibrarySpecification;
use crate::graph::{AppInfo, DexReference, DexType};
use crate::level::{AndroidApiLevel, ComputedApiLevel};
use std::sync::Arc;

/// Resolves the level required to reference a symbol.
///
/// Resolution order for a reference whose context type is `T`:
///
/// 1. `T` is an array: `clone()` needs the build minimum, anything else
///    resolves like the element type.
/// 2. `T` is primitive or void: the lowest level.
/// 3. `T` has no definition: unknown.
/// 4. `T` is not a platform class: the build minimum.
/// 5. `T` is `java.lang.Object` (the type or any of its members), or the
///    reference is bridged by the desugared library: the build minimum.
/// 6. An explicit override from the options.
/// 7. The level database, memoized; no answer is unknown.
pub struct AndroidApiReferenceLevelCache {
    options: ApiModelingOptions,
    app: Arc<dyn AppInfo>,
    database: Box<dyn AndroidApiLevelDatabase>,
    desugared_library: DesugaredLibrarySpecification,
    memo: StripedMemo<DexReference, ComputedApiLevel>,
}

impl AndroidApiReferenceLevelCache {
    /// Creates a cache for one compilation.
    pub fn new(
        options: ApiModelingOptions,
        app: Arc<dyn AppInfo>,
        database: Box<dyn AndroidApiLevelDatabase>,
        desugared_library: DesugaredLibrarySpecification,
    ) -> Self {
        let memo = StripedMemo::new(options.memo_shards);
        Self { options, app, database, desugared_library, memo }
    }

    /// The build minimum as a computed level.
    pub fn min_api_level(&self) -> ComputedApiLevel {
        ComputedApiLevel::Known(self.options.min_api_level)
    }

    /// Resolves the level required by `reference`.
    pub fn lookup(&self, reference: &DexReference) -> ComputedApiLevel {
        self.resolve(reference, true)
    }

    /// Resolves `reference` as if no desugared library were configured.
    ///
    /// Bridged symbols answer with their platform level instead of the build
    /// minimum. All other rules apply unchanged.
    pub fn lookup_ignoring_desugared_library(&self, reference: &DexReference) -> ComputedApiLevel {
        self.resolve(reference, false)
    }

    fn resolve(&self, reference: &DexReference, bridge_desugared: bool) -> ComputedApiLevel {
        let context = reference.context_type();
        if context.is_array_type() {
            if let DexReference::Method(method) = reference {
                if method.is_object_clone() {
                    return self.min_api_level();
                }
            }
            return self.resolve(&DexReference::Type(context.to_base_type()), bridge_desugared);
        }
        if context.is_primitive_type() || context.is_void_type() {
            return ComputedApiLevel::Known(AndroidApiLevel::lowest());
        }
        match self.app.definition_for(context) {
            None => return ComputedApiLevel::Unknown,
            Some(origin) if !origin.is_library() => return self.min_api_level(),
            Some(_) => {}
        }
        if context.is_java_lang_object() {
            return self.min_api_level();
        }
        if bridge_desugared && self.desugared_library.is_supported(reference) {
            return self.min_api_level();
        }
        if let Some(level) = self.options.api_level_override(reference) {
            return ComputedApiLevel::Known(level);
        }
        self.memo.get_or_insert_with(reference, || self.lookup_database(reference))
    }

    /// Resolves `reference` and raises the result to at least `floor`.
    pub fn lookup_max(&self, reference: &DexReference, floor: ComputedApiLevel) -> ComputedApiLevel {
        self.lookup(reference).max(floor)
    }

    /// Shorthand for resolving a type reference.
    pub fn lookup_type(&self, ty: &DexType) -> ComputedApiLevel {
        self.lookup(&DexReference::Type(ty.clone()))
    }

    fn lookup_database(&self, reference: &DexReference) -> ComputedApiLevel {
        let level = match reference {
            DexReference::Type(ty) => self.database.get_type_api_level(ty),
            DexReference::Field(field) => self.database.get_field_api_level(field),
            DexReference::Method(method) => self.database.get_method_api_level(method),
        };
        match level {
            Some(level) => ComputedApiLevel::Known(level),
            None => {
                log::trace!("No API level for {}", reference);
                ComputedApiLevel::Unknown
            }
        }
    }

    /// Memo performance counters.
    pub fn stats(&self) -> MemoStats {
        self.memo.stats()
    }

    /// Number of memoized database answers.
    pub fn num_memoized(&self) -> usize {
        self.memo.len()
    }
}

impl std::fmt::Debug for AndroidApiReferenceLevelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AndroidApiReferenceLevelCache")
            .field("min_api_level", &self.options.min_api_level)
            .field("memoized", &self.memo.len())
            .finish()
    }
}
