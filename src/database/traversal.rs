//! Class-traversal level database.
//!
//! Each platform class is described by an [`AndroidApiClass`] that can
//! enumerate its own members together with their levels. Descriptors are
//! produced on demand by a [`ClassDescriptorProvider`] and cached per type.
//! Lookups are linear in the number of members of the holder.

use crate::database::AndroidApiLevelDatabase;
use crate::graph::{DexField, DexMethod, DexProto, DexType};
use crate::level::AndroidApiLevel;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Level information for one platform class.
#[derive(Debug, Clone)]
pub struct AndroidApiClass {
    ty: DexType,
    api_level: AndroidApiLevel,
    fields: Vec<(DexField, AndroidApiLevel)>,
    methods: Vec<(DexMethod, AndroidApiLevel)>,
}

impl AndroidApiClass {
    /// Describes a class introduced at `api_level`.
    pub fn new(ty: DexType, api_level: AndroidApiLevel) -> Self {
        Self { ty, api_level, fields: Vec::new(), methods: Vec::new() }
    }

    /// Adds a field declared on this class.
    pub fn with_field(
        mut self,
        name: &str,
        field_type: DexType,
        api_level: AndroidApiLevel,
    ) -> Self {
        let field = DexField::new(self.ty.clone(), name, field_type);
        self.fields.push((field, api_level));
        self
    }

    /// Adds a method declared on this class.
    pub fn with_method(
        mut self,
        name: &str,
        proto: DexProto,
        api_level: AndroidApiLevel,
    ) -> Self {
        let method = DexMethod::new(self.ty.clone(), name, proto);
        self.methods.push((method, api_level));
        self
    }

    /// The described type.
    pub fn ty(&self) -> &DexType {
        &self.ty
    }

    /// Level at which the class itself was introduced.
    pub fn api_level(&self) -> AndroidApiLevel {
        self.api_level
    }

    /// Visits fields until `visitor` breaks.
    pub fn visit_fields_with_api_levels<B>(
        &self,
        mut visitor: impl FnMut(&DexField, AndroidApiLevel) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for (field, level) in &self.fields {
            visitor(field, *level)?;
        }
        ControlFlow::Continue(())
    }

    /// Visits methods until `visitor` breaks.
    pub fn visit_methods_with_api_levels<B>(
        &self,
        mut visitor: impl FnMut(&DexMethod, AndroidApiLevel) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for (method, level) in &self.methods {
            visitor(method, *level)?;
        }
        ControlFlow::Continue(())
    }
}

/// Produces class descriptors on demand.
pub trait ClassDescriptorProvider: Send + Sync {
    /// Returns the descriptor for `ty`, or `None` if it is not a platform class.
    fn descriptor_for(&self, ty: &DexType) -> Option<AndroidApiClass>;
}

impl ClassDescriptorProvider for HashMap<DexType, AndroidApiClass> {
    fn descriptor_for(&self, ty: &DexType) -> Option<AndroidApiClass> {
        self.get(ty).cloned()
    }
}

/// [`AndroidApiLevelDatabase`] that walks per-class descriptors.
pub struct AndroidApiLevelClassTraversalDatabase {
    provider: Box<dyn ClassDescriptorProvider>,
    descriptors: RwLock<HashMap<DexType, Option<Arc<AndroidApiClass>>>>,
}

impl AndroidApiLevelClassTraversalDatabase {
    /// Creates a database over `provider`.
    pub fn new(provider: impl ClassDescriptorProvider + 'static) -> Self {
        Self { provider: Box::new(provider), descriptors: RwLock::new(HashMap::new()) }
    }

    /// Creates a database over a fixed set of descriptors.
    pub fn from_classes(classes: impl IntoIterator<Item = AndroidApiClass>) -> Self {
        let map: HashMap<DexType, AndroidApiClass> =
            classes.into_iter().map(|class| (class.ty().clone(), class)).collect();
        Self::new(map)
    }

    /// Number of descriptors built so far, including negative results.
    pub fn num_cached(&self) -> usize {
        self.descriptors.read().len()
    }

    fn descriptor(&self, ty: &DexType) -> Option<Arc<AndroidApiClass>> {
        if let Some(cached) = self.descriptors.read().get(ty) {
            return cached.clone();
        }
        let built = self.provider.descriptor_for(ty).map(Arc::new);
        // Another thread may have raced us; both results are equivalent.
        self.descriptors.write().entry(ty.clone()).or_insert(built).clone()
    }
}

impl std::fmt::Debug for AndroidApiLevelClassTraversalDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AndroidApiLevelClassTraversalDatabase")
            .field("cached", &self.num_cached())
            .finish()
    }
}

impl AndroidApiLevelDatabase for AndroidApiLevelClassTraversalDatabase {
    fn get_type_api_level(&self, ty: &DexType) -> Option<AndroidApiLevel> {
        self.descriptor(ty).map(|class| class.api_level())
    }

    fn get_method_api_level(&self, method: &DexMethod) -> Option<AndroidApiLevel> {
        let class = self.descriptor(&method.holder)?;
        match class.visit_methods_with_api_levels(|candidate, level| {
            if candidate == method {
                ControlFlow::Break(level)
            } else {
                ControlFlow::Continue(())
            }
        }) {
            ControlFlow::Break(level) => Some(level),
            ControlFlow::Continue(()) => None,
        }
    }

    fn get_field_api_level(&self, field: &DexField) -> Option<AndroidApiLevel> {
        let class = self.descriptor(&field.holder)?;
        match class.visit_fields_with_api_levels(|candidate, level| {
            if candidate == field {
                ControlFlow::Break(level)
            } else {
                ControlFlow::Continue(())
            }
        }) {
            ControlFlow::Break(level) => Some(level),
            ControlFlow::Continue(()) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn activity() -> AndroidApiClass {
        let activity = DexType::from_class_name("android.app.Activity");
        AndroidApiClass::new(activity, AndroidApiLevel::B)
            .with_field("RESULT_OK", DexType::int(), AndroidApiLevel::B)
            .with_method(
                "isInMultiWindowMode",
                DexProto::new(DexType::new("Z"), vec![]),
                AndroidApiLevel::N,
            )
    }

    #[test]
    fn test_member_lookup() {
        let db = AndroidApiLevelClassTraversalDatabase::from_classes([activity()]);
        let ty = activity().ty().clone();

        assert_eq!(db.get_type_api_level(&ty), Some(AndroidApiLevel::B));
        let method = DexMethod::new(
            ty.clone(),
            "isInMultiWindowMode",
            DexProto::new(DexType::new("Z"), vec![]),
        );
        assert_eq!(db.get_method_api_level(&method), Some(AndroidApiLevel::N));
        let field = DexField::new(ty.clone(), "RESULT_OK", DexType::int());
        assert_eq!(db.get_field_api_level(&field), Some(AndroidApiLevel::B));
        let missing = DexField::new(ty, "RESULT_MAYBE", DexType::int());
        assert_eq!(db.get_field_api_level(&missing), None);
    }

    #[test]
    fn test_visitor_short_circuits() {
        let class = activity().with_field("RESULT_CANCELED", DexType::int(), AndroidApiLevel::B);
        let mut visited = 0;
        let flow = class.visit_fields_with_api_levels(|_, _| {
            visited += 1;
            ControlFlow::Break(())
        });
        assert!(flow.is_break());
        assert_eq!(visited, 1);
    }

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    impl ClassDescriptorProvider for CountingProvider {
        fn descriptor_for(&self, ty: &DexType) -> Option<AndroidApiClass> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (ty == activity().ty()).then(activity)
        }
    }

    #[test]
    fn test_descriptors_are_built_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let db = AndroidApiLevelClassTraversalDatabase::new(CountingProvider {
            calls: Arc::clone(&calls),
        });
        let ty = activity().ty().clone();
        let unknown = DexType::new("Lcom/example/Unknown;");

        for _ in 0..3 {
            assert_eq!(db.get_type_api_level(&ty), Some(AndroidApiLevel::B));
            assert_eq!(db.get_type_api_level(&unknown), None);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(db.num_cached(), 2);
    }
}
