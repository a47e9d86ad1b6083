//! Definition lookup supplied by the surrounding compiler.

use crate::graph::DexType;
use std::collections::HashMap;

/// Where a class definition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassOrigin {
    /// Compiled as part of the program.
    Program,
    /// Available at compile time only, not shipped.
    Classpath,
    /// Provided by the Android platform.
    Library,
}

impl ClassOrigin {
    /// Returns true for platform library classes.
    pub fn is_library(self) -> bool {
        self == ClassOrigin::Library
    }
}

/// Read access to the whole-program class table.
pub trait AppInfo: Send + Sync {
    /// Returns the origin of the definition of `ty`, or `None` if the type is
    /// not defined anywhere.
    fn definition_for(&self, ty: &DexType) -> Option<ClassOrigin>;
}

/// A plain map-backed [`AppInfo`].
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: HashMap<DexType, ClassOrigin>,
}

impl ClassTable {
    /// Creates an empty class table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition, replacing any earlier one for the same type.
    pub fn add(&mut self, ty: DexType, origin: ClassOrigin) -> &mut Self {
        self.classes.insert(ty, origin);
        self
    }

    /// Builder-style variant of [`ClassTable::add`].
    pub fn with(mut self, ty: DexType, origin: ClassOrigin) -> Self {
        self.classes.insert(ty, origin);
        self
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl AppInfo for ClassTable {
    fn definition_for(&self, ty: &DexType) -> Option<ClassOrigin> {
        self.classes.get(ty).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_table_lookup() {
        let table = ClassTable::new()
            .with(DexType::new("Lcom/example/Main;"), ClassOrigin::Program)
            .with(DexType::object(), ClassOrigin::Library);

        assert_eq!(table.len(), 2);
        assert_eq!(table.definition_for(&DexType::object()), Some(ClassOrigin::Library));
        assert_eq!(
            table.definition_for(&DexType::new("Lcom/example/Main;")),
            Some(ClassOrigin::Program)
        );
        assert_eq!(table.definition_for(&DexType::new("Lcom/example/Missing;")), None);
    }
}
