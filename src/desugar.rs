//! Desugared-library bridge table.
//!
//! When a build ships a desugared library, some platform types and members
//! are rewritten to library-provided replacements. References to them never
//! reach the platform, so they need no particular API level.
//!
//! The table is usually read from JSON:
//!
//! ```json
//! {
//!   "identifier": "com.tools.android:desugar_jdk_libs:2.0.4",
//!   "bridged_types": ["Ljava/time/LocalDate;"],
//!   "bridged_members": ["Ljava/util/List;->of()Ljava/util/List;"]
//! }
//! ```

use crate::error::Result;
use crate::graph::{DexReference, DexType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Set of platform references bridged by the desugared library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesugaredLibrarySpecification {
    /// Maven coordinate or other label of the library, for diagnostics.
    pub identifier: Option<String>,
    /// Descriptors of types whose every member is bridged.
    pub bridged_types: BTreeSet<String>,
    /// Serialized member references bridged individually.
    pub bridged_members: BTreeSet<String>,
}

impl DesugaredLibrarySpecification {
    /// An empty table: nothing is bridged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a table from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a table from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Marks every member of `ty` (and the type itself) as bridged.
    pub fn with_type(mut self, ty: &DexType) -> Self {
        self.bridged_types.insert(ty.descriptor().to_string());
        self
    }

    /// Marks a single member as bridged.
    pub fn with_member(mut self, member: impl Into<DexReference>) -> Self {
        self.bridged_members.insert(member.into().to_key_string());
        self
    }

    /// Returns true if nothing is bridged.
    pub fn is_empty(&self) -> bool {
        self.bridged_types.is_empty() && self.bridged_members.is_empty()
    }

    /// Returns true if `reference` is rewritten away by the desugared library.
    pub fn is_supported(&self, reference: &DexReference) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.bridged_types.contains(reference.context_type().descriptor()) {
            return true;
        }
        match reference {
            DexReference::Type(_) => false,
            DexReference::Field(_) | DexReference::Method(_) => {
                self.bridged_members.contains(&reference.to_key_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DexField, DexMethod, DexProto};
    use tempfile::TempDir;

    fn list_of() -> DexMethod {
        let list = DexType::from_class_name("java.util.List");
        DexMethod::new(list.clone(), "of", DexProto::new(list, vec![]))
    }

    #[test]
    fn test_empty_supports_nothing() {
        let table = DesugaredLibrarySpecification::empty();
        assert!(table.is_empty());
        assert!(!table.is_supported(&DexReference::Method(list_of())));
    }

    #[test]
    fn test_bridged_type_covers_members() {
        let local_date = DexType::from_class_name("java.time.LocalDate");
        let table = DesugaredLibrarySpecification::empty().with_type(&local_date);

        assert!(table.is_supported(&DexReference::Type(local_date.clone())));
        let epoch = DexField::new(local_date.clone(), "EPOCH", local_date);
        assert!(table.is_supported(&epoch.into()));
        assert!(!table.is_supported(&DexReference::Method(list_of())));
    }

    #[test]
    fn test_bridged_member_only() {
        let table = DesugaredLibrarySpecification::empty().with_member(list_of());

        assert!(table.is_supported(&DexReference::Method(list_of())));
        let list = list_of().holder;
        assert!(!table.is_supported(&DexReference::Type(list.clone())));
        let size = DexMethod::new(list, "size", DexProto::new(DexType::int(), vec![]));
        assert!(!table.is_supported(&size.into()));
    }

    #[test]
    fn test_from_json() {
        let table = DesugaredLibrarySpecification::from_json_str(
            r#"{
                "identifier": "desugar_jdk_libs:2.0.4",
                "bridged_members": ["Ljava/util/List;->of()Ljava/util/List;"]
            }"#,
        )
        .unwrap();

        assert_eq!(table.identifier.as_deref(), Some("desugar_jdk_libs:2.0.4"));
        assert!(table.bridged_types.is_empty());
        assert!(table.is_supported(&DexReference::Method(list_of())));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("desugar.json");
        let table = DesugaredLibrarySpecification::empty()
            .with_type(&DexType::from_class_name("java.time.Instant"));
        std::fs::write(&path, serde_json::to_string(&table).unwrap()).unwrap();

        assert_eq!(DesugaredLibrarySpecification::from_file(&path).unwrap(), table);
        assert!(DesugaredLibrarySpecification::from_file(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = DesugaredLibrarySpecification::from_json_str("{\"bridged_types\": 3}").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }
}
