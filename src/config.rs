//! Configuration options for API level modeling.

use crate::graph::{DexField, DexMethod, DexReference, DexType};
use crate::level::AndroidApiLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Build-wide options for resolving API levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiModelingOptions {
    /// Compute API levels for library references.
    /// When disabled every reference resolves to the lowest level.
    /// Default: true
    pub enable_api_caller_identification: bool,

    /// Minimum API level targeted by the build.
    /// Default: AndroidApiLevel::B
    pub min_api_level: AndroidApiLevel,

    /// Memory-map the level database instead of loading it into memory.
    /// Default: true
    pub use_memory_mapped_database: bool,

    /// Explicit levels for types, keyed by descriptor.
    pub class_api_mapping: BTreeMap<String, AndroidApiLevel>,

    /// Explicit levels for fields, keyed by serialized field reference.
    pub field_api_mapping: BTreeMap<String, AndroidApiLevel>,

    /// Explicit levels for methods, keyed by serialized method reference.
    pub method_api_mapping: BTreeMap<String, AndroidApiLevel>,

    /// Number of lock stripes in the resolver memo. Must be a power of two.
    /// Default: 16
    pub memo_shards: usize,
}

impl Default for ApiModelingOptions {
    fn default() -> Self {
        Self {
            enable_api_caller_identification: true,
            min_api_level: AndroidApiLevel::B,
            use_memory_mapped_database: true,
            class_api_mapping: BTreeMap::new(),
            field_api_mapping: BTreeMap::new(),
            method_api_mapping: BTreeMap::new(),
            memo_shards: 16,
        }
    }
}

impl ApiModelingOptions {
    /// Creates a new ApiModelingOptions with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Enables or disables API level computation.
    pub fn enable_api_caller_identification(mut self, value: bool) -> Self {
        self.enable_api_caller_identification = value;
        self
    }

    /// Sets the build minimum API level.
    pub fn min_api_level(mut self, level: AndroidApiLevel) -> Self {
        self.min_api_level = level;
        self
    }

    /// Sets whether to memory-map the level database.
    pub fn use_memory_mapped_database(mut self, value: bool) -> Self {
        self.use_memory_mapped_database = value;
        self
    }

    /// Sets the number of lock stripes in the resolver memo.
    pub fn memo_shards(mut self, shards: usize) -> Self {
        self.memo_shards = shards;
        self
    }

    /// Pins the level of a type.
    pub fn class_api_level(mut self, ty: &DexType, level: AndroidApiLevel) -> Self {
        self.class_api_mapping.insert(ty.descriptor().to_string(), level);
        self
    }

    /// Pins the level of a field.
    pub fn field_api_level(mut self, field: &DexField, level: AndroidApiLevel) -> Self {
        let key = DexReference::Field(field.clone()).to_key_string();
        self.field_api_mapping.insert(key, level);
        self
    }

    /// Pins the level of a method.
    pub fn method_api_level(mut self, method: &DexMethod, level: AndroidApiLevel) -> Self {
        let key = DexReference::Method(method.clone()).to_key_string();
        self.method_api_mapping.insert(key, level);
        self
    }

    /// Returns the pinned level for `reference`, if any.
    pub fn api_level_override(&self, reference: &DexReference) -> Option<AndroidApiLevel> {
        let mapping = match reference {
            DexReference::Type(_) => &self.class_api_mapping,
            DexReference::Field(_) => &self.field_api_mapping,
            DexReference::Method(_) => &self.method_api_mapping,
        };
        if mapping.is_empty() {
            return None;
        }
        mapping.get(&reference.to_key_string()).copied()
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.memo_shards == 0 || !self.memo_shards.is_power_of_two() {
            return Err(crate::Error::invalid_argument(
                "memo_shards must be a power of two",
            ));
        }
        if self.min_api_level > AndroidApiLevel::ANDROID_PLATFORM {
            return Err(crate::Error::invalid_argument(format!(
                "min_api_level {} is above ANDROID_PLATFORM",
                self.min_api_level.level()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ApiModelingOptions::default();
        assert!(opts.enable_api_caller_identification);
        assert!(opts.use_memory_mapped_database);
        assert_eq!(opts.min_api_level, AndroidApiLevel::B);
        assert_eq!(opts.memo_shards, 16);
    }

    #[test]
    fn test_options_builder() {
        let opts = ApiModelingOptions::new()
            .min_api_level(AndroidApiLevel::L)
            .use_memory_mapped_database(false)
            .memo_shards(4);

        assert_eq!(opts.min_api_level, AndroidApiLevel::L);
        assert!(!opts.use_memory_mapped_database);
        assert_eq!(opts.memo_shards, 4);
    }

    #[test]
    fn test_options_validation() {
        let mut opts = ApiModelingOptions::default();
        assert!(opts.validate().is_ok());

        opts.memo_shards = 0;
        assert!(opts.validate().is_err());

        opts.memo_shards = 12;
        assert!(opts.validate().is_err());

        opts.memo_shards = 8;
        opts.min_api_level = AndroidApiLevel::new(10001).unwrap();
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_api_level_override() {
        let foo = DexType::new("LFoo;");
        let field = DexField::new(foo.clone(), "x", DexType::int());
        let opts = ApiModelingOptions::new()
            .class_api_level(&foo, AndroidApiLevel::M)
            .field_api_level(&field, AndroidApiLevel::O);

        assert_eq!(
            opts.api_level_override(&DexReference::Type(foo.clone())),
            Some(AndroidApiLevel::M)
        );
        assert_eq!(opts.api_level_override(&field.into()), Some(AndroidApiLevel::O));
        let other = DexField::new(foo, "y", DexType::int());
        assert_eq!(opts.api_level_override(&other.into()), None);
    }

    #[test]
    fn test_from_json() {
        let opts = ApiModelingOptions::from_json_str(
            r#"{
                "min_api_level": 21,
                "use_memory_mapped_database": false,
                "method_api_mapping": { "LFoo;->run()V": 26 }
            }"#,
        )
        .unwrap();

        assert_eq!(opts.min_api_level, AndroidApiLevel::L);
        assert!(!opts.use_memory_mapped_database);
        assert!(opts.enable_api_caller_identification);
        assert_eq!(opts.method_api_mapping.get("LFoo;->run()V"), Some(&AndroidApiLevel::O));

        assert!(ApiModelingOptions::from_json_str(r#"{ "memo_shards": 3 }"#).is_err());
    }
}
