//! Type, field, and method references.
//!
//! ## Serialized Form
//!
//! Each reference has a canonical string form, which is also the key the
//! level database is indexed by:
//!
//! ```text
//! type:   Ljava/lang/String;
//! field:  Landroid/os/Build;->SDK_INT:I
//! method: Landroid/app/Activity;->setResult(ILandroid/content/Intent;)V
//! ```

use std::fmt;
use std::sync::Arc;

/// A type descriptor such as `Ljava/lang/Object;`, `[I` or `V`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DexType {
    descriptor: Arc<str>,
}

impl DexType {
    /// Creates a type from its descriptor.
    pub fn new(descriptor: impl Into<Arc<str>>) -> Self {
        let descriptor = descriptor.into();
        debug_assert!(!descriptor.is_empty(), "type descriptor must not be empty");
        Self { descriptor }
    }

    /// Creates a class type from a binary name such as `java.lang.String`.
    pub fn from_class_name(name: &str) -> Self {
        Self::new(format!("L{};", name.replace('.', "/")))
    }

    /// The `int` primitive.
    pub fn int() -> Self {
        Self::new("I")
    }

    /// The `void` type.
    pub fn void() -> Self {
        Self::new("V")
    }

    /// `java.lang.Object`.
    pub fn object() -> Self {
        Self::new("Ljava/lang/Object;")
    }

    /// Returns the descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Returns true for array types.
    pub fn is_array_type(&self) -> bool {
        self.descriptor.starts_with('[')
    }

    /// Returns true for class and interface types.
    pub fn is_class_type(&self) -> bool {
        self.descriptor.starts_with('L')
    }

    /// Returns true for the eight primitive types.
    pub fn is_primitive_type(&self) -> bool {
        matches!(&*self.descriptor, "Z" | "B" | "S" | "C" | "I" | "J" | "F" | "D")
    }

    /// Returns true for `void`.
    pub fn is_void_type(&self) -> bool {
        &*self.descriptor == "V"
    }

    /// Returns true for `java.lang.Object`.
    pub fn is_java_lang_object(&self) -> bool {
        &*self.descriptor == "Ljava/lang/Object;"
    }

    /// Strips every array dimension, e.g. `[[Ljava/lang/String;` becomes
    /// `Ljava/lang/String;`. Non-array types are returned unchanged.
    pub fn to_base_type(&self) -> DexType {
        let base = self.descriptor.trim_start_matches('[');
        if base.len() == self.descriptor.len() {
            return self.clone();
        }
        DexType::new(base)
    }

    /// Wraps this type in one array dimension.
    pub fn to_array_type(&self) -> DexType {
        DexType::new(format!("[{}", self.descriptor))
    }
}

impl fmt::Display for DexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

/// A method prototype: return type and parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DexProto {
    /// The return type.
    pub return_type: DexType,
    /// The parameter types, in declaration order.
    pub parameters: Vec<DexType>,
}

impl DexProto {
    /// Creates a prototype.
    pub fn new(return_type: DexType, parameters: Vec<DexType>) -> Self {
        Self { return_type, parameters }
    }

    /// Writes the `(params)ret` descriptor.
    fn write_descriptor(&self, out: &mut String) {
        out.push('(');
        for parameter in &self.parameters {
            out.push_str(parameter.descriptor());
        }
        out.push(')');
        out.push_str(self.return_type.descriptor());
    }

    /// Iterates over the return type followed by the parameter types.
    pub fn types(&self) -> impl Iterator<Item = &DexType> {
        std::iter::once(&self.return_type).chain(self.parameters.iter())
    }
}

/// A field reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DexField {
    /// The declaring class.
    pub holder: DexType,
    /// The field name.
    pub name: Arc<str>,
    /// The field type.
    pub ty: DexType,
}

impl DexField {
    /// Creates a field reference.
    pub fn new(holder: DexType, name: impl Into<Arc<str>>, ty: DexType) -> Self {
        Self { holder, name: name.into(), ty }
    }
}

/// A method reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DexMethod {
    /// The declaring class.
    pub holder: DexType,
    /// The method name.
    pub name: Arc<str>,
    /// The prototype.
    pub proto: DexProto,
}

impl DexMethod {
    /// Creates a method reference.
    pub fn new(holder: DexType, name: impl Into<Arc<str>>, proto: DexProto) -> Self {
        Self { holder, name: name.into(), proto }
    }

    /// Returns true if this is `clone()` returning `java.lang.Object`.
    pub fn is_object_clone(&self) -> bool {
        &*self.name == "clone"
            && self.proto.parameters.is_empty()
            && self.proto.return_type.is_java_lang_object()
    }
}

/// A reference to a type, field, or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DexReference {
    /// A type reference.
    Type(DexType),
    /// A field reference.
    Field(DexField),
    /// A method reference.
    Method(DexMethod),
}

impl DexReference {
    /// The type that decides where the reference lives: the type itself, or
    /// the holder of a member.
    pub fn context_type(&self) -> &DexType {
        match self {
            DexReference::Type(ty) => ty,
            DexReference::Field(field) => &field.holder,
            DexReference::Method(method) => &method.holder,
        }
    }

    /// Returns the canonical serialized form used as the database key.
    pub fn to_key_string(&self) -> String {
        match self {
            DexReference::Type(ty) => ty.descriptor().to_string(),
            DexReference::Field(field) => {
                let mut out = String::with_capacity(
                    field.holder.descriptor().len() + field.name.len() + field.ty.descriptor().len() + 3,
                );
                out.push_str(field.holder.descriptor());
                out.push_str("->");
                out.push_str(&field.name);
                out.push(':');
                out.push_str(field.ty.descriptor());
                out
            }
            DexReference::Method(method) => {
                let mut out = String::new();
                out.push_str(method.holder.descriptor());
                out.push_str("->");
                out.push_str(&method.name);
                method.proto.write_descriptor(&mut out);
                out
            }
        }
    }
}

impl From<DexType> for DexReference {
    fn from(ty: DexType) -> Self {
        DexReference::Type(ty)
    }
}

impl From<DexField> for DexReference {
    fn from(field: DexField) -> Self {
        DexReference::Field(field)
    }
}

impl From<DexMethod> for DexReference {
    fn from(method: DexMethod) -> Self {
        DexReference::Method(method)
    }
}

impl fmt::Display for DexReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key_string())
    }
}
