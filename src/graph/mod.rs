//! Symbol references and the program view the resolver consults.
//!
//! References are structural: two references are equal when their
//! descriptors, names, and signatures are equal.

mod app;
mod reference;

pub use app::{AppInfo, ClassOrigin, ClassTable};
pub use reference::{DexField, DexMethod, DexProto, DexReference, DexType};
