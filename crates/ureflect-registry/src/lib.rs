//! Type registry for reflected package classes.
//!
//! [`TypeRegistry`] maps exported class names to type descriptors and
//! constructs default objects through them. [`TypeRegistry::with_native_classes`]
//! seeds it with the built-in object model variants and engine structures.

mod builtin;
mod registry;

pub use builtin::native_classes;
pub use registry::{ClassEntry, TypeRegistry, TypeSource};
