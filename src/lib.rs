//! Reflection of field objects out of Unreal packages.
//!
//! Given a [`Package`] (name, import and export tables over the raw bytes)
//! and a [`TypeRegistry`], a [`LoadSession`] rebuilds the package's graph of
//! enumerations, constants, structures, classes and properties, links a
//! layout for every structure, and materializes default objects.
//!
//! ```ignore
//! use ureflect::{LoadOptions, TypeRegistry, load_package};
//!
//! let registry = TypeRegistry::with_native_classes();
//! let loaded = load_package(&package, &registry, LoadOptions::default())?;
//! for class in loaded.classes() {
//!     println!("{}", class.name);
//! }
//! ```

mod graph;
mod link;
mod materialize;
mod reader;

pub mod options;
pub mod package;
pub mod session;

pub use options::LoadOptions;
pub use package::{CLASS_CLASS, InMemoryPackage, ObjectExport, ObjectImport, Package};
pub use session::{LoadSession, LoadedPackage, load_package};

pub use ureflect_core::*;
pub use ureflect_registry::{ClassEntry, TypeRegistry, TypeSource, native_classes};
