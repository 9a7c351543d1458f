//! Core types for reflecting field objects out of Unreal packages.
//!
//! This crate holds everything a single object routine needs:
//!
//! - [`VersionContext`] and [`Game`]: the facts every read is gated on
//! - [`Archive`]: sequential typed reads bounded by a stopper
//! - [`TypeDescriptor`]: schema of native mirror types and synthesized layouts
//! - the object model in [`object`], with per-variant versioned routines
//! - [`LoadError`] and [`Diagnostics`]: fatal and recoverable findings
//!
//! The registry and the load session live in their own crates.

pub mod archive;
pub mod defaults;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod ids;
pub mod object;
pub mod rules;
pub mod version;

pub use archive::{Archive, ByteCursor, SliceArchive, format_name, lookup_name, read_array, read_map};
pub use defaults::{ArrayValue, DefaultsBuffer, Instance, Pools, read_tagged_properties};
pub use descriptor::{
    Constructor, PropertyCount, PropertyDescriptor, TypeDescriptor, TypeRef, ValueKind,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{
    ArchiveError, ContextFrame, LoadError, LoadErrorKind, RegistryError, Result, ResultExt,
};
pub use flags::{ClassCategory, ClassFlags, PropertyFlags, StructFlags};
pub use ids::{ExportIndex, ImportIndex, ObjectRef, PackageIndex};
pub use object::{
    Class, Const, Enum, Field, FieldKind, Fields, ObjectKind, ObjectLookup, Property,
    PropertyKind, PropertyTag, PropertyType, ScriptStruct, State, Struct, TextBuffer, UObject,
};
pub use version::{Game, VersionContext};
