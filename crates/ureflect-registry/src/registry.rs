//! TypeRegistry - class name to type descriptor table.
//!
//! Structures and classes share one table keyed by the exported class name;
//! the [`ClassCategory`] bits of each entry tell them apart. An entry's
//! descriptor is produced lazily: either by a native getter over a static
//! table or from a layout synthesized while loading a package.
//!
//! # Aliasing
//!
//! Registering a name twice overwrites the first entry. This is how one
//! native implementation is exposed under several historical class names.

use rustc_hash::FxHashMap;

use ureflect_core::{ClassCategory, ObjectKind, RegistryError, TypeRef, UObject};

/// Where an entry's descriptor comes from.
#[derive(Clone)]
pub enum TypeSource {
    /// Static native descriptor.
    Native(fn() -> TypeRef),
    /// Layout built from a loaded structure.
    Synthesized(TypeRef),
}

impl std::fmt::Debug for TypeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeSource::Native(_) => f.write_str("Native"),
            TypeSource::Synthesized(t) => write!(f, "Synthesized({})", t.name()),
        }
    }
}

/// One registered class or structure.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub name: String,
    pub category: ClassCategory,
    pub source: TypeSource,
}

impl ClassEntry {
    pub fn native(name: impl Into<String>, category: ClassCategory, getter: fn() -> TypeRef) -> Self {
        Self {
            name: name.into(),
            category,
            source: TypeSource::Native(getter),
        }
    }

    pub fn synthesized(name: impl Into<String>, category: ClassCategory, layout: TypeRef) -> Self {
        Self {
            name: name.into(),
            category,
            source: TypeSource::Synthesized(layout),
        }
    }

    pub fn type_info(&self) -> TypeRef {
        match &self.source {
            TypeSource::Native(getter) => getter(),
            TypeSource::Synthesized(layout) => layout.clone(),
        }
    }

    pub fn is_class(&self) -> bool {
        self.category.contains(ClassCategory::CLASS)
    }

    pub fn is_struct(&self) -> bool {
        self.category.contains(ClassCategory::STRUCT)
    }
}

/// Name-keyed table of class entries.
///
/// Lookups are case-sensitive and must use the exported class name.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    classes: FxHashMap<String, ClassEntry>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in native classes.
    pub fn with_native_classes() -> Self {
        let mut registry = Self::new();
        registry.register_classes(crate::builtin::native_classes());
        registry
    }

    // === Registration ===

    /// Insert entries; a name already present is overwritten.
    pub fn register_classes(&mut self, entries: impl IntoIterator<Item = ClassEntry>) {
        for entry in entries {
            self.register_class(entry);
        }
    }

    pub fn register_class(&mut self, entry: ClassEntry) {
        self.classes.insert(entry.name.clone(), entry);
    }

    /// Remove `name`, and with `whole_tree` every entry whose descriptor
    /// derives from it. Returns how many entries were removed.
    pub fn unregister_class(&mut self, name: &str, whole_tree: bool) -> usize {
        let Some(removed) = self.classes.remove(name) else {
            return 0;
        };
        if !whole_tree {
            return 1;
        }
        let root = removed.type_info();
        let before = self.classes.len();
        self.classes
            .retain(|_, entry| !entry.type_info().is_a(root.name()));
        1 + before - self.classes.len()
    }

    // === Lookup ===

    pub fn get(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    /// Descriptor of a class entry.
    pub fn find_class_type(&self, name: &str) -> Option<TypeRef> {
        self.get(name)
            .filter(|entry| entry.is_class())
            .map(ClassEntry::type_info)
    }

    /// Descriptor of a structure entry.
    pub fn find_struct_type(&self, name: &str) -> Option<TypeRef> {
        self.get(name)
            .filter(|entry| entry.is_struct())
            .map(ClassEntry::type_info)
    }

    pub fn is_known_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Allocate a default-constructed object of the registered class `name`.
    pub fn create_class(&self, name: &str) -> Result<UObject, RegistryError> {
        let entry = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))?;
        let type_info = entry.type_info();
        let kind: ObjectKind = type_info
            .construct()
            .ok_or_else(|| RegistryError::NotConstructible(name.to_string()))?;
        Ok(UObject::new("", name, type_info, kind))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}
