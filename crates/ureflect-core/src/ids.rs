//! Identifier types for objects inside one package.
//!
//! Relations between objects (`next`, `superField`, property targets) are
//! stored as these indices rather than as references, so a relation can be
//! recorded before the object it names has been populated.

use std::fmt;

/// Index into a package's export table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExportIndex(u32);

impl ExportIndex {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExportIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "export_{}", self.0)
    }
}

impl From<u32> for ExportIndex {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

/// Index into a package's import table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportIndex(u32);

impl ImportIndex {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ImportIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import_{}", self.0)
    }
}

/// Raw on-disk object reference.
///
/// Positive values name export `value - 1`, negative values name import
/// `-value - 1`, zero is the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackageIndex(i32);

impl PackageIndex {
    pub const NULL: PackageIndex = PackageIndex(0);

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    pub const fn from_export(index: ExportIndex) -> Self {
        Self(index.0 as i32 + 1)
    }

    pub const fn from_import(index: ImportIndex) -> Self {
        Self(-(index.0 as i32) - 1)
    }

    /// Decode into a typed reference; `None` for the null reference.
    pub fn resolve(self) -> Option<ObjectRef> {
        match self.0 {
            0 => None,
            raw if raw > 0 => Some(ObjectRef::Export(ExportIndex::new((raw - 1) as u32))),
            raw => Some(ObjectRef::Import(ImportIndex::new(-(raw + 1) as u32))),
        }
    }
}

impl From<ObjectRef> for PackageIndex {
    fn from(object: ObjectRef) -> Self {
        match object {
            ObjectRef::Export(index) => Self::from_export(index),
            ObjectRef::Import(index) => Self::from_import(index),
        }
    }
}

/// A resolved, non-null reference to an object of the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Export(ExportIndex),
    Import(ImportIndex),
}

impl ObjectRef {
    /// The export index, when this names an export.
    pub fn as_export(self) -> Option<ExportIndex> {
        match self {
            ObjectRef::Export(index) => Some(index),
            ObjectRef::Import(_) => None,
        }
    }

    pub fn is_import(self) -> bool {
        matches!(self, ObjectRef::Import(_))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Export(index) => index.fmt(f),
            ObjectRef::Import(index) => index.fmt(f),
        }
    }
}
