//! Package collaborator: name, import and export tables over raw bytes.
//!
//! File I/O, decompression and header parsing happen elsewhere; a
//! [`Package`] is what remains once a file is fully in memory.

use ureflect_core::{ExportIndex, ObjectRef, PackageIndex, VersionContext};

/// Class name of an export whose class reference is null.
pub const CLASS_CLASS: &str = "Class";

/// One entry of the export table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectExport {
    pub object_name: String,
    /// Class of the object; null for class objects themselves.
    pub class_index: PackageIndex,
    pub outer_index: PackageIndex,
    /// Byte range of the object's serialized data.
    pub serial_offset: u64,
    pub serial_size: u64,
}

impl ObjectExport {
    pub fn new(object_name: impl Into<String>, class_index: PackageIndex) -> Self {
        Self {
            object_name: object_name.into(),
            class_index,
            outer_index: PackageIndex::NULL,
            serial_offset: 0,
            serial_size: 0,
        }
    }

    pub fn with_outer(mut self, outer: PackageIndex) -> Self {
        self.outer_index = outer;
        self
    }

    pub fn with_range(mut self, offset: u64, size: u64) -> Self {
        self.serial_offset = offset;
        self.serial_size = size;
        self
    }

    /// End of the serialized data: the stopper for this object.
    pub fn serial_end(&self) -> u64 {
        self.serial_offset + self.serial_size
    }
}

/// One entry of the import table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectImport {
    pub class_package: String,
    pub class_name: String,
    pub outer_index: PackageIndex,
    pub object_name: String,
}

impl ObjectImport {
    pub fn new(class_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            class_package: "Core".to_string(),
            class_name: class_name.into(),
            outer_index: PackageIndex::NULL,
            object_name: object_name.into(),
        }
    }
}

/// A loaded package file.
pub trait Package {
    fn version(&self) -> VersionContext;

    fn names(&self) -> &[String];

    fn imports(&self) -> &[ObjectImport];

    fn exports(&self) -> &[ObjectExport];

    /// The whole uncompressed file.
    fn data(&self) -> &[u8];

    // === Provided ===

    fn export(&self, index: ExportIndex) -> Option<&ObjectExport> {
        self.exports().get(index.as_usize())
    }

    /// Name of an export or import.
    fn object_name(&self, object: ObjectRef) -> Option<&str> {
        match object {
            ObjectRef::Export(index) => self.export(index).map(|e| e.object_name.as_str()),
            ObjectRef::Import(index) => self
                .imports()
                .get(index.as_usize())
                .map(|i| i.object_name.as_str()),
        }
    }

    /// Declared class name of an export.
    fn export_class_name(&self, index: ExportIndex) -> Option<&str> {
        let export = self.export(index)?;
        match export.class_index.resolve() {
            None => Some(CLASS_CLASS),
            Some(class) => self.object_name(class),
        }
    }
}

/// A package assembled in memory.
#[derive(Debug, Clone)]
pub struct InMemoryPackage {
    version: VersionContext,
    names: Vec<String>,
    imports: Vec<ObjectImport>,
    exports: Vec<ObjectExport>,
    data: Vec<u8>,
}

impl InMemoryPackage {
    pub fn new(version: VersionContext, data: Vec<u8>) -> Self {
        Self {
            version,
            names: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            data,
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn with_imports(mut self, imports: Vec<ObjectImport>) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_exports(mut self, exports: Vec<ObjectExport>) -> Self {
        self.exports = exports;
        self
    }
}

impl Package for InMemoryPackage {
    fn version(&self) -> VersionContext {
        self.version
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn imports(&self) -> &[ObjectImport] {
        &self.imports
    }

    fn exports(&self) -> &[ObjectExport] {
        &self.exports
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ureflect_core::{Game, ImportIndex};

    fn package() -> InMemoryPackage {
        InMemoryPackage::new(VersionContext::new(700, 0, Game::Ue3), vec![0; 16])
            .with_imports(vec![ObjectImport::new("Class", "IntProperty")])
            .with_exports(vec![
                ObjectExport::new("Pawn", PackageIndex::NULL).with_range(0, 8),
                ObjectExport::new("Health", PackageIndex::from_import(ImportIndex::new(0)))
                    .with_outer(PackageIndex::from_export(ExportIndex::new(0)))
                    .with_range(8, 8),
                ObjectExport::new("Default__Pawn", PackageIndex::from_export(ExportIndex::new(0))),
            ])
    }

    #[test]
    fn class_names_of_exports() {
        let package = package();
        assert_eq!(package.export_class_name(ExportIndex::new(0)), Some("Class"));
        assert_eq!(package.export_class_name(ExportIndex::new(1)), Some("IntProperty"));
        assert_eq!(package.export_class_name(ExportIndex::new(2)), Some("Pawn"));
        assert_eq!(package.export_class_name(ExportIndex::new(9)), None);
    }

    #[test]
    fn serial_range() {
        let package = package();
        assert_eq!(package.export(ExportIndex::new(1)).unwrap().serial_end(), 16);
    }
}
