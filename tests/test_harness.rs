//! Synthetic package builder for the load integration tests.
//!
//! Exports are declared first so payloads can reference each other by
//! package index, then the payloads are laid out back to back.

#![allow(dead_code)]

use ureflect::{
    ExportIndex, Game, InMemoryPackage, ObjectExport, ObjectImport, PackageIndex, VersionContext,
};

/// Little-endian byte writer for export payloads.
#[derive(Default, Clone)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Name reference: table index and instance number.
    pub fn name(self, index: i32) -> Self {
        self.i32(index).i32(0)
    }

    pub fn string(mut self, s: &str) -> Self {
        self = self.i32(s.len() as i32 + 1);
        self.0.extend_from_slice(s.as_bytes());
        self.0.push(0);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    /// Net index followed by an empty property list.
    pub fn object_header(self) -> Self {
        self.i32(0).name(PackageBuilder::NONE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Assembles an [`InMemoryPackage`] from declared imports and exports.
pub struct PackageBuilder {
    version: VersionContext,
    names: Vec<String>,
    imports: Vec<ObjectImport>,
    exports: Vec<ObjectExport>,
    payloads: Vec<Vec<u8>>,
}

impl PackageBuilder {
    /// Index of `None`, always the first name.
    pub const NONE: i32 = 0;

    pub fn new(version: i32) -> Self {
        Self::with_context(VersionContext::new(version, 0, Game::Ue3))
    }

    pub fn with_context(version: VersionContext) -> Self {
        Self {
            version,
            names: vec!["None".to_string()],
            imports: Vec::new(),
            exports: Vec::new(),
            payloads: Vec::new(),
        }
    }

    /// Intern a name and return its table index.
    pub fn name(&mut self, name: &str) -> i32 {
        if let Some(i) = self.names.iter().position(|n| n == name) {
            return i as i32;
        }
        self.names.push(name.to_string());
        self.names.len() as i32 - 1
    }

    /// Import an object from Core, usually a native class.
    pub fn import(&mut self, object_name: &str) -> i32 {
        self.name(object_name);
        self.imports.push(ObjectImport::new("Class", object_name));
        -(self.imports.len() as i32)
    }

    /// Declare an export; its payload is set later.
    pub fn declare(&mut self, object_name: &str, class: i32) -> i32 {
        self.name(object_name);
        self.exports
            .push(ObjectExport::new(object_name, PackageIndex::from_raw(class)));
        self.payloads.push(Vec::new());
        self.exports.len() as i32
    }

    pub fn payload(&mut self, export: i32, bytes: Bytes) {
        self.payloads[export as usize - 1] = bytes.0;
    }

    pub fn build(self) -> InMemoryPackage {
        let mut data = Vec::new();
        let mut exports = self.exports;
        for (export, payload) in exports.iter_mut().zip(&self.payloads) {
            *export = export
                .clone()
                .with_range(data.len() as u64, payload.len() as u64);
            data.extend_from_slice(payload);
        }
        InMemoryPackage::new(self.version, data)
            .with_names(self.names)
            .with_imports(self.imports)
            .with_exports(exports)
    }
}

/// Export index of a package reference returned by `declare`.
pub fn export_index(reference: i32) -> ExportIndex {
    ExportIndex::new(reference as u32 - 1)
}

// =============================================================================
// Payload shapes, UE3 from version 756
// =============================================================================

/// Struct body: next, super, script text, children, cpp text, line, text
/// position and the script block.
pub fn struct_body(next: i32, super_field: i32, children: i32, script: &[u8]) -> Bytes {
    Bytes::new()
        .object_header()
        .i32(next)
        .i32(super_field)
        .i32(0)
        .i32(children)
        .i32(0)
        .i32(0)
        .i32(0)
        .i32(script.len() as i32)
        .raw(script)
}

/// State data with no function map.
pub fn state_tail(bytes: Bytes) -> Bytes {
    bytes.i64(0).i64(0).i32(0).u16(0).i32(0)
}

/// A class whose last four bytes reference its default object.
pub fn class_payload(super_field: i32, children: i32, default_object: i32) -> Bytes {
    state_tail(struct_body(0, super_field, children, &[]))
        .u32(0)
        .i32(0)
        .name(PackageBuilder::NONE)
        .i32(default_object)
}

/// A property with no flags, followed by its kind's extra references.
pub fn property_payload(next: i32, extras: &[i32]) -> Bytes {
    let bytes = Bytes::new()
        .object_header()
        .i32(next)
        .i32(1)
        .u32(0)
        .u32(0)
        .name(PackageBuilder::NONE)
        .i32(0);
    extras.iter().fold(bytes, |b, r| b.i32(*r))
}

/// One explicit tag holding a 32-bit integer.
pub fn int_tag(bytes: Bytes, name: i32, int_property: i32, value: i32) -> Bytes {
    bytes.name(name).name(int_property).i32(4).i32(0).i32(value)
}
