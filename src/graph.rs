//! Arena of export slots shared by every phase of a load.
//!
//! Slots are allocated by export index up front. An object is taken out of
//! its slot while its own bytes are read, so the reader can construct and
//! look up the rest of the graph through `&mut ObjectGraph`.

use std::collections::BTreeSet;

use tracing::{trace, warn};

use ureflect_core::{
    ContextFrame, DiagnosticKind, Diagnostics, ExportIndex, FieldKind, LoadError, LoadErrorKind,
    ObjectLookup, ObjectRef, Result, ResultExt, TypeRef, UObject,
};
use ureflect_registry::TypeRegistry;

use crate::package::Package;

/// Progress of one export slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportState {
    /// Not constructed yet.
    Absent,
    /// Placeholder waiting to be populated.
    Created,
    /// Taken out of its slot and being read.
    Loading,
    Loaded,
    /// Instance of a class from this package; constructed once that class
    /// has a layout.
    Deferred,
}

pub(crate) struct ObjectGraph<'a> {
    pub package: &'a dyn Package,
    pub registry: &'a TypeRegistry,
    /// Layouts synthesized from this package, consulted before `registry`.
    pub script_types: TypeRegistry,
    pub objects: Vec<Option<UObject>>,
    pub states: Vec<ExportState>,
    /// Created placeholders, populated in export order.
    pub pending: BTreeSet<u32>,
    pub diagnostics: Diagnostics,
}

impl<'a> ObjectGraph<'a> {
    pub fn new(package: &'a dyn Package, registry: &'a TypeRegistry) -> Self {
        let count = package.exports().len();
        Self {
            package,
            registry,
            script_types: TypeRegistry::new(),
            objects: (0..count).map(|_| None).collect(),
            states: vec![ExportState::Absent; count],
            pending: BTreeSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn state(&self, index: ExportIndex) -> Option<ExportState> {
        self.states.get(index.as_usize()).copied()
    }

    /// Construct the placeholder for an export, or return the existing one.
    pub fn create_export(&mut self, index: ExportIndex) -> Result<()> {
        let package = self.package;
        let missing = || LoadError::new(LoadErrorKind::MissingExport(index.index()));
        let state = self.state(index).ok_or_else(missing)?;
        if state != ExportState::Absent {
            return Ok(());
        }
        let export = package.export(index).ok_or_else(missing)?;
        if let Some(ObjectRef::Export(_)) = export.class_index.resolve() {
            trace!(object = %export.object_name, "instance of a script class deferred");
            self.states[index.as_usize()] = ExportState::Deferred;
            return Ok(());
        }
        let class_name = package.export_class_name(index).ok_or_else(missing)?;
        let mut object = self
            .registry
            .create_class(class_name)
            .context(|| ContextFrame::new("create_export", export.object_name.as_str()))?;
        object.name = export.object_name.clone();
        object.export = Some(index);
        object.outer = export.outer_index.resolve();
        trace!(object = %object.name, class = class_name, "placeholder");

        self.objects[index.as_usize()] = Some(object);
        self.states[index.as_usize()] = ExportState::Created;
        self.pending.insert(index.index());
        Ok(())
    }

    /// Install an instance of a script class into its deferred slot.
    pub fn create_script_object(&mut self, index: ExportIndex) -> Result<Option<UObject>> {
        let package = self.package;
        let export = package
            .export(index)
            .ok_or_else(|| LoadError::new(LoadErrorKind::MissingExport(index.index())))?;
        let Some(class_name) = package.export_class_name(index) else {
            return Ok(None);
        };
        match self.script_types.create_class(class_name) {
            Ok(mut object) => {
                object.name = export.object_name.clone();
                object.export = Some(index);
                object.outer = export.outer_index.resolve();
                Ok(Some(object))
            }
            Err(err) => {
                self.report(
                    DiagnosticKind::MissingReference,
                    &export.object_name,
                    format!("class {class_name} has no layout: {err}"),
                );
                Ok(None)
            }
        }
    }

    pub fn report(&mut self, kind: DiagnosticKind, object: &str, message: String) {
        warn!(object, kind = %kind, "{message}");
        self.diagnostics.push(kind, object, message);
    }

    /// Ordinal of an enumeration value, looked up among loaded enums.
    pub fn enum_value(&self, enum_name: &str, value: &str) -> Option<u8> {
        self.objects.iter().flatten().find_map(|object| {
            if object.name != enum_name {
                return None;
            }
            match &object.as_field()?.kind {
                FieldKind::Enum(e) => e.names.iter().position(|n| n == value).map(|i| i as u8),
                _ => None,
            }
        })
    }

    /// Layout registered for a structure or class name.
    pub fn find_layout(&self, name: &str) -> Option<TypeRef> {
        self.script_types
            .find_struct_type(name)
            .or_else(|| self.script_types.find_class_type(name))
            .or_else(|| self.registry.find_struct_type(name))
    }
}

impl ObjectLookup for ObjectGraph<'_> {
    fn object(&self, object: ObjectRef) -> Option<&UObject> {
        match object {
            ObjectRef::Export(index) => self.objects.get(index.as_usize())?.as_ref(),
            ObjectRef::Import(_) => None,
        }
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn object_name(&self, object: ObjectRef) -> Option<String> {
        self.package.object_name(object).map(str::to_string)
    }

    fn layout_of(&self, object: ObjectRef) -> Option<TypeRef> {
        match object {
            ObjectRef::Export(_) => self.object(object)?.as_struct()?.layout.clone(),
            ObjectRef::Import(_) => self.find_layout(self.package.object_name(object)?),
        }
    }
}
