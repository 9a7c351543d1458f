//! One package load: placeholder, population and post-load phases.
//!
//! A [`LoadSession`] owns the object graph for exactly one package. Any
//! fatal error aborts the load and drops the graph; recoverable problems end
//! up in [`LoadedPackage::diagnostics`].

use tracing::{debug, info};

use ureflect_core::{
    DefaultsBuffer, Diagnostics, ExportIndex, FieldKind, Instance, ObjectKind, ObjectLookup,
    ObjectRef, Result, TypeRef, UObject, VersionContext,
};
use ureflect_registry::TypeRegistry;

use crate::graph::{ExportState, ObjectGraph};
use crate::link::link_layouts;
use crate::materialize::{instantiate_script_objects, resolve_deferred_defaults};
use crate::options::LoadOptions;
use crate::package::{CLASS_CLASS, Package};
use crate::reader::read_export;

/// Loads one package against a type registry.
///
/// # Example
///
/// ```ignore
/// let registry = TypeRegistry::with_native_classes();
/// let loaded = LoadSession::new(&package, &registry, LoadOptions::default()).load()?;
/// for class in loaded.classes() {
///     println!("{}", class.name);
/// }
/// ```
pub struct LoadSession<'a> {
    options: LoadOptions,
    graph: ObjectGraph<'a>,
}

impl<'a> LoadSession<'a> {
    pub fn new(package: &'a dyn Package, registry: &'a TypeRegistry, options: LoadOptions) -> Self {
        Self {
            options,
            graph: ObjectGraph::new(package, registry),
        }
    }

    /// Run every phase and hand back the populated graph.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn load(mut self) -> Result<LoadedPackage<'a>> {
        let version = self.graph.package.version();
        debug!(
            version = version.version,
            licensee = version.licensee_version,
            game = ?version.game,
            exports = self.graph.objects.len(),
            "loading package"
        );

        self.create_placeholders()?;
        self.populate()?;
        self.post_load()?;

        info!(
            objects = self.graph.objects.iter().flatten().count(),
            diagnostics = self.graph.diagnostics.len(),
            "package loaded"
        );
        Ok(LoadedPackage {
            graph: self.graph,
            version,
        })
    }

    // =========================================================================
    // Phases
    // =========================================================================

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_placeholders(&mut self) -> Result<()> {
        let package = self.graph.package;
        for i in 0..package.exports().len() {
            let index = ExportIndex::new(i as u32);
            if self.options.classes_only && package.export_class_name(index) != Some(CLASS_CLASS) {
                continue;
            }
            self.graph.create_export(index)?;
        }
        Ok(())
    }

    /// Read every created placeholder. Reads may create further placeholders,
    /// which join the queue.
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn populate(&mut self) -> Result<()> {
        while let Some(i) = self.graph.pending.pop_first() {
            let index = ExportIndex::new(i);
            let slot = index.as_usize();
            let Some(mut object) = self.graph.objects[slot].take() else {
                continue;
            };
            self.graph.states[slot] = ExportState::Loading;
            let result = read_export(
                &mut self.graph,
                index,
                &mut object,
                self.options.report_unread_bytes,
            );
            self.graph.objects[slot] = Some(object);
            self.graph.states[slot] = ExportState::Loaded;
            result?;
        }
        Ok(())
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn post_load(&mut self) -> Result<()> {
        link_layouts(&mut self.graph);
        if !self.options.materialize_defaults {
            return Ok(());
        }
        resolve_deferred_defaults(&mut self.graph)?;
        instantiate_script_objects(&mut self.graph, self.options.report_unread_bytes)?;
        // Default objects may reference exports nothing else touched.
        self.populate()
    }
}

/// Load `package` with the given options.
pub fn load_package<'a>(
    package: &'a dyn Package,
    registry: &'a TypeRegistry,
    options: LoadOptions,
) -> Result<LoadedPackage<'a>> {
    LoadSession::new(package, registry, options).load()
}

/// Object graph of a successfully loaded package.
pub struct LoadedPackage<'a> {
    graph: ObjectGraph<'a>,
    version: VersionContext,
}

impl<'a> LoadedPackage<'a> {
    pub fn version(&self) -> VersionContext {
        self.version
    }

    pub fn package(&self) -> &'a dyn Package {
        self.graph.package
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.graph.diagnostics
    }

    /// Loaded object of an export.
    pub fn export(&self, index: ExportIndex) -> Option<&UObject> {
        self.graph.objects.get(index.as_usize())?.as_ref()
    }

    /// Every loaded export with its index, in export order.
    pub fn objects(&self) -> impl Iterator<Item = (ExportIndex, &UObject)> {
        self.graph
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, o)| Some((ExportIndex::new(i as u32), o.as_ref()?)))
    }

    /// First loaded export with this name.
    pub fn object_by_name(&self, name: &str) -> Option<(ExportIndex, &UObject)> {
        self.objects().find(|(_, o)| o.name == name)
    }

    /// Loaded classes, skipping the `None` placeholder class.
    pub fn classes(&self) -> impl Iterator<Item = &UObject> {
        self.objects()
            .map(|(_, o)| o)
            .filter(|o| o.as_class().is_some() && o.name != "None")
    }

    /// Layout synthesized for a structure or class of this package, or
    /// registered natively.
    pub fn find_layout(&self, name: &str) -> Option<TypeRef> {
        self.graph.find_layout(name)
    }

    /// Session-local registry of this package's script types.
    pub fn script_types(&self) -> &TypeRegistry {
        &self.graph.script_types
    }

    /// Default bytes of a structure, class or instance.
    ///
    /// Structures and classes without defaults of their own fall back to the
    /// closest ancestor that has some. `None` when nothing was materialized.
    pub fn defaults_of(&self, index: ExportIndex) -> Option<&[u8]> {
        let mut current = Some(ObjectRef::Export(index));
        for _ in 0..self.graph.objects.len() {
            let object = self.object(current?)?;
            if let Some(bytes) = self.own_defaults(object) {
                return Some(bytes);
            }
            current = object.as_struct()?.super_field;
        }
        None
    }

    fn own_defaults<'s>(&'s self, object: &'s UObject) -> Option<&'s [u8]> {
        let buffer = match &object.kind {
            ObjectKind::Instance(instance) => Some(instance.defaults()),
            ObjectKind::Field(field) => match &field.kind {
                FieldKind::ScriptStruct(s) => s.defaults.as_ref(),
                FieldKind::Class(class) => self
                    .object(class.class_default_object?)
                    .and_then(UObject::as_instance)
                    .map(Instance::defaults),
                _ => None,
            },
            ObjectKind::TextBuffer(_) => None,
        };
        buffer.map(DefaultsBuffer::as_bytes).filter(|b| !b.is_empty())
    }
}

impl ObjectLookup for LoadedPackage<'_> {
    fn object(&self, object: ObjectRef) -> Option<&UObject> {
        self.graph.object(object)
    }

    fn object_count(&self) -> usize {
        self.graph.object_count()
    }

    fn object_name(&self, object: ObjectRef) -> Option<String> {
        self.graph.object_name(object)
    }

    fn layout_of(&self, object: ObjectRef) -> Option<TypeRef> {
        self.graph.layout_of(object)
    }
}
