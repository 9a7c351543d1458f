//! The in-memory object graph.
//!
//! Every export becomes a [`UObject`]: package identity, the descriptor it
//! was constructed from and an [`ObjectKind`] payload. Field variants form a
//! closed union matched exhaustively by the deserialization routines.
//! Relations between objects are [`ObjectRef`]s resolved through an
//! [`ObjectLookup`].

mod class;
mod field;
mod property;
mod structure;
mod tag;
mod text_buffer;

pub use class::Class;
pub use field::{Const, Enum, Field, FieldKind};
pub use property::{Property, PropertyKind, PropertyType};
pub use structure::{ScriptStruct, State, Struct};
pub use tag::{PropertyTag, skip_tagged_properties};
pub use text_buffer::TextBuffer;

pub use crate::defaults::Instance;

use tracing::trace;

use crate::{
    Archive, ExportIndex, Game, ObjectRef, Result, TypeRef, defaults::read_tagged_properties,
};

/// Payload of an object, selected once at construction.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    TextBuffer(TextBuffer),
    Field(Field),
    /// Instance of a script class or structure, e.g. a default object.
    Instance(Instance),
}

/// One object of a package.
#[derive(Debug, Clone)]
pub struct UObject {
    pub name: String,
    /// Registered class name the object was created under.
    pub class_name: String,
    pub outer: Option<ObjectRef>,
    pub export: Option<ExportIndex>,
    pub net_index: Option<i32>,
    type_info: TypeRef,
    pub kind: ObjectKind,
}

impl UObject {
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        type_info: TypeRef,
        kind: ObjectKind,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            outer: None,
            export: None,
            net_index: None,
            type_info,
            kind,
        }
    }

    pub fn type_info(&self) -> &TypeRef {
        &self.type_info
    }

    /// Walk the native descriptor chain.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_info.is_a(type_name)
    }

    pub fn as_field(&self) -> Option<&Field> {
        match &self.kind {
            ObjectKind::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut Field> {
        match &mut self.kind {
            ObjectKind::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Structure part of a Struct, ScriptStruct, State or Class.
    pub fn as_struct(&self) -> Option<&Struct> {
        self.as_field().and_then(|f| f.kind.as_struct())
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut Struct> {
        self.as_field_mut().and_then(|f| f.kind.as_struct_mut())
    }

    pub fn as_class(&self) -> Option<&Class> {
        match &self.as_field()?.kind {
            FieldKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match &self.as_field()?.kind {
            FieldKind::Property(property) => Some(property),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match &self.kind {
            ObjectKind::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Read the object from its byte range.
    pub fn deserialize(&mut self, ar: &mut dyn Archive) -> Result<()> {
        self.read_header(ar)?;
        match &mut self.kind {
            ObjectKind::TextBuffer(text) => text.deserialize(ar),
            ObjectKind::Field(field) => field.deserialize(ar),
            ObjectKind::Instance(_) => Ok(()),
        }
    }

    /// Net index and the tagged property list every object starts with.
    fn read_header(&mut self, ar: &mut dyn Archive) -> Result<()> {
        let ctx = ar.version();
        if ctx.engine_at_least(Game::Ue3) && ctx.version >= 322 {
            self.net_index = Some(ar.read_i32()?);
        }
        match &mut self.kind {
            ObjectKind::Instance(instance) => {
                let layout = instance.layout().clone();
                read_tagged_properties(ar, &layout, instance.defaults_mut())
            }
            _ => {
                let skipped = skip_tagged_properties(ar)?;
                if skipped > 0 {
                    trace!(object = %self.name, skipped, "skipped header properties");
                }
                Ok(())
            }
        }
    }
}

/// Resolution of object references within one load.
pub trait ObjectLookup {
    /// Loaded object behind a reference.
    fn object(&self, object: ObjectRef) -> Option<&UObject>;

    /// Upper bound on the number of objects, used to stop cyclic walks.
    fn object_count(&self) -> usize;

    /// Name of a referenced object, loaded or not.
    fn object_name(&self, object: ObjectRef) -> Option<String> {
        self.object(object).map(|o| o.name.clone())
    }

    /// Realized layout of a referenced structure.
    fn layout_of(&self, object: ObjectRef) -> Option<TypeRef> {
        self.object(object)?.as_struct()?.layout.clone()
    }

    /// Iterate a field list through its `next` links.
    fn fields(&self, head: Option<ObjectRef>) -> Fields<'_, Self>
    where
        Self: Sized,
    {
        Fields {
            lookup: self,
            current: head,
            remaining: self.object_count(),
        }
    }
}

/// Iterator over a `next`-linked field list.
///
/// Stops at a null link, at a reference that is not a loaded field, or after
/// as many steps as there are objects.
pub struct Fields<'a, L: ObjectLookup> {
    lookup: &'a L,
    current: Option<ObjectRef>,
    remaining: usize,
}

impl<'a, L: ObjectLookup> Iterator for Fields<'a, L> {
    type Item = (ObjectRef, &'a UObject);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.current?;
        let object = self.lookup.object(current)?;
        self.current = object.as_field().and_then(|f| f.next);
        Some((current, object))
    }
}
