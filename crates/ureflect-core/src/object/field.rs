use crate::{
    Archive, ObjectRef, Result,
    archive::read_array,
    error::{ContextFrame, ResultExt},
    rules::{FIELD_LINKS, FieldLinks, pick},
};

use super::{Class, Property, ScriptStruct, State, Struct};

/// Named enumeration.
#[derive(Debug, Clone, Default)]
pub struct Enum {
    pub names: Vec<String>,
}

/// Named constant with its literal text.
#[derive(Debug, Clone, Default)]
pub struct Const {
    pub value: String,
}

/// Variant payload of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Enum(Enum),
    Const(Const),
    /// Bytes are kept out of the model; the body is skipped.
    Function,
    Struct(Struct),
    ScriptStruct(ScriptStruct),
    State(State),
    Class(Class),
    Property(Property),
}

impl FieldKind {
    /// Variant name used in diagnostics and decision tables.
    pub fn variant_name(&self) -> &'static str {
        match self {
            FieldKind::Enum(_) => "Enum",
            FieldKind::Const(_) => "Const",
            FieldKind::Function => "Function",
            FieldKind::Struct(_) => "Struct",
            FieldKind::ScriptStruct(_) => "ScriptStruct",
            FieldKind::State(_) => "State",
            FieldKind::Class(_) => "Class",
            FieldKind::Property(p) => p.kind.class_name(),
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            FieldKind::Struct(s) => Some(s),
            FieldKind::ScriptStruct(s) => Some(&s.base),
            FieldKind::State(s) => Some(&s.base),
            FieldKind::Class(c) => Some(&c.state.base),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut Struct> {
        match self {
            FieldKind::Struct(s) => Some(s),
            FieldKind::ScriptStruct(s) => Some(&mut s.base),
            FieldKind::State(s) => Some(&mut s.base),
            FieldKind::Class(c) => Some(&mut c.state.base),
            _ => None,
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self, FieldKind::Property(_))
    }
}

/// A reflected entity: enum, constant, function, structure or property.
#[derive(Debug, Clone)]
pub struct Field {
    /// Legacy parent link, stored ahead of `next` by older versions.
    pub super_field2: Option<ObjectRef>,
    /// Sibling declared immediately after this one.
    pub next: Option<ObjectRef>,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            super_field2: None,
            next: None,
            kind,
        }
    }

    pub fn deserialize(&mut self, ar: &mut dyn Archive) -> Result<()> {
        let ctx = ar.version();
        if pick("Field", FIELD_LINKS, &ctx)? == FieldLinks::SuperThenNext {
            self.super_field2 = ar.read_object()?;
        }
        self.next = ar.read_object()?;

        let super_field2 = self.super_field2;
        let variant = self.kind.variant_name();
        match &mut self.kind {
            FieldKind::Enum(e) => {
                e.names = read_array(ar, |ar| ar.read_name())?;
                Ok(())
            }
            FieldKind::Const(c) => {
                c.value = ar.read_string()?;
                Ok(())
            }
            FieldKind::Function => ar.drop_remaining_data(),
            FieldKind::Struct(s) => s.deserialize(ar, super_field2),
            FieldKind::ScriptStruct(s) => s.deserialize(ar, super_field2),
            FieldKind::State(s) => s.deserialize(ar, super_field2),
            FieldKind::Class(c) => c.deserialize(ar, super_field2),
            FieldKind::Property(p) => p.deserialize(ar),
        }
        .context(|| ContextFrame::new("Field::deserialize", variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::{Bytes, RecordingArchive};
    use crate::{ExportIndex, Game, ImportIndex, VersionContext};

    fn names() -> Vec<String> {
        ["None", "Red", "Green"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn old_versions_read_super_field2() {
        let data = Bytes::default().i32(3).i32(-1).i32(0).0;
        let names = names();
        let mut ar = RecordingArchive::new(&data, VersionContext::new(700, 0, Game::Ue3), &names);
        let mut field = Field::new(FieldKind::Enum(Enum::default()));
        field.deserialize(&mut ar).unwrap();
        assert_eq!(field.super_field2, Some(ObjectRef::Export(ExportIndex::new(2))));
        assert_eq!(field.next, Some(ObjectRef::Import(ImportIndex::new(0))));
    }

    #[test]
    fn new_versions_read_next_only() {
        let data = Bytes::default().i32(2).string("42").0;
        let names = names();
        let mut ar = RecordingArchive::new(&data, VersionContext::new(800, 0, Game::Ue3), &names);
        let mut field = Field::new(FieldKind::Const(Const::default()));
        field.deserialize(&mut ar).unwrap();
        assert_eq!(field.super_field2, None);
        assert_eq!(field.next, Some(ObjectRef::Export(ExportIndex::new(1))));
        match &field.kind {
            FieldKind::Const(c) => assert_eq!(c.value, "42"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn enum_names_in_order() {
        let data = Bytes::default().i32(0).i32(2).name(1).name(2).0;
        let names = names();
        let mut ar = RecordingArchive::new(&data, VersionContext::new(800, 0, Game::Ue3), &names);
        let mut field = Field::new(FieldKind::Enum(Enum::default()));
        field.deserialize(&mut ar).unwrap();
        match &field.kind {
            FieldKind::Enum(e) => assert_eq!(e.names, vec!["Red", "Green"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn function_body_is_dropped() {
        let data = Bytes::default().i32(0).raw(&[0xAB; 10]).0;
        let names = names();
        let mut ar = RecordingArchive::new(&data, VersionContext::new(800, 0, Game::Ue3), &names);
        let mut field = Field::new(FieldKind::Function);
        field.deserialize(&mut ar).unwrap();
        assert_eq!(ar.remaining(), 0);
    }

    #[test]
    fn unsupported_family_fails() {
        let data = Bytes::default().i32(0).0;
        let names = names();
        let mut ar =
            RecordingArchive::new(&data, VersionContext::new(900, 0, Game::Ue4Base), &names);
        let mut field = Field::new(FieldKind::Function);
        let err = field.deserialize(&mut ar).unwrap_err();
        assert!(err.is_unsupported_version());
    }
}
