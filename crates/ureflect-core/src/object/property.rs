use std::fmt;

use crate::{
    Archive, Game, ObjectRef, PropertyFlags, Result, ValueKind,
    flags::flags2,
    rules::{ARRAY_DIM, ArrayDimWidth, PROPERTY_META, PropertyMeta, pick},
};

use super::ObjectLookup;

/// Variant payload of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Byte { enum_ref: Option<ObjectRef> },
    Int,
    Bool,
    Float,
    Object { class: Option<ObjectRef> },
    Class { class: Option<ObjectRef>, meta_class: Option<ObjectRef> },
    Name,
    Str,
    Array { inner: Option<ObjectRef> },
    Map { key: Option<ObjectRef>, value: Option<ObjectRef> },
    Struct { struct_ref: Option<ObjectRef> },
    Component { class: Option<ObjectRef> },
    Interface { class: Option<ObjectRef> },
    Delegate { function: Option<ObjectRef>, source_delegate: Option<ObjectRef> },
    NativeType { type_name: String },
    Pointer,
}

impl PropertyKind {
    /// Native class name of the variant.
    pub fn class_name(&self) -> &'static str {
        match self {
            PropertyKind::Byte { .. } => "ByteProperty",
            PropertyKind::Int => "IntProperty",
            PropertyKind::Bool => "BoolProperty",
            PropertyKind::Float => "FloatProperty",
            PropertyKind::Object { .. } => "ObjectProperty",
            PropertyKind::Class { .. } => "ClassProperty",
            PropertyKind::Name => "NameProperty",
            PropertyKind::Str => "StrProperty",
            PropertyKind::Array { .. } => "ArrayProperty",
            PropertyKind::Map { .. } => "MapProperty",
            PropertyKind::Struct { .. } => "StructProperty",
            PropertyKind::Component { .. } => "ComponentProperty",
            PropertyKind::Interface { .. } => "InterfaceProperty",
            PropertyKind::Delegate { .. } => "DelegateProperty",
            PropertyKind::NativeType { .. } => "NativeTypeProperty",
            PropertyKind::Pointer => "PointerProperty",
        }
    }

    /// Storage of one element in a defaults buffer.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            PropertyKind::Byte { .. } => ValueKind::Byte,
            PropertyKind::Int => ValueKind::Int,
            PropertyKind::Bool => ValueKind::Bool,
            PropertyKind::Float => ValueKind::Float,
            PropertyKind::Object { .. }
            | PropertyKind::Class { .. }
            | PropertyKind::Component { .. } => ValueKind::Object,
            PropertyKind::Interface { .. } => ValueKind::Interface,
            PropertyKind::Name => ValueKind::Name,
            PropertyKind::Str => ValueKind::Str,
            PropertyKind::Array { .. } => ValueKind::Array,
            PropertyKind::Map { .. } => ValueKind::Map,
            PropertyKind::Struct { .. } => ValueKind::Struct,
            PropertyKind::Delegate { .. } => ValueKind::Delegate,
            PropertyKind::NativeType { .. } => ValueKind::Opaque,
            PropertyKind::Pointer => ValueKind::Pointer,
        }
    }

    fn deserialize(&mut self, ar: &mut dyn Archive) -> Result<()> {
        match self {
            PropertyKind::Byte { enum_ref } => *enum_ref = ar.read_object()?,
            PropertyKind::Object { class }
            | PropertyKind::Component { class }
            | PropertyKind::Interface { class } => *class = ar.read_object()?,
            PropertyKind::Class { class, meta_class } => {
                *class = ar.read_object()?;
                *meta_class = ar.read_object()?;
            }
            PropertyKind::Array { inner } => *inner = ar.read_object()?,
            PropertyKind::Map { key, value } => {
                *key = ar.read_object()?;
                *value = ar.read_object()?;
            }
            PropertyKind::Struct { struct_ref } => *struct_ref = ar.read_object()?,
            PropertyKind::Delegate {
                function,
                source_delegate,
            } => {
                *function = ar.read_object()?;
                if ar.version().game_at_least(Game::Ue3) {
                    *source_delegate = ar.read_object()?;
                }
            }
            PropertyKind::NativeType { type_name } => *type_name = ar.read_name()?,
            PropertyKind::Int
            | PropertyKind::Bool
            | PropertyKind::Float
            | PropertyKind::Name
            | PropertyKind::Str
            | PropertyKind::Pointer => {}
        }
        Ok(())
    }
}

/// A typed member of a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub array_dim: i32,
    /// Canonical flags, normalized from fork-specific flag spaces.
    pub flags: PropertyFlags,
    pub flags2: u32,
    pub category: Option<String>,
    /// Enumeration whose count gives `array_dim`.
    pub array_size_enum: Option<ObjectRef>,
    pub rep_offset: Option<u16>,
    pub comment: Option<String>,
    pub kind: PropertyKind,
}

impl Property {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            array_dim: 1,
            flags: PropertyFlags::empty(),
            flags2: 0,
            category: None,
            array_size_enum: None,
            rep_offset: None,
            comment: None,
            kind,
        }
    }

    pub fn deserialize(&mut self, ar: &mut dyn Archive) -> Result<()> {
        let ctx = ar.version();
        self.array_dim = match pick("Property", ARRAY_DIM, &ctx)? {
            ArrayDimWidth::I16 => ar.read_i16()? as i32,
            ArrayDimWidth::I32 => ar.read_i32()?,
        };
        let raw_flags = ar.read_u32()?;
        if ctx.game_at_least(Game::Ue3) {
            self.flags2 = ar.read_u32()?;
        }
        let mut flags = PropertyFlags::from_bits_retain(raw_flags);

        if pick("Property", PROPERTY_META, &ctx)? == PropertyMeta::Read {
            self.category = Some(ar.read_name()?);
            if ctx.game_at_least(Game::Ue3) {
                self.array_size_enum = ar.read_object()?;
            }
            if ctx.is(Game::Borderlands) && ctx.licensee_version >= 2 {
                ar.read_object()?;
                ar.read_object()?;
            }
            if ctx.game_between(Game::Batman2, Game::Batman4) {
                flags = PropertyFlags::from_batman(raw_flags);
            }
        }

        if flags.contains(PropertyFlags::NET) {
            self.rep_offset = Some(ar.read_u16()?);
        }
        if ctx.game_below(Game::Ue3) && flags.contains(PropertyFlags::COMMENT) {
            self.comment = Some(ar.read_string()?);
        }
        if ctx.is(Game::Tna) && self.flags2 & flags2::TNA_EXTRA != 0 {
            ar.read_u16()?;
        }
        if ctx.is(Game::A51) && self.flags2 & flags2::A51_COMMENT != 0 {
            self.comment = Some(ar.read_string()?);
        }
        self.flags = flags;

        self.kind.deserialize(ar)
    }

    /// Bytes one element occupies in a data layout.
    ///
    /// A map side that refers back into the map it belongs to counts as 0.
    pub fn element_size(&self, lookup: &dyn ObjectLookup) -> usize {
        self.element_size_in(lookup, &mut Vec::new())
    }

    fn element_size_in(&self, lookup: &dyn ObjectLookup, path: &mut Vec<ObjectRef>) -> usize {
        match &self.kind {
            PropertyKind::Byte { .. } | PropertyKind::Bool => 1,
            PropertyKind::Int | PropertyKind::Float => 4,
            PropertyKind::Object { .. }
            | PropertyKind::Class { .. }
            | PropertyKind::Component { .. } => 4,
            PropertyKind::Interface { .. } => 8,
            PropertyKind::Name | PropertyKind::Str | PropertyKind::Array { .. } => 8,
            PropertyKind::Pointer => 8,
            PropertyKind::Delegate { .. } => 12,
            PropertyKind::NativeType { .. } => 0,
            PropertyKind::Map { key, value } => {
                let mut side = |r: &Option<ObjectRef>| {
                    follow(lookup, *r, path, |p, path| p.element_size_in(lookup, path))
                        .unwrap_or(0)
                };
                side(key) + side(value)
            }
            PropertyKind::Struct { struct_ref } => struct_ref
                .and_then(|r| lookup.layout_of(r))
                .map_or(0, |layout| layout.instance_size()),
        }
    }

    /// Natural alignment of one element.
    pub fn alignment(&self, lookup: &dyn ObjectLookup) -> usize {
        match &self.kind {
            PropertyKind::Struct { struct_ref } => struct_ref
                .and_then(|r| lookup.layout_of(r))
                .map_or(1, |layout| layout.alignment()),
            PropertyKind::Map { .. } => 4,
            kind => kind.value_kind().alignment(),
        }
    }

    /// Declared type for schema output.
    ///
    /// An array whose element chain loops back on itself renders its
    /// element as unknown.
    pub fn property_type(&self, lookup: &dyn ObjectLookup) -> PropertyType {
        self.property_type_in(lookup, &mut Vec::new())
    }

    fn property_type_in(
        &self,
        lookup: &dyn ObjectLookup,
        path: &mut Vec<ObjectRef>,
    ) -> PropertyType {
        let name_of = |r: &Option<ObjectRef>| r.and_then(|r| lookup.object_name(r));
        match &self.kind {
            PropertyKind::Byte { enum_ref } => match name_of(enum_ref) {
                Some(name) => PropertyType::Enum(name),
                None => PropertyType::Byte,
            },
            PropertyKind::Int => PropertyType::Int,
            PropertyKind::Bool => PropertyType::Bool,
            PropertyKind::Float => PropertyType::Float,
            PropertyKind::Object { class } => PropertyType::Object(name_of(class)),
            PropertyKind::Class { .. } => PropertyType::Class,
            PropertyKind::Name => PropertyType::Name,
            PropertyKind::Str => PropertyType::Str,
            PropertyKind::Array { inner } => {
                let element = follow(lookup, *inner, path, |p, path| {
                    p.property_type_in(lookup, path)
                })
                .unwrap_or(PropertyType::Unknown);
                PropertyType::Array(Box::new(element))
            }
            PropertyKind::Map { .. } => PropertyType::Map,
            PropertyKind::Struct { struct_ref } => PropertyType::Struct(name_of(struct_ref)),
            PropertyKind::Component { .. } => PropertyType::Component,
            PropertyKind::Interface { .. } => PropertyType::Interface,
            PropertyKind::Delegate { .. } => PropertyType::Delegate,
            PropertyKind::NativeType { type_name } => PropertyType::Native(type_name.clone()),
            PropertyKind::Pointer => PropertyType::Pointer,
        }
    }
}

/// Apply `f` to the property behind `r`, unless `r` is already on `path`.
///
/// Returns `None` for a null or unloaded reference, a non-property target or
/// a reference back into the walk.
fn follow<T>(
    lookup: &dyn ObjectLookup,
    r: Option<ObjectRef>,
    path: &mut Vec<ObjectRef>,
    f: impl FnOnce(&Property, &mut Vec<ObjectRef>) -> T,
) -> Option<T> {
    let r = r?;
    if path.contains(&r) || path.len() >= lookup.object_count() {
        return None;
    }
    let property = lookup.object(r)?.as_property()?;
    path.push(r);
    let result = f(property, path);
    path.pop();
    Some(result)
}

/// Declared type of a property as rendered in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Byte,
    Enum(String),
    Int,
    Bool,
    Float,
    Object(Option<String>),
    Class,
    Name,
    Str,
    Array(Box<PropertyType>),
    Map,
    Struct(Option<String>),
    Component,
    Interface,
    Delegate,
    Native(String),
    Pointer,
    /// Referenced type could not be resolved.
    Unknown,
}

impl PropertyType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, PropertyType::Unknown)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Byte => f.write_str("byte"),
            PropertyType::Enum(name) => f.write_str(name),
            PropertyType::Int => f.write_str("int"),
            PropertyType::Bool => f.write_str("bool"),
            PropertyType::Float => f.write_str("float"),
            PropertyType::Object(Some(class)) => f.write_str(class),
            PropertyType::Object(None) => f.write_str("object"),
            PropertyType::Class => f.write_str("class"),
            PropertyType::Name => f.write_str("name"),
            PropertyType::Str => f.write_str("string"),
            PropertyType::Array(inner) => write!(f, "array<{inner}>"),
            PropertyType::Map => f.write_str("map<>"),
            PropertyType::Struct(Some(name)) => f.write_str(name),
            PropertyType::Struct(None) => f.write_str("struct"),
            PropertyType::Component => f.write_str("component"),
            PropertyType::Interface => f.write_str("interface"),
            PropertyType::Delegate => f.write_str("delegate"),
            PropertyType::Native(name) => f.write_str(name),
            PropertyType::Pointer => f.write_str("pointer"),
            PropertyType::Unknown => f.write_str("unknown"),
        }
    }
}
