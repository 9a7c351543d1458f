//! Built-in native classes and structures.
//!
//! Each native variant of the object model gets one static descriptor with
//! its place in the native parent chain and a constructor. `Object`, `Field`
//! and `Property` exist only as parents and are not registered. The common
//! engine math structures are registered with their binary layouts so that
//! tagged default values naming them can be decoded.

use std::sync::LazyLock;

use ureflect_core::{
    Class, ClassCategory, Const, Constructor, Enum, Field, FieldKind, ObjectKind, Property,
    PropertyDescriptor, PropertyKind, ScriptStruct, State, Struct, TextBuffer, TypeDescriptor,
    TypeRef, ValueKind,
};

use crate::ClassEntry;

// ============================================================================
// Object model
// ============================================================================

fn field(kind: FieldKind) -> ObjectKind {
    ObjectKind::Field(Field::new(kind))
}

fn property(kind: PropertyKind) -> ObjectKind {
    field(FieldKind::Property(Property::new(kind)))
}

fn native(name: &str, parent: &TypeRef, make: fn() -> ObjectKind) -> TypeRef {
    TypeDescriptor::class(name)
        .with_parent(Some(parent.clone()))
        .with_constructor(Constructor::Native(make))
        .into_ref()
}

fn abstract_class(name: &str, parent: Option<&TypeRef>) -> TypeRef {
    TypeDescriptor::class(name)
        .with_parent(parent.cloned())
        .into_ref()
}

static OBJECT: LazyLock<TypeRef> = LazyLock::new(|| abstract_class("Object", None));
static FIELD: LazyLock<TypeRef> = LazyLock::new(|| abstract_class("Field", Some(&*OBJECT)));
static PROPERTY: LazyLock<TypeRef> = LazyLock::new(|| abstract_class("Property", Some(&*FIELD)));

static TEXT_BUFFER: LazyLock<TypeRef> = LazyLock::new(|| {
    native("TextBuffer", &OBJECT, || {
        ObjectKind::TextBuffer(TextBuffer::default())
    })
});
static ENUM: LazyLock<TypeRef> =
    LazyLock::new(|| native("Enum", &FIELD, || field(FieldKind::Enum(Enum::default()))));
static CONST: LazyLock<TypeRef> =
    LazyLock::new(|| native("Const", &FIELD, || field(FieldKind::Const(Const::default()))));
static STRUCT: LazyLock<TypeRef> =
    LazyLock::new(|| native("Struct", &FIELD, || field(FieldKind::Struct(Struct::default()))));
static FUNCTION: LazyLock<TypeRef> =
    LazyLock::new(|| native("Function", &FIELD, || field(FieldKind::Function)));
static SCRIPT_STRUCT: LazyLock<TypeRef> = LazyLock::new(|| {
    native("ScriptStruct", &STRUCT, || {
        field(FieldKind::ScriptStruct(ScriptStruct::default()))
    })
});
static STATE: LazyLock<TypeRef> =
    LazyLock::new(|| native("State", &STRUCT, || field(FieldKind::State(State::default()))));
static CLASS: LazyLock<TypeRef> =
    LazyLock::new(|| native("Class", &STATE, || field(FieldKind::Class(Class::default()))));

macro_rules! property_types {
    ($($static:ident = $name:literal => $kind:expr;)*) => {
        $(
            static $static: LazyLock<TypeRef> =
                LazyLock::new(|| native($name, &PROPERTY, || property($kind)));
        )*

        fn property_entries() -> Vec<ClassEntry> {
            vec![$(
                ClassEntry::native($name, ClassCategory::NATIVE_CLASS, || $static.clone()),
            )*]
        }
    };
}

property_types! {
    BYTE_PROPERTY = "ByteProperty" => PropertyKind::Byte { enum_ref: None };
    INT_PROPERTY = "IntProperty" => PropertyKind::Int;
    BOOL_PROPERTY = "BoolProperty" => PropertyKind::Bool;
    FLOAT_PROPERTY = "FloatProperty" => PropertyKind::Float;
    OBJECT_PROPERTY = "ObjectProperty" => PropertyKind::Object { class: None };
    CLASS_PROPERTY = "ClassProperty" => PropertyKind::Class { class: None, meta_class: None };
    NAME_PROPERTY = "NameProperty" => PropertyKind::Name;
    STR_PROPERTY = "StrProperty" => PropertyKind::Str;
    ARRAY_PROPERTY = "ArrayProperty" => PropertyKind::Array { inner: None };
    MAP_PROPERTY = "MapProperty" => PropertyKind::Map { key: None, value: None };
    STRUCT_PROPERTY = "StructProperty" => PropertyKind::Struct { struct_ref: None };
    COMPONENT_PROPERTY = "ComponentProperty" => PropertyKind::Component { class: None };
    INTERFACE_PROPERTY = "InterfaceProperty" => PropertyKind::Interface { class: None };
    DELEGATE_PROPERTY = "DelegateProperty" => PropertyKind::Delegate { function: None, source_delegate: None };
    NATIVE_TYPE_PROPERTY = "NativeTypeProperty" => PropertyKind::NativeType { type_name: String::new() };
    POINTER_PROPERTY = "PointerProperty" => PropertyKind::Pointer;
}

// ============================================================================
// Engine structures
// ============================================================================

fn binary_struct(name: &str, size: usize, align: usize, fields: &[(&str, ValueKind, usize)]) -> TypeRef {
    let mut offset = 0;
    let properties = fields
        .iter()
        .map(|&(field, value, element_size)| {
            let p = PropertyDescriptor::new(field, type_name(value), value, offset, element_size);
            offset += element_size;
            p
        })
        .collect();
    TypeDescriptor::structure(name)
        .with_properties(properties)
        .with_size(size, align)
        .with_constructor(Constructor::Instance)
        .with_binary_layout(true)
        .into_ref()
}

fn type_name(value: ValueKind) -> &'static str {
    match value {
        ValueKind::Byte => "byte",
        ValueKind::Int => "int",
        ValueKind::Float => "float",
        _ => "struct",
    }
}

const F: ValueKind = ValueKind::Float;
const I: ValueKind = ValueKind::Int;
const B: ValueKind = ValueKind::Byte;

static VECTOR: LazyLock<TypeRef> =
    LazyLock::new(|| binary_struct("Vector", 12, 4, &[("X", F, 4), ("Y", F, 4), ("Z", F, 4)]));
static VECTOR2D: LazyLock<TypeRef> =
    LazyLock::new(|| binary_struct("Vector2D", 8, 4, &[("X", F, 4), ("Y", F, 4)]));
static VECTOR4: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("Vector4", 16, 4, &[("X", F, 4), ("Y", F, 4), ("Z", F, 4), ("W", F, 4)])
});
static PLANE: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("Plane", 16, 4, &[("X", F, 4), ("Y", F, 4), ("Z", F, 4), ("W", F, 4)])
});
static QUAT: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("Quat", 16, 4, &[("X", F, 4), ("Y", F, 4), ("Z", F, 4), ("W", F, 4)])
});
static ROTATOR: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("Rotator", 12, 4, &[("Pitch", I, 4), ("Yaw", I, 4), ("Roll", I, 4)])
});
static COLOR: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("Color", 4, 1, &[("B", B, 1), ("G", B, 1), ("R", B, 1), ("A", B, 1)])
});
static LINEAR_COLOR: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("LinearColor", 16, 4, &[("R", F, 4), ("G", F, 4), ("B", F, 4), ("A", F, 4)])
});
static GUID: LazyLock<TypeRef> = LazyLock::new(|| {
    binary_struct("Guid", 16, 4, &[("A", I, 4), ("B", I, 4), ("C", I, 4), ("D", I, 4)])
});
static BOX: LazyLock<TypeRef> = LazyLock::new(|| {
    let vector = VECTOR.clone();
    TypeDescriptor::structure("Box")
        .with_properties(vec![
            PropertyDescriptor::new("Min", "Vector", ValueKind::Struct, 0, 12)
                .with_layout(vector.clone()),
            PropertyDescriptor::new("Max", "Vector", ValueKind::Struct, 12, 12).with_layout(vector),
            PropertyDescriptor::new("IsValid", "byte", ValueKind::Byte, 24, 1),
        ])
        .with_size(25, 4)
        .with_constructor(Constructor::Instance)
        .with_binary_layout(true)
        .into_ref()
});

/// Every native entry, in registration order.
pub fn native_classes() -> Vec<ClassEntry> {
    use ClassCategory as C;
    let mut entries = vec![
        ClassEntry::native("TextBuffer", C::NATIVE_CLASS, || TEXT_BUFFER.clone()),
        ClassEntry::native("Enum", C::NATIVE_CLASS, || ENUM.clone()),
        ClassEntry::native("Const", C::NATIVE_CLASS, || CONST.clone()),
        ClassEntry::native("Struct", C::NATIVE_CLASS, || STRUCT.clone()),
        ClassEntry::native("Function", C::NATIVE_CLASS, || FUNCTION.clone()),
        ClassEntry::native("ScriptStruct", C::NATIVE_CLASS, || SCRIPT_STRUCT.clone()),
        ClassEntry::native("State", C::NATIVE_CLASS, || STATE.clone()),
        ClassEntry::native("Class", C::NATIVE_CLASS, || CLASS.clone()),
    ];
    entries.extend(property_entries());
    // Mortal Kombat name for byte properties.
    entries.push(ClassEntry::native("ResourceProperty", C::NATIVE_CLASS, || {
        BYTE_PROPERTY.clone()
    }));
    entries.extend([
        ClassEntry::native("Vector", C::NATIVE_STRUCT, || VECTOR.clone()),
        ClassEntry::native("Vector2D", C::NATIVE_STRUCT, || VECTOR2D.clone()),
        ClassEntry::native("Vector4", C::NATIVE_STRUCT, || VECTOR4.clone()),
        ClassEntry::native("Plane", C::NATIVE_STRUCT, || PLANE.clone()),
        ClassEntry::native("Quat", C::NATIVE_STRUCT, || QUAT.clone()),
        ClassEntry::native("Rotator", C::NATIVE_STRUCT, || ROTATOR.clone()),
        ClassEntry::native("Color", C::NATIVE_STRUCT, || COLOR.clone()),
        ClassEntry::native("LinearColor", C::NATIVE_STRUCT, || LINEAR_COLOR.clone()),
        ClassEntry::native("Guid", C::NATIVE_STRUCT, || GUID.clone()),
        ClassEntry::native("Box", C::NATIVE_STRUCT, || BOX.clone()),
    ]);
    entries
}

#[cfg(test)]
mod tests {
    use crate::TypeRegistry;
    use ureflect_core::{ObjectKind, PropertyKind, RegistryError};

    #[test]
    fn every_registered_name_round_trips() {
        let registry = TypeRegistry::with_native_classes();
        for name in registry.names() {
            let object = registry
                .create_class(name)
                .unwrap_or_else(|err| panic!("{name}: {err}"));
            assert_eq!(object.class_name, name);
        }
        assert_eq!(registry.len(), 35);
    }

    #[test]
    fn math_struct_creates_an_instance() {
        let registry = TypeRegistry::with_native_classes();
        let object = registry.create_class("Vector").unwrap();
        assert!(matches!(object.kind, ObjectKind::Instance(_)));
        assert!(object.is_a("Vector"));
    }

    #[test]
    fn native_chain() {
        let registry = TypeRegistry::with_native_classes();
        let class = registry.find_class_type("Class").unwrap();
        for ancestor in ["Class", "State", "Struct", "Field", "Object"] {
            assert!(class.is_a(ancestor), "{ancestor}");
        }
        assert!(!class.is_a("Property"));
        let int = registry.find_class_type("IntProperty").unwrap();
        assert!(int.is_a("Property"));
        let function = registry.find_class_type("Function").unwrap();
        assert!(function.is_a("Field"));
        assert!(!function.is_a("Struct"));
    }

    #[test]
    fn resource_property_is_a_byte_property() {
        let registry = TypeRegistry::with_native_classes();
        let object = registry.create_class("ResourceProperty").unwrap();
        assert_eq!(object.class_name, "ResourceProperty");
        assert!(object.is_a("ByteProperty"));
        assert!(matches!(
            object.as_property().map(|p| &p.kind),
            Some(PropertyKind::Byte { .. })
        ));
    }

    #[test]
    fn abstract_parents_are_not_registered() {
        let registry = TypeRegistry::with_native_classes();
        for name in ["Object", "Field", "Property"] {
            assert!(!registry.is_known_class(name), "{name}");
            assert!(matches!(
                registry.create_class(name),
                Err(RegistryError::UnknownType(_))
            ));
        }
    }

    #[test]
    fn math_structs_have_binary_layouts() {
        let registry = TypeRegistry::with_native_classes();
        let vector = registry.find_struct_type("Vector").unwrap();
        assert!(vector.has_binary_layout());
        assert_eq!(vector.instance_size(), 12);
        assert_eq!(vector.find_property("Z").unwrap().offset, 8);
        let boxed = registry.find_struct_type("Box").unwrap();
        assert_eq!(boxed.aligned_size(), 28);
        assert!(registry.find_class_type("Vector").is_none());
    }
}
