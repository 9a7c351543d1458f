//! End-to-end loads of synthetic packages.

mod test_harness;

use test_harness::*;
use ureflect::{
    ArchiveError, ClassCategory, ClassEntry, DiagnosticKind, FieldKind, Game, LoadErrorKind,
    LoadOptions, ObjectLookup, ObjectRef, PropertyType, TypeDescriptor, TypeRegistry,
    VersionContext, load_package,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("ureflect=debug")
        .try_init();
}

fn registry() -> TypeRegistry {
    TypeRegistry::with_native_classes()
}

fn export_ref(reference: i32) -> ObjectRef {
    ObjectRef::Export(export_index(reference))
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn derived_is_a_base() {
    let base = TypeDescriptor::class("Base").into_ref();
    let derived = TypeDescriptor::class("Derived")
        .with_parent(Some(base.clone()))
        .into_ref();
    let mut registry = TypeRegistry::new();
    registry.register_class(ClassEntry::synthesized("Base", ClassCategory::SCRIPT_CLASS, base));
    registry.register_class(ClassEntry::synthesized(
        "Derived",
        ClassCategory::SCRIPT_CLASS,
        derived,
    ));

    let found = registry.find_class_type("Derived").unwrap();
    assert!(found.is_a("Derived"));
    assert!(found.is_a("Base"));
    assert!(!found.is_a("Unrelated"));
}

#[test]
fn every_native_class_round_trips_through_create_class() {
    let registry = registry();
    for name in registry.names() {
        match registry.create_class(name) {
            Ok(object) => assert_eq!(object.class_name, name),
            Err(err) => panic!("{name}: {err}"),
        }
    }
    assert!(matches!(
        registry.create_class("Nope"),
        Err(ureflect::RegistryError::UnknownType(_))
    ));
}

// =============================================================================
// Structures
// =============================================================================

#[test]
fn old_struct_takes_super_from_super_field2() {
    init_tracing();
    let mut b = PackageBuilder::new(700);
    let struct_class = b.import("Struct");
    let int_property = b.import("IntProperty");
    let base = b.declare("BaseStruct", struct_class);
    let s = b.declare("MyStruct", struct_class);
    let first = b.declare("A", int_property);
    let second = b.declare("B", int_property);

    // super field 2, next, script text, children, cpp text, line, text pos, script size
    let empty_struct = |super2: i32, children: i32| {
        Bytes::new()
            .object_header()
            .i32(super2)
            .i32(0)
            .i32(0)
            .i32(children)
            .i32(0)
            .i32(0)
            .i32(0)
            .i32(0)
    };
    b.payload(base, empty_struct(0, 0));
    b.payload(s, empty_struct(base, first));
    // super field 2, next, array dim, flags, flags2, category, array size enum
    let property = |next: i32| {
        Bytes::new()
            .object_header()
            .i32(0)
            .i32(next)
            .i32(1)
            .u32(0)
            .u32(0)
            .name(PackageBuilder::NONE)
            .i32(0)
    };
    b.payload(first, property(second));
    b.payload(second, property(0));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let object = loaded.export(export_index(s)).unwrap();
    let field = object.as_field().unwrap();
    assert_eq!(field.super_field2, Some(export_ref(base)));
    let structure = object.as_struct().unwrap();
    assert_eq!(structure.super_field, field.super_field2);

    let children: Vec<&str> = loaded
        .fields(structure.children)
        .map(|(_, o)| o.name.as_str())
        .collect();
    assert_eq!(children, ["A", "B"]);
    assert!(loaded.diagnostics().is_empty(), "{:?}", loaded.diagnostics());
}

#[test]
fn new_struct_reads_super_directly() {
    let mut b = PackageBuilder::new(800);
    let struct_class = b.import("Struct");
    let base = b.declare("BaseStruct", struct_class);
    let s = b.declare("MyStruct", struct_class);
    b.payload(base, struct_body(0, 0, 0, &[]));
    b.payload(s, struct_body(0, base, 0, &[1, 2, 3]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let object = loaded.export(export_index(s)).unwrap();
    assert_eq!(object.as_field().unwrap().super_field2, None);
    let structure = object.as_struct().unwrap();
    assert_eq!(structure.super_field, Some(export_ref(base)));
    assert_eq!(structure.script, [1, 2, 3]);
}

#[test]
fn oversized_script_is_dropped_and_loading_continues() {
    init_tracing();
    let mut b = PackageBuilder::new(900);
    let struct_class = b.import("Struct");
    let const_class = b.import("Const");
    let s = b.declare("Broken", struct_class);
    let k = b.declare("Answer", const_class);

    let payload = struct_body(0, 0, 0, &[]);
    let size_at = payload.len() - 4;
    let mut bytes = payload.raw(&[0x5A; 100]).0;
    bytes[size_at..size_at + 4].copy_from_slice(&500i32.to_le_bytes());
    b.payload(s, Bytes(bytes));
    b.payload(k, Bytes::new().object_header().i32(0).string("42"));
    let package = b.build();

    let registry = registry();
    let options = LoadOptions::default().with_report_unread_bytes(false);
    let loaded = load_package(&package, &registry, options).unwrap();
    let structure = loaded.export(export_index(s)).unwrap().as_struct().unwrap();
    assert!(structure.script.is_empty());
    assert_eq!(loaded.diagnostics().count(DiagnosticKind::MalformedLength), 1);

    match &loaded.export(export_index(k)).unwrap().as_field().unwrap().kind {
        FieldKind::Const(c) => assert_eq!(c.value, "42"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unread_bytes_are_reported() {
    let mut b = PackageBuilder::new(800);
    let const_class = b.import("Const");
    let k = b.declare("Answer", const_class);
    b.payload(k, Bytes::new().object_header().i32(0).string("42").raw(&[0; 3]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let unread: Vec<_> = loaded.diagnostics().of_kind(DiagnosticKind::UnreadBytes).collect();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].object, "Answer");
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn array_without_inner_is_unknown() {
    let mut b = PackageBuilder::new(800);
    let struct_class = b.import("Struct");
    let array_property = b.import("ArrayProperty");
    let s = b.declare("Holder", struct_class);
    let items = b.declare("Items", array_property);
    b.payload(s, struct_body(0, 0, items, &[]));
    b.payload(items, property_payload(0, &[0]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let property = loaded.export(export_index(items)).unwrap().as_property().unwrap();
    let ty = property.property_type(&loaded);
    assert!(matches!(&ty, PropertyType::Array(inner) if inner.is_unknown()));
    assert_eq!(ty.to_string(), "array<unknown>");
    assert_eq!(loaded.diagnostics().count(DiagnosticKind::MissingReference), 1);

    let layout = loaded.find_layout("Holder").unwrap();
    assert!(layout.find_property("Items").is_some());
}

#[test]
fn array_of_itself_loads_with_a_missing_reference() {
    let mut b = PackageBuilder::new(800);
    let struct_class = b.import("Struct");
    let array_property = b.import("ArrayProperty");
    let s = b.declare("Holder", struct_class);
    let items = b.declare("Items", array_property);
    b.payload(s, struct_body(0, 0, items, &[]));
    b.payload(items, property_payload(0, &[items]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let property = loaded.export(export_index(items)).unwrap().as_property().unwrap();
    assert!(property.property_type(&loaded).to_string().contains("unknown"));
    assert_eq!(property.element_size(&loaded), 8);
    assert!(loaded.diagnostics().count(DiagnosticKind::MissingReference) >= 1);

    let layout = loaded.find_layout("Holder").unwrap();
    let described = layout.find_property("Items").unwrap();
    assert!(described.inner.is_none());
}

#[test]
fn map_of_itself_has_no_element_size() {
    let mut b = PackageBuilder::new(800);
    let map_property = b.import("MapProperty");
    let lookup = b.declare("Lookup", map_property);
    b.payload(lookup, property_payload(0, &[lookup, lookup]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let property = loaded.export(export_index(lookup)).unwrap().as_property().unwrap();
    assert_eq!(property.element_size(&loaded), 0);
}

#[test]
fn map_element_size_sums_both_sides() {
    let mut b = PackageBuilder::new(800);
    let map_property = b.import("MapProperty");
    let int_property = b.import("IntProperty");
    let float_property = b.import("FloatProperty");
    let full = b.declare("Full", map_property);
    let half = b.declare("Half", map_property);
    let key = b.declare("Key", int_property);
    let value = b.declare("Value", float_property);
    b.payload(full, property_payload(0, &[key, value]));
    b.payload(half, property_payload(0, &[key, 0]));
    b.payload(key, property_payload(0, &[]));
    b.payload(value, property_payload(0, &[]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let size = |r: i32| {
        loaded
            .export(export_index(r))
            .unwrap()
            .as_property()
            .unwrap()
            .element_size(&loaded)
    };
    assert_eq!(size(full), 8);
    assert_eq!(size(half), 4);
}

// =============================================================================
// Classes and defaults
// =============================================================================

#[test]
fn class_without_default_object_has_no_defaults() {
    let mut b = PackageBuilder::new(800);
    let class = b.declare("Lonely", 0);
    b.payload(class, class_payload(0, 0, 0));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    let object = loaded.export(export_index(class)).unwrap();
    assert_eq!(object.as_class().unwrap().class_default_object, None);
    assert_eq!(loaded.defaults_of(export_index(class)), None);
    assert_eq!(loaded.classes().count(), 1);
}

/// A class with one integer property and a default object setting it.
fn class_with_defaults(value: i32) -> (ureflect::InMemoryPackage, i32, i32) {
    let mut b = PackageBuilder::new(800);
    let int_property = b.import("IntProperty");
    let int_property_name = b.name("IntProperty");
    let class = b.declare("Pawn", 0);
    let health = b.declare("Health", int_property);
    let cdo = b.declare("Default__Pawn", class);
    let health_name = b.name("Health");

    b.payload(class, class_payload(0, health, cdo));
    b.payload(health, property_payload(0, &[]));
    let defaults = int_tag(Bytes::new().i32(0), health_name, int_property_name, value)
        .name(PackageBuilder::NONE);
    b.payload(cdo, defaults);
    (b.build(), class, cdo)
}

#[test]
fn default_object_is_materialized_into_class_layout() {
    init_tracing();
    let (package, class, cdo) = class_with_defaults(42);
    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();

    let layout = loaded.find_layout("Pawn").unwrap();
    let health = layout.find_property("Health").unwrap();
    assert_eq!(health.offset, 0);
    assert_eq!(layout.instance_size(), 4);

    let object = loaded.export(export_index(cdo)).unwrap();
    assert_eq!(object.class_name, "Pawn");
    let instance = object.as_instance().unwrap();
    assert_eq!(instance.defaults().i32_at(health.offset), Some(42));

    let bytes = loaded.defaults_of(export_index(class)).unwrap();
    assert_eq!(bytes, 42i32.to_le_bytes());
    assert!(loaded.diagnostics().is_empty(), "{:?}", loaded.diagnostics());
}

#[test]
fn defaults_are_skipped_when_disabled() {
    let (package, class, cdo) = class_with_defaults(7);
    let registry = registry();
    let options = LoadOptions::default().with_materialize_defaults(false);
    let loaded = load_package(&package, &registry, options).unwrap();
    assert!(loaded.export(export_index(cdo)).is_none());
    assert_eq!(loaded.defaults_of(export_index(class)), None);
    assert!(loaded.find_layout("Pawn").is_some());
}

#[test]
fn script_struct_defaults_decode_tags() {
    let mut b = PackageBuilder::new(800);
    let script_struct = b.import("ScriptStruct");
    let int_property = b.import("IntProperty");
    let int_property_name = b.name("IntProperty");
    let s = b.declare("Settings", script_struct);
    let count = b.declare("Count", int_property);
    let count_name = b.name("Count");

    let body = struct_body(0, 0, count, &[]).u32(0);
    b.payload(s, int_tag(body, count_name, int_property_name, 7).name(PackageBuilder::NONE));
    b.payload(count, property_payload(0, &[]));
    let package = b.build();

    let registry = registry();
    let loaded = load_package(&package, &registry, LoadOptions::default()).unwrap();
    assert_eq!(loaded.defaults_of(export_index(s)).unwrap(), 7i32.to_le_bytes());
    assert!(loaded.script_types().find_struct_type("Settings").is_some());
}

#[test]
fn classes_only_creates_the_rest_on_demand() {
    let mut b = PackageBuilder::new(800);
    let int_property = b.import("IntProperty");
    let const_class = b.import("Const");
    let class = b.declare("Pawn", 0);
    let health = b.declare("Health", int_property);
    let orphan = b.declare("Orphan", const_class);
    b.payload(class, class_payload(0, health, 0));
    b.payload(health, property_payload(0, &[]));
    b.payload(orphan, Bytes::new().object_header().i32(0).string("unused"));
    let package = b.build();

    let registry = registry();
    let options = LoadOptions::default().with_classes_only(true);
    let loaded = load_package(&package, &registry, options).unwrap();
    assert!(loaded.export(export_index(class)).is_some());
    assert!(loaded.export(export_index(health)).is_some());
    assert!(loaded.export(export_index(orphan)).is_none());
}

// =============================================================================
// Fatal conditions
// =============================================================================

#[test]
fn unknown_class_aborts_the_load() {
    let mut b = PackageBuilder::new(800);
    let mystery = b.import("MysteryThing");
    let thing = b.declare("Thing", mystery);
    b.payload(thing, Bytes::new().object_header());
    let package = b.build();

    let registry = registry();
    let err = load_package(&package, &registry, LoadOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err.kind(), LoadErrorKind::UnknownType(name) if name == "MysteryThing"));
    assert!(!err.context().is_empty());
}

#[test]
fn unsupported_family_aborts_the_load() {
    let mut b = PackageBuilder::with_context(VersionContext::new(900, 0, Game::Ue4Base));
    let const_class = b.import("Const");
    let k = b.declare("Answer", const_class);
    b.payload(k, Bytes::new().object_header().i32(0).string("42"));
    let package = b.build();

    let registry = registry();
    let err = load_package(&package, &registry, LoadOptions::default())
        .err()
        .unwrap();
    assert!(err.is_unsupported_version(), "{err}");
}

#[test]
fn reading_into_the_next_export_is_an_error() {
    let mut b = PackageBuilder::new(800);
    let int_property = b.import("IntProperty");
    let const_class = b.import("Const");
    let health = b.declare("Health", int_property);
    let k = b.declare("Answer", const_class);
    // array size enum missing, so it is taken from the constant's net index
    let mut short = property_payload(0, &[]).0;
    short.truncate(short.len() - 4);
    b.payload(health, Bytes(short));
    b.payload(k, Bytes::new().object_header().i32(0).string("42"));
    let package = b.build();

    let registry = registry();
    let err = load_package(&package, &registry, LoadOptions::default())
        .err()
        .unwrap();
    assert!(
        matches!(err.kind(), LoadErrorKind::Archive(ArchiveError::Overrun { .. })),
        "{err}"
    );
}

#[test]
fn most_negative_next_link_is_an_error() {
    let mut b = PackageBuilder::new(800);
    let const_class = b.import("Const");
    let k = b.declare("Answer", const_class);
    b.payload(k, Bytes::new().object_header().i32(i32::MIN).string("42"));
    let package = b.build();

    let registry = registry();
    let err = load_package(&package, &registry, LoadOptions::default())
        .err()
        .unwrap();
    assert!(
        matches!(err.kind(), LoadErrorKind::Archive(ArchiveError::BadObjectIndex(i32::MIN))),
        "{err}"
    );
}

#[test]
fn reference_past_the_export_table_is_an_error() {
    let mut b = PackageBuilder::new(800);
    let const_class = b.import("Const");
    let k = b.declare("Answer", const_class);
    b.payload(k, Bytes::new().object_header().i32(9).string("42"));
    let package = b.build();

    let registry = registry();
    let err = load_package(&package, &registry, LoadOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err.kind(), LoadErrorKind::Archive(_)), "{err}");
}
