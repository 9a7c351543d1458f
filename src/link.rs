//! Layout linking: type descriptors synthesized from declared properties.
//!
//! Every loaded structure gets a descriptor whose parent is its super
//! structure's layout and whose properties are its declared property
//! children in declaration order, each at its natural alignment. Classes
//! and script structures are then registered in the session's script
//! registry so that their instances can be constructed.

use tracing::debug;

use ureflect_core::{
    ClassCategory, Constructor, DiagnosticKind, ExportIndex, FieldKind, ObjectLookup, ObjectRef,
    Property, PropertyCount, PropertyDescriptor, PropertyKind, TypeDescriptor, TypeRef, UObject,
    ValueKind,
};
use ureflect_registry::ClassEntry;

use crate::graph::ObjectGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Link every structure of the graph, dependencies first.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn link_layouts(graph: &mut ObjectGraph<'_>) {
    let mut marks = vec![Mark::Unvisited; graph.objects.len()];
    for i in 0..graph.objects.len() {
        link_one(graph, i, &mut marks);
    }
}

fn link_one(graph: &mut ObjectGraph<'_>, i: usize, marks: &mut [Mark]) {
    if marks[i] != Mark::Unvisited {
        return;
    }
    marks[i] = Mark::InProgress;

    for dependency in dependencies(graph, i) {
        link_one(graph, dependency, marks);
    }
    if let Some((layout, category, missing)) = build_layout(graph, i) {
        let name = layout.name().to_string();
        for message in missing {
            graph.report(DiagnosticKind::MissingReference, &name, message);
        }
        debug!(
            object = %name,
            size = layout.instance_size(),
            properties = layout.properties().len(),
            "linked layout"
        );
        if let Some(category) = category {
            graph
                .script_types
                .register_class(ClassEntry::synthesized(name, category, layout.clone()));
        }
        if let Some(s) = graph.objects[i].as_mut().and_then(UObject::as_struct_mut) {
            s.layout = Some(layout);
        }
    }
    marks[i] = Mark::Done;
}

/// Exports whose layouts this structure's layout is built from.
fn dependencies(graph: &ObjectGraph<'_>, i: usize) -> Vec<usize> {
    let Some(s) = graph.objects[i].as_ref().and_then(UObject::as_struct) else {
        return Vec::new();
    };
    let export = |r: Option<ObjectRef>| r.and_then(ObjectRef::as_export).map(ExportIndex::as_usize);
    let mut deps: Vec<usize> = export(s.super_field).into_iter().collect();
    for (_, child) in graph.fields(s.children) {
        let Some(property) = child.as_property() else {
            continue;
        };
        deps.extend(export(struct_of(graph, property)));
    }
    deps
}

/// Structure referenced by a struct property or an array of structs.
fn struct_of<'a>(graph: &'a ObjectGraph<'_>, mut property: &'a Property) -> Option<ObjectRef> {
    let mut seen = Vec::new();
    loop {
        match &property.kind {
            PropertyKind::Struct { struct_ref } => return *struct_ref,
            PropertyKind::Array { inner } => {
                let inner = (*inner)?;
                if seen.contains(&inner) {
                    return None;
                }
                seen.push(inner);
                property = graph.object(inner)?.as_property()?;
            }
            _ => return None,
        }
    }
}

type Linked = (TypeRef, Option<ClassCategory>, Vec<String>);

fn build_layout(graph: &ObjectGraph<'_>, i: usize) -> Option<Linked> {
    let object = graph.objects[i].as_ref()?;
    let field = object.as_field()?;
    let s = field.kind.as_struct()?;
    let (category, is_class, binary) = match &field.kind {
        FieldKind::Class(_) => (Some(ClassCategory::SCRIPT_CLASS), true, false),
        FieldKind::ScriptStruct(ss) => (Some(ClassCategory::SCRIPT_STRUCT), false, ss.is_binary()),
        FieldKind::Struct(_) => (Some(ClassCategory::SCRIPT_STRUCT), false, false),
        _ => (None, false, false),
    };

    let parent = s.super_field.and_then(|r| graph.layout_of(r));
    let mut offset = parent.as_ref().map_or(0, |p| p.instance_size());
    let mut alignment = parent.as_ref().map_or(1, |p| p.alignment());
    let mut properties = Vec::new();
    let mut missing = Vec::new();

    for (r, child) in graph.fields(s.children) {
        let Some(property) = child.as_property() else {
            continue;
        };
        let mut desc = describe(graph, &child.name, property, &mut vec![r], &mut missing);
        let align = property.alignment(graph).max(1);
        offset = offset.next_multiple_of(align);
        desc.offset = offset;
        offset += desc.inline_size();
        alignment = alignment.max(align);
        properties.push(desc);
    }

    let descriptor = if is_class {
        TypeDescriptor::class(&object.name)
    } else {
        TypeDescriptor::structure(&object.name)
    };
    let layout = descriptor
        .with_parent(parent)
        .with_properties(properties)
        .with_size(offset, alignment)
        .with_constructor(Constructor::Instance)
        .with_binary_layout(binary)
        .into_ref();
    Some((layout, category, missing))
}

/// Descriptor of one declared property, offset left at zero.
///
/// `path` holds the properties being described, outermost first.
fn describe(
    graph: &ObjectGraph<'_>,
    name: &str,
    property: &Property,
    path: &mut Vec<ObjectRef>,
    missing: &mut Vec<String>,
) -> PropertyDescriptor {
    let count = match property.kind {
        PropertyKind::Array { .. } => PropertyCount::Dynamic,
        _ => PropertyCount::Fixed(property.array_dim.max(1) as u32),
    };
    let ty = property.property_type(graph);
    let mut desc = PropertyDescriptor::new(
        name,
        ty.to_string(),
        property.kind.value_kind(),
        0,
        property.element_size(graph),
    )
    .with_count(count);

    match &property.kind {
        PropertyKind::Struct { struct_ref } => {
            match struct_ref.and_then(|r| graph.layout_of(r)) {
                Some(layout) => desc = desc.with_layout(layout),
                None => missing.push(format!("{name}: structure type unresolved")),
            }
        }
        PropertyKind::Array { inner: Some(r) } if path.contains(r) => {
            missing.push(format!("{name}: array element refers back to itself"));
        }
        PropertyKind::Array { inner } => {
            let inner = inner.and_then(|r| {
                let o = graph.object(r)?;
                Some((r, o.name.as_str(), o.as_property()?))
            });
            match inner {
                Some((r, inner_name, inner)) => {
                    path.push(r);
                    desc = desc.with_inner(describe(graph, inner_name, inner, path, missing));
                    path.pop();
                }
                None => missing.push(format!("{name}: array element unresolved")),
            }
        }
        _ => {}
    }
    if desc.value == ValueKind::Opaque {
        debug!(property = name, "native storage left opaque");
    }
    desc
}
