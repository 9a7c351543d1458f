//! Default-object materialization.
//!
//! Runs once every structure has a layout. Script structures decode the
//! tagged defaults at their recorded offset; classes read the default-object
//! reference from theirs; deferred instances of script classes are then
//! constructed and read like any other export.

use tracing::debug;

use ureflect_core::{
    Archive, ContextFrame, DefaultsBuffer, ExportIndex, FieldKind, ObjectKind, Result, ResultExt,
    read_tagged_properties,
};

use crate::graph::{ExportState, ObjectGraph};
use crate::reader::{PackageReader, read_export};

/// Resolve deferred defaults of every structure and class in the graph.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn resolve_deferred_defaults(graph: &mut ObjectGraph<'_>) -> Result<()> {
    for i in 0..graph.objects.len() {
        let Some(mut object) = graph.objects[i].take() else {
            continue;
        };
        let result = resolve_one(graph, ExportIndex::new(i as u32), &mut object.kind, &object.name);
        graph.objects[i] = Some(object);
        result?;
    }
    Ok(())
}

fn resolve_one(
    graph: &mut ObjectGraph<'_>,
    index: ExportIndex,
    kind: &mut ObjectKind,
    name: &str,
) -> Result<()> {
    let ObjectKind::Field(field) = kind else {
        return Ok(());
    };
    let Some(stopper) = graph.package.export(index).map(|e| e.serial_end()) else {
        return Ok(());
    };
    match &mut field.kind {
        FieldKind::ScriptStruct(s) => {
            let (Some(offset), Some(layout)) = (s.deferred_defaults, s.base.layout.clone()) else {
                return Ok(());
            };
            let binary = s.is_binary();
            let mut reader = PackageReader::new(graph, offset, stopper, name)?;
            let defaults = if binary {
                let mut raw = vec![0u8; reader.remaining() as usize];
                reader.serialize_raw(&mut raw)?;
                raw.resize(layout.aligned_size(), 0);
                DefaultsBuffer::from_bytes(raw)
            } else {
                let mut buf = DefaultsBuffer::zeroed(&layout);
                read_tagged_properties(&mut reader, &layout, &mut buf)
                    .and_then(|()| reader.check_stopper())
                    .context(|| ContextFrame::new("ScriptStruct defaults", name))?;
                buf
            };
            debug!(object = name, size = defaults.len(), "structure defaults");
            s.defaults = Some(defaults);
        }
        FieldKind::Class(class) => {
            let Some(offset) = class.deferred_defaults else {
                return Ok(());
            };
            let mut reader = PackageReader::new(graph, offset, stopper, name)?;
            class.class_default_object = reader
                .read_object()
                .and_then(|cdo| reader.check_stopper().map(|()| cdo))
                .context(|| ContextFrame::new("Class default object", name))?;
        }
        _ => {}
    }
    Ok(())
}

/// Construct and read every deferred instance of a script class.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn instantiate_script_objects(
    graph: &mut ObjectGraph<'_>,
    report_unread_bytes: bool,
) -> Result<()> {
    for i in 0..graph.states.len() {
        if graph.states[i] != ExportState::Deferred {
            continue;
        }
        let index = ExportIndex::new(i as u32);
        let Some(mut object) = graph.create_script_object(index)? else {
            continue;
        };
        graph.states[i] = ExportState::Loading;
        read_export(graph, index, &mut object, report_unread_bytes)?;
        graph.objects[i] = Some(object);
        graph.states[i] = ExportState::Loaded;
    }
    Ok(())
}
