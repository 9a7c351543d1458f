//! Archive over one export's byte range inside a load session.

use ureflect_core::{
    Archive, ArchiveError, ByteCursor, ContextFrame, DiagnosticKind, ExportIndex, ObjectRef,
    Result, ResultExt, UObject, VersionContext, lookup_name,
};

use crate::graph::ObjectGraph;

/// Reads one object. References to exports construct their placeholders on
/// the way, which is how reentrant construction reaches the session.
pub(crate) struct PackageReader<'g, 'a> {
    cursor: ByteCursor<'a>,
    version: VersionContext,
    graph: &'g mut ObjectGraph<'a>,
    object: String,
}

impl<'g, 'a> PackageReader<'g, 'a> {
    /// Reader positioned at `start`, bounded by `stopper`.
    pub fn new(
        graph: &'g mut ObjectGraph<'a>,
        start: u64,
        stopper: u64,
        object: impl Into<String>,
    ) -> Result<Self> {
        let package = graph.package;
        let cursor = ByteCursor::with_range(package.data(), start, stopper)?;
        Ok(Self {
            cursor,
            version: package.version(),
            graph,
            object: object.into(),
        })
    }
}

impl Archive for PackageReader<'_, '_> {
    fn version(&self) -> VersionContext {
        self.version
    }

    fn tell(&self) -> u64 {
        self.cursor.pos()
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        Ok(self.cursor.seek(pos)?)
    }

    fn stopper(&self) -> u64 {
        self.cursor.stopper()
    }

    fn serialize_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        Ok(self.cursor.read_exact(buf)?)
    }

    fn read_name(&mut self) -> Result<String> {
        let (index, number) = self.read_name_index()?;
        lookup_name(self.graph.package.names(), index, number)
    }

    fn read_object(&mut self) -> Result<Option<ObjectRef>> {
        let raw = self.read_package_index()?;
        let package = self.graph.package;
        match raw.resolve() {
            Some(ObjectRef::Export(index)) => {
                if package.export(index).is_none() {
                    return Err(ArchiveError::BadObjectIndex(raw.raw()).into());
                }
                self.graph.create_export(index)?;
            }
            Some(ObjectRef::Import(index)) => {
                if package.imports().get(index.as_usize()).is_none() {
                    return Err(ArchiveError::BadObjectIndex(raw.raw()).into());
                }
            }
            None => {}
        }
        Ok(raw.resolve())
    }

    fn report(&mut self, kind: DiagnosticKind, message: String) {
        self.graph.report(kind, &self.object, message);
    }

    fn resolve_enum_value(&self, enum_name: &str, value: &str) -> Option<u8> {
        self.graph.enum_value(enum_name, value)
    }
}

/// Read one object from its export range.
pub(crate) fn read_export(
    graph: &mut ObjectGraph<'_>,
    index: ExportIndex,
    object: &mut UObject,
    report_unread_bytes: bool,
) -> Result<()> {
    let package = graph.package;
    let Some(export) = package.export(index) else {
        return Ok(());
    };
    let detail = format!("{} ({})", object.name, object.class_name);
    let frame = || ContextFrame::new("read_export", detail.clone());

    let mut reader =
        PackageReader::new(graph, export.serial_offset, export.serial_end(), object.name.as_str())
            .context(frame)?;
    let result = object
        .deserialize(&mut reader)
        .and_then(|()| reader.check_stopper());
    let remaining = reader.remaining();
    result.context(frame)?;

    if report_unread_bytes && remaining > 0 {
        graph.report(
            DiagnosticKind::UnreadBytes,
            &object.name,
            format!("{remaining} bytes left before the stopper"),
        );
    }
    Ok(())
}
