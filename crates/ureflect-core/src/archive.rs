//! Byte cursors and the archive interface every field routine reads through.
//!
//! [`ByteCursor`] is the low-level little-endian reader with an absolute
//! position and a stopper. [`Archive`] layers the package-aware reads on top:
//! table-indexed names, object references and version-dependent encodings
//! (compact indices before UE3, plain 32-bit integers after).

use tracing::warn;

use crate::{
    ArchiveError, DiagnosticKind, ObjectRef, PackageIndex, Result, VersionContext,
};

/// Maximum number of continuation bytes in a compact index.
const COMPACT_INDEX_MAX_BYTES: usize = 5;

/// A forward/backward cursor over a byte slice.
///
/// Positions are absolute offsets into the slice. The stopper bounds the
/// current object; reads are only limited by the end of the slice, so an
/// overrun is caught afterwards by [`Archive::check_stopper`].
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: u64,
    stopper: u64,
}

impl<'a> ByteCursor<'a> {
    /// Cursor at the start of `data`, stopper at its end.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            stopper: data.len() as u64,
        }
    }

    /// Cursor positioned at `start`, bounded by `stopper`.
    pub fn with_range(data: &'a [u8], start: u64, stopper: u64) -> Result<Self, ArchiveError> {
        let len = data.len() as u64;
        if start > len || stopper > len || start > stopper {
            return Err(ArchiveError::SeekOutOfRange {
                pos: start.max(stopper),
                len,
            });
        }
        Ok(Self {
            data,
            pos: start,
            stopper,
        })
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub fn stopper(&self) -> u64 {
        self.stopper
    }

    pub fn set_stopper(&mut self, stopper: u64) {
        self.stopper = stopper;
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), ArchiveError> {
        let len = self.data.len() as u64;
        if pos > len {
            return Err(ArchiveError::SeekOutOfRange { pos, len });
        }
        self.pos = pos;
        Ok(())
    }

    /// Fill `buf` from the current position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ArchiveError> {
        let len = self.data.len() as u64;
        let end = self.pos + buf.len() as u64;
        if end > len {
            return Err(ArchiveError::UnexpectedEof {
                pos: self.pos,
                wanted: buf.len(),
                len,
            });
        }
        let start = self.pos as usize;
        buf.copy_from_slice(&self.data[start..end as usize]);
        self.pos = end;
        Ok(())
    }
}

/// Sequential typed reads, positioning and version facts for one object.
///
/// Implementors supply the primitives; the typed helpers are provided.
/// Every routine takes `&mut dyn Archive` so that one routine body serves
/// standalone slices and full load sessions alike.
pub trait Archive {
    /// Version context of the package being read.
    fn version(&self) -> VersionContext;

    /// Absolute byte position.
    fn tell(&self) -> u64;

    /// Absolute seek.
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// End offset of the current object.
    fn stopper(&self) -> u64;

    /// Copy raw bytes.
    fn serialize_raw(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read a table-indexed name.
    fn read_name(&mut self) -> Result<String>;

    /// Read an object reference. Implementations backed by a load session
    /// also make sure the referenced export has a placeholder.
    fn read_object(&mut self) -> Result<Option<ObjectRef>>;

    /// Record a recoverable finding about the object being read.
    fn report(&mut self, kind: DiagnosticKind, message: String) {
        warn!(kind = %kind, "{message}");
    }

    /// Ordinal of `value` within the enumeration named `enum_name`, when the
    /// archive can see loaded enumerations.
    fn resolve_enum_value(&self, _enum_name: &str, _value: &str) -> Option<u8> {
        None
    }

    // === Provided ===

    /// Bytes left before the stopper.
    fn remaining(&self) -> u64 {
        self.stopper().saturating_sub(self.tell())
    }

    /// Fail when reading went past the stopper into the next object.
    fn check_stopper(&self) -> Result<()> {
        let (pos, stopper) = (self.tell(), self.stopper());
        if pos > stopper {
            return Err(ArchiveError::Overrun { pos, stopper }.into());
        }
        Ok(())
    }

    /// Skip everything up to the stopper.
    fn drop_remaining_data(&mut self) -> Result<()> {
        let stopper = self.stopper();
        self.seek(stopper)
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        let pos = self.tell() + count;
        self.seek(pos)
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.serialize_raw(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.serialize_raw(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.serialize_raw(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.serialize_raw(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.serialize_raw(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.serialize_raw(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.serialize_raw(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.serialize_raw(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Variable-length signed integer used by the pre-UE3 families.
    ///
    /// First byte: sign bit 0x80, continuation bit 0x40, six value bits.
    /// Following bytes: continuation bit 0x80, seven value bits.
    fn read_compact_index(&mut self) -> Result<i32> {
        let pos = self.tell();
        let first = self.read_u8()?;
        let negative = first & 0x80 != 0;
        let mut value = (first & 0x3F) as i32;
        if first & 0x40 != 0 {
            let mut shift = 6;
            for _ in 1..COMPACT_INDEX_MAX_BYTES {
                let byte = self.read_u8()?;
                value |= ((byte & 0x7F) as i32) << shift;
                shift += 7;
                if byte & 0x80 == 0 {
                    break;
                }
            }
        }
        if !negative {
            return Ok(value);
        }
        value.checked_neg().ok_or_else(|| {
            ArchiveError::BadCount {
                count: i64::from(value),
                pos,
            }
            .into()
        })
    }

    /// 32-bit integer, or a compact index for the pre-UE3 families.
    fn read_index(&mut self) -> Result<i32> {
        if self.version().uses_compact_indices() {
            self.read_compact_index()
        } else {
            self.read_i32()
        }
    }

    /// Raw object reference as stored on disk.
    fn read_package_index(&mut self) -> Result<PackageIndex> {
        Ok(PackageIndex::from_raw(self.read_index()?))
    }

    /// Name table reference: `(index, number)`. The instance number is only
    /// stored by the UE3 family from version 343.
    fn read_name_index(&mut self) -> Result<(i32, i32)> {
        let ctx = self.version();
        if ctx.uses_compact_indices() {
            return Ok((self.read_compact_index()?, 0));
        }
        let index = self.read_i32()?;
        let number = if ctx.version >= 343 { self.read_i32()? } else { 0 };
        Ok((index, number))
    }

    /// Element count of a serialized array.
    fn read_count(&mut self) -> Result<usize> {
        let pos = self.tell();
        let count = self.read_index()?;
        if count < 0 || count as u64 > self.remaining() {
            return Err(ArchiveError::BadCount {
                count: count as i64,
                pos,
            }
            .into());
        }
        Ok(count as usize)
    }

    /// Length-prefixed string. A negative length means UTF-16 code units;
    /// the stored terminator is stripped.
    fn read_string(&mut self) -> Result<String> {
        let pos = self.tell();
        let len = self.read_index()?;
        if len == 0 {
            return Ok(String::new());
        }
        let units = len.unsigned_abs() as u64;
        let byte_len = if len < 0 { units * 2 } else { units };
        if byte_len > self.remaining() {
            return Err(ArchiveError::InvalidString { pos }.into());
        }
        let mut raw = vec![0u8; byte_len as usize];
        self.serialize_raw(&mut raw)?;
        let text = if len < 0 {
            let wide: Vec<u16> = raw
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&wide).map_err(|_| ArchiveError::InvalidString { pos })?
        } else {
            raw.iter().map(|&b| b as char).collect()
        };
        Ok(text.trim_end_matches('\0').to_string())
    }
}

/// Read a count-prefixed array, each element with `read`.
pub fn read_array<T>(
    ar: &mut dyn Archive,
    mut read: impl FnMut(&mut dyn Archive) -> Result<T>,
) -> Result<Vec<T>> {
    let count = ar.read_count()?;
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        items.push(read(ar)?);
    }
    Ok(items)
}

/// Read a count-prefixed map as ordered pairs.
pub fn read_map<K, V>(
    ar: &mut dyn Archive,
    mut read_key: impl FnMut(&mut dyn Archive) -> Result<K>,
    mut read_value: impl FnMut(&mut dyn Archive) -> Result<V>,
) -> Result<Vec<(K, V)>> {
    read_array(ar, |ar| {
        let key = read_key(ar)?;
        let value = read_value(ar)?;
        Ok((key, value))
    })
}

/// Render a name table entry with its instance number.
pub fn format_name(base: &str, number: i32) -> String {
    if number > 0 {
        format!("{}_{}", base, number - 1)
    } else {
        base.to_string()
    }
}

/// Archive over a package byte slice with a name table and no load session.
///
/// References are decoded but never constructed; this is what deferred
/// reads and standalone decoding use.
pub struct SliceArchive<'a> {
    cursor: ByteCursor<'a>,
    version: VersionContext,
    names: &'a [String],
}

impl<'a> SliceArchive<'a> {
    pub fn new(cursor: ByteCursor<'a>, version: VersionContext, names: &'a [String]) -> Self {
        Self {
            cursor,
            version,
            names,
        }
    }

    pub fn cursor(&self) -> &ByteCursor<'a> {
        &self.cursor
    }
}

impl Archive for SliceArchive<'_> {
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
        lookup_name(self.names, index, number)
    }

    fn read_object(&mut self) -> Result<Option<ObjectRef>> {
        Ok(self.read_package_index()?.resolve())
    }
}

/// Resolve a name table reference.
pub fn lookup_name(names: &[String], index: i32, number: i32) -> Result<String> {
    usize::try_from(index)
        .ok()
        .and_then(|i| names.get(i))
        .map(|base| format_name(base, number))
        .ok_or_else(|| ArchiveError::BadNameIndex(index).into())
}
