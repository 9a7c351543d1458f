//! Default-value buffers and the tagged property decoder that fills them.
//!
//! A buffer is laid out by a [`TypeDescriptor`]: every property owns
//! `element_size * count` bytes at its offset. Values that have no fixed
//! inline form (names, strings, dynamic arrays) are kept in side pools and
//! referenced from the inline bytes by a 1-based pool index, so a zeroed
//! slot always means "unset".
//!
//! Inline encodings (little endian):
//!
//! | value | bytes |
//! |---|---|
//! | byte, bool | 1 |
//! | int, float | 4 |
//! | object, class, component | raw package index, 4 |
//! | interface | package index, 4 padding |
//! | name, string | pool index + 1, 4 zero |
//! | array | array pool index + 1, element count |
//! | delegate | package index, name pool index + 1, 4 padding |
//! | struct | the struct's own layout |

use tracing::debug;

use crate::{
    Archive, ArchiveError, DiagnosticKind, ObjectRef, PackageIndex, PropertyCount,
    PropertyDescriptor, Result, TypeDescriptor, TypeRef, ValueKind,
    object::PropertyTag,
    rules::{VALUE_DECODING, pick},
};

/// Elements of one dynamic array value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayValue {
    pub element_size: usize,
    pub count: usize,
    /// `count * element_size` bytes in the inline encoding of the element.
    pub data: Vec<u8>,
}

impl ArrayValue {
    pub fn element(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.element_size)?;
        self.data.get(start..start + self.element_size)
    }
}

/// Out-of-line storage shared by a buffer and everything nested in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pools {
    pub strings: Vec<String>,
    pub arrays: Vec<ArrayValue>,
}

impl Pools {
    fn push_string(&mut self, s: String) -> u32 {
        self.strings.push(s);
        self.strings.len() as u32
    }

    fn push_array(&mut self, array: ArrayValue) -> u32 {
        self.arrays.push(array);
        self.arrays.len() as u32
    }
}

/// Owned default values of one class or structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultsBuffer {
    bytes: Vec<u8>,
    pools: Pools,
}

impl DefaultsBuffer {
    /// All-zero buffer sized to the layout's aligned instance size.
    pub fn zeroed(layout: &TypeDescriptor) -> Self {
        Self {
            bytes: vec![0; layout.aligned_size()],
            pools: Pools::default(),
        }
    }

    /// Buffer holding raw bytes, for structures stored in binary form.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            pools: Pools::default(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    fn word(&self, offset: usize) -> Option<[u8; 4]> {
        self.bytes.get(offset..offset + 4)?.try_into().ok()
    }

    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    pub fn i32_at(&self, offset: usize) -> Option<i32> {
        self.word(offset).map(i32::from_le_bytes)
    }

    pub fn f32_at(&self, offset: usize) -> Option<f32> {
        self.word(offset).map(f32::from_le_bytes)
    }

    /// Object stored at `offset`; `None` for an unset slot.
    pub fn object_at(&self, offset: usize) -> Option<ObjectRef> {
        PackageIndex::from_raw(self.i32_at(offset)?).resolve()
    }

    /// Name or string stored at `offset`.
    pub fn string_at(&self, offset: usize) -> Option<&str> {
        let slot = u32::from_le_bytes(self.word(offset)?) as usize;
        self.pools.strings.get(slot.checked_sub(1)?).map(String::as_str)
    }

    /// Dynamic array stored at `offset`.
    pub fn array_at(&self, offset: usize) -> Option<&ArrayValue> {
        let slot = u32::from_le_bytes(self.word(offset)?) as usize;
        self.pools.arrays.get(slot.checked_sub(1)?)
    }
}

/// An instance of a script class or structure: its layout and values.
#[derive(Debug, Clone)]
pub struct Instance {
    layout: TypeRef,
    defaults: DefaultsBuffer,
}

impl Instance {
    pub fn new(layout: TypeRef) -> Self {
        let defaults = DefaultsBuffer::zeroed(&layout);
        Self { layout, defaults }
    }

    pub fn layout(&self) -> &TypeRef {
        &self.layout
    }

    pub fn defaults(&self) -> &DefaultsBuffer {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut DefaultsBuffer {
        &mut self.defaults
    }

    /// Property by name, inherited ones included.
    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.layout.ancestors().find_map(|t| t.find_property(name))
    }
}

/// Decode a tagged property list into `buf` according to `layout`.
///
/// Tags that name no stored property are skipped by size and reported.
/// Only the UE3 family is supported.
pub fn read_tagged_properties(
    ar: &mut dyn Archive,
    layout: &TypeDescriptor,
    buf: &mut DefaultsBuffer,
) -> Result<()> {
    let ctx = ar.version();
    pick("defaults", VALUE_DECODING, &ctx)?;
    let DefaultsBuffer { bytes, pools } = buf;
    read_tagged_into(ar, layout, bytes, pools)
}

fn read_tagged_into(
    ar: &mut dyn Archive,
    layout: &TypeDescriptor,
    bytes: &mut [u8],
    pools: &mut Pools,
) -> Result<()> {
    while let Some(tag) = PropertyTag::read(ar)? {
        let start = ar.tell();
        if tag.size as u64 > ar.remaining() {
            return Err(ArchiveError::BadCount {
                count: tag.size as i64,
                pos: start,
            }
            .into());
        }
        let end = start + tag.size as u64;

        let Some(desc) = layout
            .ancestors()
            .find_map(|t| t.find_property(&tag.name))
            .filter(|d| !d.is_dropped())
        else {
            ar.report(
                DiagnosticKind::UnknownProperty,
                format!("{}.{} ({}) skipped", layout.name(), tag.name, tag.type_name),
            );
            ar.seek(end)?;
            continue;
        };

        let index = tag.array_index as usize;
        let in_range = match desc.count {
            PropertyCount::Fixed(n) => index < n as usize,
            PropertyCount::Dynamic => index == 0,
        };
        let offset = desc.offset + index * desc.element_size;
        let slot = if in_range {
            bytes.get_mut(offset..offset + desc.element_size)
        } else {
            None
        };
        let Some(slot) = slot else {
            ar.report(
                DiagnosticKind::MalformedLength,
                format!("{}[{}] is outside of {}", tag.name, index, layout.name()),
            );
            ar.seek(end)?;
            continue;
        };

        if tag.is_bool() {
            write(slot, &[tag.bool_value as u8]);
            continue;
        }

        let decoded = read_value(ar, desc, Some(&tag), slot, pools)?;
        let consumed = ar.tell().saturating_sub(start);
        if decoded && consumed != tag.size as u64 {
            ar.report(
                DiagnosticKind::MalformedLength,
                format!("{} declared {} bytes, read {}", tag.name, tag.size, consumed),
            );
        }
        if ar.tell() != end {
            ar.seek(end)?;
        }
    }
    Ok(())
}

/// Decode one element into `out`. `false` when the value was not decoded
/// and the caller must skip it.
fn read_value(
    ar: &mut dyn Archive,
    desc: &PropertyDescriptor,
    tag: Option<&PropertyTag>,
    out: &mut [u8],
    pools: &mut Pools,
) -> Result<bool> {
    match desc.value {
        ValueKind::Byte => {
            let enum_name = tag.and_then(|t| t.enum_name.as_deref()).filter(|n| *n != "None");
            match (enum_name, tag) {
                (Some(enum_name), Some(tag)) if tag.size != 1 => {
                    let value = ar.read_name()?;
                    let ordinal = ar.resolve_enum_value(enum_name, &value).unwrap_or_else(|| {
                        ar.report(
                            DiagnosticKind::MissingReference,
                            format!("{}: no value {value} in {enum_name}", desc.name),
                        );
                        0
                    });
                    write(out, &[ordinal]);
                }
                _ => write(out, &[ar.read_u8()?]),
            }
        }
        ValueKind::Bool => {
            let value = if ar.version().version >= 673 {
                ar.read_u8()? != 0
            } else {
                ar.read_i32()? != 0
            };
            write(out, &[value as u8]);
        }
        ValueKind::Int => write(out, &ar.read_i32()?.to_le_bytes()),
        ValueKind::Float => write(out, &ar.read_f32()?.to_le_bytes()),
        ValueKind::Object | ValueKind::Interface => {
            let object = ar.read_object()?;
            write(out, &raw_index(object).to_le_bytes());
        }
        ValueKind::Name => {
            let slot = pools.push_string(ar.read_name()?);
            write(out, &slot.to_le_bytes());
        }
        ValueKind::Str => {
            let slot = pools.push_string(ar.read_string()?);
            write(out, &slot.to_le_bytes());
        }
        ValueKind::Delegate => {
            let object = ar.read_object()?;
            let name = pools.push_string(ar.read_name()?);
            write(out, &raw_index(object).to_le_bytes());
            if let Some(rest) = out.get_mut(4..) {
                write(rest, &name.to_le_bytes());
            }
        }
        ValueKind::Array => return read_array_value(ar, desc, out, pools),
        ValueKind::Struct => return read_struct_value(ar, desc, tag, out, pools),
        ValueKind::Map | ValueKind::Pointer | ValueKind::Opaque => {
            ar.report(
                DiagnosticKind::UnknownProperty,
                format!("{}: {:?} values are not decoded", desc.name, desc.value),
            );
            return Ok(false);
        }
    }
    Ok(true)
}

fn read_array_value(
    ar: &mut dyn Archive,
    desc: &PropertyDescriptor,
    out: &mut [u8],
    pools: &mut Pools,
) -> Result<bool> {
    let Some(inner) = desc.inner.as_deref().filter(|inner| inner.element_size > 0) else {
        ar.report(
            DiagnosticKind::MissingReference,
            format!("{}: array element type unknown", desc.name),
        );
        return Ok(false);
    };
    let count = ar.read_count()?;
    let mut data = vec![0u8; count * inner.element_size];
    for element in data.chunks_mut(inner.element_size) {
        if !read_value(ar, inner, None, element, pools)? {
            return Ok(false);
        }
    }
    debug!(property = %desc.name, count, "array value");
    let slot = pools.push_array(ArrayValue {
        element_size: inner.element_size,
        count,
        data,
    });
    write(out, &slot.to_le_bytes());
    if let Some(rest) = out.get_mut(4..) {
        write(rest, &(count as u32).to_le_bytes());
    }
    Ok(true)
}

fn read_struct_value(
    ar: &mut dyn Archive,
    desc: &PropertyDescriptor,
    tag: Option<&PropertyTag>,
    out: &mut [u8],
    pools: &mut Pools,
) -> Result<bool> {
    let Some(layout) = desc.layout.as_ref() else {
        ar.report(
            DiagnosticKind::MissingReference,
            format!("{}: structure layout unknown", desc.name),
        );
        return Ok(false);
    };
    if layout.has_binary_layout() {
        let size = tag.map_or(layout.instance_size(), |t| t.size as usize);
        let mut raw = vec![0u8; size];
        ar.serialize_raw(&mut raw)?;
        write(out, &raw);
        return Ok(true);
    }
    read_tagged_into(ar, layout, out, pools)?;
    Ok(true)
}

fn raw_index(object: Option<ObjectRef>) -> i32 {
    object.map_or(0, |o| PackageIndex::from(o).raw())
}

/// Copy as much of `value` as fits.
fn write(out: &mut [u8], value: &[u8]) {
    let n = out.len().min(value.len());
    out[..n].copy_from_slice(&value[..n]);
}
