//! Tagged property list headers.
//!
//! Every object starts with a list of `(tag, value)` pairs terminated by the
//! name `None`. UE3 writes the type as a name with explicit 32-bit size and
//! index; older families pack type, size class and an array flag into one
//! info byte.

use crate::{
    Archive, ArchiveError, DiagnosticKind, Result,
    rules::{TAG_FORMAT, TagFormat, pick},
};

/// Terminator of a tagged property list.
pub const NONE_NAME: &str = "None";

/// Packed type codes, indexed by the low nibble of the info byte.
const PACKED_TYPES: [&str; 16] = [
    "",
    "ByteProperty",
    "IntProperty",
    "BoolProperty",
    "FloatProperty",
    "ObjectProperty",
    "NameProperty",
    "StringProperty",
    "ClassProperty",
    "ArrayProperty",
    "StructProperty",
    "VectorProperty",
    "RotatorProperty",
    "StrProperty",
    "MapProperty",
    "FixedArrayProperty",
];

const PACKED_STRUCT: u8 = 10;
const PACKED_BOOL: u8 = 3;
const PACKED_ARRAY_FLAG: u8 = 0x80;

/// Header of one tagged property value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTag {
    pub name: String,
    pub type_name: String,
    /// Size of the value that follows, in bytes.
    pub size: u32,
    pub array_index: u32,
    pub struct_name: Option<String>,
    pub enum_name: Option<String>,
    /// Bool values live in the tag itself.
    pub bool_value: bool,
}

impl PropertyTag {
    /// Read the next tag; `None` at the list terminator.
    pub fn read(ar: &mut dyn Archive) -> Result<Option<Self>> {
        let ctx = ar.version();
        let format = pick("PropertyTag", TAG_FORMAT, &ctx)?;
        let name = ar.read_name()?;
        if name == NONE_NAME {
            return Ok(None);
        }
        let tag = match format {
            TagFormat::Explicit => Self::read_explicit(ar, name)?,
            TagFormat::Packed => Self::read_packed(ar, name)?,
        };
        Ok(Some(tag))
    }

    fn read_explicit(ar: &mut dyn Archive, name: String) -> Result<Self> {
        let version = ar.version().version;
        let type_name = ar.read_name()?;
        let size = read_size(ar)?;
        let array_index = ar.read_i32()? as u32;
        let mut tag = Self {
            name,
            type_name,
            size,
            array_index,
            ..Self::default()
        };
        match tag.type_name.as_str() {
            "StructProperty" => tag.struct_name = Some(ar.read_name()?),
            "BoolProperty" => {
                tag.bool_value = if version >= 673 {
                    ar.read_u8()? != 0
                } else {
                    ar.read_i32()? != 0
                };
            }
            "ByteProperty" if version >= 633 => tag.enum_name = Some(ar.read_name()?),
            _ => {}
        }
        Ok(tag)
    }

    fn read_packed(ar: &mut dyn Archive, name: String) -> Result<Self> {
        let info = ar.read_u8()?;
        let type_code = info & 0x0F;
        let is_array = info & PACKED_ARRAY_FLAG != 0;
        let mut tag = Self {
            name,
            type_name: PACKED_TYPES[type_code as usize].to_string(),
            ..Self::default()
        };
        if type_code == PACKED_STRUCT {
            tag.struct_name = Some(ar.read_name()?);
        }
        tag.size = match (info >> 4) & 0x07 {
            0 => 1,
            1 => 2,
            2 => 4,
            3 => 12,
            4 => 16,
            5 => ar.read_u8()? as u32,
            6 => ar.read_u16()? as u32,
            _ => read_size(ar)?,
        };
        if type_code == PACKED_BOOL {
            tag.bool_value = is_array;
        } else if is_array {
            tag.array_index = read_packed_index(ar)?;
        }
        Ok(tag)
    }

    pub fn is_bool(&self) -> bool {
        self.type_name == "BoolProperty"
    }
}

fn read_size(ar: &mut dyn Archive) -> Result<u32> {
    let pos = ar.tell();
    let size = ar.read_i32()?;
    u32::try_from(size).map_err(|_| {
        ArchiveError::BadCount {
            count: size as i64,
            pos,
        }
        .into()
    })
}

/// One, two or four bytes, selected by the high bits of the first.
fn read_packed_index(ar: &mut dyn Archive) -> Result<u32> {
    let b = ar.read_u8()? as u32;
    if b & 0x80 == 0 {
        return Ok(b);
    }
    if b & 0xC0 == 0x80 {
        let lo = ar.read_u8()? as u32;
        return Ok(((b & 0x7F) << 8) | lo);
    }
    let mut rest = [0u8; 3];
    ar.serialize_raw(&mut rest)?;
    Ok(((b & 0x3F) << 24) | ((rest[0] as u32) << 16) | ((rest[1] as u32) << 8) | rest[2] as u32)
}

/// Skip a tagged property list, reporting every entry as unknown.
///
/// Returns the number of entries skipped.
pub fn skip_tagged_properties(ar: &mut dyn Archive) -> Result<usize> {
    let mut skipped = 0;
    while let Some(tag) = PropertyTag::read(ar)? {
        if tag.size as u64 > ar.remaining() {
            return Err(ArchiveError::BadCount {
                count: tag.size as i64,
                pos: ar.tell(),
            }
            .into());
        }
        ar.report(
            DiagnosticKind::UnknownProperty,
            format!("{} ({}) skipped", tag.name, tag.type_name),
        );
        ar.skip(tag.size as u64)?;
        skipped += 1;
    }
    Ok(skipped)
}
