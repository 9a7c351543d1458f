use bitflags::bitflags;

bitflags! {
    /// Registry category of a class entry.
    ///
    /// Structures and classes share one lookup table; these bits are what
    /// tells them apart.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassCategory: u32 {
        const STRUCT = 0x01;
        const CLASS = 0x02;
        const ACTOR = 0x04 | Self::CLASS.bits();
        const NATIVE = 0x08;
        const SCRIPT = 0x10;

        const NATIVE_STRUCT = Self::NATIVE.bits() | Self::STRUCT.bits();
        const NATIVE_CLASS = Self::NATIVE.bits() | Self::CLASS.bits();
        const NATIVE_ACTOR = Self::NATIVE.bits() | Self::ACTOR.bits();
        const SCRIPT_STRUCT = Self::SCRIPT.bits() | Self::STRUCT.bits();
        const SCRIPT_CLASS = Self::SCRIPT.bits() | Self::CLASS.bits();
        const SCRIPT_ACTOR = Self::SCRIPT.bits() | Self::ACTOR.bits();
    }
}

bitflags! {
    /// Canonical property flags (the low 32-bit word).
    ///
    /// Bits this crate does not name are retained as read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u32 {
        /// Visible in the editor.
        const EDIT = 0x0000_0001;
        const CONST = 0x0000_0002;
        /// Replicated; a replication offset follows in the stream.
        const NET = 0x0000_0020;
        const NATIVE = 0x0000_1000;
        const TRANSIENT = 0x0000_2000;
        const CONFIG = 0x0000_4000;
        const EDIT_CONST = 0x0002_0000;
        const NO_EXPORT = 0x0080_0000;
        /// Pre-UE3: a comment string follows in the stream.
        const COMMENT = 0x0200_0000;
        const EDIT_INLINE = 0x0400_0000;

        const _ = !0;
    }
}

impl PropertyFlags {
    /// Bit used by the Batman forks to mark replicated properties.
    pub const BATMAN_NET: u32 = 0x0400_0000;

    /// Map the Batman flag space into the canonical one.
    ///
    /// Only the replication bit is meaningful afterwards; everything else
    /// is cleared.
    pub fn from_batman(raw: u32) -> Self {
        if raw & Self::BATMAN_NET != 0 {
            PropertyFlags::NET
        } else {
            PropertyFlags::empty()
        }
    }
}

/// Second property flag word bits that change the stream layout.
pub mod flags2 {
    /// TNA Impact: an extra `u16` follows.
    pub const TNA_EXTRA: u32 = 0x0000_0020;
    /// Area 51: a comment string follows.
    pub const A51_COMMENT: u32 = 0x8000_0000;
}

bitflags! {
    /// Script structure flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StructFlags: u32 {
        const NATIVE = 0x0000_0001;
        const EXPORT = 0x0000_0002;
        const HAS_COMPONENTS = 0x0000_0004;
        const TRANSIENT = 0x0000_0008;
        const ATOMIC = 0x0000_0010;
        const IMMUTABLE = 0x0000_0020;
        const STRICT_CONFIG = 0x0000_0040;
        const IMMUTABLE_WHEN_COOKED = 0x0000_0080;
        const ATOMIC_WHEN_COOKED = 0x0000_0100;

        const _ = !0;
    }
}

bitflags! {
    /// Class flags as stored in the package.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        const ABSTRACT = 0x0000_0001;
        const COMPILED = 0x0000_0002;
        const CONFIG = 0x0000_0004;
        const TRANSIENT = 0x0000_0008;
        const PARSED = 0x0000_0010;
        const LOCALIZED = 0x0000_0020;
        const SAFE_REPLACE = 0x0000_0040;
        const NATIVE = 0x0000_0080;
        const NO_EXPORT = 0x0000_0100;
        const PLACEABLE = 0x0000_0200;
        const PER_OBJECT_CONFIG = 0x0000_0400;
        const NATIVE_REPLICATION = 0x0000_0800;
        const EDIT_INLINE_NEW = 0x0000_1000;
        const COLLAPSE_CATEGORIES = 0x0000_2000;
        const INTERFACE = 0x0000_4000;

        const _ = !0;
    }
}
