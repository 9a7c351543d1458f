//! Version decision tables.
//!
//! Each table lists `(predicate, layout)` rules evaluated top to bottom; the
//! first matching predicate selects the layout. Contexts outside of the
//! engine families these tables describe match no rule at all, and a table
//! may also leave families of its own uncovered; either way the read fails
//! with [`LoadErrorKind::UnsupportedVersion`](crate::LoadErrorKind::UnsupportedVersion).

use crate::{Game, LoadError, Result, VersionContext};

/// One row of a decision table.
#[derive(Clone, Copy)]
pub struct Rule<T: 'static> {
    pub when: fn(&VersionContext) -> bool,
    pub then: T,
}

/// First layout whose predicate accepts `ctx`.
pub fn pick<T: Copy>(variant: &'static str, rules: &[Rule<T>], ctx: &VersionContext) -> Result<T> {
    if !known_family(ctx) {
        return Err(LoadError::unsupported(variant, *ctx));
    }
    rules
        .iter()
        .find(|rule| (rule.when)(ctx))
        .map(|rule| rule.then)
        .ok_or_else(|| LoadError::unsupported(variant, *ctx))
}

/// Families whose layouts are described by these tables.
fn known_family(ctx: &VersionContext) -> bool {
    ctx.game_below(Game::Ue4Base)
}

fn always(_: &VersionContext) -> bool {
    true
}

// ============================================================================
// Field
// ============================================================================

/// Link fields at the start of every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLinks {
    /// Only `next`.
    NextOnly,
    /// Legacy `superField2`, then `next`.
    SuperThenNext,
}

pub static FIELD_LINKS: &[Rule<FieldLinks>] = &[
    Rule {
        when: |c| c.is(Game::Bioshock3),
        then: FieldLinks::NextOnly,
    },
    Rule {
        when: |c| c.version < 756,
        then: FieldLinks::SuperThenNext,
    },
    Rule {
        when: always,
        then: FieldLinks::NextOnly,
    },
];

// ============================================================================
// Struct
// ============================================================================

/// Where a structure's `superField` comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperSource {
    /// Read from the stream.
    Direct,
    /// Copied from the already read `superField2`.
    FromSuperField2,
}

pub static STRUCT_SUPER: &[Rule<SuperSource>] = &[
    Rule {
        when: |c| c.is(Game::Bioshock3),
        then: SuperSource::Direct,
    },
    Rule {
        when: |c| c.version >= 756,
        then: SuperSource::Direct,
    },
    Rule {
        when: always,
        then: SuperSource::FromSuperField2,
    },
];

/// Shape of the structure body after the super link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructBody {
    /// Children only; the rest of the object is dropped.
    ChildrenOnly,
    /// Script text, children, extras, line info and bytecode.
    Full,
}

pub static STRUCT_BODY: &[Rule<StructBody>] = &[
    Rule {
        when: |c| c.is(Game::Mk) && c.version >= 472,
        then: StructBody::ChildrenOnly,
    },
    Rule {
        when: |c| c.is(Game::Batman4),
        then: StructBody::ChildrenOnly,
    },
    Rule {
        when: always,
        then: StructBody::Full,
    },
];

// ============================================================================
// Class
// ============================================================================

/// What follows `configName` in a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassTail {
    /// The default-object reference sits in the last four bytes of the
    /// export; record its offset and drop the rest.
    DeferredDefaults,
    /// Category and interface collections, read and discarded.
    LegacyCategories,
    /// Nothing further.
    Nothing,
}

pub static CLASS_TAIL: &[Rule<ClassTail>] = &[
    Rule {
        when: |c| c.version >= 322,
        then: ClassTail::DeferredDefaults,
    },
    Rule {
        when: |c| c.engine_at_least(Game::Ue3),
        then: ClassTail::LegacyCategories,
    },
    Rule {
        when: always,
        then: ClassTail::Nothing,
    },
];

// ============================================================================
// Property
// ============================================================================

/// Storage width of `arrayDim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayDimWidth {
    I16,
    I32,
}

pub static ARRAY_DIM: &[Rule<ArrayDimWidth>] = &[
    Rule {
        when: |c| c.is(Game::LostPlanet3) && c.licensee_version >= 79,
        then: ArrayDimWidth::I16,
    },
    Rule {
        when: always,
        then: ArrayDimWidth::I32,
    },
];

/// Whether the category block follows the property flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyMeta {
    /// Category, array-size enum and fork extras.
    Read,
    /// Straight to the replication offset.
    Skip,
}

pub static PROPERTY_META: &[Rule<PropertyMeta>] = &[
    Rule {
        when: |c| c.is(Game::Mk) && c.version >= 472,
        then: PropertyMeta::Skip,
    },
    Rule {
        when: always,
        then: PropertyMeta::Read,
    },
];

// ============================================================================
// Tagged properties
// ============================================================================

/// Tagged property list encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFormat {
    /// Name, info byte, optional struct name and packed size/index.
    Packed,
    /// Name, type name, 32-bit size and index, type-specific extras.
    Explicit,
}

pub static TAG_FORMAT: &[Rule<TagFormat>] = &[
    Rule {
        when: |c| c.engine_at_least(Game::Ue3),
        then: TagFormat::Explicit,
    },
    Rule {
        when: always,
        then: TagFormat::Packed,
    },
];

/// Families whose tagged values are decoded into defaults buffers.
pub static VALUE_DECODING: &[Rule<()>] = &[Rule {
    when: |c| c.engine_at_least(Game::Ue3),
    then: (),
}];

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(version: i32, licensee: i32, game: Game) -> VersionContext {
        VersionContext::new(version, licensee, game)
    }

    #[test]
    fn field_links_by_version() {
        let old = ctx(700, 0, Game::Ue3);
        let new = ctx(800, 0, Game::Ue3);
        assert_eq!(pick("Field", FIELD_LINKS, &old).unwrap(), FieldLinks::SuperThenNext);
        assert_eq!(pick("Field", FIELD_LINKS, &new).unwrap(), FieldLinks::NextOnly);
    }

    #[test]
    fn bioshock_always_uses_new_path() {
        let c = ctx(141, 0, Game::Bioshock3);
        assert_eq!(pick("Field", FIELD_LINKS, &c).unwrap(), FieldLinks::NextOnly);
        assert_eq!(pick("Struct", STRUCT_SUPER, &c).unwrap(), SuperSource::Direct);
    }

    #[test]
    fn children_only_forks() {
        assert_eq!(
            pick("Struct", STRUCT_BODY, &ctx(472, 0, Game::Mk)).unwrap(),
            StructBody::ChildrenOnly
        );
        assert_eq!(
            pick("Struct", STRUCT_BODY, &ctx(471, 0, Game::Mk)).unwrap(),
            StructBody::Full
        );
        assert_eq!(
            pick("Struct", STRUCT_BODY, &ctx(864, 0, Game::Batman4)).unwrap(),
            StructBody::ChildrenOnly
        );
    }

    #[test]
    fn class_tail_eras() {
        assert_eq!(
            pick("Class", CLASS_TAIL, &ctx(512, 0, Game::Ue3)).unwrap(),
            ClassTail::DeferredDefaults
        );
        assert_eq!(
            pick("Class", CLASS_TAIL, &ctx(300, 0, Game::Ue3)).unwrap(),
            ClassTail::LegacyCategories
        );
        assert_eq!(
            pick("Class", CLASS_TAIL, &ctx(128, 0, Game::Ue2)).unwrap(),
            ClassTail::Nothing
        );
    }

    #[test]
    fn lost_planet_short_array_dim() {
        assert_eq!(
            pick("Property", ARRAY_DIM, &ctx(600, 79, Game::LostPlanet3)).unwrap(),
            ArrayDimWidth::I16
        );
        assert_eq!(
            pick("Property", ARRAY_DIM, &ctx(600, 78, Game::LostPlanet3)).unwrap(),
            ArrayDimWidth::I32
        );
    }

    #[test]
    fn unknown_family_is_unsupported() {
        let c = ctx(900, 0, Game::Ue4Base);
        let err = pick("Struct", STRUCT_SUPER, &c).unwrap_err();
        assert!(err.is_unsupported_version());
        assert!(pick("Class", CLASS_TAIL, &c).is_err());
        assert!(pick("Property", PROPERTY_META, &c).is_err());
    }

    #[test]
    fn value_decoding_needs_ue3() {
        assert!(pick("defaults", VALUE_DECODING, &ctx(600, 0, Game::Ue3)).is_ok());
        assert!(pick("defaults", VALUE_DECODING, &ctx(128, 0, Game::Ue2)).is_err());
    }
}
