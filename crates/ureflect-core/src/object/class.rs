use crate::{
    Archive, ClassFlags, Game, ObjectRef, Result,
    archive::{read_array, read_map},
    rules::{CLASS_TAIL, ClassTail, pick},
};

use super::State;

/// A class: a state with class flags and a default object.
#[derive(Debug, Clone, Default)]
pub struct Class {
    pub state: State,
    pub class_flags: ClassFlags,
    pub class_within: Option<ObjectRef>,
    pub config_name: String,
    /// Resolved after loading from [`deferred_defaults`](Self::deferred_defaults).
    pub class_default_object: Option<ObjectRef>,
    /// Offset of the default-object reference inside the export.
    pub deferred_defaults: Option<u64>,
}

impl Class {
    pub fn deserialize(&mut self, ar: &mut dyn Archive, super_field2: Option<ObjectRef>) -> Result<()> {
        self.state.deserialize(ar, super_field2)?;

        let ctx = ar.version();
        self.class_flags = ClassFlags::from_bits_retain(ar.read_u32()?);
        if ctx.version < 547 {
            ar.read_u8()?;
        }
        self.class_within = ar.read_object()?;
        self.config_name = ar.read_name()?;

        match pick("Class", CLASS_TAIL, &ctx)? {
            ClassTail::DeferredDefaults => {
                self.deferred_defaults = Some(ar.stopper().saturating_sub(4));
                ar.drop_remaining_data()
            }
            ClassTail::LegacyCategories => {
                let old_order = ctx.version < 539 || ctx.is(Game::Tera);
                if old_order {
                    read_array(ar, |ar| ar.read_name())?;
                }
                // component name -> default object
                read_map(ar, |ar| ar.read_name(), |ar| ar.read_object())?;
                if ctx.version >= 369 {
                    read_map(ar, |ar| ar.read_object(), |ar| ar.read_object())?;
                }
                if ctx.version >= 603 && !ctx.is(Game::Tera) {
                    read_array(ar, |ar| ar.read_name())?;
                }
                if !old_order {
                    read_array(ar, |ar| ar.read_name())?;
                }
                ar.drop_remaining_data()
            }
            ClassTail::Nothing => Ok(()),
        }
    }
}
