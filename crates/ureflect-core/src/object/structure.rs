use tracing::debug;

use crate::{
    Archive, DiagnosticKind, Game, ObjectRef, Result, StructFlags, TypeRef,
    archive::read_map,
    defaults::DefaultsBuffer,
    rules::{STRUCT_BODY, STRUCT_SUPER, StructBody, SuperSource, pick},
};

/// A structure: ordered children, inheritance link and opaque bytecode.
#[derive(Debug, Clone, Default)]
pub struct Struct {
    /// Parent in the instance graph.
    pub super_field: Option<ObjectRef>,
    pub script_text: Option<ObjectRef>,
    pub cpp_text: Option<ObjectRef>,
    /// Head of the declared field list.
    pub children: Option<ObjectRef>,
    pub friendly_name: Option<String>,
    pub ut2_extra: Option<i32>,
    pub line: i32,
    pub text_pos: i32,
    /// Compiled bytecode, kept uninterpreted.
    pub script: Vec<u8>,
    /// Data layout built from the declared properties after loading.
    pub layout: Option<TypeRef>,
}

impl Struct {
    pub fn deserialize(&mut self, ar: &mut dyn Archive, super_field2: Option<ObjectRef>) -> Result<()> {
        let ctx = ar.version();
        self.super_field = match pick("Struct", STRUCT_SUPER, &ctx)? {
            SuperSource::Direct => ar.read_object()?,
            SuperSource::FromSuperField2 => super_field2,
        };

        if pick("Struct", STRUCT_BODY, &ctx)? == StructBody::ChildrenOnly {
            self.children = ar.read_object()?;
            return Ok(());
        }

        self.script_text = ar.read_object()?;
        self.children = ar.read_object()?;
        if ctx.game_at_least(Game::Ue3) {
            self.cpp_text = ar.read_object()?;
        }
        if ctx.game_below(Game::Ue3) {
            self.friendly_name = Some(ar.read_name()?);
        }
        if ctx.is(Game::Ut2) && ctx.licensee_version >= 25 {
            self.ut2_extra = Some(ar.read_i32()?);
        }
        self.line = ar.read_i32()?;
        self.text_pos = ar.read_i32()?;

        // Borderlands stores these two the other way round.
        if ctx.is(Game::Borderlands) {
            std::mem::swap(&mut self.script_text, &mut self.children);
        }

        let script_size = ar.read_i32()?;
        if script_size == 0 {
            return Ok(());
        }
        let remaining = ar.stopper() as i64 - ar.tell() as i64;
        debug!(declared = script_size, remaining, "struct script");
        if script_size < 0 || remaining < script_size as i64 {
            ar.report(
                DiagnosticKind::MalformedLength,
                format!("script size {script_size} exceeds the {remaining} bytes remaining, dropped"),
            );
            return Ok(());
        }
        if ctx.is(Game::Transformers) {
            return Ok(());
        }
        let mut script = vec![0u8; script_size as usize];
        ar.serialize_raw(&mut script)?;
        self.script = script;
        Ok(())
    }
}

/// A structure declared in script with its own default values.
#[derive(Debug, Clone, Default)]
pub struct ScriptStruct {
    pub base: Struct,
    pub struct_flags: StructFlags,
    /// Offset of the tagged default values, read after loading.
    pub deferred_defaults: Option<u64>,
    pub defaults: Option<DefaultsBuffer>,
}

impl ScriptStruct {
    pub fn deserialize(&mut self, ar: &mut dyn Archive, super_field2: Option<ObjectRef>) -> Result<()> {
        self.base.deserialize(ar, super_field2)?;
        self.struct_flags = StructFlags::from_bits_retain(ar.read_u32()?);
        self.deferred_defaults = Some(ar.tell());
        ar.drop_remaining_data()
    }

    /// Stored as raw bytes rather than a tagged list.
    pub fn is_binary(&self) -> bool {
        self.struct_flags
            .intersects(StructFlags::IMMUTABLE | StructFlags::IMMUTABLE_WHEN_COOKED)
    }
}

/// A state: a structure with probe masks and a function map.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub base: Struct,
    pub probe_mask: i64,
    pub ignore_mask: i64,
    pub state_flags: i32,
    pub label_table_offset: u16,
    pub function_map: Vec<(String, Option<ObjectRef>)>,
}

impl State {
    pub fn deserialize(&mut self, ar: &mut dyn Archive, super_field2: Option<ObjectRef>) -> Result<()> {
        self.base.deserialize(ar, super_field2)?;
        self.probe_mask = ar.read_i64()?;
        self.ignore_mask = ar.read_i64()?;
        self.state_flags = ar.read_i32()?;
        self.label_table_offset = ar.read_u16()?;
        self.function_map = read_map(ar, |ar| ar.read_name(), |ar| ar.read_object())?;
        Ok(())
    }
}
