use crate::{Archive, Result};

/// Source text attached to a structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    pub pos: i32,
    pub top: i32,
    pub text: String,
}

impl TextBuffer {
    pub fn deserialize(&mut self, ar: &mut dyn Archive) -> Result<()> {
        self.pos = ar.read_i32()?;
        self.top = ar.read_i32()?;
        self.text = ar.read_string()?;
        Ok(())
    }
}
