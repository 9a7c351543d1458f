//! Error types for registry lookups, archive reads and package loads.
//!
//! ## Error Hierarchy
//!
//! ```text
//! LoadError (kind + context frames)
//! └── LoadErrorKind
//!     ├── UnknownType         - declared class name not in the registry (fatal)
//!     ├── UnsupportedVersion  - no layout rule matches the version context (fatal)
//!     ├── Archive             - byte-level read failure (fatal)
//!     └── MissingExport       - export index outside the export table (fatal)
//! ```
//!
//! Recoverable conditions (malformed length blocks, missing references,
//! unread trailing bytes) are not errors; they are reported as
//! [`Diagnostic`](crate::Diagnostic)s and loading continues.

use std::fmt;

use thiserror::Error;

use crate::VersionContext;

/// Result alias used throughout the loader.
pub type Result<T, E = LoadError> = std::result::Result<T, E>;

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors from the type registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No entry is registered under this name.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The entry exists but its descriptor has no constructor.
    #[error("type '{0}' cannot be constructed")]
    NotConstructible(String),
}

// ============================================================================
// Archive Errors
// ============================================================================

/// Byte-level failures of an archive cursor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    #[error("read of {wanted} bytes at offset {pos} runs past the end of data ({len})")]
    UnexpectedEof { pos: u64, wanted: usize, len: u64 },

    #[error("seek to {pos} is outside of data ({len})")]
    SeekOutOfRange { pos: u64, len: u64 },

    #[error("name index {0} is out of range")]
    BadNameIndex(i32),

    #[error("object index {0} is out of range")]
    BadObjectIndex(i32),

    #[error("bad element count {count} at offset {pos}")]
    BadCount { count: i64, pos: u64 },

    #[error("malformed string at offset {pos}")]
    InvalidString { pos: u64 },

    #[error("object read ended at {pos}, past its stopper {stopper}")]
    Overrun { pos: u64, stopper: u64 },
}

// ============================================================================
// Load Errors
// ============================================================================

/// What went wrong during a load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadErrorKind {
    /// A declared class name is absent from the type registry.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// No rule of a variant's decision table matches the version context.
    #[error("no {variant} layout rule for {context}")]
    UnsupportedVersion {
        variant: &'static str,
        context: VersionContext,
    },

    /// A byte-level read failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// An export index outside the export table.
    #[error("export {0} does not exist")]
    MissingExport(u32),
}

impl From<RegistryError> for LoadErrorKind {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownType(name) | RegistryError::NotConstructible(name) => {
                LoadErrorKind::UnknownType(name)
            }
        }
    }
}

/// One named frame of diagnostic context, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFrame {
    /// Routine or phase that was running.
    pub scope: &'static str,
    /// Object or field it was working on.
    pub detail: String,
}

impl ContextFrame {
    pub fn new(scope: &'static str, detail: impl Into<String>) -> Self {
        Self {
            scope,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ContextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(self.scope)
        } else {
            write!(f, "{}: {}", self.scope, self.detail)
        }
    }
}

/// A fatal load error together with the chain of frames it unwound through.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadError {
    kind: LoadErrorKind,
    context: Vec<ContextFrame>,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::UnknownType(name.into()))
    }

    pub fn unsupported(variant: &'static str, context: VersionContext) -> Self {
        Self::new(LoadErrorKind::UnsupportedVersion { variant, context })
    }

    pub fn kind(&self) -> &LoadErrorKind {
        &self.kind
    }

    /// Context frames, innermost first.
    pub fn context(&self) -> &[ContextFrame] {
        &self.context
    }

    /// Append an outer frame.
    pub fn push_frame(mut self, frame: ContextFrame) -> Self {
        self.context.push(frame);
        self
    }

    pub fn is_unknown_type(&self) -> bool {
        matches!(self.kind, LoadErrorKind::UnknownType(_))
    }

    pub fn is_unsupported_version(&self) -> bool {
        matches!(self.kind, LoadErrorKind::UnsupportedVersion { .. })
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.context {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<LoadErrorKind> for LoadError {
    fn from(kind: LoadErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<ArchiveError> for LoadError {
    fn from(err: ArchiveError) -> Self {
        Self::new(LoadErrorKind::Archive(err))
    }
}

impl From<RegistryError> for LoadError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.into())
    }
}

/// Attach context frames to a failing result as it propagates outward.
pub trait ResultExt<T> {
    fn context(self, frame: impl FnOnce() -> ContextFrame) -> Result<T>;
}

impl<T, E: Into<LoadError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, frame: impl FnOnce() -> ContextFrame) -> Result<T> {
        self.map_err(|err| err.into().push_frame(frame()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Game;

    #[test]
    fn archive_error_display() {
        let err = ArchiveError::UnexpectedEof {
            pos: 10,
            wanted: 4,
            len: 12,
        };
        assert_eq!(
            err.to_string(),
            "read of 4 bytes at offset 10 runs past the end of data (12)"
        );
    }

    #[test]
    fn registry_error_becomes_unknown_type() {
        let err: LoadError = RegistryError::UnknownType("Widget".into()).into();
        assert!(err.is_unknown_type());
        assert_eq!(err.to_string(), "unknown type: Widget");
    }

    #[test]
    fn context_frames_render_innermost_first() {
        let result: Result<()> = Err(LoadError::unsupported(
            "Struct",
            VersionContext::new(900, 0, Game::Ue4Base),
        ));
        let err = result
            .context(|| ContextFrame::new("Struct::deserialize", "Vector"))
            .context(|| ContextFrame::new("LoadSession::populate", "export_3"))
            .unwrap_err();

        assert!(err.is_unsupported_version());
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0].detail, "Vector");
        assert_eq!(
            err.to_string(),
            "no Struct layout rule for Ue4Base (version 900, licensee 0)\n  \
             in Struct::deserialize: Vector\n  \
             in LoadSession::populate: export_3"
        );
    }

    #[test]
    fn archive_error_converts_with_context() {
        let result: std::result::Result<(), ArchiveError> = Err(ArchiveError::BadNameIndex(99));
        let err = result
            .context(|| ContextFrame::new("read_name", ""))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            LoadErrorKind::Archive(ArchiveError::BadNameIndex(99))
        ));
        assert_eq!(err.to_string(), "name index 99 is out of range\n  in read_name");
    }
}
