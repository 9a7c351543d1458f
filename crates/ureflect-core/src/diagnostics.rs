//! Recoverable load findings.
//!
//! Anything that can be downgraded without breaking byte-position
//! invariants for the rest of the file is recorded here instead of aborting.

use std::fmt;

/// Category of a recoverable finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A length-prefixed block declared more bytes than remain; it was dropped.
    MalformedLength,
    /// A reference that should have named an object was null or unresolved;
    /// the schema degrades to an "unknown" placeholder.
    MissingReference,
    /// An object routine finished before reaching its stopper.
    UnreadBytes,
    /// A tagged property value could not be matched to a declared property.
    UnknownProperty,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedLength => "malformed length",
            DiagnosticKind::MissingReference => "missing reference",
            DiagnosticKind::UnreadBytes => "unread bytes",
            DiagnosticKind::UnknownProperty => "unknown property",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recoverable finding, attributed to the object being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Name of the object being loaded when it was found.
    pub object: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.object, self.kind, self.message)
    }
}

/// Collection of findings for one load.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, object: impl Into<String>, message: impl Into<String>) {
        self.items.push(Diagnostic {
            kind,
            object: object.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}
