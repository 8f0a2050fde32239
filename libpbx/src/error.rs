//! Error types for reading, editing and persisting pbxproj documents.

use crate::guid::Guid;
use thiserror::Error;

/// Result type for read operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self) -> String {
        match &self.filename {
            Some(name) => format!(" of <{}>", name),
            None => String::new(),
        }
    }
}

/// Error raised while reading a document. Any of these aborts the whole read.
///
/// Line numbers are 0-based document lines; messages print them 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token.
    #[error("Invalid character {ch:?} at line {}{suffix}", .line + 1)]
    InvalidChar {
        ch: char,
        line: usize,
        suffix: String,
    },

    /// The header never reached the line that opens the object table.
    #[error("Missing \"objects = {{\" line{0}")]
    MissingObjectTable(String),

    /// A section header without its matching end marker.
    #[error("Unterminated section \"{name}\" starting at line {}{suffix}", .line + 1)]
    UnterminatedSection {
        name: String,
        line: usize,
        suffix: String,
    },

    /// An end marker naming a different section than the one that is open.
    #[error("Section \"{expected}\" closed as \"{found}\" at line {}{suffix}", .line + 1)]
    MismatchedSectionEnd {
        expected: String,
        found: String,
        line: usize,
        suffix: String,
    },

    /// Token-level grammar failure inside a section body.
    #[error("Expected {expected}, found {found} at line {}{suffix}", .line + 1)]
    Expected {
        expected: &'static str,
        found: String,
        line: usize,
        suffix: String,
    },

    /// An entry in a known section without an `isa` property.
    #[error("Entry {guid} in {section} section has no isa{suffix}")]
    MissingIsa {
        guid: String,
        section: String,
        suffix: String,
    },

    /// A typed field holding a value of the wrong shape.
    #[error("Entry {guid}: {message}{suffix}")]
    InvalidEntry {
        guid: String,
        message: String,
        suffix: String,
    },

    /// The same GUID declared twice anywhere in the object table.
    #[error("Duplicate GUID {guid}{suffix}")]
    DuplicateGuid { guid: String, suffix: String },
}

/// Error raised by operations on the object graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A lookup the operation depends on found nothing.
    #[error("No {kind} found for {key}")]
    NotFound { kind: &'static str, key: String },

    /// Inserting an entry whose GUID is already used somewhere in the project.
    #[error("GUID {0} is already in use")]
    DuplicateGuid(Guid),

    /// Real path and project path describe different kinds of file.
    #[error("Project and real path extensions do not match: \"{real}\" vs \"{project}\"")]
    FileTypeMismatch { real: String, project: String },

    /// The target has no build phase able to hold the file.
    #[error("Target {target} has no {phase} build phase")]
    MissingPhase { target: Guid, phase: &'static str },

    /// The file's extension cannot be built into a target.
    #[error("Files with extension \"{0}\" cannot be built")]
    NotBuildable(String),

    /// A capability needs an entitlements file and none was given.
    #[error("Capability {0} requires an entitlements file")]
    MissingEntitlements(&'static str),
}

impl EditError {
    pub(crate) fn not_found(kind: &'static str, key: impl std::fmt::Display) -> Self {
        EditError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

/// Error raised by an [`EditSession`](crate::EditSession).
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
