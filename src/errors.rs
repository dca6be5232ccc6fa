//! Error types with diagnostics using miette
//!
//! Scene errors are recoverable: they are published on the error channel and
//! the script keeps running. Script errors stop the run at the offending line.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::types::ParsePointError;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<script>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }

    /// Span covering the whole of 1-based `line`, or an empty span at the
    /// end of the source when the line does not exist.
    pub fn line_span(&self, line: usize) -> SourceSpan {
        let mut offset = 0;
        for (idx, text) in self.source.split('\n').enumerate() {
            if idx + 1 == line {
                let len = text.trim_end_matches('\r').len();
                return (offset, len).into();
            }
            offset += text.len() + 1;
        }
        (self.source.len(), 0).into()
    }
}

// ============================================================================
// Scene Errors
// ============================================================================

/// Errors raised by scene operations
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("There is already an object called {name}, you can't use the same name.")]
    #[diagnostic(code(shapescript::scene::duplicate_name))]
    DuplicateName { name: String },

    #[error("Name of your object must start with a letter and contain only letters or numbers.")]
    #[diagnostic(code(shapescript::scene::invalid_name))]
    InvalidName { name: String },

    #[error("You must set a type of object to create, like this: new text title")]
    #[diagnostic(code(shapescript::scene::missing_type))]
    MissingType,

    #[error("{kind} not a valid object type, must be one of these: {expected}")]
    #[diagnostic(code(shapescript::scene::unknown_type))]
    UnknownType { kind: String, expected: String },

    #[error("There was no object called {name}.")]
    #[diagnostic(code(shapescript::scene::no_such_object))]
    NoSuchObject { name: String },

    #[error("No object is selected.")]
    #[diagnostic(
        code(shapescript::scene::no_selection),
        help("name the object, or select one first with `with <name>`")
    )]
    NoSelection,

    #[error("{name} is a {kind} and needs {expected} points, got {found}.")]
    #[diagnostic(code(shapescript::scene::point_count))]
    PointCount {
        name: String,
        kind: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("{name} is a {kind} and can't be sized to 0, it could never grow back.")]
    #[diagnostic(code(shapescript::scene::flat_path))]
    FlatPath { name: String, kind: &'static str },

    #[error("`{token}` is not a point: {reason}")]
    #[diagnostic(code(shapescript::scene::invalid_point))]
    InvalidPoint {
        token: String,
        reason: ParsePointError,
    },
}

// ============================================================================
// Script Errors
// ============================================================================

/// Errors that halt a run
#[derive(Error, Diagnostic, Debug)]
pub enum ScriptError {
    #[error("Invalid command: {line}")]
    #[diagnostic(
        code(shapescript::script::invalid_command),
        help("check the spelling of the command and the order of its words")
    )]
    InvalidCommand {
        line: String,
        line_number: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("no command matches this line")]
        span: SourceSpan,
    },

    #[error("invalid number: {text}")]
    #[diagnostic(code(shapescript::script::invalid_number))]
    InvalidNumber {
        text: String,
        line_number: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this number is out of range")]
        span: SourceSpan,
    },
}

impl ScriptError {
    /// 1-based line the run stopped at
    pub fn line_number(&self) -> usize {
        match self {
            ScriptError::InvalidCommand { line_number, .. }
            | ScriptError::InvalidNumber { line_number, .. } => *line_number,
        }
    }
}
