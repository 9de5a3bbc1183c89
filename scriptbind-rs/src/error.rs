//! Error types for binding access, script resolution and script execution.
//!
//! Resolution failures (the script could not be turned into something
//! runnable) and runtime failures (the script body itself failed) are kept
//! apart so callers can tell "missing or malformed script" from "script
//! raised an error".

use std::path::PathBuf;

use thiserror::Error;

/// Raised by [`Binding::get`](crate::Binding::get) for a name that was never set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("undefined variable '{name}'")]
pub struct UndefinedVariable {
    pub name: String,
}

impl UndefinedVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A syntax error with its 1-based source position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// The script reference could not be turned into executable source.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("script '{name}' not found (searched: {searched})")]
    NotFound { name: String, searched: String },

    #[error("malformed script reference '{name}': {reason}")]
    Malformed { name: String, reason: String },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in '{name}' at {error}")]
    Parse {
        name: String,
        #[source]
        error: ParseError,
    },
}

/// A failure raised while a script body executes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(transparent)]
    Undefined(#[from] UndefinedVariable),

    #[error("type error: {0}")]
    Type(String),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key '{0}' not found")]
    MissingKey(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name}() expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("invalid pattern '{pattern}': {details}")]
    BadPattern { pattern: String, details: String },

    /// Raised explicitly by a script (`fail(...)`) or a host unit.
    #[error("{0}")]
    Raised(String),

    #[error("maximum nesting depth {0} exceeded")]
    DepthExceeded(usize),

    #[error("{0}() needs a script engine to resolve names")]
    NoHost(String),
}

/// Top-level error of every evaluation.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl From<UndefinedVariable> for ScriptError {
    fn from(e: UndefinedVariable) -> Self {
        ScriptError::Runtime(RuntimeError::Undefined(e))
    }
}

impl ScriptError {
    /// Shorthand for a script-level failure with a message.
    pub fn raised(message: impl Into<String>) -> Self {
        ScriptError::Runtime(RuntimeError::Raised(message.into()))
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self, ScriptError::Resolution(_))
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, ScriptError::Runtime(_))
    }

    /// Name of the undefined variable, if that is what failed.
    pub fn undefined_variable(&self) -> Option<&str> {
        match self {
            ScriptError::Runtime(RuntimeError::Undefined(e)) => Some(&e.name),
            _ => None,
        }
    }

    /// A short suggestion for fixing the error, printed by the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ScriptError::Resolution(ResolutionError::NotFound { .. }) => {
                Some("add the script's directory with -I or SCRIPTBIND_PATH")
            }
            ScriptError::Resolution(ResolutionError::Malformed { .. }) => {
                Some("use a relative name such as 'greet' or 'lib/greet.sb'")
            }
            ScriptError::Resolution(ResolutionError::Io { .. }) => {
                Some("check the file path and permissions")
            }
            ScriptError::Resolution(ResolutionError::Parse { .. }) => None,
            ScriptError::Runtime(RuntimeError::Undefined(_)) => {
                Some("seed the variable with --set name=value or --arg")
            }
            ScriptError::Runtime(RuntimeError::NoHost(_)) => {
                Some("use `scriptbind run` so nested names can be resolved")
            }
            ScriptError::Runtime(_) => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
