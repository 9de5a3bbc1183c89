//! The small scripting language evaluated against a [`Binding`](crate::Binding).
//!
//! This module implements a tree-walking interpreter covering:
//!
//! - Assignment (`name = expr`, `+=`, `-=`) straight into the binding
//! - Arithmetic, string concatenation, comparison and logic
//! - List literals and indexing (`args[0]`)
//! - Control flow: `if` / `else`, `while`, `break`, `return`
//! - Pure built-ins (`len`, `join`, `matches`, …) plus binding-aware ones
//!   (`defined`, `get`, `set`, `binding`) and delegation (`run`, `eval`)
//!
//! # Quick start
//!
//! ```rust
//! use scriptbind::script::Interpreter;
//! use scriptbind::{Binding, Value};
//!
//! let mut binding = Binding::new().with("args", ["Hello", "World"]);
//! let result = Interpreter::new(&mut binding)
//!     .exec_script("result = args[0] + \" \" + args[1]")
//!     .unwrap();
//! assert_eq!(result, Value::from("Hello World"));
//! assert_eq!(binding.get("result").unwrap(), &Value::from("Hello World"));
//! ```

pub mod builtins;
pub mod expr;
pub mod interp;
pub mod stmt;
pub mod value;

use std::time::SystemTime;

use crate::error::ResolutionError;
use crate::resolve::{Origin, ScriptSource};

// Re-exports for convenience.
pub use expr::EvalContext;
pub use interp::{Interpreter, ScriptHost};
pub use stmt::Stmt;
pub use value::{HostObject, Value};

/// A parsed script, ready to run any number of times.
///
/// The engine caches these behind an `Arc` per logical name; the shell builds
/// a fresh one for every evaluation.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    name: String,
    origin: Origin,
    modified: Option<SystemTime>,
    stmts: Vec<Stmt>,
}

impl CompiledScript {
    /// Parse resolved source.  Syntax errors are reported as
    /// [`ResolutionError::Parse`]: the script never became runnable.
    pub fn compile(source: ScriptSource) -> Result<Self, ResolutionError> {
        let stmts = stmt::parse_script(&source.text).map_err(|error| ResolutionError::Parse {
            name: source.name.clone(),
            error,
        })?;
        Ok(CompiledScript {
            name: source.name,
            origin: source.origin,
            modified: source.modified,
            stmts,
        })
    }

    /// Parse source text that did not come from a resolver.
    pub fn from_text(name: impl Into<String>, text: &str) -> Result<Self, ResolutionError> {
        Self::compile(ScriptSource::inline(name, text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Modification time of the source this was compiled from, if known.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
