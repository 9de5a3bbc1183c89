//! Direct-source evaluation: parse, run once, forget.

use std::path::Path;

use crate::binding::Binding;
use crate::error::ScriptError;
use crate::evaluator::Evaluator;
use crate::resolve::ScriptSource;
use crate::script::{CompiledScript, Interpreter, ScriptHost, Value};

/// Evaluates raw source text or a single file.
///
/// Nothing is cached; each call parses its input again.  Attach a host with
/// [`with_host`](Self::with_host) to let the evaluated code `run()` other
/// scripts by name.
#[derive(Default, Clone, Copy)]
pub struct Shell<'h> {
    host: Option<&'h dyn ScriptHost>,
}

impl<'h> Shell<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &'h dyn ScriptHost) -> Self {
        self.host = Some(host);
        self
    }

    /// Parse and run `text` against `binding`.
    pub fn eval_source(&self, binding: &mut Binding, text: &str) -> Result<Value, ScriptError> {
        let script = CompiledScript::compile(ScriptSource::inline("<source>", text))?;
        self.exec(binding, &script)
    }

    /// Read, parse and run the file at `path`.
    pub fn eval_file(&self, binding: &mut Binding, path: impl AsRef<Path>) -> Result<Value, ScriptError> {
        let source = ScriptSource::from_file(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "shell eval");
        let script = CompiledScript::compile(source)?;
        self.exec(binding, &script)
    }

    fn exec(&self, binding: &mut Binding, script: &CompiledScript) -> Result<Value, ScriptError> {
        let mut interp = Interpreter::new(binding);
        if let Some(host) = self.host {
            interp = interp.with_host(host);
        }
        interp.exec_compiled(script)
    }
}

impl Evaluator for Shell<'_> {
    /// `script` is a file path.
    fn evaluate(&self, script: &str, binding: &mut Binding) -> Result<Value, ScriptError> {
        self.eval_file(binding, script)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
