//! The common evaluation capability.

use crate::binding::Binding;
use crate::error::ScriptError;
use crate::script::Value;

/// Executes a script reference against a borrowed binding.
///
/// What `script` means depends on the implementation: a file path for the
/// [`Shell`](crate::Shell), a logical name for the [`Engine`](crate::Engine).
/// Either way the script reads and writes `binding` in place and the value of
/// its last statement is returned.
pub trait Evaluator {
    fn evaluate(&self, script: &str, binding: &mut Binding) -> Result<Value, ScriptError>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, script: &str, binding: &mut Binding) -> Result<Value, ScriptError> {
        (**self).evaluate(script, binding)
    }
}
