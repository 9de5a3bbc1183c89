//! Script interpreter.
//!
//! An [`Interpreter`] borrows one [`Binding`] for the length of a run and
//! executes parsed [`Stmt`] trees against it.  It implements [`EvalContext`]
//! so the expression evaluator can call back into it for variable lookups and
//! function calls.
//!
//! Nested runs (`run("name")`, `eval("source")`) reborrow the *same* binding;
//! there is no per-call scope, so every level reads and writes one flat
//! namespace.

use std::sync::Arc;

use super::{
    builtins::{arity, call_builtin, get_str},
    expr::{eval_expr, EvalContext},
    stmt::{AssignOp, Stmt},
    value::Value,
    CompiledScript,
};
use crate::binding::Binding;
use crate::error::{ResolutionError, RuntimeError, ScriptError, UndefinedVariable};

// ── ScriptHost ────────────────────────────────────────────────────────────────

/// Something that can turn a logical script name into a compiled script.
///
/// Implemented by [`Engine`](crate::Engine); gives scripts the ability to
/// delegate to other scripts with `run("name")`.
pub trait ScriptHost {
    fn load(&self, name: &str) -> Result<Arc<CompiledScript>, ResolutionError>;

    /// Maximum nesting depth for `run`/`eval`; `None` is unlimited.
    fn max_depth(&self) -> Option<usize> {
        None
    }
}

// ── ControlFlow ───────────────────────────────────────────────────────────────

/// Outcome of executing a statement or block.
#[derive(Debug)]
enum Flow {
    /// Ran to completion with this value.
    Normal(Value),
    Break,
    Return(Value),
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// Executes scripts against a borrowed binding.
pub struct Interpreter<'b, 'h> {
    binding: &'b mut Binding,
    host: Option<&'h dyn ScriptHost>,
    depth: usize,
    max_depth: Option<usize>,
}

impl<'b, 'h> Interpreter<'b, 'h> {
    pub fn new(binding: &'b mut Binding) -> Self {
        Interpreter {
            binding,
            host: None,
            depth: 0,
            max_depth: None,
        }
    }

    /// Attach a host so `run("name")` can resolve other scripts.  The host's
    /// depth limit applies unless one was set explicitly.
    pub fn with_host(mut self, host: &'h dyn ScriptHost) -> Self {
        self.max_depth = self.max_depth.or(host.max_depth());
        self.host = Some(host);
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn binding(&self) -> &Binding {
        self.binding
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Parse and execute a script string.
    pub fn exec_script(&mut self, src: &str) -> Result<Value, ScriptError> {
        let script = CompiledScript::from_text("<inline>", src)?;
        self.exec_compiled(&script)
    }

    /// Execute a compiled script.  The result is the value of the last
    /// statement executed, or the argument of `return`.
    pub fn exec_compiled(&mut self, script: &CompiledScript) -> Result<Value, ScriptError> {
        tracing::trace!(script = script.name(), depth = self.depth, "exec");
        match self.exec_block(script.stmts())? {
            Flow::Normal(v) | Flow::Return(v) => Ok(v),
            // The parser rejects `break` outside a loop.
            Flow::Break => Ok(Value::Null),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, ScriptError> {
        let mut last = Value::Null;
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal(v) => last = v,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Expr(expr) => Ok(Flow::Normal(eval_expr(expr, self)?)),

            Stmt::Assign { name, op, value } => {
                let rval = eval_expr(value, self)?;
                let new_val = match op {
                    AssignOp::Set => rval,
                    AssignOp::Add => self.binding.get(name)?.arith_add(&rval)?,
                    AssignOp::Sub => self.binding.get(name)?.arith_sub(&rval)?,
                };
                self.binding.set(name.as_str(), new_val.clone());
                Ok(Flow::Normal(new_val))
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let block = if eval_expr(cond, self)?.as_bool() {
                    then_block
                } else {
                    else_block
                };
                self.exec_block(block)
            }

            Stmt::While { cond, body } => {
                while eval_expr(cond, self)?.as_bool() {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                        Flow::Normal(_) => {}
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }

            Stmt::Break => Ok(Flow::Break),

            Stmt::Return(value) => {
                let v = match value {
                    Some(expr) => eval_expr(expr, self)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(v))
            }
        }
    }

    // ── Delegation ────────────────────────────────────────────────────────────

    /// An interpreter one level deeper that shares this one's binding.
    fn nested(&mut self) -> Result<Interpreter<'_, 'h>, RuntimeError> {
        let depth = self.depth + 1;
        if let Some(max) = self.max_depth {
            if depth > max {
                return Err(RuntimeError::DepthExceeded(max));
            }
        }
        Ok(Interpreter {
            binding: &mut *self.binding,
            host: self.host,
            depth,
            max_depth: self.max_depth,
        })
    }

    fn run_named(&mut self, name: &str) -> Result<Value, ScriptError> {
        let host = self
            .host
            .ok_or_else(|| RuntimeError::NoHost("run".into()))?;
        let script = host.load(name)?;
        let _span = tracing::debug_span!("run", script = name, depth = self.depth + 1).entered();
        self.nested()?.exec_compiled(&script)
    }

    fn eval_nested(&mut self, src: &str) -> Result<Value, ScriptError> {
        let script = CompiledScript::from_text("<eval>", src)?;
        self.nested()?.exec_compiled(&script)
    }
}

// ── EvalContext impl ──────────────────────────────────────────────────────────

impl EvalContext for Interpreter<'_, '_> {
    fn get_var(&self, name: &str) -> Result<Value, UndefinedVariable> {
        self.binding.get(name).cloned()
    }

    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        // Functions that need the binding or the host.
        match name {
            "defined" => {
                arity(name, &args, 1)?;
                Ok(Value::Bool(self.binding.has(get_str(name, &args, 0)?)))
            }
            "get" => {
                arity(name, &args, 1)?;
                Ok(self.binding.get(get_str(name, &args, 0)?)?.clone())
            }
            "set" => {
                arity(name, &args, 2)?;
                let var = get_str(name, &args, 0)?.to_owned();
                let value = args[1].clone();
                self.binding.set(var, value.clone());
                Ok(value)
            }
            "unset" => {
                arity(name, &args, 1)?;
                Ok(self
                    .binding
                    .unset(get_str(name, &args, 0)?)
                    .unwrap_or_default())
            }
            "binding" => {
                arity(name, &args, 0)?;
                Ok(self.binding.snapshot())
            }
            "run" => {
                arity(name, &args, 1)?;
                self.run_named(get_str(name, &args, 0)?)
            }
            "eval" => {
                arity(name, &args, 1)?;
                self.eval_nested(get_str(name, &args, 0)?)
            }
            "fail" => {
                let parts: Vec<String> = args.iter().map(Value::to_string).collect();
                Err(RuntimeError::Raised(parts.join(" ")).into())
            }
            _ => match call_builtin(name, args) {
                Some(result) => Ok(result?),
                None => Err(RuntimeError::UnknownFunction(name.to_owned()).into()),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
