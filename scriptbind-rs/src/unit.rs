//! Callable units: things the host can instantiate and run against a binding.
//!
//! A [`Unit`] has its body supplied from outside (a compiled script, a host
//! closure, or another unit it builds on demand).  [`DelegatingUnit`]
//! composes units: it does optional local work, constructs a nested unit and
//! hands it the very same binding.

use std::sync::Arc;

use crate::binding::Binding;
use crate::engine::Engine;
use crate::error::ScriptError;
use crate::script::{CompiledScript, Interpreter, Value};

/// A runnable body that works on a caller-supplied binding.
pub trait Unit {
    fn invoke(&self, binding: &mut Binding) -> Result<Value, ScriptError>;

    /// Attach a binding now and run later with [`Bound::run`].
    fn bind(self, binding: &mut Binding) -> Bound<'_, Self>
    where
        Self: Sized,
    {
        Bound {
            unit: self,
            binding,
        }
    }
}

impl<U: Unit + ?Sized> Unit for Box<U> {
    fn invoke(&self, binding: &mut Binding) -> Result<Value, ScriptError> {
        (**self).invoke(binding)
    }
}

impl<U: Unit + ?Sized> Unit for &U {
    fn invoke(&self, binding: &mut Binding) -> Result<Value, ScriptError> {
        (**self).invoke(binding)
    }
}

/// A unit holding the binding it will run against.
pub struct Bound<'b, U> {
    unit: U,
    binding: &'b mut Binding,
}

impl<U: Unit> Bound<'_, U> {
    pub fn run(&mut self) -> Result<Value, ScriptError> {
        self.unit.invoke(self.binding)
    }

    pub fn binding(&self) -> &Binding {
        self.binding
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }
}

// ── ScriptUnit ────────────────────────────────────────────────────────────────

/// A compiled script packaged as a unit.
#[derive(Clone)]
pub struct ScriptUnit<'e> {
    script: Arc<CompiledScript>,
    engine: Option<&'e Engine>,
}

impl<'e> ScriptUnit<'e> {
    pub fn new(script: Arc<CompiledScript>) -> Self {
        ScriptUnit {
            script,
            engine: None,
        }
    }

    /// Let the script `run()` other scripts through `engine`.
    pub fn with_engine(mut self, engine: &'e Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn script(&self) -> &CompiledScript {
        &self.script
    }
}

impl Unit for ScriptUnit<'_> {
    fn invoke(&self, binding: &mut Binding) -> Result<Value, ScriptError> {
        match self.engine {
            Some(engine) => engine.execute(&self.script, binding),
            None => Interpreter::new(binding).exec_compiled(&self.script),
        }
    }
}

// ── FnUnit ────────────────────────────────────────────────────────────────────

/// A host closure as a unit.
pub struct FnUnit<F>(F);

impl<F> FnUnit<F>
where
    F: Fn(&mut Binding) -> Result<Value, ScriptError>,
{
    pub fn new(body: F) -> Self {
        FnUnit(body)
    }
}

impl<F> Unit for FnUnit<F>
where
    F: Fn(&mut Binding) -> Result<Value, ScriptError>,
{
    fn invoke(&self, binding: &mut Binding) -> Result<Value, ScriptError> {
        (self.0)(binding)
    }
}

// ── DelegatingUnit ────────────────────────────────────────────────────────────

/// What a [`DelegatingUnit`] does when the nested unit fails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NestedFailure {
    /// Return the nested error unchanged.
    #[default]
    Propagate,
    /// Store the error message in `var` and return `Value::Null`.
    Record { var: String },
}

type Factory<'a> = Box<dyn Fn(&Binding) -> Result<Box<dyn Unit + 'a>, ScriptError> + 'a>;
type Before<'a> = Box<dyn Fn(&mut Binding) -> Result<(), ScriptError> + 'a>;

/// A unit whose body builds and runs another unit on the same binding.
///
/// The delegating unit keeps no binding of its own.  Every write the nested
/// unit makes lands in the caller's binding, and so does every write made
/// before a nested failure.
pub struct DelegatingUnit<'a> {
    name: String,
    before: Option<Before<'a>>,
    factory: Factory<'a>,
    on_failure: NestedFailure,
}

impl<'a> DelegatingUnit<'a> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Binding) -> Result<Box<dyn Unit + 'a>, ScriptError> + 'a,
    {
        DelegatingUnit {
            name: name.into(),
            before: None,
            factory: Box::new(factory),
            on_failure: NestedFailure::default(),
        }
    }

    /// Delegate to the engine script `script`, resolved on every invocation.
    pub fn to_script(engine: &'a Engine, script: impl Into<String>) -> Self {
        let script = script.into();
        let name = format!("delegate:{script}");
        DelegatingUnit::new(name, move |_| {
            Ok(Box::new(engine.unit(&script)?) as Box<dyn Unit + 'a>)
        })
    }

    /// Local work to do on the binding before the nested unit is built.
    pub fn before<F>(mut self, work: F) -> Self
    where
        F: Fn(&mut Binding) -> Result<(), ScriptError> + 'a,
    {
        self.before = Some(Box::new(work));
        self
    }

    pub fn on_failure(mut self, policy: NestedFailure) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Unit for DelegatingUnit<'_> {
    fn invoke(&self, binding: &mut Binding) -> Result<Value, ScriptError> {
        if let Some(before) = &self.before {
            before(binding)?;
        }

        let _span = tracing::debug_span!("delegate", unit = %self.name).entered();
        let result = (self.factory)(binding).and_then(|nested| nested.invoke(binding));

        match (result, &self.on_failure) {
            (Ok(value), _) => Ok(value),
            (Err(err), NestedFailure::Propagate) => Err(err),
            (Err(err), NestedFailure::Record { var }) => {
                tracing::debug!(error = %err, %var, "recording nested failure");
                binding.set(var.as_str(), err.to_string());
                Ok(Value::Null)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::resolve::MemoryResolver;

    fn greeting() -> FnUnit<impl Fn(&mut Binding) -> Result<Value, ScriptError>> {
        FnUnit::new(|b: &mut Binding| {
            let args = b.get("args")?.clone();
            b.set("myArgs", args.clone());
            let first = args.index(&Value::Int(0))?;
            let second = args.index(&Value::Int(1))?;
            let result = first.arith_add(&Value::from(" "))?.arith_add(&second)?;
            b.set("result", result.clone());
            Ok(result)
        })
    }

    #[test]
    fn fn_unit_writes_binding() {
        let mut b = Binding::new().with("args", ["Hello", "World"]);
        let v = greeting().invoke(&mut b).unwrap();
        assert_eq!(v, Value::from("Hello World"));
        assert_eq!(b.get("myArgs"), Ok(&Value::from(["Hello", "World"])));
    }

    #[test]
    fn bound_unit_runs_later() {
        let mut b = Binding::new().with("args", ["a", "b"]);
        let mut bound = greeting().bind(&mut b);
        assert!(!bound.binding().has("result"));
        let unseeded = bound.unit().invoke(&mut Binding::new()).unwrap_err();
        assert_eq!(unseeded.undefined_variable(), Some("args"));
        assert_eq!(bound.run().unwrap(), Value::from("a b"));
        assert_eq!(b.get("result"), Ok(&Value::from("a b")));
    }

    #[test]
    fn script_unit_without_engine() {
        let script = Arc::new(CompiledScript::from_text("inc", "n += 1").unwrap());
        let unit = ScriptUnit::new(script);
        assert_eq!(unit.script().name(), "inc");
        let mut b = Binding::new().with("n", 1);
        unit.invoke(&mut b).unwrap();
        unit.invoke(&mut b).unwrap();
        assert_eq!(b.get("n"), Ok(&Value::Int(3)));
    }

    #[test]
    fn delegating_unit_shares_binding() {
        let unit = DelegatingUnit::new("outer", |_| Ok(Box::new(greeting()) as Box<dyn Unit>))
            .before(|b| {
                b.set("args", ["from", "outer"]);
                Ok(())
            });
        let mut b = Binding::new();
        let v = unit.invoke(&mut b).unwrap();
        assert_eq!(v, Value::from("from outer"));
        assert_eq!(b.get("result"), Ok(&Value::from("from outer")));
    }

    #[test]
    fn nested_failure_propagates_and_keeps_writes() {
        let failing = |_: &Binding| {
            Ok::<_, ScriptError>(Box::new(FnUnit::new(|b: &mut Binding| {
                b.set("partial", true);
                Err(ScriptError::raised("nested broke"))
            })) as Box<dyn Unit>)
        };
        let unit = DelegatingUnit::new("outer", failing).before(|b| {
            b.set("started", true);
            Ok(())
        });
        let mut b = Binding::new();
        let err = unit.invoke(&mut b).unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(RuntimeError::Raised(ref m)) if m == "nested broke"));
        assert!(b.has("started"));
        assert!(b.has("partial"));
    }

    #[test]
    fn nested_failure_can_be_recorded() {
        let unit = DelegatingUnit::new("outer", |_| {
            Ok(Box::new(FnUnit::new(|_: &mut Binding| Err(ScriptError::raised("boom")))) as Box<dyn Unit>)
        })
        .on_failure(NestedFailure::Record {
            var: "nestedError".into(),
        });
        let mut b = Binding::new();
        assert_eq!(unit.invoke(&mut b).unwrap(), Value::Null);
        assert_eq!(
            b.get("nestedError"),
            Ok(&Value::from("runtime error: boom"))
        );
    }

    #[test]
    fn factory_sees_current_binding() {
        let unit = DelegatingUnit::new("pick", |b: &Binding| {
            let loud = b.get("loud").map(Value::as_bool).unwrap_or(false);
            let body = if loud { "out = 'HELLO'" } else { "out = 'hello'" };
            let script = CompiledScript::from_text("pick", body)?;
            Ok(Box::new(ScriptUnit::new(Arc::new(script))) as Box<dyn Unit>)
        });
        let mut b = Binding::new().with("loud", true);
        unit.invoke(&mut b).unwrap();
        assert_eq!(b.get("out"), Ok(&Value::from("HELLO")));
    }

    #[test]
    fn to_script_resolves_through_engine() {
        let engine = Engine::new(MemoryResolver::new().with("inner", "seen = true\n'done'"));
        let unit = DelegatingUnit::to_script(&engine, "inner");
        assert_eq!(unit.name(), "delegate:inner");
        let mut b = Binding::new();
        assert_eq!(unit.invoke(&mut b).unwrap(), Value::from("done"));
        assert_eq!(b.get("seen"), Ok(&Value::Bool(true)));
    }

    #[test]
    fn to_script_missing_is_resolution_error() {
        let engine = Engine::new(MemoryResolver::new());
        let unit = DelegatingUnit::to_script(&engine, "ghost");
        let mut b = Binding::new();
        assert!(unit.invoke(&mut b).unwrap_err().is_resolution());
    }
}
