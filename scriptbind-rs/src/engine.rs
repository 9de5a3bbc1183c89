//! Compiled-unit evaluation with a per-name cache.
//!
//! The [`Engine`] resolves logical names through its [`ScriptResolver`],
//! parses each one once and keeps the result in a concurrent map of
//! `Arc<CompiledScript>`.  Later runs of the same name reuse the parsed tree.

use std::sync::Arc;

use dashmap::DashMap;

use crate::binding::Binding;
use crate::config::EngineConfig;
use crate::error::{ResolutionError, ScriptError};
use crate::evaluator::Evaluator;
use crate::resolve::{ScriptResolver, SearchPath};
use crate::script::{CompiledScript, Interpreter, ScriptHost, Value};
use crate::unit::ScriptUnit;

/// Script engine: name resolution, compile cache, execution.
///
/// `Engine` is `Sync`; one instance can serve several threads, each running
/// against its own binding.
pub struct Engine {
    resolver: Box<dyn ScriptResolver>,
    cache: DashMap<String, Arc<CompiledScript>>,
    check_modified: bool,
    max_depth: Option<usize>,
}

impl Engine {
    pub fn new(resolver: impl ScriptResolver + 'static) -> Self {
        Engine {
            resolver: Box::new(resolver),
            cache: DashMap::new(),
            check_modified: false,
            max_depth: None,
        }
    }

    /// Engine over a [`SearchPath`] built from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let search = SearchPath::new(config.roots.iter().cloned())
            .with_extensions(config.extensions.iter().cloned());
        Engine::new(search)
            .with_check_modified(config.check_modified)
            .with_max_depth(config.max_depth)
    }

    /// Recompile a cached script when its source reports a newer
    /// modification time.
    pub fn with_check_modified(mut self, check: bool) -> Self {
        self.check_modified = check;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn resolver(&self) -> &dyn ScriptResolver {
        self.resolver.as_ref()
    }

    /// Compiled script for `name`, from the cache when possible.
    pub fn load(&self, name: &str) -> Result<Arc<CompiledScript>, ResolutionError> {
        if let Some(cached) = self.cache.get(name).map(|entry| Arc::clone(&entry)) {
            if !self.is_stale(name, &cached) {
                tracing::trace!(script = name, "cache hit");
                return Ok(cached);
            }
            tracing::debug!(script = name, "source changed, recompiling");
        }

        let source = self.resolver.resolve(name)?;
        let script = Arc::new(CompiledScript::compile(source)?);
        tracing::debug!(script = name, origin = ?script.origin(), "compiled");
        self.cache.insert(name.to_owned(), Arc::clone(&script));
        Ok(script)
    }

    fn is_stale(&self, name: &str, cached: &CompiledScript) -> bool {
        if !self.check_modified {
            return false;
        }
        match (self.resolver.modified(name), cached.modified()) {
            (Some(now), Some(then)) => now > then,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Resolve (or reuse) `name` and run it against `binding`.
    pub fn run(&self, name: &str, binding: &mut Binding) -> Result<Value, ScriptError> {
        let script = self.load(name)?;
        self.execute(&script, binding)
    }

    /// Run an already compiled script with this engine as host, so its
    /// `run()` calls resolve through the same cache.
    pub fn execute(&self, script: &CompiledScript, binding: &mut Binding) -> Result<Value, ScriptError> {
        Interpreter::new(binding).with_host(self).exec_compiled(script)
    }

    /// A callable unit for `name`, bound to this engine.
    pub fn unit(&self, name: &str) -> Result<ScriptUnit<'_>, ResolutionError> {
        Ok(ScriptUnit::new(self.load(name)?).with_engine(self))
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Drop one cached script; returns whether it was present.
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache.remove(name).is_some()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl ScriptHost for Engine {
    fn load(&self, name: &str) -> Result<Arc<CompiledScript>, ResolutionError> {
        Engine::load(self, name)
    }

    fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

impl Evaluator for Engine {
    /// `script` is a logical name.
    fn evaluate(&self, script: &str, binding: &mut Binding) -> Result<Value, ScriptError> {
        self.run(script, binding)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::resolve::MemoryResolver;

    fn engine(scripts: &[(&str, &str)]) -> Engine {
        let mut resolver = MemoryResolver::new();
        for (name, text) in scripts {
            resolver.insert(*name, *text);
        }
        Engine::new(resolver)
    }

    #[test]
    fn run_resolves_and_caches() {
        let e = engine(&[("greet", "result = 'hi ' + who")]);
        let mut b = Binding::new().with("who", "there");
        assert!(!e.is_cached("greet"));
        assert_eq!(e.run("greet", &mut b).unwrap(), Value::from("hi there"));
        assert!(e.is_cached("greet"));
        assert_eq!(e.cached_len(), 1);
    }

    #[test]
    fn second_load_reuses_compiled_script() {
        let e = engine(&[("a", "1")]);
        let first = e.load("a").unwrap();
        let second = e.load("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_forces_recompile() {
        let e = engine(&[("a", "1")]);
        let first = e.load("a").unwrap();
        assert!(e.invalidate("a"));
        assert!(!e.invalidate("a"));
        let second = e.load("a").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        e.clear_cache();
        assert_eq!(e.cached_len(), 0);
    }

    #[test]
    fn missing_name_is_resolution_error() {
        let e = engine(&[]);
        let mut b = Binding::new();
        let err = e.run("nope", &mut b).unwrap_err();
        assert!(err.is_resolution());
        assert!(!e.is_cached("nope"));
    }

    #[test]
    fn parse_failure_is_not_cached() {
        let e = engine(&[("broken", "x = (")]);
        let mut b = Binding::new();
        assert!(e.run("broken", &mut b).unwrap_err().is_resolution());
        assert!(!e.is_cached("broken"));
    }

    #[test]
    fn scripts_run_each_other_through_the_cache() {
        let e = engine(&[
            ("outer", "trail = ['outer']\nrun('inner')\ntrail = trail + ['back']"),
            ("inner", "trail = trail + ['inner']"),
        ]);
        let mut b = Binding::new();
        e.run("outer", &mut b).unwrap();
        assert_eq!(b.get("trail"), Ok(&Value::from(["outer", "inner", "back"])));
        assert!(e.is_cached("inner"));
    }

    #[test]
    fn max_depth_stops_recursion() {
        let e = engine(&[("again", "run('again')")]).with_max_depth(Some(8));
        let mut b = Binding::new();
        let err = e.run("again", &mut b).unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(RuntimeError::DepthExceeded(8))));
    }

    #[test]
    fn resolver_is_reachable_and_bypasses_cache() {
        let e = engine(&[("a", "x = 1")]);
        let source = e.resolver().resolve("a").unwrap();
        assert_eq!(source.text, "x = 1");
        assert!(e.resolver().resolve("missing").is_err());
        assert!(!e.is_cached("a"));
    }

    #[test]
    fn engine_is_sync() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Engine>();
    }
}
