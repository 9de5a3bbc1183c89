//! Shared variable bindings between a host program and the scripts it runs.
//!
//! The host creates a [`Binding`], seeds it, and lends it to an evaluator:
//! the [`Shell`] (parse and run source directly), the [`Engine`] (resolve a
//! logical name, cache the compiled script, run it), or a [`Unit`] such as a
//! [`DelegatingUnit`].  Scripts read and write the binding in place; nested
//! runs share the same instance.
//!
//! ```rust
//! use scriptbind::{Binding, Engine, MemoryResolver, Value};
//!
//! let engine = Engine::new(
//!     MemoryResolver::new().with("greet", "myArgs = args\nresult = args[0] + ' ' + args[1]"),
//! );
//! let mut binding = Binding::new().with("args", ["Hello", "World"]);
//! engine.run("greet", &mut binding).unwrap();
//! assert_eq!(binding.get("result").unwrap(), &Value::from("Hello World"));
//! ```

pub mod binding;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod resolve;
pub mod script;
pub mod shell;
pub mod unit;

pub use binding::{is_valid_name, Binding};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ParseError, ResolutionError, RuntimeError, ScriptError, UndefinedVariable};
pub use evaluator::Evaluator;
pub use resolve::{MemoryResolver, Origin, ScriptResolver, ScriptSource, SearchPath};
pub use script::{CompiledScript, HostObject, Value};
pub use shell::Shell;
pub use unit::{Bound, DelegatingUnit, FnUnit, NestedFailure, ScriptUnit, Unit};
