//! Command-line argument parsing.
//!
//! Usage:
//!   scriptbind [-v] run   <name> [-I <dir>]… [--arg <text>]… [--set <name>=<value>]…
//!   scriptbind [-v] eval  (<file> | -e <source>) [-I <dir>]… [--arg …] [--set …]
//!   scriptbind [-v] check <file>

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::binding::{is_valid_name, Binding};
use crate::config::ConfigError;
use crate::error::ScriptError;
use crate::script::expr::eval_str;
use crate::script::{Interpreter, Value};

#[derive(Parser, Debug)]
#[command(name = "scriptbind")]
#[command(about = "Run scripts against a shared variable binding")]
#[command(version)]
pub struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script by logical name through the caching engine
    Run {
        /// Script name, resolved against the search roots (extension optional)
        name: String,

        #[command(flatten)]
        seeds: Seeds,

        #[command(flatten)]
        search: Search,
    },

    /// Evaluate a file or inline source directly
    Eval {
        /// Path to a script file
        #[arg(required_unless_present = "source", conflicts_with = "source")]
        file: Option<PathBuf>,

        /// Inline source instead of a file
        #[arg(short = 'e', long = "expr", value_name = "SOURCE")]
        source: Option<String>,

        #[command(flatten)]
        seeds: Seeds,

        #[command(flatten)]
        search: Search,
    },

    /// Parse a script file without running it
    Check {
        file: PathBuf,
    },
}

/// Initial binding contents.
#[derive(Args, Debug, Default)]
pub struct Seeds {
    /// Append to the `args` list (repeatable)
    #[arg(long = "arg", value_name = "TEXT")]
    pub args: Vec<String>,

    /// Set one variable; the value is read as a literal, else as a string
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_seed)]
    pub set: Vec<(String, Value)>,
}

impl Seeds {
    /// A fresh binding holding `args` (always present, possibly empty) and
    /// every `--set` pair in order.
    pub fn to_binding(&self) -> Binding {
        let mut binding = Binding::new().with("args", self.args.clone());
        binding.extend(self.set.iter().cloned());
        binding
    }
}

#[derive(Args, Debug, Default)]
pub struct Search {
    /// Add a search root, highest priority first (repeatable)
    #[arg(short = 'I', long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Recompile cached scripts whose files changed
    #[arg(long)]
    pub check_modified: bool,
}

/// Parse one `NAME=VALUE` seed.
pub fn parse_seed(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if !is_valid_name(name) {
        return Err(format!("'{name}' is not a valid variable name"));
    }
    Ok((name.to_owned(), parse_seed_value(value)))
}

/// `42`, `true`, `[1, 'a']` and friends become typed values; anything that
/// does not evaluate on an empty binding is taken as a plain string.
pub fn parse_seed_value(raw: &str) -> Value {
    let mut scratch = Binding::new();
    eval_str(raw, &mut Interpreter::new(&mut scratch)).unwrap_or_else(|_| Value::from(raw))
}

/// Every way a command can fail.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CliError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Script(e) => e.hint(),
            CliError::Config(_) => Some("unset the variable or give it a number"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("scriptbind").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn run_with_seeds_and_roots() {
        let cli = parse(&[
            "run", "greet", "--arg", "Hello", "--arg", "World", "--set", "n=3", "-I", "lib",
        ]);
        let Commands::Run { name, seeds, search } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(name, "greet");
        assert_eq!(seeds.args, vec!["Hello", "World"]);
        assert_eq!(seeds.set, vec![("n".to_owned(), Value::Int(3))]);
        assert_eq!(search.roots, vec![PathBuf::from("lib")]);
        assert!(!cli.verbose);
    }

    #[test]
    fn eval_inline_source() {
        let cli = parse(&["-v", "eval", "-e", "1 + 1"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Eval { file: None, source: Some(ref s), .. } if s == "1 + 1"
        ));
    }

    #[test]
    fn eval_needs_file_or_source() {
        assert!(Cli::try_parse_from(["scriptbind", "eval"]).is_err());
        assert!(Cli::try_parse_from(["scriptbind", "eval", "f.sb", "-e", "1"]).is_err());
    }

    #[test]
    fn seed_values() {
        assert_eq!(parse_seed("n=42").unwrap(), ("n".into(), Value::Int(42)));
        assert_eq!(parse_seed("ok=true").unwrap().1, Value::Bool(true));
        assert_eq!(parse_seed("xs=[1, 'a']").unwrap().1, Value::List(vec![1.into(), "a".into()]));
        assert_eq!(parse_seed("who=World").unwrap().1, Value::from("World"));
        assert_eq!(parse_seed("msg=hello there").unwrap().1, Value::from("hello there"));
        assert_eq!(parse_seed("empty=").unwrap().1, Value::from(""));
    }

    #[test]
    fn bad_seeds() {
        assert!(parse_seed("novalue").is_err());
        assert!(parse_seed("1x=2").is_err());
        assert!(parse_seed("=2").is_err());
    }

    #[test]
    fn seeds_build_binding() {
        let seeds = Seeds {
            args: vec!["a".into()],
            set: vec![("x".into(), Value::Int(1)), ("x".into(), Value::Int(2))],
        };
        let b = seeds.to_binding();
        assert_eq!(b.get("args"), Ok(&Value::from(["a"])));
        assert_eq!(b.get("x"), Ok(&Value::Int(2)));
    }
}
