//! scriptbind CLI: seed a binding, run a script against it, print the result.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scriptbind::cli::{Cli, CliError, Commands, Search, Seeds};
use scriptbind::config::EngineConfig;
use scriptbind::{Binding, CompiledScript, Engine, ScriptError, ScriptSource, Shell, Value};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run { name, seeds, search } => run_script(&name, &seeds, &search),
        Commands::Eval {
            file,
            source,
            seeds,
            search,
        } => eval_script(file, source, &seeds, &search),
        Commands::Check { file } => check_script(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

/// `warn` by default, `debug` with `-v`; `RUST_LOG` overrides both.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn engine(search: &Search) -> Result<Engine, CliError> {
    let config = EngineConfig::from_env(&search.roots)?.with_check_modified(search.check_modified);
    tracing::debug!(roots = ?config.roots, "search path");
    Ok(Engine::from_config(&config))
}

fn run_script(name: &str, seeds: &Seeds, search: &Search) -> Result<(), CliError> {
    let engine = engine(search)?;
    let mut binding = seeds.to_binding();
    let value = engine.run(name, &mut binding)?;
    report(&value, &binding);
    Ok(())
}

fn eval_script(
    file: Option<PathBuf>,
    source: Option<String>,
    seeds: &Seeds,
    search: &Search,
) -> Result<(), CliError> {
    // The engine only serves `run()` calls made by the evaluated code.
    let engine = engine(search)?;
    let shell = Shell::new().with_host(&engine);
    let mut binding = seeds.to_binding();
    let value = match (file, source) {
        (Some(path), _) => shell.eval_file(&mut binding, path)?,
        (None, Some(text)) => shell.eval_source(&mut binding, &text)?,
        (None, None) => Value::Null,
    };
    report(&value, &binding);
    Ok(())
}

fn check_script(file: &Path) -> Result<(), CliError> {
    let script = ScriptSource::from_file(file)
        .and_then(CompiledScript::compile)
        .map_err(ScriptError::from)?;
    println!("{}: ok ({} statements)", file.display(), script.stmts().len());
    Ok(())
}

/// Returned value, then the binding sorted by name.
fn report(value: &Value, binding: &Binding) {
    println!("=> {value}");
    let mut vars: Vec<(&str, &Value)> = binding.iter().collect();
    vars.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in vars {
        println!("{name} = {value}");
    }
}
