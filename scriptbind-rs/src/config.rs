//! Engine configuration and search-root discovery.
//!
//! Roots are chosen in priority order: explicit roots (`-I` on the command
//! line) → `SCRIPTBIND_PATH` → the current directory plus the per-user
//! script directory, when it exists.

use std::ffi::OsString;
use std::path::PathBuf;

use directories::ProjectDirs;
use thiserror::Error;

/// Colon- (or semicolon-, on Windows) separated list of search roots.
pub const PATH_ENV: &str = "SCRIPTBIND_PATH";
/// Maximum `run`/`eval` nesting depth.
pub const MAX_DEPTH_ENV: &str = "SCRIPTBIND_MAX_DEPTH";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var} value '{value}': expected a non-negative integer")]
    InvalidNumber { var: &'static str, value: String },
}

/// Settings for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Search roots, highest priority first.
    pub roots: Vec<PathBuf>,
    /// Extensions tried after the bare name, without the dot.
    pub extensions: Vec<String>,
    pub check_modified: bool,
    /// `None` leaves delegation depth unconstrained.
    pub max_depth: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            roots: Vec::new(),
            extensions: vec!["sb".to_owned()],
            check_modified: false,
            max_depth: None,
        }
    }
}

impl EngineConfig {
    /// Configuration from the process environment, with `cli_roots` taking
    /// priority over everything else.
    pub fn from_env(cli_roots: &[PathBuf]) -> Result<Self, ConfigError> {
        Self::from_sources(
            cli_roots,
            std::env::var_os(PATH_ENV),
            std::env::var(MAX_DEPTH_ENV).ok(),
        )
    }

    /// Same as [`from_env`](Self::from_env) with the environment passed in
    /// (exposed for testing).
    pub fn from_sources(
        cli_roots: &[PathBuf],
        env_path: Option<OsString>,
        env_max_depth: Option<String>,
    ) -> Result<Self, ConfigError> {
        let max_depth = match env_max_depth.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: MAX_DEPTH_ENV,
                value: raw.to_owned(),
            })?),
        };
        Ok(EngineConfig {
            roots: resolve_roots(cli_roots, env_path),
            max_depth,
            ..Self::default()
        })
    }

    pub fn with_check_modified(mut self, check: bool) -> Self {
        self.check_modified = check;
        self
    }
}

/// Pick the search roots.
///
/// Priority: explicit roots → `env_path` (split with platform rules, empty
/// entries dropped) → [`default_roots`].
pub fn resolve_roots(cli_roots: &[PathBuf], env_path: Option<OsString>) -> Vec<PathBuf> {
    if !cli_roots.is_empty() {
        return cli_roots.to_vec();
    }
    if let Some(raw) = env_path {
        let roots: Vec<PathBuf> = std::env::split_paths(&raw)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !roots.is_empty() {
            return roots;
        }
    }
    default_roots()
}

/// The current directory, then the user script directory if it exists.
pub fn default_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from(".")];
    if let Some(dir) = user_script_dir() {
        if dir.is_dir() {
            roots.push(dir);
        }
    }
    roots
}

/// `<data dir>/scripts` for this user, e.g. `~/.local/share/scriptbind/scripts`.
pub fn user_script_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "scriptbind").map(|dirs| dirs.data_dir().join("scripts"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
