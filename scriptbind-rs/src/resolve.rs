//! Turning logical script names into source text.
//!
//! The engine never touches the filesystem itself; it asks a
//! [`ScriptResolver`].  [`SearchPath`] walks an ordered list of root
//! directories, [`MemoryResolver`] serves sources registered in memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::error::ResolutionError;

/// Where a script's source came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(PathBuf),
    Memory,
    /// Handed over directly as text (shell `eval_source`, `eval(...)`).
    Inline,
}

/// Resolved source text plus what is known about it.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    pub name: String,
    pub origin: Origin,
    pub text: String,
    pub modified: Option<SystemTime>,
}

impl ScriptSource {
    pub fn inline(name: impl Into<String>, text: impl Into<String>) -> Self {
        ScriptSource {
            name: name.into(),
            origin: Origin::Inline,
            text: text.into(),
            modified: None,
        }
    }

    /// Read a file directly, bypassing any search path.
    pub fn from_file(path: &Path) -> Result<Self, ResolutionError> {
        // Stamp before reading: a write racing the read must look newer.
        let modified = mtime(path);
        let text = fs::read_to_string(path).map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ScriptSource {
            name: path.display().to_string(),
            origin: Origin::File(path.to_path_buf()),
            text,
            modified,
        })
    }
}

/// Strategy for locating script sources by logical name.
pub trait ScriptResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<ScriptSource, ResolutionError>;

    /// Current modification time of `name`, if the resolver can tell.
    /// Used by the engine to notice changed sources.
    fn modified(&self, _name: &str) -> Option<SystemTime> {
        None
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn malformed(name: &str, reason: &str) -> ResolutionError {
    ResolutionError::Malformed {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

// ── SearchPath ────────────────────────────────────────────────────────────────

/// Ordered list of root directories; the first root containing the name wins.
///
/// A name is tried as given, then with each configured extension appended,
/// so `greet` finds `greet.sb`.
#[derive(Debug, Clone)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl SearchPath {
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        SearchPath {
            roots: roots.into_iter().map(Into::into).collect(),
            extensions: vec!["sb".to_owned()],
        }
    }

    pub fn with_extensions<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Find the file `name` refers to.
    pub fn locate(&self, name: &str) -> Result<PathBuf, ResolutionError> {
        check_name(name)?;
        if self.roots.is_empty() {
            return Err(malformed(name, "the search path has no roots"));
        }

        for root in &self.roots {
            if !root.is_dir() {
                tracing::debug!(root = %root.display(), "skipping missing search root");
                continue;
            }
            let bare = root.join(name);
            if bare.is_file() {
                return Ok(bare);
            }
            for ext in &self.extensions {
                let candidate = root.join(format!("{name}.{ext}"));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        let searched: Vec<String> = self
            .roots
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        Err(ResolutionError::NotFound {
            name: name.to_owned(),
            searched: searched.join(", "),
        })
    }
}

/// Names must be relative and stay inside their root.
fn check_name(name: &str) -> Result<(), ResolutionError> {
    if name.trim().is_empty() {
        return Err(malformed(name, "empty name"));
    }
    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(malformed(name, "absolute paths are not allowed"));
            }
            Component::ParentDir => {
                return Err(malformed(name, "'..' may not escape the search root"));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

impl ScriptResolver for SearchPath {
    fn resolve(&self, name: &str) -> Result<ScriptSource, ResolutionError> {
        let path = self.locate(name)?;
        let mut source = ScriptSource::from_file(&path)?;
        source.name = name.to_owned();
        Ok(source)
    }

    fn modified(&self, name: &str) -> Option<SystemTime> {
        self.locate(name).ok().and_then(|path| mtime(&path))
    }
}

// ── MemoryResolver ────────────────────────────────────────────────────────────

/// Sources registered by name, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    scripts: HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.scripts.insert(name.into(), text.into());
    }
}

impl ScriptResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Result<ScriptSource, ResolutionError> {
        if name.trim().is_empty() {
            return Err(malformed(name, "empty name"));
        }
        let text = self
            .scripts
            .get(name)
            .ok_or_else(|| ResolutionError::NotFound {
                name: name.to_owned(),
                searched: "<memory>".to_owned(),
            })?;
        Ok(ScriptSource {
            name: name.to_owned(),
            origin: Origin::Memory,
            text: text.clone(),
            modified: None,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
