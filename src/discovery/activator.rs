//! Module activation across a search path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ActivationError;

/// Settings-activation collaborator.
///
/// The application host owns importing the module and its framework-side
/// environment setup; the launcher only needs to know whether activation
/// can succeed.
pub trait ModuleActivator {
    /// Activate `module`, a dotted identifier.
    ///
    /// # Errors
    ///
    /// [`ActivationError::NotFound`] when the module does not exist; the
    /// discovery chain treats this as "try the next candidate".
    /// [`ActivationError::Probe`] when existence could not be decided; this
    /// is a real fault and stops the chain.
    fn activate(&self, module: &str) -> Result<(), ActivationError>;
}

/// Default activator: resolves dotted identifiers to `.py` modules or
/// packages on an ordered search path, the way the application host will.
#[derive(Debug, Clone)]
pub struct SearchPathActivator {
    search_paths: Vec<PathBuf>,
}

impl SearchPathActivator {
    /// Create an activator over an explicit search path.
    #[must_use]
    pub const fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Build the search path from `base_dir` followed by `$PYTHONPATH`.
    #[must_use]
    pub fn from_env(base_dir: &Path) -> Self {
        let mut search_paths = vec![base_dir.to_path_buf()];
        if let Ok(raw) = std::env::var("PYTHONPATH") {
            search_paths.extend(std::env::split_paths(&raw));
        }
        Self { search_paths }
    }

    /// Relative paths a dotted identifier may resolve to: a module file or
    /// a package directory. `None` when the identifier is not well-formed.
    fn candidates(module: &str) -> Option<[PathBuf; 2]> {
        if module.is_empty() || !module.split('.').all(is_identifier) {
            return None;
        }
        let mut relative = PathBuf::new();
        for segment in module.split('.') {
            relative.push(segment);
        }
        Some([relative.with_extension("py"), relative.join("__init__.py")])
    }
}

impl ModuleActivator for SearchPathActivator {
    fn activate(&self, module: &str) -> Result<(), ActivationError> {
        let Some(candidates) = Self::candidates(module) else {
            return Err(ActivationError::NotFound(module.to_string()));
        };

        for base in &self.search_paths {
            for candidate in &candidates {
                let path = base.join(candidate);
                match fs::metadata(&path) {
                    Ok(meta) if meta.is_file() => {
                        tracing::debug!(module, path = %path.display(), "module resolved");
                        return Ok(());
                    }
                    Ok(_) => {}
                    // An unreadable search path must not masquerade as a
                    // missing module.
                    Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                        return Err(ActivationError::Probe {
                            module: module.to_string(),
                            path: path.display().to_string(),
                            source: err,
                        });
                    }
                    Err(_) => {}
                }
            }
        }
        Err(ActivationError::NotFound(module.to_string()))
    }
}

/// A valid dotted-name segment: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
