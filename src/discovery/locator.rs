//! Short-circuiting settings discovery.
//!
//! The locator evaluates an ordered chain of candidate settings sources and
//! stops at the first that resolves. With an explicit argument: a file path,
//! then a dotted module name. Without one: the conventional `settings.py`
//! in the working directory, then the module named by the ambient
//! environment variable.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::discovery::activator::ModuleActivator;
use crate::error::{ActivationError, DiscoveryError};

/// Conventional settings file tried when no explicit argument is given.
pub const SETTINGS_FILE: &str = "settings.py";

/// Environment variable naming a settings module, consulted only when no
/// explicit argument is given.
pub const SETTINGS_ENV_VAR: &str = "DJANGO_SETTINGS_MODULE";

/// Which kind of source a settings reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsKind {
    /// A settings file on disk.
    File,
    /// An importable dotted module.
    Module,
}

impl SettingsKind {
    /// Lowercase label for logs and the status endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Module => "module",
        }
    }
}

/// The resolved settings source.
///
/// Created once per process by [`Locator::locate`] and immutable afterwards.
/// The resolved identifier travels as explicit context into the bootstrap;
/// the launcher's own environment is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRef {
    /// How the source was resolved.
    pub kind: SettingsKind,
    /// Dotted identifier used to import the settings source.
    pub module_name: String,
    /// Directories the application host must prepend to its module search
    /// path, in order. Non-empty only for file-based sources.
    pub search_paths: Vec<PathBuf>,
}

impl SettingsRef {
    /// Environment pairs the application host needs to activate this source.
    ///
    /// Always contains `settings_var` set to the module name; when search
    /// paths were discovered, also a `PYTHONPATH` export with those entries
    /// first and `inherited_path` appended after them.
    #[must_use]
    pub fn env_exports(
        &self,
        settings_var: &str,
        inherited_path: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut exports = vec![(settings_var.to_string(), self.module_name.clone())];
        if !self.search_paths.is_empty() {
            let mut entries: Vec<String> = self
                .search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            if let Some(inherited) = inherited_path.filter(|p| !p.is_empty()) {
                entries.push(inherited.to_string());
            }
            exports.push(("PYTHONPATH".to_string(), entries.join(":")));
        }
        exports
    }
}

/// Settings locator.
///
/// Deterministic: discovery is a pure function of the explicit argument,
/// the base directory, the activator, and the ambient variable value. A
/// failed search leaves no state behind.
pub struct Locator<'a> {
    base_dir: PathBuf,
    activator: &'a dyn ModuleActivator,
}

impl<'a> Locator<'a> {
    /// Create a locator rooted at `base_dir` (the launcher's working
    /// directory) using `activator` as the activation collaborator.
    pub fn new(base_dir: impl Into<PathBuf>, activator: &'a dyn ModuleActivator) -> Self {
        Self {
            base_dir: base_dir.into(),
            activator,
        }
    }

    /// Resolve the settings source for this process.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::NotFound`] when an explicit argument resolves to
    /// neither a file nor a module; [`DiscoveryError::NoCandidates`] when
    /// there was no argument and neither the conventional file nor the
    /// environment variable yields a source; [`DiscoveryError::Activation`]
    /// when module activation fails for a reason other than absence.
    pub fn locate(
        &self,
        explicit: Option<&str>,
        env_var: &str,
        env_value: Option<&str>,
    ) -> Result<SettingsRef, DiscoveryError> {
        if let Some(argument) = explicit {
            if let Some(found) = self.file_step(Path::new(argument))? {
                return Ok(found);
            }
            if let Some(found) = self.module_step(argument)? {
                return Ok(found);
            }
            return Err(DiscoveryError::NotFound {
                argument: argument.to_string(),
            });
        }

        if let Some(found) = self.file_step(Path::new(SETTINGS_FILE))? {
            return Ok(found);
        }
        if let Some(value) = env_value {
            if let Some(found) = self.module_step(value)? {
                return Ok(found);
            }
        }
        Err(DiscoveryError::NoCandidates {
            env_var: env_var.to_string(),
        })
    }

    /// Chain step: treat `path` as a settings file.
    ///
    /// On success the module name is `<project dir>.<file stem>` and the
    /// search paths are the project directory and its parent, so both the
    /// settings module and the project root become importable.
    fn file_step(&self, path: &Path) -> Result<Option<SettingsRef>, DiscoveryError> {
        let path = absolutize(&self.base_dir, path);
        if !path.is_file() {
            return Ok(None);
        }
        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            return Ok(None);
        };
        let Some(project_dir) = path.parent() else {
            return Ok(None);
        };
        let Some(project_name) = project_dir.file_name().and_then(OsStr::to_str) else {
            return Ok(None);
        };

        let mut search_paths = vec![project_dir.to_path_buf()];
        if let Some(parent) = project_dir.parent() {
            search_paths.push(parent.to_path_buf());
        }

        tracing::debug!(file = %path.display(), "settings file resolved");
        Ok(Some(SettingsRef {
            kind: SettingsKind::File,
            module_name: format!("{project_name}.{stem}"),
            search_paths,
        }))
    }

    /// Chain step: treat `name` as a dotted module identifier.
    ///
    /// A missing module lets the chain continue; any other activation
    /// failure propagates.
    fn module_step(&self, name: &str) -> Result<Option<SettingsRef>, DiscoveryError> {
        match self.activator.activate(name) {
            Ok(()) => {
                tracing::debug!(module = name, "settings module activated");
                Ok(Some(SettingsRef {
                    kind: SettingsKind::Module,
                    module_name: name.to_string(),
                    search_paths: Vec::new(),
                }))
            }
            Err(ActivationError::NotFound(_)) => Ok(None),
            Err(err) => Err(DiscoveryError::Activation {
                module: name.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// Make `path` absolute against `base` and lexically normalize it.
///
/// `.` and `..` components are folded; symlinks are not resolved.
fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
