//! Where profiles come from.

use std::path::PathBuf;

use tracing::debug;

use crate::registry::{ProfileRegistry, RegistryError};

/// Colon-separated template directories searched after the built-ins
/// (read by the `--template-dir` option).
pub const TEMPLATE_DIR_ENV: &str = "MKPROF_TEMPLATE_DIR";
/// Profile `resolve` uses when no name is given.
pub const PROFILE_ENV: &str = "MKPROF_PROFILE";
/// Tracing filter, e.g. `debug` or `mkprof_cli=debug`.
pub const LOG_ENV: &str = "MKPROF_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    /// Searched in order; a later directory overrides earlier profiles.
    pub template_dirs: Vec<PathBuf>,
    /// Start from the built-in profiles.
    pub builtins: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_dirs: Vec::new(),
            builtins: true,
        }
    }
}

impl Config {
    pub fn registry(&self) -> Result<ProfileRegistry, RegistryError> {
        let mut reg = if self.builtins {
            ProfileRegistry::builtin()?
        } else {
            ProfileRegistry::new()
        };
        for dir in &self.template_dirs {
            let n = reg.load_dir(dir)?;
            debug!(dir = %dir.display(), profiles = n, "loaded template directory");
        }
        Ok(reg)
    }
}
