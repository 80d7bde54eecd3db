//! Named profile lookup.
//!
//! The registry holds every profile that passed the consistency checker,
//! keyed by name. Built-in templates are compiled into the binary; extra
//! template directories are layered on top and override by name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mkprof_check::{CheckError, CheckReport, ProfileChecker};
use mkprof_parse::{parse_file, parse_str, render, ParseError, TEMPLATE_PREFIX};
use mkprof_profile::profile::ToolchainProfile;
use thiserror::Error;
use tracing::{debug, info};

/// Templates shipped with the binary: (profile name, template source).
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("ia64", include_str!("../templates/mkmf.template.ia64")),
    (
        "ia64-debug",
        include_str!("../templates/mkmf.template.ia64-debug"),
    ),
];

#[derive(Debug, Error)]
pub enum RegistryError {
    /// No profile with that name; there is no fallback
    #[error("unknown profile '{name}' (available: {})", available_list(.available))]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("profile '{name}' is inconsistent:{}", findings(.errors))]
    Inconsistent {
        name: String,
        errors: Vec<CheckError>,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read template directory '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn available_list(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn findings(errors: &[CheckError]) -> String {
    errors.iter().map(|e| format!("\n  - {}", e)).collect()
}

#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ToolchainProfile>,
    checker: ProfileChecker,
}

impl ProfileRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in profiles.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut reg = Self::new();
        for (name, src) in BUILTIN_TEMPLATES {
            reg.insert(parse_str(name, src)?)?;
        }
        Ok(reg)
    }

    /// Check `profile` and add it, replacing any profile of the same name.
    pub fn insert(&mut self, profile: ToolchainProfile) -> Result<CheckReport, RegistryError> {
        let report = self
            .checker
            .check(&profile)
            .map_err(|errors| RegistryError::Inconsistent {
                name: profile.name.clone(),
                errors,
            })?;
        if self.profiles.contains_key(&profile.name) {
            debug!(profile = %profile.name, "overriding existing profile");
        }
        self.profiles.insert(profile.name.clone(), profile);
        Ok(report)
    }

    /// Add every `mkmf.template.<name>` file in `dir`, in file name order.
    /// Returns how many profiles were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_template = path
                .file_name()
                .and_then(|f| f.to_str())
                .is_some_and(|f| f.starts_with(TEMPLATE_PREFIX) && f.len() > TEMPLATE_PREFIX.len());
            if is_template && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let profile = parse_file(path)?;
            debug!(profile = %profile.name, path = %path.display(), "loaded template");
            self.insert(profile)?;
        }
        Ok(paths.len())
    }

    /// Exact-name lookup. Unknown names are an error, never a default.
    pub fn resolve(&self, name: &str) -> Result<&ToolchainProfile, RegistryError> {
        match self.profiles.get(name) {
            Some(profile) => {
                info!(profile = name, "resolved profile");
                Ok(profile)
            }
            None => Err(RegistryError::NotFound {
                name: name.to_string(),
                available: self.names().into_iter().map(String::from).collect(),
            }),
        }
    }

    /// Profile names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolchainProfile> {
        self.profiles.values()
    }
}

/// SHA-256 of the rendered template, prefixed with "sha256:". Equal
/// profiles always share a fingerprint.
pub fn fingerprint(profile: &ToolchainProfile) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(render(profile).as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
