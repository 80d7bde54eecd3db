//! Printable forms of a resolved profile.

use clap::ValueEnum;
use mkprof_parse::{render, PROFILE_KEYS};
use mkprof_profile::profile::ToolchainProfile;
use serde::Serialize;

use crate::registry::fingerprint;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `KEY = value` lines for mkmf
    Template,
    /// The profile as JSON
    Json,
    /// `export KEY='value'` lines for a job script
    Env,
}

pub fn format_profile(profile: &ToolchainProfile, format: Format) -> serde_json::Result<String> {
    match format {
        Format::Template => Ok(render(profile)),
        Format::Json => serde_json::to_string_pretty(profile),
        Format::Env => Ok(env_exports(profile)),
    }
}

/// One row of `mkprof list --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub fingerprint: String,
    pub open_variables: Vec<String>,
}

impl ProfileSummary {
    pub fn of(profile: &ToolchainProfile) -> Self {
        Self {
            name: profile.name.clone(),
            fingerprint: fingerprint(profile),
            open_variables: profile.open_variables(),
        }
    }
}

fn env_exports(profile: &ToolchainProfile) -> String {
    let values = [
        profile.cppflags.to_string(),
        profile.fflags.to_string(),
        profile.fc.to_string(),
        profile.ld.to_string(),
        profile.cc.to_string(),
        profile.ldflags.to_string(),
        profile.cflags.to_string(),
    ];
    PROFILE_KEYS
        .iter()
        .zip(values)
        .map(|(key, value)| format!("export {}={}\n", key, shell_quote(&value)))
        .collect()
}

/// Single-quote for POSIX sh; embedded quotes become `'\''`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
