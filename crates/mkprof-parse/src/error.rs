use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading a template into a profile. All of them are fatal
/// to the build configuration step.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed line
    #[error("line {line}: {msg}")]
    Syntax { line: u32, msg: String },

    #[error("line {line}: invalid variable name '{key}'")]
    InvalidKey { key: String, line: u32 },

    /// Second plain `=` for a key; `+=` extends instead
    #[error("line {line}: '{key}' is already defined on line {first}; use '+=' to extend it")]
    DuplicateKey { key: String, line: u32, first: u32 },

    #[error("missing required key '{key}'")]
    MissingKey { key: &'static str },

    #[error("line {line}: '{key}' must name a program")]
    EmptyValue { key: &'static str, line: u32 },

    #[error("line {line}: '+=' on undefined variable '{key}'")]
    AppendToUndefined { key: String, line: u32 },

    #[error("line {line}: variable '{name}' references itself")]
    RecursiveVariable { name: String, line: u32 },

    #[error("line {line}: variable expansion exceeds {limit} levels")]
    ExpansionTooDeep { line: u32, limit: usize },

    #[error("line {line}: expanding '{key}' produces more than {limit} bytes")]
    ExpansionTooLarge { key: String, line: u32, limit: usize },

    #[error("template exceeds {limit} bytes ({size} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
