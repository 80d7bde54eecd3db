#![forbid(unsafe_code)]
#![deny(unused_must_use)]

pub mod config;
pub mod output;
pub mod registry;

pub use config::Config;
pub use registry::{fingerprint, ProfileRegistry, RegistryError};
