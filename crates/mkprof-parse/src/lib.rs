#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

mod error;
mod expand;
mod lexer;
mod parser;
mod render;
mod token;

pub use error::ParseError;
pub use expand::{MAX_EXPANSION_DEPTH, MAX_EXPANSION_SIZE};
pub use parser::{
    parse_file, parse_str, profile_name_for, MAX_TEMPLATE_SIZE, PROFILE_KEYS, TEMPLATE_PREFIX,
};
pub use render::render;
