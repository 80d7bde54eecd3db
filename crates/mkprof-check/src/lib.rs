#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

mod checker;
pub mod kind;
pub mod link;
pub mod wrapper;

pub use checker::{CheckError, CheckReport, ProfileChecker};
pub use kind::{KindConflict, KindConvention, KindDimension};
pub use link::LinkOrder;
pub use wrapper::WrapperFamily;
