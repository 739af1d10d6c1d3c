//! Datacom DmOS platform support.

mod parse;
mod platform;

pub use parse::normalize_port;
pub use platform::DmosDriver;
