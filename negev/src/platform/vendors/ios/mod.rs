//! Cisco IOS platform support.

mod parse;
mod platform;

pub use platform::IosDriver;
