//! Built-in vendor drivers.

pub mod dmos;
pub mod ios;
