//! Channel layer for prompt matching over a raw transport.
//!
//! This module turns the byte stream of a [`Transport`](crate::transport::Transport)
//! into "read until this text shows up" operations, with ANSI stripping and
//! deadline handling.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::{Literal, PromptMatcher, TrailingPrompt};
pub use pty::{DEFAULT_POLL_INTERVAL, PtyChannel};
