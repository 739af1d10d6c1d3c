//! Text helpers shared by the vendor drivers.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::error::{Error, PlatformError, Result};
use crate::policy::{RAW_OUTPUT_TARGET, SwitchPolicy};
use crate::session::Session;

/// A parsed query result that may legitimately be empty.
pub(crate) trait ParsedOutput {
    fn is_empty_result(&self) -> bool;
}

impl<T> ParsedOutput for Vec<T> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<T> ParsedOutput for BTreeSet<T> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

/// Run candidate commands in order until one parses to a non-empty result.
///
/// Output the switch rejects (per `is_error`) moves on to the next candidate.
/// When every accepted output parsed empty, the empty result stands. When
/// nothing was accepted, the last failure is returned as
/// [`PlatformError::QueryFailed`].
pub(crate) async fn query_candidates<T, F>(
    session: &mut dyn Session,
    policy: &SwitchPolicy,
    what: &'static str,
    commands: &[&str],
    is_error: fn(&str) -> bool,
    parse: F,
) -> Result<T>
where
    T: ParsedOutput + Send,
    F: Fn(&str, &str) -> T + Send + Sync,
{
    let mut last_err: Option<Error> = None;
    let mut empty: Option<T> = None;

    for &command in commands {
        let output = match session.execute_command(command).await {
            Ok(output) => output,
            Err(e) => {
                debug!("{:?} failed: {}", command, e);
                let disconnected = e.is_disconnect();
                last_err = Some(e);
                if disconnected {
                    break;
                }
                continue;
            }
        };

        if policy.is_raw_output_enabled() {
            trace!(target: RAW_OUTPUT_TARGET, "Raw output of {:?}:\n{}", command, output);
        }

        if is_error(&output) {
            debug!("Switch rejected {:?}", command);
            last_err = Some(
                PlatformError::Unsupported {
                    command: command.to_string(),
                }
                .into(),
            );
            continue;
        }

        let parsed = parse(command, &output);
        if !parsed.is_empty_result() {
            return Ok(parsed);
        }
        debug!("{:?} returned no {}", command, what);
        empty.get_or_insert(parsed);
    }

    if let Some(parsed) = empty {
        return Ok(parsed);
    }

    let source = last_err.unwrap_or_else(|| {
        PlatformError::Unsupported {
            command: commands.join(", "),
        }
        .into()
    });
    Err(PlatformError::QueryFailed {
        what,
        source: Box::new(source),
    }
    .into())
}

/// Case-insensitive search for any of `hints` in `output`.
pub(crate) fn contains_hint(output: &str, hints: &[&str]) -> bool {
    let lower = output.to_lowercase();
    hints.iter().any(|hint| lower.contains(hint))
}

/// A table rule such as `----- ------` or `=====`.
pub(crate) fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '-' | '=' | '+' | ' '))
}
