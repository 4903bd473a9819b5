//! Cooperative host loop that feeds operator lines into the wizard.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::console::{Console, LineSource};
use crate::storage::Storage;
use crate::wizard::{Applied, KeyPrompt, TickOutcome, Wizard};

/// Runs ticks and key prompts until the selected session ends.
///
/// While no operator line is available the loop sleeps for `poll` and tries
/// again; `tick` keeps running between polls. Once the line source is closed
/// every remaining key is kept as it is, so the pass still completes.
///
/// Returns the outcome that ended the session, or `None` if nothing was
/// selected.
pub fn run_session<S, C, L>(
    wizard: &mut Wizard<S, C>,
    lines: &mut L,
    poll: Duration,
) -> Option<TickOutcome>
where
    S: Storage,
    C: Console,
    L: LineSource,
{
    let mut awaiting_value = false;
    debug!(
        file = ?wizard.selected_file(),
        phase = ?wizard.phase(),
        "host loop started"
    );

    loop {
        if let Some(outcome) = wizard.tick() {
            if outcome.ends_session() {
                return Some(outcome);
            }
            if let TickOutcome::Started { path, keys } = &outcome {
                debug!(path = %path, keys, "session opened");
            }
        }

        if !awaiting_value {
            match wizard.next_key_ticking() {
                KeyPrompt::More => awaiting_value = true,
                KeyPrompt::Pending | KeyPrompt::Done => continue,
                KeyPrompt::NoSession => return None,
            }
        }

        let line = match lines.poll_line() {
            Some(line) => line,
            None if lines.is_closed() => String::new(),
            None => {
                thread::sleep(poll);
                continue;
            }
        };

        match wizard.set_value(&line) {
            Ok(Applied::Rejected) if lines.is_closed() => {
                debug!("input closed on a rejected value, keeping old value");
                if let Err(e) = wizard.set_value("") {
                    debug!(error = %e, "could not keep old value");
                }
            }
            Ok(Applied::Changed(value)) => debug!(value = %value, "value changed"),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "input line dropped"),
        }
        awaiting_value = false;
    }
}
