//! Caller-side polling for mapping requests.
//!
//! The client library never loops; `--wait` on the mapping subcommands is
//! implemented here, with the interval and overall timeout owned by the
//! command line.

use std::time::{Duration, Instant};

use tracing::info;

/// Statuses that mean the service has not decided yet.
const PENDING_STATUSES: &[&str] = &["requested", "pending"];

/// The status that means the mapping took effect.
pub const CONFIRMED: &str = "confirmed";

pub fn is_pending(status: &str) -> bool {
    PENDING_STATUSES.contains(&status)
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The first non-pending status observed.
    Terminal(String),
    /// The timeout elapsed; carries the last status seen, if any.
    TimedOut(Option<String>),
}

/// Call `check` until it reports a non-pending status or `timeout` elapses.
///
/// `check` is always called at least once. `sleep` is invoked between polls
/// with `interval`. Errors from `check` end the loop immediately.
pub fn poll_until_terminal<E>(
    mut check: impl FnMut() -> Result<Option<String>, E>,
    interval: Duration,
    timeout: Duration,
    mut sleep: impl FnMut(Duration),
) -> Result<PollOutcome, E> {
    let deadline = Instant::now() + timeout;
    loop {
        let status = check()?;
        match status {
            Some(s) if !is_pending(&s) => return Ok(PollOutcome::Terminal(s)),
            last => {
                info!(
                    "mapping: request still {}",
                    last.as_deref().unwrap_or("unknown")
                );
                if Instant::now() >= deadline {
                    return Ok(PollOutcome::TimedOut(last));
                }
            }
        }
        sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(statuses: &[Option<&str>]) -> impl FnMut() -> Result<Option<String>, String> {
        let mut queue: Vec<Option<String>> =
            statuses.iter().rev().map(|s| s.map(String::from)).collect();
        move || queue.pop().ok_or_else(|| "polled too often".to_string())
    }

    #[test]
    fn pending_vocabulary() {
        assert!(is_pending("requested"));
        assert!(is_pending("pending"));
        assert!(!is_pending("confirmed"));
        assert!(!is_pending("discarded"));
        assert!(!is_pending("timedout"));
    }

    #[test]
    fn stops_at_first_terminal_status() {
        let mut sleeps = 0;
        let outcome = poll_until_terminal(
            scripted(&[Some("requested"), None, Some("confirmed")]),
            Duration::from_secs(5),
            Duration::from_secs(3600),
            |_| sleeps += 1,
        )
        .unwrap();
        assert_eq!(outcome, PollOutcome::Terminal("confirmed".into()));
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn unknown_terminal_status_is_passed_through() {
        let outcome = poll_until_terminal(
            scripted(&[Some("discarded")]),
            Duration::ZERO,
            Duration::from_secs(3600),
            |_| {},
        )
        .unwrap();
        assert_eq!(outcome, PollOutcome::Terminal("discarded".into()));
    }

    #[test]
    fn times_out_with_last_status() {
        let outcome = poll_until_terminal(
            scripted(&[Some("requested")]),
            Duration::ZERO,
            Duration::ZERO,
            |_| {},
        )
        .unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut(Some("requested".into())));
    }

    #[test]
    fn check_errors_end_the_loop() {
        let result = poll_until_terminal(
            || Err::<Option<String>, _>("network down"),
            Duration::ZERO,
            Duration::from_secs(3600),
            |_| {},
        );
        assert_eq!(result, Err("network down"));
    }
}
