//! Bounded poll-until-condition primitive.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Repeatedly run `probe` until it reports `true` or `timeout` elapses.
///
/// Each probe is itself bounded by the time remaining, so a hung probe
/// cannot stretch the wait past the deadline. Probe errors count as "not
/// yet" and are logged at debug level. Returns whether the condition was
/// observed.
pub async fn poll_until<F, Fut, E>(timeout: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }

        match tokio::time::timeout(remaining, probe()).await {
            Ok(Ok(true)) => return true,
            Ok(Ok(false)) => {}
            Ok(Err(e)) => tracing::debug!(%e, "Poll probe failed"),
            Err(_) => return false,
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }
}
