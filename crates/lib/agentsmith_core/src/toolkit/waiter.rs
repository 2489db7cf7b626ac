//! Connection completion polling.
//!
//! OAuth completion is observed by polling the connection until it leaves
//! `connecting` / `pending_redirect`, bounded by a wall-clock timeout.

use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ToolkitError;
use super::models::ConnectionStatus;
use super::platform::ToolkitPlatform;
use crate::credential::ApiCredential;

/// Default wait budget; OAuth consent is a human step.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polls are never closer together than this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Timeout and cadence for [`wait_for_connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitOptions {
    /// Poll interval is clamped to [`MIN_POLL_INTERVAL`].
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Poll `connection_id` until it settles.
///
/// Returns the terminal status, or [`ConnectionStatus::TimedOut`] once the
/// timeout elapses, even while a poll is still outstanding. No poll is
/// issued after that point. Returns
/// [`ToolkitError::Cancelled`] when `cancel` fires; dropping the future
/// stops polling as well. Read-only against the platform.
pub async fn wait_for_connection(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    connection_id: &str,
    options: WaitOptions,
    cancel: &CancellationToken,
) -> Result<ConnectionStatus, ToolkitError> {
    let deadline = Instant::now() + options.timeout;
    let mut polls = 0u32;

    loop {
        // A poll still in flight at the deadline is abandoned.
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ToolkitError::Cancelled),
            _ = sleep_until(deadline) => break,
            status = platform.connection_status(credential, connection_id) => status?,
        };
        polls += 1;
        if status.is_terminal() {
            debug!(connection_id, %status, polls, "connection settled");
            return Ok(status);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(ToolkitError::Cancelled),
            _ = sleep(options.poll_interval.min(remaining)) => {}
        }

        if Instant::now() >= deadline {
            break;
        }
    }

    debug!(connection_id, polls, "connection wait timed out");
    Ok(ConnectionStatus::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::testing::{CallCounts, FakePlatform};

    #[test]
    fn poll_interval_is_clamped() {
        let opts = WaitOptions::new(Duration::from_secs(10), Duration::from_millis(10));
        assert_eq!(opts.poll_interval, MIN_POLL_INTERVAL);
        assert_eq!(WaitOptions::default().timeout, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_connection_is_active() {
        let platform = FakePlatform::new().with_statuses(&[
            ConnectionStatus::Connecting,
            ConnectionStatus::Connecting,
            ConnectionStatus::Active,
        ]);

        let status = wait_for_connection(
            &platform,
            &ApiCredential::new("key"),
            "ca_1",
            WaitOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(status, ConnectionStatus::Active);
        assert_eq!(CallCounts::get(&platform.calls().connection_status), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_connection_is_terminal() {
        let platform = FakePlatform::new().with_statuses(&[ConnectionStatus::Expired]);
        let status = wait_for_connection(
            &platform,
            &ApiCredential::new("key"),
            "ca_1",
            WaitOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(status, ConnectionStatus::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_connection_times_out_and_stops_polling() {
        let platform = FakePlatform::new().with_statuses(&[ConnectionStatus::Connecting]);
        let options = WaitOptions::new(Duration::from_secs(10), Duration::from_secs(3));
        let started = Instant::now();

        let status = wait_for_connection(
            &platform,
            &ApiCredential::new("key"),
            "ca_1",
            options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(status, ConnectionStatus::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(10));
        // Polls at t = 0, 3, 6, 9; the final sleep ends at the deadline.
        let polls = CallCounts::get(&platform.calls().connection_status);
        assert_eq!(polls, 4);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(CallCounts::get(&platform.calls().connection_status), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_wait() {
        let platform = FakePlatform::new().with_statuses(&[ConnectionStatus::Connecting]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(4)).await;
            trigger.cancel();
        });

        let err = wait_for_connection(
            &platform,
            &ApiCredential::new("key"),
            "ca_1",
            WaitOptions::default(),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolkitError::Cancelled));
        assert_eq!(CallCounts::get(&platform.calls().connection_status), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_poll_cannot_outlast_the_timeout() {
        let platform = FakePlatform::new()
            .with_statuses(&[ConnectionStatus::Active])
            .with_status_delay(Duration::from_secs(60));
        let options = WaitOptions::new(Duration::from_secs(10), Duration::from_secs(3));
        let started = Instant::now();

        let status = wait_for_connection(
            &platform,
            &ApiCredential::new("key"),
            "ca_1",
            options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(status, ConnectionStatus::TimedOut);
        let waited = started.elapsed();
        assert!(
            waited >= Duration::from_secs(10) && waited < Duration::from_secs(11),
            "waited {waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_slow_poll() {
        let platform = FakePlatform::new().with_status_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let err = wait_for_connection(
            &platform,
            &ApiCredential::new("key"),
            "ca_1",
            WaitOptions::default(),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolkitError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
